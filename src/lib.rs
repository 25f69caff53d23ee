//! Pagecraft: a pagination decision engine for measured document content
//!
//! This crate decides where page breaks fall in pre-measured content:
//! - Greedy page filling over a flat box arena
//! - Kind-specific split resolvers (prose, code, lists, tables)
//! - Orphan/widow control and heading keep-with-next
//! - Page diffs and a flat buffer bridge for WASM hosts

pub mod document;
pub mod error;
pub mod layout;
pub mod render;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use document::{BoxId, BoxKind, BoxSpec, BoxTree, MeasuredBox};
pub use error::{Error, Result};
pub use layout::{
    paginate, paginate_observed, Fragment, LayoutConstraints, OversizeWarning, Page,
    PaginationEvent, PaginationObserver, PaginationOptions, PaginationResult, SplitRange,
};
pub use render::{DisplayItem, DisplayList, DisplayPage, PageDiff, PagePatch};

use log::debug;
use serde::{Deserialize, Serialize};

/// Page-space rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Paginator state: options, page geometry and the last result.
///
/// Each pass is independent; keeping the previous result only lets
/// [`Paginator::repaginate`] report what changed.
pub struct Paginator {
    options: PaginationOptions,
    constraints: LayoutConstraints,
    result: PaginationResult,
    version: u64,
}

impl Paginator {
    /// Create a paginator with the given options
    pub fn new(options: PaginationOptions) -> Result<Self> {
        options.validate()?;
        let constraints =
            LayoutConstraints::around_content(options.content_width, options.content_height);
        Ok(Self {
            options,
            constraints,
            result: PaginationResult::default(),
            version: 0,
        })
    }

    /// Create a paginator with default rules for a page geometry
    pub fn with_constraints(constraints: LayoutConstraints) -> Result<Self> {
        let mut paginator = Self::new(PaginationOptions::from_constraints(&constraints))?;
        paginator.constraints = constraints;
        Ok(paginator)
    }

    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    pub fn constraints(&self) -> &LayoutConstraints {
        &self.constraints
    }

    /// Replace the options; takes effect on the next pass
    pub fn set_options(&mut self, options: PaginationOptions) -> Result<()> {
        options.validate()?;
        if options.content_height != self.options.content_height
            || options.content_width != self.options.content_width
        {
            self.constraints =
                LayoutConstraints::around_content(options.content_width, options.content_height);
        }
        self.options = options;
        Ok(())
    }

    /// Paginate a tree, replacing the stored result
    pub fn paginate(&mut self, tree: &BoxTree) -> Result<&PaginationResult> {
        self.result = paginate(tree, &self.options)?;
        self.version += 1;
        Ok(&self.result)
    }

    /// Paginate again and report the pages that differ from the last pass
    pub fn repaginate(&mut self, tree: &BoxTree) -> Result<PageDiff> {
        let current = paginate(tree, &self.options)?;
        self.version += 1;
        let diff = PageDiff::compute(&self.result, &current, self.version);
        debug!(
            "repaginated to version {}: {} patches",
            self.version,
            diff.patch_count()
        );
        self.result = current;
        Ok(diff)
    }

    /// Last pagination result
    pub fn result(&self) -> &PaginationResult {
        &self.result
    }

    pub fn pages(&self) -> &[Page] {
        &self.result.pages
    }

    /// Get total page count
    pub fn page_count(&self) -> usize {
        self.result.page_count()
    }

    /// Number of completed passes
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Build display list for the given viewport
    pub fn build_display_list(&self, tree: &BoxTree, viewport: Option<Rect>) -> DisplayList {
        DisplayList::build(tree, &self.result, &self.options, &self.constraints, viewport)
    }
}
