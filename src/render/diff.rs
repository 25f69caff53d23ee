//! Page diff protocol for incremental repagination

use crate::document::BoxId;
use crate::layout::{Page, PaginationResult};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// A single patch operation for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "op")]
pub enum PagePatch {
    /// Append a page that did not exist before
    InsertPage { page: Page },
    /// Drop a trailing page
    RemovePage { page_index: usize },
    /// Swap the contents of an existing page
    ReplacePage { page: Page },
}

impl PagePatch {
    pub fn page_index(&self) -> usize {
        match self {
            PagePatch::InsertPage { page } | PagePatch::ReplacePage { page } => page.index,
            PagePatch::RemovePage { page_index } => *page_index,
        }
    }
}

/// Complete page diff to send to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDiff {
    pub version: u64,
    pub patches: Vec<PagePatch>,
}

impl PageDiff {
    /// Create empty diff
    pub fn new(version: u64) -> Self {
        Self {
            version,
            patches: Vec::new(),
        }
    }

    /// Compare two pagination passes page by page.
    ///
    /// Pages whose fragments are unchanged produce no patch; removals
    /// are emitted last-page first so indices stay valid while applying.
    pub fn compute(previous: &PaginationResult, current: &PaginationResult, version: u64) -> Self {
        let mut diff = Self::new(version);
        let prev_count = previous.pages.len();

        for page in &current.pages {
            match previous.pages.get(page.index) {
                None => diff.add_patch(PagePatch::InsertPage { page: page.clone() }),
                Some(old) if old.fragments != page.fragments => {
                    diff.add_patch(PagePatch::ReplacePage { page: page.clone() })
                }
                Some(_) => {}
            }
        }

        for page_index in (current.pages.len()..prev_count).rev() {
            diff.add_patch(PagePatch::RemovePage { page_index });
        }

        diff
    }

    /// Add a patch
    pub fn add_patch(&mut self, patch: PagePatch) {
        self.patches.push(patch);
    }

    /// Check if there are any patches
    pub fn has_patches(&self) -> bool {
        !self.patches.is_empty()
    }

    /// Get patch count
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Lowest page index touched by the diff
    pub fn first_changed_page(&self) -> Option<usize> {
        self.patches.iter().map(PagePatch::page_index).min()
    }
}

/// Boxes whose first page differs between two passes, or that appear in
/// only one of them
pub fn moved_boxes(previous: &PaginationResult, current: &PaginationResult) -> FxHashSet<BoxId> {
    let first_pages = |result: &PaginationResult| {
        let mut seen = FxHashSet::default();
        let mut placed = Vec::new();
        for page in &result.pages {
            for fragment in &page.fragments {
                for id in fragment.box_ids() {
                    if seen.insert(id) {
                        placed.push((id, page.index));
                    }
                }
            }
        }
        placed
    };

    let before: FxHashSet<(BoxId, usize)> = first_pages(previous).into_iter().collect();
    let after: FxHashSet<(BoxId, usize)> = first_pages(current).into_iter().collect();
    before
        .symmetric_difference(&after)
        .map(|&(id, _)| id)
        .collect()
}
