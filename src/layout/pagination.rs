//! Pages, fragments and pagination diagnostics

use crate::document::{BoxId, BoxKind};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Part of a box placed by a partial fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitRange {
    /// Line range of a `Prose` or `LineBased` box
    Lines(Range<usize>),
    /// Flattened item range of a `Container`, `SemanticSequence` or `Table`
    Children(Range<usize>),
}

impl SplitRange {
    pub fn range(&self) -> &Range<usize> {
        match self {
            SplitRange::Lines(range) | SplitRange::Children(range) => range,
        }
    }

    pub fn start(&self) -> usize {
        self.range().start
    }

    pub fn end(&self) -> usize {
        self.range().end
    }

    pub fn len(&self) -> usize {
        self.range().len()
    }

    pub fn is_empty(&self) -> bool {
        self.range().is_empty()
    }
}

/// One placed unit on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    /// Placed box; the first member for heading groups
    pub box_id: BoxId,
    /// Consecutive top-level boxes covered, more than one only for heading groups
    pub span: usize,
    pub kind: BoxKind,
    pub is_partial: bool,
    /// Placed part of a split box
    pub split_range: Option<SplitRange>,
    /// Vertical space consumed, margins included
    pub height: f32,
}

impl Fragment {
    /// Ids of the top-level boxes this fragment covers
    pub fn box_ids(&self) -> impl Iterator<Item = BoxId> {
        (self.box_id.0..self.box_id.0 + self.span).map(BoxId)
    }

    /// Check if this fragment places (part of) the given box
    pub fn covers(&self, id: BoxId) -> bool {
        id >= self.box_id && id.0 < self.box_id.0 + self.span
    }
}

/// A finished page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,
    pub fragments: Vec<Fragment>,
    pub consumed_height: f32,
}

impl Page {
    /// Create a new empty page
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fragments: Vec::new(),
            consumed_height: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Check if this page contains a given box
    pub fn contains_box(&self, id: BoxId) -> bool {
        self.fragments.iter().any(|f| f.covers(id))
    }

    pub(crate) fn push(&mut self, fragment: Fragment) {
        self.consumed_height += fragment.height;
        self.fragments.push(fragment);
    }
}

/// A box placed on an empty page that still did not fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OversizeWarning {
    pub box_id: BoxId,
    pub page_index: usize,
    /// Height beyond the page content area
    pub excess_height: f32,
}

/// Output of one pagination pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub pages: Vec<Page>,
    pub warnings: Vec<OversizeWarning>,
    /// Empty boxes left out under `skip_empty_elements`
    pub skipped: Vec<BoxId>,
}

impl PaginationResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the page a box starts on
    pub fn page_of(&self, id: BoxId) -> Option<usize> {
        self.pages
            .iter()
            .find(|page| page.contains_box(id))
            .map(|page| page.index)
    }

    /// All fragments in placement order
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.pages.iter().flat_map(|page| page.fragments.iter())
    }

    pub fn has_oversize(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Structured diagnostics the engine reports while paginating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "event")]
pub enum PaginationEvent {
    SplitChosen {
        box_id: BoxId,
        page_index: usize,
        index: usize,
        height_before: f32,
        height_after: f32,
    },
    OversizeOverflow {
        box_id: BoxId,
        page_index: usize,
        excess_height: f32,
    },
    ForcedBreak {
        box_id: BoxId,
        page_index: usize,
    },
    /// A heading moved to the next page to stay with its follower
    HeadingDeferred {
        box_id: BoxId,
        page_index: usize,
        space_after_heading: f32,
        required: f32,
    },
}

/// Receiver for engine diagnostics
pub trait PaginationObserver {
    fn on_event(&mut self, event: PaginationEvent);
}

impl PaginationObserver for () {
    fn on_event(&mut self, _event: PaginationEvent) {}
}

impl PaginationObserver for Vec<PaginationEvent> {
    fn on_event(&mut self, event: PaginationEvent) {
        self.push(event);
    }
}
