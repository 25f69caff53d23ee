//! Flat buffer protocol for zero-copy WASM bridge
//!
//! Binary format for pagination results:
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header (offset table for random access):
//! [0]     MAGIC (0x50474346 = "PGCF" for validation)
//! [1]     SCHEMA_VERSION (protocol version, currently 1)
//! [2]     version_lo (pagination pass)
//! [3]     version_hi (pagination pass)
//! [4]     page_count
//! [5]     warning_count
//! [6]     skipped_count
//! [7]     u32_warning_offset (0 if no warnings)
//! [8]     f32_warning_offset (0 if no warnings)
//! [9]     u32_skipped_offset (0 if nothing skipped)
//! [10..]  page data...
//!
//! Per-page:
//!   page_index
//!   fragment_count
//!   per-fragment: [box_id, span, kind, flags, range_start, range_end]
//!     kind: KIND_* opcode
//!     flags: bit0=partial, bit1=line range, bit2=child range
//!     range_*: only meaningful when bit1 or bit2 is set
//!
//! At u32_warning_offset: per-warning [box_id, page_index]
//! At u32_skipped_offset: per-skipped box [box_id]
//! ```
//!
//! ## f32 Buffer Layout:
//! ```text
//! Per-page: [consumed_height]
//! Per-fragment: [height]
//! At f32_warning_offset: per-warning [excess_height]
//! ```

use crate::document::{BoxId, BoxKind};
use crate::layout::{Fragment, OversizeWarning, PaginationResult, SplitRange};

/// Magic number for format validation: "PGCF" (PaGeCraFt)
pub const MAGIC: u32 = 0x50474346;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 10;

/// Opcodes for box kinds
pub const KIND_ATOMIC: u32 = 0;
pub const KIND_SEMANTIC_PAIR: u32 = 1;
pub const KIND_HEADING_GROUP: u32 = 2;
pub const KIND_PROSE: u32 = 3;
pub const KIND_LINE_BASED: u32 = 4;
pub const KIND_CONTAINER: u32 = 5;
pub const KIND_SEMANTIC_SEQUENCE: u32 = 6;
pub const KIND_TABLE: u32 = 7;

/// Flags bitmask
pub const FLAG_PARTIAL: u32 = 0b001;
pub const FLAG_LINE_RANGE: u32 = 0b010;
pub const FLAG_CHILD_RANGE: u32 = 0b100;

/// Number of u32 values per page header: [page_index, fragment_count]
pub const U32_PER_PAGE: usize = 2;

/// Number of u32 values per fragment
/// [box_id, span, kind, flags, range_start, range_end]
pub const U32_PER_FRAGMENT: usize = 6;

/// Number of u32 values per oversize warning
pub const U32_PER_WARNING: usize = 2; // box_id, page_index

/// Number of f32 values per oversize warning
pub const F32_PER_WARNING: usize = 1; // excess_height

/// Page buffer for zero-copy WASM transfer
pub struct PageBuffer {
    /// Integer data (indices, counts, offsets, opcodes)
    pub u32_data: Vec<u32>,
    /// Float data (heights)
    pub f32_data: Vec<f32>,

    // Written in finalize() so their offsets always follow the page data
    pending_warnings: Vec<OversizeWarning>,
    pending_skipped: Vec<BoxId>,
}

impl Default for PageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBuffer {
    pub fn new() -> Self {
        Self {
            u32_data: Vec::with_capacity(1024),
            f32_data: Vec::with_capacity(256),
            pending_warnings: Vec::new(),
            pending_skipped: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.u32_data.clear();
        self.f32_data.clear();
        self.pending_warnings.clear();
        self.pending_skipped.clear();
    }

    /// Pre-allocate buffers so JS-held pointers stay valid while writing.
    ///
    /// - u32_needed: HEADER_SIZE + pages * U32_PER_PAGE + fragments * U32_PER_FRAGMENT
    ///   + warnings * U32_PER_WARNING + skipped
    /// - f32_needed: pages + fragments + warnings * F32_PER_WARNING
    pub fn prepare(&mut self, u32_needed: usize, f32_needed: usize) {
        let u32_target = u32_needed + 32;
        let f32_target = f32_needed + 32;

        // Reuse buffers when capacity is sufficient
        if self.u32_data.capacity() < u32_target {
            self.u32_data = Vec::with_capacity(u32_target);
        } else {
            self.u32_data.clear();
        }

        if self.f32_data.capacity() < f32_target {
            self.f32_data = Vec::with_capacity(f32_target);
        } else {
            self.f32_data.clear();
        }

        self.pending_warnings.clear();
        self.pending_skipped.clear();
    }

    /// Write header with offset table for random access
    pub fn write_header(&mut self, version: u64, page_count: u32) {
        self.u32_data.push(MAGIC); // [0] magic number
        self.u32_data.push(SCHEMA_VERSION); // [1] schema version
        self.u32_data.push((version & 0xFFFF_FFFF) as u32); // [2] version_lo
        self.u32_data.push((version >> 32) as u32); // [3] version_hi
        self.u32_data.push(page_count); // [4] page_count
        self.u32_data.push(0); // [5] warning_count (placeholder)
        self.u32_data.push(0); // [6] skipped_count (placeholder)
        self.u32_data.push(0); // [7] u32_warning_offset (placeholder)
        self.u32_data.push(0); // [8] f32_warning_offset (placeholder)
        self.u32_data.push(0); // [9] u32_skipped_offset (placeholder)
    }

    /// Write page header, returns index where fragment_count should be written
    pub fn begin_page(&mut self, page_index: usize, consumed_height: f32) -> usize {
        self.u32_data.push(page_index as u32);
        let fragment_count_idx = self.u32_data.len();
        self.u32_data.push(0); // fragment_count placeholder

        self.f32_data.push(consumed_height);

        fragment_count_idx
    }

    /// Update fragment count for a page
    pub fn set_fragment_count(&mut self, idx: usize, count: u32) {
        if idx < self.u32_data.len() {
            self.u32_data[idx] = count;
        }
    }

    /// Write one fragment record
    pub fn write_fragment(&mut self, fragment: &Fragment) {
        let mut flags = if fragment.is_partial { FLAG_PARTIAL } else { 0 };
        let (range_start, range_end) = match &fragment.split_range {
            Some(SplitRange::Lines(r)) => {
                flags |= FLAG_LINE_RANGE;
                (r.start as u32, r.end as u32)
            }
            Some(SplitRange::Children(r)) => {
                flags |= FLAG_CHILD_RANGE;
                (r.start as u32, r.end as u32)
            }
            None => (0, 0),
        };

        self.u32_data.push(fragment.box_id.0 as u32);
        self.u32_data.push(fragment.span as u32);
        self.u32_data.push(kind_to_opcode(fragment.kind));
        self.u32_data.push(flags);
        self.u32_data.push(range_start);
        self.u32_data.push(range_end);

        self.f32_data.push(fragment.height);
    }

    /// Queue an oversize warning (written in finalize())
    pub fn write_warning(&mut self, warning: OversizeWarning) {
        self.pending_warnings.push(warning);
    }

    /// Queue a skipped box (written in finalize())
    pub fn write_skipped(&mut self, id: BoxId) {
        self.pending_skipped.push(id);
    }

    /// Write pending tables and synchronize the header.
    /// Must be called after all pages are written.
    pub fn finalize(&mut self) {
        if self.u32_data.len() < HEADER_SIZE {
            return;
        }

        if self.pending_warnings.is_empty() {
            self.u32_data[7] = 0;
            self.u32_data[8] = 0;
        } else {
            self.u32_data[7] = self.u32_data.len() as u32;
            self.u32_data[8] = self.f32_data.len() as u32;
            for warning in &self.pending_warnings {
                self.u32_data.push(warning.box_id.0 as u32);
                self.u32_data.push(warning.page_index as u32);
                self.f32_data.push(warning.excess_height);
            }
        }
        self.u32_data[5] = self.pending_warnings.len() as u32;

        if self.pending_skipped.is_empty() {
            self.u32_data[9] = 0;
        } else {
            self.u32_data[9] = self.u32_data.len() as u32;
            for id in &self.pending_skipped {
                self.u32_data.push(id.0 as u32);
            }
        }
        self.u32_data[6] = self.pending_skipped.len() as u32;

        #[cfg(debug_assertions)]
        self.validate_ranges();
    }

    /// Validate that every fragment range is ordered (debug builds only)
    #[cfg(debug_assertions)]
    fn validate_ranges(&self) {
        let page_count = self.u32_data[4] as usize;
        let mut idx = HEADER_SIZE;

        for page in 0..page_count {
            if idx + 1 >= self.u32_data.len() {
                break;
            }
            let fragment_count = self.u32_data[idx + 1] as usize;
            idx += U32_PER_PAGE;

            for fragment in 0..fragment_count {
                if idx + U32_PER_FRAGMENT > self.u32_data.len() {
                    break;
                }
                let (start, end) = (self.u32_data[idx + 4], self.u32_data[idx + 5]);
                debug_assert!(
                    start <= end,
                    "Invalid range for page {}, fragment {}: {} > {}",
                    page, fragment, start, end
                );
                idx += U32_PER_FRAGMENT;
            }
        }
    }

    /// Encode a whole pagination result, replacing previous contents
    pub fn write_result(&mut self, result: &PaginationResult, version: u64) {
        let fragments: usize = result.pages.iter().map(|p| p.fragments.len()).sum();
        let pages = result.pages.len();
        let warnings = result.warnings.len();

        self.prepare(
            HEADER_SIZE
                + pages * U32_PER_PAGE
                + fragments * U32_PER_FRAGMENT
                + warnings * U32_PER_WARNING
                + result.skipped.len(),
            pages + fragments + warnings * F32_PER_WARNING,
        );

        self.write_header(version, pages as u32);
        for page in &result.pages {
            let count_idx = self.begin_page(page.index, page.consumed_height);
            for fragment in &page.fragments {
                self.write_fragment(fragment);
            }
            self.set_fragment_count(count_idx, page.fragments.len() as u32);
        }
        for warning in &result.warnings {
            self.write_warning(*warning);
        }
        for &id in &result.skipped {
            self.write_skipped(id);
        }
        self.finalize();
    }

    // Accessors for WASM
    // u32 rather than usize: wasm32 linear memory uses u32 offsets

    pub fn u32_ptr(&self) -> u32 {
        self.u32_data.as_ptr() as u32
    }

    pub fn u32_len(&self) -> u32 {
        self.u32_data.len() as u32
    }

    pub fn f32_ptr(&self) -> u32 {
        self.f32_data.as_ptr() as u32
    }

    pub fn f32_len(&self) -> u32 {
        self.f32_data.len() as u32
    }
}

/// Convert BoxKind to its opcode
pub fn kind_to_opcode(kind: BoxKind) -> u32 {
    match kind {
        BoxKind::Atomic => KIND_ATOMIC,
        BoxKind::SemanticPair => KIND_SEMANTIC_PAIR,
        BoxKind::HeadingGroup => KIND_HEADING_GROUP,
        BoxKind::Prose => KIND_PROSE,
        BoxKind::LineBased => KIND_LINE_BASED,
        BoxKind::Container => KIND_CONTAINER,
        BoxKind::SemanticSequence => KIND_SEMANTIC_SEQUENCE,
        BoxKind::Table => KIND_TABLE,
    }
}
