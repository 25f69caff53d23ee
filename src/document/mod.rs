//! Measured box model stored in a flat arena

mod block;
mod classify;

pub use block::{BoxId, BoxKind, MeasuredBox, SplitUnit};
pub use classify::{Classification, Classifier, ElementInfo, TagClassifier};

use crate::error::{Error, Result};
use crate::layout::PaginationOptions;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::ops::Index;
use std::path::Path;

/// Nested box description produced by the external measurer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxSpec {
    pub kind: BoxKind,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub line_height: Option<f32>,
    pub line_count: Option<u32>,
    pub children: Vec<BoxSpec>,
    pub keep_together: bool,
    pub force_break_before: bool,
    pub heading_level: Option<u8>,
    pub thead_height: Option<f32>,
}

impl BoxSpec {
    /// A box of the given kind and height with no children
    pub fn new(kind: BoxKind, height: f32) -> Self {
        Self {
            kind,
            height,
            ..Default::default()
        }
    }

    /// An unsplittable box (image, rule, formula)
    pub fn atomic(height: f32) -> Self {
        Self::new(BoxKind::Atomic, height)
    }

    /// A keep-together pair (figure + caption, term + definition)
    pub fn pair(height: f32) -> Self {
        Self::new(BoxKind::SemanticPair, height)
    }

    /// A heading of the given level
    pub fn heading(level: u8, height: f32) -> Self {
        Self {
            heading_level: Some(level),
            ..Self::new(BoxKind::HeadingGroup, height)
        }
    }

    /// Flowing text of `line_count` lines
    pub fn prose(line_count: u32, line_height: f32) -> Self {
        Self {
            line_height: Some(line_height),
            line_count: Some(line_count),
            ..Self::new(BoxKind::Prose, line_count as f32 * line_height)
        }
    }

    /// Preformatted text of `line_count` lines
    pub fn line_based(line_count: u32, line_height: f32) -> Self {
        Self {
            line_height: Some(line_height),
            line_count: Some(line_count),
            ..Self::new(BoxKind::LineBased, line_count as f32 * line_height)
        }
    }

    /// A wrapper whose height is the sum of its children
    pub fn container(children: Vec<BoxSpec>) -> Self {
        Self::with_summed_height(BoxKind::Container, children)
    }

    /// A list (or row sequence) whose height is the sum of its items
    pub fn sequence(items: Vec<BoxSpec>) -> Self {
        Self::with_summed_height(BoxKind::SemanticSequence, items)
    }

    /// A table with a header block and body rows
    pub fn table(thead_height: f32, rows: Vec<BoxSpec>) -> Self {
        let mut spec = Self::with_summed_height(BoxKind::Table, rows);
        spec.height += thead_height;
        spec.thead_height = Some(thead_height);
        spec
    }

    fn with_summed_height(kind: BoxKind, children: Vec<BoxSpec>) -> Self {
        let height = children.iter().map(BoxSpec::outer_height).sum();
        Self {
            children,
            ..Self::new(kind, height)
        }
    }

    /// Attach a nested sub-list, growing this box by its outer height
    pub fn with_sublist(mut self, sublist: BoxSpec) -> Self {
        self.height += sublist.outer_height();
        self.children.push(sublist);
        self
    }

    /// Set vertical margins
    pub fn with_margins(mut self, top: f32, bottom: f32) -> Self {
        self.margin_top = top;
        self.margin_bottom = bottom;
        self
    }

    /// Mark the box keep-together
    pub fn keep_together(mut self) -> Self {
        self.keep_together = true;
        self
    }

    /// Request a page break before the box
    pub fn break_before(mut self) -> Self {
        self.force_break_before = true;
        self
    }

    /// Height including both margins
    pub fn outer_height(&self) -> f32 {
        self.margin_top + self.height + self.margin_bottom
    }

    fn validate(&self, path: &str) -> Result<()> {
        for (name, value) in [
            ("height", self.height),
            ("marginTop", self.margin_top),
            ("marginBottom", self.margin_bottom),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_box(path, format!("{name} must be a non-negative length, got {value}")));
            }
        }

        if self.line_count == Some(0) {
            return Err(Error::invalid_box(path, "lineCount must be at least 1"));
        }

        if self.kind.is_line_based() {
            match self.line_height {
                Some(lh) if lh.is_finite() && lh > 0.0 => {}
                Some(lh) => {
                    return Err(Error::invalid_box(path, format!("lineHeight must be positive, got {lh}")));
                }
                None => {
                    return Err(Error::invalid_box(path, format!("{} box is missing lineHeight", self.kind.name())));
                }
            }
            if self.line_count.is_none() {
                return Err(Error::invalid_box(path, format!("{} box is missing lineCount", self.kind.name())));
            }
        }

        if let Some(level) = self.heading_level {
            if !(1..=6).contains(&level) {
                return Err(Error::invalid_box(path, format!("heading level {level} is outside 1-6")));
            }
        }

        if let Some(thead) = self.thead_height {
            if !thead.is_finite() || thead < 0.0 {
                return Err(Error::invalid_box(path, format!("theadHeight must be a non-negative length, got {thead}")));
            }
        }

        Ok(())
    }

    fn into_box(self, children: std::ops::Range<usize>) -> MeasuredBox {
        MeasuredBox {
            kind: self.kind,
            height: self.height,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            line_height: self.line_height,
            line_count: self.line_count,
            children,
            keep_together: self.keep_together,
            force_break_before: self.force_break_before,
            heading_level: self.heading_level,
            thead_height: self.thead_height,
        }
    }
}

/// Immutable arena of measured boxes.
///
/// Boxes are laid out breadth-first: the top-level sequence occupies ids
/// `0..root_count()` and every box's children form one contiguous id range,
/// so fragments and flattened items can refer to content by index alone.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    boxes: Vec<MeasuredBox>,
    root_count: usize,
}

impl BoxTree {
    /// Build and validate a tree from the measurer's nested specs
    pub fn from_specs(specs: Vec<BoxSpec>) -> Result<Self> {
        let root_count = specs.len();
        let mut boxes: Vec<MeasuredBox> = Vec::with_capacity(root_count);
        let mut pending: VecDeque<(usize, BoxSpec, String)> = VecDeque::with_capacity(root_count);

        for (index, spec) in specs.into_iter().enumerate() {
            boxes.push(MeasuredBox::default());
            pending.push_back((index, spec, index.to_string()));
        }

        while let Some((id, mut spec, path)) = pending.pop_front() {
            spec.validate(&path)?;

            let children = std::mem::take(&mut spec.children);
            let start = boxes.len();
            for (index, child) in children.into_iter().enumerate() {
                let child_id = boxes.len();
                boxes.push(MeasuredBox::default());
                pending.push_back((child_id, child, format!("{path}/{index}")));
            }

            boxes[id] = spec.into_box(start..boxes.len());
        }

        Ok(Self { boxes, root_count })
    }

    /// Parse a JSON array of box specs and build the tree
    pub fn from_json(json: &str) -> Result<Self> {
        let specs: Vec<BoxSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    /// Read a JSON file of box specs
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Total number of boxes, nested ones included
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Number of top-level boxes
    pub fn root_count(&self) -> usize {
        self.root_count
    }

    /// Ids of the top-level boxes in document order
    pub fn roots(&self) -> impl Iterator<Item = BoxId> {
        (0..self.root_count).map(BoxId)
    }

    /// Get a box by id
    pub fn get(&self, id: BoxId) -> Option<&MeasuredBox> {
        self.boxes.get(id.0)
    }

    /// Direct children of a box
    pub fn children(&self, id: BoxId) -> &[MeasuredBox] {
        &self.boxes[self[id].children.clone()]
    }

    /// Number of items a list flattens to, nested sub-list items included
    pub fn list_item_count(&self, id: BoxId) -> usize {
        self[id]
            .child_ids()
            .map(|item| {
                1 + self[item]
                    .child_ids()
                    .filter(|&sub| self[sub].kind == BoxKind::SemanticSequence)
                    .map(|sub| self.list_item_count(sub))
                    .sum::<usize>()
            })
            .sum()
    }

    /// Number of body rows in a table, row groups expanded
    pub fn table_row_count(&self, id: BoxId) -> usize {
        self.children(id)
            .iter()
            .map(|child| match child.kind {
                BoxKind::Container => child.child_count(),
                _ => 1,
            })
            .sum()
    }

    /// Whether the engine may hand this box to a split resolver.
    ///
    /// Derived from the kind contract, the keep-together signal and the
    /// minimum sizes a split must leave on both pages.
    pub fn can_split(&self, id: BoxId, options: &PaginationOptions) -> bool {
        let b = &self[id];
        if b.keep_together || b.kind.is_atomic() {
            return false;
        }

        match b.kind {
            BoxKind::Prose => b.lines() >= options.orphan_lines + options.widow_lines,
            BoxKind::LineBased => b.lines() >= 2,
            BoxKind::Container => b.child_count() >= 2,
            BoxKind::SemanticSequence => {
                self.list_item_count(id) >= (2 * options.min_items_for_split).max(2)
            }
            BoxKind::Table => self.table_row_count(id) >= (2 * options.min_rows_for_split).max(2),
            BoxKind::Atomic | BoxKind::SemanticPair | BoxKind::HeadingGroup => false,
        }
    }
}

impl Index<BoxId> for BoxTree {
    type Output = MeasuredBox;

    fn index(&self, id: BoxId) -> &MeasuredBox {
        &self.boxes[id.0]
    }
}
