//! Measured box metadata

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Index of a box in a [`BoxTree`](super::BoxTree) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BoxId(pub usize);

/// Semantic kind of a measured box, decided once by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoxKind {
    /// Images, rules, formulas: never split
    #[default]
    Atomic,
    /// Flowing text with orphan/widow control
    Prose,
    /// Preformatted lines (code, poetry) without orphan/widow control
    LineBased,
    /// Generic wrapper split between its children
    Container,
    /// Term + definition, figure + caption: never separated
    SemanticPair,
    /// List items or table-like rows
    SemanticSequence,
    /// A heading or a run of headings
    HeadingGroup,
    /// Table body rows with an optional repeated header
    Table,
}

/// What a resolver may split a box at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitUnit {
    Line,
    Child,
}

impl BoxKind {
    /// Split unit for this kind, `None` for kinds that never split
    pub fn split_unit(&self) -> Option<SplitUnit> {
        match self {
            BoxKind::Atomic | BoxKind::SemanticPair | BoxKind::HeadingGroup => None,
            BoxKind::Prose | BoxKind::LineBased => Some(SplitUnit::Line),
            BoxKind::Container | BoxKind::SemanticSequence | BoxKind::Table => {
                Some(SplitUnit::Child)
            }
        }
    }

    /// Check if this kind is always placed whole
    pub fn is_atomic(&self) -> bool {
        self.split_unit().is_none()
    }

    /// Check if this kind is measured in lines
    pub fn is_line_based(&self) -> bool {
        matches!(self.split_unit(), Some(SplitUnit::Line))
    }

    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, BoxKind::HeadingGroup)
    }

    /// Short lowercase name, used in logs and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            BoxKind::Atomic => "atomic",
            BoxKind::Prose => "prose",
            BoxKind::LineBased => "line-based",
            BoxKind::Container => "container",
            BoxKind::SemanticPair => "pair",
            BoxKind::SemanticSequence => "sequence",
            BoxKind::HeadingGroup => "heading",
            BoxKind::Table => "table",
        }
    }
}

/// One measured content unit, stored in the tree arena
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasuredBox {
    pub kind: BoxKind,
    /// Border-box height, margins excluded
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    /// Present for `Prose` and `LineBased`
    pub line_height: Option<f32>,
    /// Present for `Prose` and `LineBased`
    pub line_count: Option<u32>,
    /// Contiguous child ids in the arena
    pub children: Range<usize>,
    /// External keep-together signal (e.g. `break-inside: avoid`)
    pub keep_together: bool,
    pub force_break_before: bool,
    /// Heading level (1-6) for heading members
    pub heading_level: Option<u8>,
    /// Header block height repeated on table continuations
    pub thead_height: Option<f32>,
}

impl MeasuredBox {
    /// Height including both margins
    pub fn outer_height(&self) -> f32 {
        self.margin_top + self.height + self.margin_bottom
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Ids of the direct children
    pub fn child_ids(&self) -> impl Iterator<Item = BoxId> {
        self.children.clone().map(BoxId)
    }

    /// Line count, zero for boxes that are not line-measured
    pub fn lines(&self) -> usize {
        self.line_count.unwrap_or(0) as usize
    }

    /// Check if the box occupies no space and holds nothing
    pub fn is_empty(&self) -> bool {
        self.outer_height() <= 0.0 && self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_units() {
        assert_eq!(BoxKind::Atomic.split_unit(), None);
        assert_eq!(BoxKind::SemanticPair.split_unit(), None);
        assert_eq!(BoxKind::HeadingGroup.split_unit(), None);
        assert_eq!(BoxKind::Prose.split_unit(), Some(SplitUnit::Line));
        assert_eq!(BoxKind::LineBased.split_unit(), Some(SplitUnit::Line));
        assert_eq!(BoxKind::Table.split_unit(), Some(SplitUnit::Child));

        assert!(BoxKind::HeadingGroup.is_atomic());
        assert!(BoxKind::HeadingGroup.is_heading());
        assert!(!BoxKind::Container.is_atomic());
    }

    #[test]
    fn test_outer_height_and_empty() {
        let mut b = MeasuredBox {
            kind: BoxKind::Atomic,
            height: 0.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
            line_height: None,
            line_count: None,
            children: 0..0,
            keep_together: false,
            force_break_before: false,
            heading_level: None,
            thead_height: None,
        };
        assert!(b.is_empty());

        b.height = 10.0;
        b.margin_top = 4.0;
        b.margin_bottom = 6.0;
        assert_eq!(b.outer_height(), 20.0);
        assert!(!b.is_empty());
    }
}
