//! Heading aggregation: runs of headings become one placement unit

use crate::document::{BoxId, BoxKind, BoxTree};

/// One unit of the top-level flow handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct FlowBox {
    /// First top-level box of the unit
    pub first: BoxId,
    /// Number of consecutive top-level boxes, more than one only for heading runs
    pub span: usize,
    pub kind: BoxKind,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub force_break_before: bool,
}

impl FlowBox {
    fn single(tree: &BoxTree, id: BoxId) -> Self {
        let b = &tree[id];
        Self {
            first: id,
            span: 1,
            kind: b.kind,
            height: b.height,
            margin_top: b.margin_top,
            margin_bottom: b.margin_bottom,
            force_break_before: b.force_break_before,
        }
    }

    /// Height including both margins
    pub fn outer_height(&self) -> f32 {
        self.margin_top + self.height + self.margin_bottom
    }

    /// Check if this unit is a synthetic heading group
    pub fn is_heading_group(&self) -> bool {
        self.kind == BoxKind::HeadingGroup
    }
}

/// Merge every maximal run of consecutive headings into one `HeadingGroup`
/// unit; other top-level boxes pass through unchanged.
///
/// A group's height is the members' heights plus the margins between them,
/// its outer margins are the first member's top and the last member's
/// bottom margin, and it breaks before only if its first member does.
pub fn aggregate(tree: &BoxTree) -> Vec<FlowBox> {
    let mut flow: Vec<FlowBox> = Vec::with_capacity(tree.root_count());

    for id in tree.roots() {
        let b = &tree[id];
        if b.kind == BoxKind::HeadingGroup {
            if let Some(group) = flow.last_mut().filter(|unit| unit.is_heading_group()) {
                group.height += group.margin_bottom + b.margin_top + b.height;
                group.margin_bottom = b.margin_bottom;
                group.span += 1;
                continue;
            }
        }
        flow.push(FlowBox::single(tree, id));
    }

    flow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BoxSpec;

    #[test]
    fn test_heading_run_merges() {
        let tree = BoxTree::from_specs(vec![
            BoxSpec::heading(2, 30.0).with_margins(10.0, 4.0).break_before(),
            BoxSpec::heading(3, 24.0).with_margins(6.0, 4.0),
            BoxSpec::heading(4, 20.0).with_margins(6.0, 8.0),
            BoxSpec::prose(5, 20.0),
        ])
        .unwrap();

        let flow = aggregate(&tree);
        assert_eq!(flow.len(), 2);

        let group = &flow[0];
        assert_eq!(group.kind, BoxKind::HeadingGroup);
        assert_eq!(group.first, BoxId(0));
        assert_eq!(group.span, 3);
        // 30 + (4 + 6) + 24 + (4 + 6) + 20
        assert_eq!(group.height, 94.0);
        assert_eq!(group.margin_top, 10.0);
        assert_eq!(group.margin_bottom, 8.0);
        assert!(group.force_break_before);
        assert_eq!(group.outer_height(), 112.0);

        assert_eq!(flow[1].first, BoxId(3));
        assert_eq!(flow[1].kind, BoxKind::Prose);
    }

    #[test]
    fn test_lone_heading_is_group_of_one() {
        let tree = BoxTree::from_specs(vec![
            BoxSpec::prose(5, 20.0),
            BoxSpec::heading(2, 30.0),
            BoxSpec::atomic(50.0),
            BoxSpec::heading(2, 30.0),
            BoxSpec::heading(3, 20.0).break_before(),
        ])
        .unwrap();

        let flow = aggregate(&tree);
        let spans: Vec<usize> = flow.iter().map(|unit| unit.span).collect();
        assert_eq!(spans, vec![1, 1, 1, 2]);
        assert!(flow[1].is_heading_group());
        // Only the first member decides the break
        assert!(!flow[3].force_break_before);
    }
}
