//! Flattening of nested lists and table row groups into linear sequences
//!
//! A page break inside a nested list forces the continuation page to reopen
//! every enclosing sub-list, and a break inside a table repeats its header.
//! Both costs are charged here, once, so that a single linear scan can
//! split every child-based box the same way regardless of nesting depth.

use crate::document::{BoxId, BoxKind, BoxTree};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// One item of a flattened sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatItem {
    pub source: BoxId,
    /// List, table or row group the item sits in
    pub list: BoxId,
    /// Nesting level below the flattened root
    pub depth: u16,
    /// Own height with margins, non-empty nested sub-lists excluded
    pub content_height: f32,
    /// Padding and margins of the first sub-list this item opens, paid by
    /// the depth increase that enters it
    pub nested_list_overhead: f32,
    /// Padding and margins of a later sibling sub-list, paid on its first
    /// item since no depth increase enters it
    pub opening_overhead: f32,
    /// Extra height paid when this item opens a continuation page
    pub leading_overhead: f32,
}

impl FlatItem {
    fn leaf(source: BoxId, list: BoxId, depth: u16, content_height: f32) -> Self {
        Self {
            source,
            list,
            depth,
            content_height,
            nested_list_overhead: 0.0,
            opening_overhead: 0.0,
            leading_overhead: 0.0,
        }
    }
}

/// A flattened child sequence plus the header it carries on every page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatSequence {
    /// Header height (table `thead`), zero for lists and containers
    pub header_height: f32,
    pub items: Vec<FlatItem>,
}

impl FlatSequence {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Height of `items[start..end]` laid out on its own, header excluded.
    ///
    /// A piece that does not begin the sequence pays the leading overhead
    /// of its first item. Inside the piece, every sub-list pays its own
    /// overhead once where its first item appears.
    pub fn piece_height(&self, start: usize, end: usize) -> f32 {
        let mut height = 0.0;
        for index in start..end {
            height += self.item_cost(start, index);
        }
        height
    }

    /// Cost of placing `items[index]` in a piece that begins at `start`
    pub(crate) fn item_cost(&self, start: usize, index: usize) -> f32 {
        let item = &self.items[index];
        let mut cost = item.content_height;
        if index == start {
            if start > 0 {
                cost += item.leading_overhead;
            }
        } else {
            let prev = &self.items[index - 1];
            if item.depth > prev.depth {
                cost += prev.nested_list_overhead;
            }
            cost += item.opening_overhead;
        }
        cost
    }
}

/// Flatten a list into one item per list item, depth-first
pub fn flatten_list(tree: &BoxTree, root: BoxId) -> Vec<FlatItem> {
    let mut items = Vec::with_capacity(tree.list_item_count(root));
    walk_list(tree, root, 0, 0.0, &mut items);
    items
}

fn walk_list(tree: &BoxTree, list: BoxId, depth: u16, leading: f32, items: &mut Vec<FlatItem>) {
    for item_id in tree[list].child_ids() {
        let item = &tree[item_id];
        // Empty sub-lists never receive a depth increase; their height stays
        // with the item
        let sublists: SmallVec<[BoxId; 2]> = item
            .child_ids()
            .filter(|&child| {
                tree[child].kind == BoxKind::SemanticSequence && tree[child].child_count() > 0
            })
            .collect();
        let nested_outer: f32 = sublists.iter().map(|&s| tree[s].outer_height()).sum();

        items.push(FlatItem {
            source: item_id,
            list,
            depth,
            content_height: (item.outer_height() - nested_outer).max(0.0),
            nested_list_overhead: sublists.first().map_or(0.0, |&s| list_overhead(tree, s)),
            opening_overhead: 0.0,
            leading_overhead: leading,
        });

        for (position, &sublist) in sublists.iter().enumerate() {
            let overhead = list_overhead(tree, sublist);
            let first = items.len();
            walk_list(tree, sublist, depth + 1, leading + overhead, items);
            if position > 0 {
                items[first].opening_overhead = overhead;
            }
        }
    }
}

/// Height a list box adds on top of its items
pub(crate) fn list_overhead(tree: &BoxTree, list: BoxId) -> f32 {
    let items: f32 = tree.children(list).iter().map(|item| item.outer_height()).sum();
    (tree[list].outer_height() - items).max(0.0)
}

/// Flatten table body rows; `Container` children are row groups whose rows
/// are expanded in order, with the group's own chrome charged to its first
/// row.
pub fn flatten_table_rows(tree: &BoxTree, table: BoxId) -> FlatSequence {
    let mut items = Vec::with_capacity(tree.table_row_count(table));

    for child_id in tree[table].child_ids() {
        let child = &tree[child_id];
        if child.kind != BoxKind::Container {
            items.push(FlatItem::leaf(child_id, table, 0, child.outer_height()));
            continue;
        }

        let group_chrome = list_overhead(tree, child_id);
        for (index, row_id) in child.child_ids().enumerate() {
            let mut height = tree[row_id].outer_height();
            if index == 0 {
                height += group_chrome;
            }
            items.push(FlatItem::leaf(row_id, child_id, 1, height));
        }
    }

    FlatSequence {
        header_height: tree[table].thead_height.unwrap_or(0.0),
        items,
    }
}

/// Flatten any child-split box into the sequence its resolver scans
pub fn flatten(tree: &BoxTree, id: BoxId) -> FlatSequence {
    match tree[id].kind {
        BoxKind::SemanticSequence => FlatSequence {
            header_height: 0.0,
            items: flatten_list(tree, id),
        },
        BoxKind::Table => flatten_table_rows(tree, id),
        _ => FlatSequence {
            header_height: 0.0,
            items: tree[id]
                .child_ids()
                .map(|child| FlatItem::leaf(child, id, 0, tree[child].outer_height()))
                .collect(),
        },
    }
}

/// Per-pass memo of flattened sequences
#[derive(Debug, Default)]
pub struct FlatCache {
    sequences: FxHashMap<BoxId, FlatSequence>,
}

impl FlatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattened sequence for a box, computed on first use
    pub fn get(&mut self, tree: &BoxTree, id: BoxId) -> &FlatSequence {
        self.sequences.entry(id).or_insert_with(|| flatten(tree, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BoxSpec;

    /// Outer item (40) whose sub-list has 16 of its own padding and holds
    /// three 20-high items, followed by one more outer item.
    fn nested_list() -> BoxTree {
        let mut sublist = BoxSpec::sequence(vec![BoxSpec::atomic(20.0); 3]);
        sublist.height += 16.0;
        BoxTree::from_specs(vec![BoxSpec::sequence(vec![
            BoxSpec::atomic(40.0).with_sublist(sublist),
            BoxSpec::atomic(30.0),
        ])])
        .unwrap()
    }

    #[test]
    fn test_flatten_nested_list() {
        let tree = nested_list();
        let items = flatten_list(&tree, BoxId(0));

        assert_eq!(items.len(), 5);
        let depths: Vec<u16> = items.iter().map(|i| i.depth).collect();
        assert_eq!(depths, vec![0, 1, 1, 1, 0]);

        assert_eq!(items[0].content_height, 40.0);
        assert_eq!(items[0].nested_list_overhead, 16.0);
        assert_eq!(items[0].leading_overhead, 0.0);

        for inner in &items[1..4] {
            assert_eq!(inner.content_height, 20.0);
            assert_eq!(inner.leading_overhead, 16.0);
        }
        assert_eq!(items[4].leading_overhead, 0.0);
    }

    #[test]
    fn test_piece_heights_conserve_list_height() {
        let tree = nested_list();
        let seq = flatten(&tree, BoxId(0));

        // 40 + 16 + 3 * 20 + 30
        assert_eq!(seq.piece_height(0, seq.len()), tree[BoxId(0)].height);
        // A continuation starting at the first inner item reopens the sub-list
        assert_eq!(seq.piece_height(1, 2), 36.0);
        // Depth increase inside the piece pays the opener's overhead
        assert_eq!(seq.piece_height(0, 2), 76.0);
    }

    #[test]
    fn test_deep_leading_overhead_accumulates() {
        let mut inner = BoxSpec::sequence(vec![BoxSpec::atomic(10.0), BoxSpec::atomic(10.0)]);
        inner.height += 8.0;
        let mut middle = BoxSpec::sequence(vec![BoxSpec::atomic(10.0).with_sublist(inner)]);
        middle.height += 12.0;
        let tree =
            BoxTree::from_specs(vec![BoxSpec::sequence(vec![BoxSpec::atomic(10.0).with_sublist(middle)])])
                .unwrap();

        let items = flatten_list(&tree, BoxId(0));
        let leading: Vec<f32> = items.iter().map(|i| i.leading_overhead).collect();
        assert_eq!(leading, vec![0.0, 12.0, 20.0, 20.0]);
    }

    #[test]
    fn test_sibling_sublists_charge_their_own_overhead() {
        let mut first = BoxSpec::sequence(vec![BoxSpec::atomic(10.0); 2]);
        first.height += 8.0;
        let mut second = BoxSpec::sequence(vec![BoxSpec::atomic(10.0)]);
        second.height += 6.0;
        let item = BoxSpec::atomic(20.0).with_sublist(first).with_sublist(second);
        let tree = BoxTree::from_specs(vec![BoxSpec::sequence(vec![item, BoxSpec::atomic(30.0)])])
            .unwrap();

        let seq = flatten(&tree, BoxId(0));
        let lists: Vec<BoxId> = seq.items.iter().map(|i| i.list).collect();
        assert_eq!(lists, vec![BoxId(0), BoxId(3), BoxId(3), BoxId(4), BoxId(0)]);
        assert_eq!(seq.items[0].nested_list_overhead, 8.0);
        assert_eq!(seq.items[3].opening_overhead, 6.0);
        assert_eq!(seq.items[3].leading_overhead, 6.0);

        assert_eq!(seq.piece_height(0, seq.len()), tree[BoxId(0)].height);
        // The second sub-list is entered without a depth increase
        assert_eq!(seq.piece_height(2, 4), 18.0 + 16.0);
        assert_eq!(seq.piece_height(3, 4), 16.0);
    }

    #[test]
    fn test_empty_sublist_stays_with_item() {
        let mut empty = BoxSpec::sequence(vec![]);
        empty.height = 4.0;
        let tree = BoxTree::from_specs(vec![BoxSpec::sequence(vec![
            BoxSpec::atomic(20.0).with_sublist(empty),
            BoxSpec::atomic(10.0),
        ])])
        .unwrap();

        let seq = flatten(&tree, BoxId(0));
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.items[0].content_height, 24.0);
        assert_eq!(seq.piece_height(0, seq.len()), tree[BoxId(0)].height);
    }

    #[test]
    fn test_flatten_table_row_groups() {
        let mut group = BoxSpec::container(vec![BoxSpec::atomic(20.0), BoxSpec::atomic(20.0)]);
        group.height += 4.0;
        let tree = BoxTree::from_specs(vec![BoxSpec::table(
            30.0,
            vec![BoxSpec::atomic(20.0), group, BoxSpec::atomic(25.0)],
        )])
        .unwrap();

        let rows = flatten_table_rows(&tree, BoxId(0));
        assert_eq!(rows.header_height, 30.0);
        let heights: Vec<f32> = rows.items.iter().map(|r| r.content_height).collect();
        assert_eq!(heights, vec![20.0, 24.0, 20.0, 25.0]);
        assert_eq!(rows.items[1].depth, 1);
        assert_eq!(rows.piece_height(0, rows.len()) + rows.header_height, tree[BoxId(0)].height);
    }

    #[test]
    fn test_cache_flattens_once() {
        let tree = nested_list();
        let mut cache = FlatCache::new();
        assert_eq!(cache.get(&tree, BoxId(0)).len(), 5);
        assert_eq!(cache.sequences.len(), 1);
        assert_eq!(cache.get(&tree, BoxId(0)).len(), 5);
        assert_eq!(cache.sequences.len(), 1);
    }
}
