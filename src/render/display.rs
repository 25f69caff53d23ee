//! Display list: where each fragment lands and what a renderer must rebuild

use crate::document::{BoxId, BoxKind, BoxTree};
use crate::layout::flatten::list_overhead;
use crate::layout::{FlatCache, Fragment, LayoutConstraints, PaginationOptions, PaginationResult, SplitRange};
use crate::Rect;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Which edge of a cut line-based block a marker sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerEdge {
    Top,
    Bottom,
}

/// A display item to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum DisplayItem {
    /// Content of one fragment, margins excluded
    Block {
        box_id: BoxId,
        span: usize,
        kind: BoxKind,
        y: f32,
        height: f32,
        split_range: Option<SplitRange>,
    },
    /// Table header repeated at the top of a continuation
    TableHeader { table: BoxId, y: f32, height: f32 },
    /// List level reopened before a continued item; `height` is the
    /// level's own padding
    ReopenList {
        list: BoxId,
        depth: u16,
        y: f32,
        height: f32,
    },
    /// Continuation marker on a cut line-based block
    ContinuationMarker { box_id: BoxId, y: f32, edge: MarkerEdge },
}

/// Display list for a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPage {
    pub page_index: usize,
    pub bounds: Rect,
    pub items: Vec<DisplayItem>,
}

/// Complete display list for rendering
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayList {
    pub pages: Vec<DisplayPage>,
}

impl DisplayList {
    /// Build display pages for the pages intersecting `viewport`.
    ///
    /// Pages are stacked vertically, page `i` starting at
    /// `i * page_height`; item positions are relative to their page.
    pub fn build(
        tree: &BoxTree,
        result: &PaginationResult,
        options: &PaginationOptions,
        constraints: &LayoutConstraints,
        viewport: Option<Rect>,
    ) -> Self {
        let mut cache = FlatCache::new();
        let mut pages = Vec::new();

        for page in &result.pages {
            let bounds = Rect::new(
                0.0,
                page.index as f32 * constraints.page_height,
                constraints.page_width,
                constraints.page_height,
            );
            if viewport.is_some_and(|v| !v.intersects(&bounds)) {
                continue;
            }

            let mut items = Vec::new();
            let mut y = constraints.margin_top;
            for fragment in &page.fragments {
                Self::emit_fragment(tree, &mut cache, options, fragment, y, &mut items);
                y += fragment.height;
            }

            pages.push(DisplayPage {
                page_index: page.index,
                bounds,
                items,
            });
        }

        DisplayList { pages }
    }

    fn emit_fragment(
        tree: &BoxTree,
        cache: &mut FlatCache,
        options: &PaginationOptions,
        fragment: &Fragment,
        y: f32,
        items: &mut Vec<DisplayItem>,
    ) {
        let first = &tree[fragment.box_id];
        let last = &tree[BoxId(fragment.box_id.0 + fragment.span - 1)];
        let range = fragment.split_range.as_ref();

        let starts_box = range.map_or(true, |r| r.start() == 0);
        let ends_box = match range {
            None => true,
            Some(SplitRange::Lines(r)) => r.end >= first.lines(),
            Some(SplitRange::Children(r)) => r.end >= cache.get(tree, fragment.box_id).len(),
        };

        let top = if starts_box { first.margin_top } else { 0.0 };
        let bottom = if ends_box { last.margin_bottom } else { 0.0 };
        let mut content_y = y + top;
        let mut content_height = (fragment.height - top - bottom).max(0.0);

        // Repeated chrome sits above the continued content
        if !starts_box {
            match fragment.kind {
                BoxKind::Table if options.repeat_table_header => {
                    let height = first.thead_height.unwrap_or(0.0);
                    items.push(DisplayItem::TableHeader {
                        table: fragment.box_id,
                        y: content_y,
                        height,
                    });
                    content_y += height;
                    content_height = (content_height - height).max(0.0);
                }
                BoxKind::SemanticSequence => {
                    if let Some(r) = range {
                        for (list, depth) in open_lists(cache, tree, fragment.box_id, r.start()) {
                            let height = if depth == 0 { 0.0 } else { list_overhead(tree, list) };
                            items.push(DisplayItem::ReopenList {
                                list,
                                depth,
                                y: content_y,
                                height,
                            });
                            content_y += height;
                            content_height = (content_height - height).max(0.0);
                        }
                    }
                }
                BoxKind::LineBased => items.push(DisplayItem::ContinuationMarker {
                    box_id: fragment.box_id,
                    y: content_y,
                    edge: MarkerEdge::Top,
                }),
                _ => {}
            }
        }

        items.push(DisplayItem::Block {
            box_id: fragment.box_id,
            span: fragment.span,
            kind: fragment.kind,
            y: content_y,
            height: content_height,
            split_range: fragment.split_range.clone(),
        });

        if !ends_box && fragment.kind == BoxKind::LineBased {
            items.push(DisplayItem::ContinuationMarker {
                box_id: fragment.box_id,
                y: content_y + content_height - options.line_based_padding,
                edge: MarkerEdge::Bottom,
            });
        }
    }
}

/// Lists enclosing flattened item `index` of `root`, outermost first
fn open_lists(cache: &mut FlatCache, tree: &BoxTree, root: BoxId, index: usize) -> SmallVec<[(BoxId, u16); 4]> {
    let items = &cache.get(tree, root).items;
    let mut chain: SmallVec<[(BoxId, u16); 4]> = SmallVec::new();
    let Some(item) = items.get(index) else {
        return chain;
    };

    // Each level is the list of the nearest earlier item one level up
    let mut cursor = index;
    chain.push((item.list, item.depth));
    for depth in (0..item.depth).rev() {
        let Some(parent) = (0..cursor).rev().find(|&i| items[i].depth == depth) else {
            break;
        };
        chain.push((items[parent].list, depth));
        cursor = parent;
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BoxSpec;
    use crate::layout::paginate;

    fn constraints(content_height: f32) -> LayoutConstraints {
        LayoutConstraints {
            page_width: 400.0,
            page_height: content_height + 40.0,
            margin_top: 20.0,
            margin_bottom: 20.0,
            margin_left: 20.0,
            margin_right: 20.0,
        }
    }

    fn build(specs: Vec<BoxSpec>, content_height: f32, viewport: Option<Rect>) -> DisplayList {
        let constraints = constraints(content_height);
        let options = PaginationOptions::from_constraints(&constraints);
        let tree = BoxTree::from_specs(specs).unwrap();
        let result = paginate(&tree, &options).unwrap();
        DisplayList::build(&tree, &result, &options, &constraints, viewport)
    }

    #[test]
    fn test_block_positions_skip_margins() {
        let list = build(
            vec![
                BoxSpec::atomic(50.0).with_margins(10.0, 5.0),
                BoxSpec::atomic(30.0),
            ],
            200.0,
            None,
        );

        assert_eq!(list.pages.len(), 1);
        let ys: Vec<(f32, f32)> = list.pages[0]
            .items
            .iter()
            .map(|item| match item {
                DisplayItem::Block { y, height, .. } => (*y, *height),
                other => panic!("unexpected item {other:?}"),
            })
            .collect();
        // Page margin 20, then the first box's 10 top margin
        assert_eq!(ys, vec![(30.0, 50.0), (85.0, 30.0)]);
    }

    fn placements(page: &DisplayPage) -> Vec<(f32, f32)> {
        page.items
            .iter()
            .filter_map(|item| match item {
                DisplayItem::Block { y, height, .. }
                | DisplayItem::TableHeader { y, height, .. }
                | DisplayItem::ReopenList { y, height, .. } => Some((*y, *height)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_table_continuation_repeats_header() {
        let list = build(
            vec![BoxSpec::table(30.0, vec![BoxSpec::atomic(20.0); 10])],
            200.0,
            None,
        );

        assert_eq!(list.pages.len(), 2);
        assert!(matches!(
            list.pages[1].items[0],
            DisplayItem::TableHeader { height, .. } if height == 30.0
        ));
        assert!(!list.pages[0]
            .items
            .iter()
            .any(|item| matches!(item, DisplayItem::TableHeader { .. })));

        // Header then the two remaining rows below it, no overlap
        assert_eq!(placements(&list.pages[1]), vec![(20.0, 30.0), (50.0, 40.0)]);
    }

    #[test]
    fn test_nested_list_reopens_levels() {
        let mut sublist = BoxSpec::sequence(vec![BoxSpec::atomic(20.0); 6]);
        sublist.height += 16.0;
        let list = build(
            vec![BoxSpec::sequence(vec![BoxSpec::atomic(40.0).with_sublist(sublist)])],
            100.0,
            None,
        );

        let second = &list.pages[1];
        let reopened: Vec<u16> = second
            .items
            .iter()
            .filter_map(|item| match item {
                DisplayItem::ReopenList { depth, .. } => Some(*depth),
                _ => None,
            })
            .collect();
        assert_eq!(reopened, vec![0, 1]);
        // The sub-list's padding sits between the page top and the items
        assert_eq!(placements(second), vec![(20.0, 0.0), (20.0, 16.0), (36.0, 80.0)]);
    }

    #[test]
    fn test_reopens_the_sublist_holding_the_item() {
        let mut first = BoxSpec::sequence(vec![BoxSpec::atomic(20.0); 2]);
        first.height += 8.0;
        let mut second = BoxSpec::sequence(vec![BoxSpec::atomic(20.0); 6]);
        second.height += 6.0;
        let item = BoxSpec::atomic(30.0).with_sublist(first).with_sublist(second);
        let list = build(vec![BoxSpec::sequence(vec![item])], 100.0, None);

        let reopened: Vec<(BoxId, u16, f32)> = list.pages[1]
            .items
            .iter()
            .filter_map(|item| match item {
                DisplayItem::ReopenList { list, depth, height, .. } => Some((*list, *depth, *height)),
                _ => None,
            })
            .collect();
        assert_eq!(reopened, vec![(BoxId(0), 0, 0.0), (BoxId(3), 1, 6.0)]);
    }

    #[test]
    fn test_line_based_markers() {
        let list = build(vec![BoxSpec::line_based(30, 10.0)], 200.0, None);
        let markers: Vec<MarkerEdge> = list
            .pages
            .iter()
            .flat_map(|page| page.items.iter())
            .filter_map(|item| match item {
                DisplayItem::ContinuationMarker { edge, .. } => Some(*edge),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec![MarkerEdge::Bottom, MarkerEdge::Top]);
    }

    #[test]
    fn test_viewport_culls_pages() {
        let specs = vec![BoxSpec::atomic(150.0); 4];
        // Page height 240: the viewport covers only the second page
        let list = build(specs, 200.0, Some(Rect::new(0.0, 250.0, 400.0, 100.0)));
        assert_eq!(list.pages.len(), 1);
        assert_eq!(list.pages[0].page_index, 1);
    }
}
