//! Split-point resolvers, one per box kind

use crate::document::{BoxId, BoxKind, BoxTree, MeasuredBox, SplitUnit};
use crate::layout::flatten::{FlatCache, FlatSequence};
use crate::layout::options::{PaginationOptions, LAYOUT_TOLERANCE};
use std::ops::Range;

/// Where a box should break and what each side costs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPoint {
    pub unit: SplitUnit,
    /// First line / flattened item of the part moved to the next page
    pub index: usize,
    /// Height placed on the current page, margins excluded
    pub height_before: f32,
    /// Height the remainder needs on a continuation page, margins excluded
    pub height_after: f32,
}

/// Page state a resolver decides against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitContext {
    /// Space left for the box's content on the current page
    pub available: f32,
    /// Whether nothing has been placed on the current page yet
    pub page_is_empty: bool,
}

/// Minimum sizes and header costs for a child-sequence split
#[derive(Debug, Clone, Copy, PartialEq)]
struct SequenceRule {
    min_before: usize,
    min_after: usize,
    /// Header paid on the page where the box starts
    header_first: f32,
    /// Header paid on every continuation page
    header_continuation: f32,
}

impl SequenceRule {
    fn container() -> Self {
        Self {
            min_before: 1,
            min_after: 1,
            header_first: 0.0,
            header_continuation: 0.0,
        }
    }

    fn list(options: &PaginationOptions) -> Self {
        let min = options.min_items_for_split.max(1);
        Self {
            min_before: min,
            min_after: min,
            header_first: 0.0,
            header_continuation: 0.0,
        }
    }

    fn table(options: &PaginationOptions, header: f32) -> Self {
        let min = options.min_rows_for_split.max(1);
        Self {
            min_before: min,
            min_after: min,
            header_first: header,
            header_continuation: if options.repeat_table_header { header } else { 0.0 },
        }
    }

    fn for_box(kind: BoxKind, options: &PaginationOptions, header: f32) -> Self {
        match kind {
            BoxKind::Table => Self::table(options, header),
            BoxKind::SemanticSequence => Self::list(options),
            _ => Self::container(),
        }
    }

    fn header_at(&self, start: usize) -> f32 {
        if start == 0 {
            self.header_first
        } else {
            self.header_continuation
        }
    }
}

/// Find where to break the unplaced part `range` of a box.
///
/// `range` is in the box's line space for line-split kinds and in its
/// flattened item space for child-split kinds; the whole box is
/// `0..unit_len`. Returns `None` when the box never splits, when the part
/// already fits, or when no break satisfies the constraints. The latest
/// valid index always wins.
pub fn find_split(
    tree: &BoxTree,
    cache: &mut FlatCache,
    id: BoxId,
    range: Range<usize>,
    ctx: &SplitContext,
    options: &PaginationOptions,
) -> Option<SplitPoint> {
    let b = &tree[id];
    match b.kind {
        BoxKind::Atomic | BoxKind::SemanticPair | BoxKind::HeadingGroup => None,
        BoxKind::Prose => split_prose(b, range, ctx, options),
        BoxKind::LineBased => split_line_based(b, range, ctx, options),
        BoxKind::Container | BoxKind::SemanticSequence | BoxKind::Table => {
            let seq = cache.get(tree, id);
            let rule = SequenceRule::for_box(b.kind, options, seq.header_height);
            split_sequence(seq, range, ctx.available, &rule)
        }
    }
}

/// Number of split units (lines or flattened items) in a box
pub fn unit_len(tree: &BoxTree, cache: &mut FlatCache, id: BoxId) -> usize {
    let b = &tree[id];
    match b.kind.split_unit() {
        Some(SplitUnit::Line) => b.lines(),
        Some(SplitUnit::Child) => cache.get(tree, id).len(),
        None => 0,
    }
}

/// Height of the unplaced part `range` of a box, margins excluded.
///
/// A range starting at 0 is the whole box and reports the measured height.
pub fn piece_height(
    tree: &BoxTree,
    cache: &mut FlatCache,
    id: BoxId,
    range: &Range<usize>,
    options: &PaginationOptions,
) -> f32 {
    let b = &tree[id];
    if range.start == 0 {
        return b.height;
    }

    match b.kind {
        BoxKind::Prose => prose_tail_height(b, range.start),
        BoxKind::LineBased => {
            range.len() as f32 * b.line_height.unwrap_or(options.default_line_height)
                + options.line_based_padding
        }
        BoxKind::Container | BoxKind::SemanticSequence | BoxKind::Table => {
            let seq = cache.get(tree, id);
            let rule = SequenceRule::for_box(b.kind, options, seq.header_height);
            rule.header_at(range.start) + seq.piece_height(range.start, range.end)
        }
        BoxKind::Atomic | BoxKind::SemanticPair | BoxKind::HeadingGroup => b.height,
    }
}

/// Whole lines of `line_height` that fit in `available`
fn lines_fitting(available: f32, line_height: f32) -> usize {
    if available <= 0.0 {
        return 0;
    }
    ((available + LAYOUT_TOLERANCE) / line_height).floor() as usize
}

/// Prose keeps its padding with the last fragment
fn prose_tail_height(b: &MeasuredBox, start: usize) -> f32 {
    let lh = b.line_height.unwrap_or(0.0);
    (b.height - start as f32 * lh).max(0.0)
}

fn split_prose(
    b: &MeasuredBox,
    range: Range<usize>,
    ctx: &SplitContext,
    options: &PaginationOptions,
) -> Option<SplitPoint> {
    let lh = b.line_height?;
    let lines = range.len();
    let orphans = options.orphan_lines.max(1);
    let widows = options.widow_lines.max(1);
    if lines < orphans + widows {
        return None;
    }

    let piece = if range.start == 0 {
        b.height
    } else {
        prose_tail_height(b, range.start)
    };

    // Refuse to leave a near-empty first fragment behind other content
    if !ctx.page_is_empty {
        let guard = (options.min_content_lines as f32 * lh).max(options.prose_min_fill_ratio * piece);
        if ctx.available + LAYOUT_TOLERANCE < guard {
            return None;
        }
    }

    let fit = lines_fitting(ctx.available, lh);
    if fit < orphans || fit >= lines {
        return None;
    }

    let mut before = fit;
    if lines - before < widows {
        before = lines - widows;
        if before < orphans {
            return None;
        }
    }

    let height_before = before as f32 * lh;
    Some(SplitPoint {
        unit: SplitUnit::Line,
        index: range.start + before,
        height_before,
        height_after: (piece - height_before).max(0.0),
    })
}

fn split_line_based(
    b: &MeasuredBox,
    range: Range<usize>,
    ctx: &SplitContext,
    options: &PaginationOptions,
) -> Option<SplitPoint> {
    let lh = b.line_height?;
    let padding = options.line_based_padding;
    let lines = range.len();

    let fit = lines_fitting(ctx.available - padding, lh);
    if fit < 1 || fit >= lines {
        return None;
    }

    Some(SplitPoint {
        unit: SplitUnit::Line,
        index: range.start + fit,
        height_before: fit as f32 * lh + padding,
        height_after: (lines - fit) as f32 * lh + padding,
    })
}

fn split_sequence(
    seq: &FlatSequence,
    range: Range<usize>,
    available: f32,
    rule: &SequenceRule,
) -> Option<SplitPoint> {
    let (start, end) = (range.start, range.end.min(seq.len()));
    if end <= start {
        return None;
    }
    let count = end - start;
    if count < rule.min_before + rule.min_after {
        return None;
    }

    let header = rule.header_at(start);
    let mut used = header;
    let mut fit = 0;
    for index in start..end {
        let cost = seq.item_cost(start, index);
        if used + cost > available + LAYOUT_TOLERANCE {
            break;
        }
        used += cost;
        fit += 1;
    }

    if fit >= count || fit < rule.min_before {
        return None;
    }

    // Borrow items from the near side when the remainder is too short
    let mut before = fit;
    if count - before < rule.min_after {
        before = count - rule.min_after;
        if before < rule.min_before {
            return None;
        }
    }

    let split = start + before;
    Some(SplitPoint {
        unit: SplitUnit::Child,
        index: split,
        height_before: header + seq.piece_height(start, split),
        height_after: rule.header_continuation + seq.piece_height(split, end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BoxSpec;

    fn ctx(available: f32) -> SplitContext {
        SplitContext {
            available,
            page_is_empty: false,
        }
    }

    fn split_root(
        specs: Vec<BoxSpec>,
        range: Range<usize>,
        ctx: SplitContext,
        options: &PaginationOptions,
    ) -> Option<SplitPoint> {
        let tree = BoxTree::from_specs(specs).unwrap();
        let mut cache = FlatCache::new();
        find_split(&tree, &mut cache, BoxId(0), range, &ctx, options)
    }

    #[test]
    fn test_atomic_kinds_never_split() {
        let options = PaginationOptions::default();
        for spec in [BoxSpec::atomic(900.0), BoxSpec::pair(900.0), BoxSpec::heading(2, 900.0)] {
            assert_eq!(split_root(vec![spec], 0..0, ctx(100.0), &options), None);
        }
    }

    #[test]
    fn test_prose_split_at_latest_line() {
        let options = PaginationOptions::default().with_orphans_widows(2, 2);
        let point = split_root(vec![BoxSpec::prose(10, 20.0)], 0..10, ctx(120.0), &options).unwrap();

        assert_eq!(point.unit, SplitUnit::Line);
        assert_eq!(point.index, 6);
        assert_eq!(point.height_before, 120.0);
        assert_eq!(point.height_after, 80.0);
    }

    #[test]
    fn test_prose_widow_shifts_split_left() {
        let options = PaginationOptions::default()
            .with_orphans_widows(2, 3)
            .with_prose_min_fill_ratio(0.0);
        // 8 of 10 lines fit, but 3 must move: split after line 7
        let point = split_root(vec![BoxSpec::prose(10, 20.0)], 0..10, ctx(165.0), &options).unwrap();
        assert_eq!(point.index, 7);
        assert_eq!(point.height_before, 140.0);
    }

    #[test]
    fn test_prose_orphan_rejects() {
        let options = PaginationOptions::default()
            .with_orphans_widows(3, 2)
            .with_prose_min_fill_ratio(0.0)
            .with_min_content_lines(0);
        assert_eq!(split_root(vec![BoxSpec::prose(10, 20.0)], 0..10, ctx(50.0), &options), None);
        // Too short to honour both sides
        assert_eq!(split_root(vec![BoxSpec::prose(4, 20.0)], 0..4, ctx(60.0), &options), None);
    }

    #[test]
    fn test_prose_fill_guard_only_on_used_page() {
        let options = PaginationOptions::default();
        // 100 of 400: below 0.6 * 400
        assert_eq!(split_root(vec![BoxSpec::prose(20, 20.0)], 0..20, ctx(100.0), &options), None);

        let fresh = SplitContext {
            available: 100.0,
            page_is_empty: true,
        };
        let point = split_root(vec![BoxSpec::prose(20, 20.0)], 0..20, fresh, &options).unwrap();
        assert_eq!(point.index, 5);
    }

    #[test]
    fn test_prose_continuation_range() {
        let options = PaginationOptions::default().with_prose_min_fill_ratio(0.0);
        let fresh = SplitContext {
            available: 100.0,
            page_is_empty: true,
        };
        let point = split_root(vec![BoxSpec::prose(20, 20.0)], 5..20, fresh, &options).unwrap();
        assert_eq!(point.index, 10);
        assert_eq!(point.height_before, 100.0);
        assert_eq!(point.height_after, 200.0);
    }

    #[test]
    fn test_line_based_reserves_padding() {
        let options = PaginationOptions::default();
        // (100 - 8) / 10 = 9 lines
        let point = split_root(vec![BoxSpec::line_based(30, 10.0)], 0..30, ctx(100.0), &options).unwrap();
        assert_eq!(point.index, 9);
        assert_eq!(point.height_before, 98.0);
        assert_eq!(point.height_after, 218.0);

        assert_eq!(split_root(vec![BoxSpec::line_based(30, 10.0)], 0..30, ctx(15.0), &options), None);
    }

    #[test]
    fn test_container_splits_before_overflowing_child() {
        let options = PaginationOptions::default();
        let specs = vec![BoxSpec::container(vec![
            BoxSpec::atomic(50.0),
            BoxSpec::atomic(50.0),
            BoxSpec::atomic(80.0),
        ])];

        let point = split_root(specs.clone(), 0..3, ctx(150.0), &options).unwrap();
        assert_eq!(point.unit, SplitUnit::Child);
        assert_eq!(point.index, 2);
        assert_eq!(point.height_before, 100.0);
        assert_eq!(point.height_after, 80.0);

        // First child alone overflows: nothing precedes it
        assert_eq!(split_root(specs, 0..3, ctx(40.0), &options), None);
    }

    #[test]
    fn test_sequence_borrows_for_short_remainder() {
        let options = PaginationOptions::default().with_min_items(2);
        let specs = vec![BoxSpec::sequence(vec![BoxSpec::atomic(20.0); 6])];

        // 5 fit, 1 would remain: move one more item over
        let point = split_root(specs.clone(), 0..6, ctx(100.0), &options).unwrap();
        assert_eq!(point.index, 4);
        assert_eq!(point.height_before, 80.0);
        assert_eq!(point.height_after, 40.0);

        // Only one item fits
        assert_eq!(split_root(specs, 0..6, ctx(30.0), &options), None);
    }

    #[test]
    fn test_table_repeats_header() {
        let options = PaginationOptions::default().with_min_rows(2);
        let specs = vec![BoxSpec::table(30.0, vec![BoxSpec::atomic(20.0); 10])];

        let point = split_root(specs.clone(), 0..10, ctx(200.0), &options).unwrap();
        assert_eq!(point.index, 8);
        assert_eq!(point.height_before, 190.0);
        assert_eq!(point.height_after, 70.0);

        let no_repeat = options.clone().with_repeat_table_header(false);
        let point = split_root(specs.clone(), 0..10, ctx(200.0), &no_repeat).unwrap();
        assert_eq!(point.height_after, 40.0);

        // Header plus one row is below the minimum
        assert_eq!(split_root(specs, 0..10, ctx(60.0), &options), None);
    }

    #[test]
    fn test_table_continuation_counts_header() {
        let options = PaginationOptions::default().with_min_rows(1);
        let specs = vec![BoxSpec::table(30.0, vec![BoxSpec::atomic(20.0); 10])];

        let point = split_root(specs, 4..10, ctx(100.0), &options).unwrap();
        // 30 header + 3 rows
        assert_eq!(point.index, 7);
        assert_eq!(point.height_before, 90.0);
        assert_eq!(point.height_after, 90.0);
    }

    #[test]
    fn test_nested_list_leading_overhead() {
        let options = PaginationOptions::default().with_min_items(1);
        let mut sublist = BoxSpec::sequence(vec![BoxSpec::atomic(20.0); 3]);
        sublist.height += 16.0;
        let specs = vec![BoxSpec::sequence(vec![BoxSpec::atomic(40.0).with_sublist(sublist)])];

        // Outer item (40) + reopen (16) + first inner (20) = 76; the second
        // inner item would need 96
        let point = split_root(specs.clone(), 0..4, ctx(90.0), &options).unwrap();
        assert_eq!(point.index, 2);
        assert_eq!(point.height_before, 76.0);
        // Continuation reopens the sub-list for the second inner item
        assert_eq!(point.height_after, 16.0 + 40.0);

        let tree = BoxTree::from_specs(specs).unwrap();
        let mut cache = FlatCache::new();
        assert_eq!(piece_height(&tree, &mut cache, BoxId(0), &(1..4), &options), 76.0);
        assert_eq!(unit_len(&tree, &mut cache, BoxId(0)), 4);
    }
}
