//! Greedy page-filling engine

use crate::document::{BoxId, BoxTree, SplitUnit};
use crate::error::Result;
use crate::layout::aggregate::{aggregate, FlowBox};
use crate::layout::flatten::FlatCache;
use crate::layout::options::{PaginationOptions, LAYOUT_TOLERANCE};
use crate::layout::pagination::{
    Fragment, OversizeWarning, Page, PaginationEvent, PaginationObserver, PaginationResult,
    SplitRange,
};
use crate::layout::split::{find_split, piece_height, unit_len, SplitContext};
use log::{debug, trace, warn};
use std::ops::Range;

/// Paginate a measured tree.
///
/// A pure function of its inputs: the same tree and options always yield
/// the same pages.
pub fn paginate(tree: &BoxTree, options: &PaginationOptions) -> Result<PaginationResult> {
    paginate_observed(tree, options, &mut ())
}

/// Paginate and report split, break and overflow decisions to `observer`
pub fn paginate_observed<O>(
    tree: &BoxTree,
    options: &PaginationOptions,
    observer: &mut O,
) -> Result<PaginationResult>
where
    O: PaginationObserver + ?Sized,
{
    options.validate()?;

    let flow = aggregate(tree);
    let mut filler = PageFiller::new(tree, options, observer);
    for (position, unit) in flow.iter().enumerate() {
        let next = flow[position + 1..].iter().find(|u| !filler.skips(u));
        filler.place(unit, next);
    }

    let result = filler.finish();
    debug!(
        "paginated {} boxes into {} pages ({} oversize)",
        tree.root_count(),
        result.pages.len(),
        result.warnings.len()
    );
    Ok(result)
}

/// Owns the page under construction and the cursor state of one pass
struct PageFiller<'a, O: ?Sized> {
    tree: &'a BoxTree,
    options: &'a PaginationOptions,
    observer: &'a mut O,
    cache: FlatCache,
    pages: Vec<Page>,
    current: Page,
    remaining: f32,
    warnings: Vec<OversizeWarning>,
    skipped: Vec<BoxId>,
}

impl<'a, O> PageFiller<'a, O>
where
    O: PaginationObserver + ?Sized,
{
    fn new(tree: &'a BoxTree, options: &'a PaginationOptions, observer: &'a mut O) -> Self {
        Self {
            tree,
            options,
            observer,
            cache: FlatCache::new(),
            pages: Vec::new(),
            current: Page::new(0),
            remaining: options.content_height,
            warnings: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Whether `unit` is an empty box that will not be placed
    fn skips(&self, unit: &FlowBox) -> bool {
        self.options.skip_empty_elements && unit.span == 1 && self.tree[unit.first].is_empty()
    }

    /// Place one flow unit, advancing pages as needed.
    ///
    /// `next` is the next unit that will actually be placed.
    fn place(&mut self, unit: &FlowBox, next: Option<&FlowBox>) {
        if self.skips(unit) {
            self.skipped.push(unit.first);
            return;
        }

        if unit.force_break_before && !self.current.is_empty() {
            debug!("forced break before box {}", unit.first.0);
            self.observer.on_event(PaginationEvent::ForcedBreak {
                box_id: unit.first,
                page_index: self.current.index,
            });
            self.advance();
        }

        if unit.is_heading_group() && !self.current.is_empty() {
            self.keep_heading_with_next(unit, next);
        }

        self.place_pieces(unit);
    }

    /// Move a heading to the next page when too little of its follower
    /// would fit after it
    fn keep_heading_with_next(&mut self, heading: &FlowBox, next: Option<&FlowBox>) {
        let Some(next) = next else {
            return;
        };

        let next_splits = next.span == 1 && self.tree.can_split(next.first, self.options);
        let required = if next_splits {
            let line_height = self.tree[next.first]
                .line_height
                .unwrap_or(self.options.default_line_height);
            (self.options.min_content_lines as f32 * line_height)
                .max(next.height * self.options.heading_follow_ratio)
        } else {
            next.outer_height()
        };

        let space_after_heading = self.remaining - heading.outer_height();
        if space_after_heading + LAYOUT_TOLERANCE < required {
            debug!(
                "heading {} deferred: {:.1} left after it, {:.1} required",
                heading.first.0, space_after_heading, required
            );
            self.observer.on_event(PaginationEvent::HeadingDeferred {
                box_id: heading.first,
                page_index: self.current.index,
                space_after_heading,
                required,
            });
            self.advance();
        }
    }

    /// Fill → split → advance loop for one unit.
    ///
    /// `range` is `None` while the whole unit is still unplaced and holds
    /// the remaining line or item range once it has been split.
    fn place_pieces(&mut self, unit: &FlowBox) {
        let id = unit.first;
        let splittable = unit.span == 1 && self.tree.can_split(id, self.options);
        let mut range: Option<Range<usize>> = None;

        loop {
            let lead = if range.is_none() { unit.margin_top } else { 0.0 };
            let body = match &range {
                None => unit.height,
                Some(r) => piece_height(self.tree, &mut self.cache, id, r, self.options),
            };
            let total = lead + body + unit.margin_bottom;

            if total <= self.remaining + LAYOUT_TOLERANCE {
                self.push(unit, range, total);
                return;
            }

            if splittable {
                let whole = match &range {
                    Some(r) => r.clone(),
                    None => 0..unit_len(self.tree, &mut self.cache, id),
                };
                let ctx = SplitContext {
                    available: self.remaining - lead,
                    page_is_empty: self.current.is_empty(),
                };

                if let Some(point) =
                    find_split(self.tree, &mut self.cache, id, whole.clone(), &ctx, self.options)
                {
                    debug!(
                        "box {} split at {:?} {} ({:.1} before, {:.1} after)",
                        id.0, point.unit, point.index, point.height_before, point.height_after
                    );
                    self.observer.on_event(PaginationEvent::SplitChosen {
                        box_id: id,
                        page_index: self.current.index,
                        index: point.index,
                        height_before: point.height_before,
                        height_after: point.height_after,
                    });

                    self.push(unit, Some(whole.start..point.index), lead + point.height_before);
                    self.advance();
                    range = Some(point.index..whole.end);
                    continue;
                }
            }

            if !self.current.is_empty() {
                self.advance();
                continue;
            }

            // Alone on an empty page and still too tall: place it anyway
            let excess = total - self.remaining;
            warn!(
                "box {} overflows page {} by {:.1}",
                id.0, self.current.index, excess
            );
            self.observer.on_event(PaginationEvent::OversizeOverflow {
                box_id: id,
                page_index: self.current.index,
                excess_height: excess,
            });
            self.warnings.push(OversizeWarning {
                box_id: id,
                page_index: self.current.index,
                excess_height: excess,
            });
            self.push(unit, range, total);
            self.remaining = 0.0;
            return;
        }
    }

    /// Append a fragment; `range` is the placed part of a split unit
    fn push(&mut self, unit: &FlowBox, range: Option<Range<usize>>, height: f32) {
        let split_range = range.map(|r| match unit.kind.split_unit() {
            Some(SplitUnit::Line) => SplitRange::Lines(r),
            _ => SplitRange::Children(r),
        });

        self.current.push(Fragment {
            box_id: unit.first,
            span: unit.span,
            kind: unit.kind,
            is_partial: split_range.is_some(),
            split_range,
            height,
        });
        self.remaining -= height;
    }

    /// Finalize the current page and open a fresh one
    fn advance(&mut self) {
        let next = Page::new(self.current.index + 1);
        let done = std::mem::replace(&mut self.current, next);
        trace!(
            "page {} closed with {} fragments, {:.1} used",
            done.index,
            done.fragments.len(),
            done.consumed_height
        );
        self.pages.push(done);
        self.remaining = self.options.content_height;
    }

    fn finish(mut self) -> PaginationResult {
        if !self.current.is_empty() {
            let last = std::mem::take(&mut self.current);
            self.pages.push(last);
        }

        PaginationResult {
            pages: self.pages,
            warnings: self.warnings,
            skipped: self.skipped,
        }
    }
}
