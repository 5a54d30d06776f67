//! Scroll Anchor Calculator
//!
//! Pure functions over a horizontal column layout. A scroll anchor is a
//! `(column index, pixel offset)` pair:
//!
//! - left aligned: the viewport's leading edge lies in column `index`, with
//!   the first `offset` pixels of the column scrolled out of view. The
//!   gridline after a column counts as part of that column.
//! - right aligned: the viewport's trailing edge lies in column `index`,
//!   with the last `offset` pixels of the column scrolled out of view. The
//!   gridline before a column counts as part of that column.
//!
//! Scroll positions ("viewport start") are content relative pixels, the
//! number a scrollbar reports. Column positions only count scrollable
//! (non-fixed) columns and the interior gridlines between them.

use std::ops::Range;
use tracing::trace;

/// Where the scrolling edge of the viewport sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ScrollAnchor {
    pub index: usize,
    pub offset: u32,
}

impl ScrollAnchor {
    pub fn new(index: usize, offset: u32) -> Self {
        Self { index, offset }
    }
}

/// The leftmost and rightmost legal anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchorLimits {
    pub start_anchor_limit_index: usize,
    pub start_anchor_limit_offset: u32,
    pub finish_anchor_limit_index: usize,
    pub finish_anchor_limit_offset: u32,
}

impl AnchorLimits {
    fn new(start: ScrollAnchor, finish: ScrollAnchor) -> Self {
        Self {
            start_anchor_limit_index: start.index,
            start_anchor_limit_offset: start.offset,
            finish_anchor_limit_index: finish.index,
            finish_anchor_limit_offset: finish.offset,
        }
    }

    fn point(anchor: ScrollAnchor) -> Self {
        Self::new(anchor, anchor)
    }

    pub fn start(&self) -> ScrollAnchor {
        ScrollAnchor::new(self.start_anchor_limit_index, self.start_anchor_limit_offset)
    }

    pub fn finish(&self) -> ScrollAnchor {
        ScrollAnchor::new(self.finish_anchor_limit_index, self.finish_anchor_limit_offset)
    }
}

/// Result of laying out the scrollable columns against a viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollDimension {
    /// Total scrollable size in pixels, including any stepped-scroll padding
    pub content_size: u32,
    pub content_overflowed: bool,
    pub anchor_limits: AnchorLimits,
    /// Scroll position of the first scrollable column's leading edge.
    /// Stepped scrolling of right aligned content pads (positive) or trims
    /// (negative) the leading side; otherwise zero.
    pub content_origin: i64,
}

/// Inputs to the calculator. Widths are per active column, fixed columns
/// first.
#[derive(Debug, Clone, Copy)]
pub struct HorizontalScrollLayout<'a> {
    /// Canvas x where the scrollable region begins (after fixed columns and
    /// the fixed gridline)
    pub content_start: u32,
    /// Pixels available to scrollable columns
    pub viewport_size: u32,
    pub grid_right_aligned: bool,
    pub fixed_column_count: usize,
    pub column_widths: &'a [u32],
    pub grid_lines_width: u32,
    pub scroll_smoothly: bool,
}

impl<'a> HorizontalScrollLayout<'a> {
    pub fn column_count(&self) -> usize {
        self.column_widths.len()
    }

    fn first_scrollable(&self) -> usize {
        self.fixed_column_count.min(self.column_count())
    }

    /// Active indexes of the scrollable columns
    pub fn scrollable_columns(&self) -> Range<usize> {
        self.first_scrollable()..self.column_count()
    }

    fn width(&self, index: usize) -> i64 {
        self.column_widths.get(index).copied().map_or(0, i64::from)
    }

    fn gridline(&self) -> i64 {
        i64::from(self.grid_lines_width)
    }

    /// Gridline following `index`, if it is an interior one
    fn trailing_gridline(&self, index: usize) -> i64 {
        if index + 1 < self.column_count() {
            self.gridline()
        } else {
            0
        }
    }

    /// Leading edge of a scrollable column, relative to the first one
    fn column_start(&self, index: usize) -> i64 {
        (self.first_scrollable()..index.min(self.column_count()))
            .map(|i| self.width(i) + self.gridline())
            .sum()
    }

    fn column_finish(&self, index: usize) -> i64 {
        self.column_start(index) + self.width(index)
    }

    /// Scrollable column widths plus interior gridlines
    fn natural_content_size(&self) -> i64 {
        let range = self.scrollable_columns();
        if range.is_empty() {
            return 0;
        }
        let widths: i64 = range.clone().map(|i| self.width(i)).sum();
        widths + self.gridline() * (range.len() as i64 - 1)
    }

    /// Compute content size and anchor limits
    pub fn calculate(&self) -> ScrollDimension {
        let column_count = self.column_count();
        let fixed = self.first_scrollable();
        let viewport = i64::from(self.viewport_size);
        let content = self.natural_content_size();

        if fixed == column_count || content <= viewport {
            let point = if self.grid_right_aligned {
                ScrollAnchor::new(column_count.saturating_sub(1), 0)
            } else {
                ScrollAnchor::new(self.fixed_column_count, 0)
            };
            return ScrollDimension {
                content_size: to_pixels(content),
                content_overflowed: false,
                anchor_limits: AnchorLimits::point(point),
                content_origin: 0,
            };
        }

        let dimension = if self.grid_right_aligned {
            let mut start = self.leading_limit_right_aligned(viewport);
            let mut origin = 0;
            if !self.scroll_smoothly && start.offset > 0 {
                // Step back so the leading column is whole; the gap this
                // leaves is padded in front of the content
                if start.index > fixed {
                    start = ScrollAnchor::new(start.index - 1, 0);
                } else {
                    start.offset = 0;
                }
                origin = viewport - self.column_finish(start.index);
            }
            ScrollDimension {
                content_size: to_pixels(content + origin),
                content_overflowed: true,
                anchor_limits: AnchorLimits::new(start, ScrollAnchor::new(column_count - 1, 0)),
                content_origin: origin,
            }
        } else {
            let mut finish = self.trailing_limit_left_aligned(viewport);
            let mut content_size = content;
            if !self.scroll_smoothly && finish.offset > 0 {
                // Step forward so the last column can be shown whole; the
                // gap this leaves is padded after the content
                if finish.index + 1 < column_count {
                    finish = ScrollAnchor::new(finish.index + 1, 0);
                } else {
                    finish.offset = 0;
                }
                content_size = self.column_start(finish.index) + viewport;
            }
            ScrollDimension {
                content_size: to_pixels(content_size),
                content_overflowed: true,
                anchor_limits: AnchorLimits::new(ScrollAnchor::new(fixed, 0), finish),
                content_origin: 0,
            }
        };

        trace!(target: "scroll_anchor",
               "calculate: viewport={} content={} right_aligned={} smooth={} -> {:?}",
               viewport, content, self.grid_right_aligned, self.scroll_smoothly, dimension);
        dimension
    }

    /// Left aligned: walk back from the last column until the accumulated
    /// span covers the viewport. The viewport start then lies in that
    /// column (or in the gridline that follows it).
    fn trailing_limit_left_aligned(&self, viewport: i64) -> ScrollAnchor {
        let fixed = self.first_scrollable();
        let mut accumulated = 0;
        for index in self.scrollable_columns().rev() {
            accumulated += self.width(index);
            if accumulated >= viewport {
                return ScrollAnchor::new(index, to_pixels(accumulated - viewport));
            }
            if index > fixed {
                accumulated += self.gridline();
                if accumulated >= viewport {
                    let owner = index - 1;
                    return ScrollAnchor::new(
                        owner,
                        to_pixels(self.width(owner) + accumulated - viewport),
                    );
                }
            }
        }
        ScrollAnchor::new(fixed, 0)
    }

    /// Right aligned: walk forward from the first scrollable column until
    /// the accumulated span covers the viewport. The viewport finish then
    /// lies in that column (or in the gridline in front of it).
    fn leading_limit_right_aligned(&self, viewport: i64) -> ScrollAnchor {
        let column_count = self.column_count();
        let mut accumulated = 0;
        for index in self.scrollable_columns() {
            accumulated += self.width(index);
            if accumulated >= viewport {
                return ScrollAnchor::new(index, to_pixels(accumulated - viewport));
            }
            if index + 1 < column_count {
                accumulated += self.gridline();
                if accumulated >= viewport {
                    let owner = index + 1;
                    return ScrollAnchor::new(
                        owner,
                        to_pixels(self.width(owner) + accumulated - viewport),
                    );
                }
            }
        }
        ScrollAnchor::new(column_count.saturating_sub(1), 0)
    }

    /// Signed viewport start for an anchor. Negative when right aligned
    /// content is narrower than the viewport.
    fn signed_viewport_start(&self, dimension: &ScrollDimension, anchor: ScrollAnchor) -> i64 {
        let offset = i64::from(anchor.offset);
        if self.grid_right_aligned {
            dimension.content_origin + self.column_finish(anchor.index) - offset
                - i64::from(self.viewport_size)
        } else {
            dimension.content_origin + self.column_start(anchor.index) + offset
        }
    }

    /// The scrollbar position that shows `anchor`
    pub fn viewport_start_from_anchor(&self, dimension: &ScrollDimension, anchor: ScrollAnchor) -> u32 {
        to_pixels(self.signed_viewport_start(dimension, anchor))
    }

    /// Largest scrollbar position
    pub fn max_viewport_start(&self, dimension: &ScrollDimension) -> u32 {
        dimension.content_size.saturating_sub(self.viewport_size)
    }

    /// Convert a scrollbar position back into an anchor. Exact inverse of
    /// `viewport_start_from_anchor` for positions inside the limits.
    pub fn anchor_from_viewport_start(&self, dimension: &ScrollDimension, viewport_start: u32) -> ScrollAnchor {
        if self.scrollable_columns().is_empty() {
            return dimension.anchor_limits.start();
        }
        let last = self.column_count() - 1;
        let position = i64::from(viewport_start) - dimension.content_origin;

        if self.grid_right_aligned {
            let edge = position + i64::from(self.viewport_size);
            let mut finish = 0;
            for index in self.scrollable_columns() {
                if index > self.first_scrollable() {
                    finish += self.gridline();
                }
                finish += self.width(index);
                if edge <= finish || index == last {
                    return ScrollAnchor::new(index, to_pixels(finish - edge));
                }
            }
        } else {
            let mut start = 0;
            for index in self.scrollable_columns() {
                let span = self.width(index) + self.trailing_gridline(index);
                if position < start + span || index == last {
                    return ScrollAnchor::new(index, to_pixels(position - start));
                }
                start += span;
            }
        }
        dimension.anchor_limits.start()
    }

    /// Bring an anchor inside the limits. Stale indexes (for example after
    /// columns were removed) are pulled into range first.
    pub fn clamp_anchor(&self, dimension: &ScrollDimension, anchor: ScrollAnchor) -> ScrollAnchor {
        let range = self.scrollable_columns();
        if range.is_empty() {
            return dimension.anchor_limits.start();
        }
        let anchor = ScrollAnchor::new(anchor.index.clamp(range.start, range.end - 1), anchor.offset);
        let low = self.signed_viewport_start(dimension, dimension.anchor_limits.start());
        let high = self.signed_viewport_start(dimension, dimension.anchor_limits.finish());
        let position = self.signed_viewport_start(dimension, anchor);
        let clamped = position.clamp(low.min(high), high.max(low));
        if clamped == position && self.is_well_formed(anchor) {
            return anchor;
        }
        if clamped == low {
            return dimension.anchor_limits.start();
        }
        if clamped == high {
            return dimension.anchor_limits.finish();
        }
        self.anchor_from_viewport_start(dimension, to_pixels(clamped))
    }

    /// Offset lies inside the column (including the gridline it owns)
    fn is_well_formed(&self, anchor: ScrollAnchor) -> bool {
        let owned_gridline = if self.grid_right_aligned {
            if anchor.index > self.first_scrollable() {
                self.gridline()
            } else {
                0
            }
        } else {
            self.trailing_gridline(anchor.index)
        };
        let span = self.width(anchor.index) + owned_gridline;
        i64::from(anchor.offset) < span.max(1)
    }

    /// Whole column anchors on either side of `anchor`, ordered by scroll
    /// position (lower, upper). Equal when the anchor is already whole.
    pub fn column_boundaries(&self, anchor: ScrollAnchor) -> (ScrollAnchor, ScrollAnchor) {
        let whole = ScrollAnchor::new(anchor.index, 0);
        if anchor.offset == 0 {
            return (whole, whole);
        }
        let range = self.scrollable_columns();
        if self.grid_right_aligned {
            let lower = if anchor.index > range.start {
                ScrollAnchor::new(anchor.index - 1, 0)
            } else {
                whole
            };
            (lower, whole)
        } else {
            let upper = if anchor.index + 1 < range.end {
                ScrollAnchor::new(anchor.index + 1, 0)
            } else {
                whole
            };
            (whole, upper)
        }
    }

    /// Snap an anchor to a whole column boundary, rounding to the nearer one
    pub fn snap_to_column(&self, anchor: ScrollAnchor) -> ScrollAnchor {
        if anchor.offset == 0 {
            return anchor;
        }
        let (lower, upper) = self.column_boundaries(anchor);
        let span = self.width(anchor.index) + self.gridline();
        let past_half = i64::from(anchor.offset) * 2 >= span;
        // A right aligned offset hides the column's trailing part, so a
        // large offset is closer to the lower boundary
        match (self.grid_right_aligned, past_half) {
            (false, true) | (true, false) => upper,
            _ => lower,
        }
    }

    /// Scrollable columns at least partly inside the viewport
    pub fn visible_columns(&self, dimension: &ScrollDimension, anchor: ScrollAnchor) -> Range<usize> {
        let viewport_start = self.signed_viewport_start(dimension, anchor);
        let viewport_finish = viewport_start + i64::from(self.viewport_size);
        let mut first = None;
        let mut last = None;
        for index in self.scrollable_columns() {
            let start = dimension.content_origin + self.column_start(index);
            let finish = start + self.width(index);
            if finish > viewport_start && start < viewport_finish {
                first.get_or_insert(index);
                last = Some(index);
            }
        }
        match (first, last) {
            (Some(first), Some(last)) => first..last + 1,
            _ => {
                let fixed = self.first_scrollable();
                fixed..fixed
            }
        }
    }

    /// Canvas x of a scrollable column's leading edge for the given anchor
    pub fn column_canvas_left(&self, dimension: &ScrollDimension, anchor: ScrollAnchor, index: usize) -> i64 {
        i64::from(self.content_start) + dimension.content_origin + self.column_start(index)
            - self.signed_viewport_start(dimension, anchor)
    }
}

fn to_pixels(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(widths: &[u32], viewport: u32, right: bool, smooth: bool) -> HorizontalScrollLayout<'_> {
        HorizontalScrollLayout {
            content_start: 0,
            viewport_size: viewport,
            grid_right_aligned: right,
            fixed_column_count: 0,
            column_widths: widths,
            grid_lines_width: 0,
            scroll_smoothly: smooth,
        }
    }

    #[test]
    fn test_no_overflow_left_aligned_collapses_to_fixed_point() {
        let widths = [50, 50];
        let l = layout(&widths, 300, false, true);
        let d = l.calculate();
        assert!(!d.content_overflowed);
        assert_eq!(d.content_size, 100);
        assert_eq!(d.anchor_limits.start(), ScrollAnchor::new(0, 0));
        assert_eq!(d.anchor_limits.finish(), ScrollAnchor::new(0, 0));
    }

    #[test]
    fn test_no_overflow_right_aligned_anchors_on_last_column() {
        let widths = [50, 50, 50];
        let l = layout(&widths, 300, true, true);
        let d = l.calculate();
        assert_eq!(d.anchor_limits.start(), ScrollAnchor::new(2, 0));
        assert_eq!(d.anchor_limits.finish(), ScrollAnchor::new(2, 0));
        // Content is drawn flush with the trailing edge
        assert_eq!(l.column_canvas_left(&d, ScrollAnchor::new(2, 0), 0), 150);
        assert_eq!(l.viewport_start_from_anchor(&d, ScrollAnchor::new(2, 0)), 0);
    }

    #[test]
    fn test_gridline_pixels_belong_to_preceding_column() {
        let widths = [100, 100, 100];
        let mut l = layout(&widths, 150, false, true);
        l.grid_lines_width = 2;
        let d = l.calculate();
        assert_eq!(d.content_size, 304);
        // Position 101 is inside the gridline after column 0
        assert_eq!(l.anchor_from_viewport_start(&d, 101), ScrollAnchor::new(0, 101));
        assert_eq!(l.anchor_from_viewport_start(&d, 102), ScrollAnchor::new(1, 0));
    }

    #[test]
    fn test_single_wide_column_stepped() {
        let widths = [500];
        let l = layout(&widths, 200, false, false);
        let d = l.calculate();
        assert!(d.content_overflowed);
        assert_eq!(d.anchor_limits.finish(), ScrollAnchor::new(0, 0));
        assert_eq!(d.content_size, 200);
    }

    #[test]
    fn test_snap_rounds_to_nearer_boundary() {
        let widths = [100, 100, 100, 100];
        let l = layout(&widths, 150, false, false);
        assert_eq!(l.snap_to_column(ScrollAnchor::new(1, 30)), ScrollAnchor::new(1, 0));
        assert_eq!(l.snap_to_column(ScrollAnchor::new(1, 60)), ScrollAnchor::new(2, 0));
        assert_eq!(l.snap_to_column(ScrollAnchor::new(3, 90)), ScrollAnchor::new(3, 0));
    }

    #[test]
    fn test_clamp_pulls_stale_index_into_range() {
        let widths = [100, 100, 100, 100];
        let l = layout(&widths, 150, false, true);
        let d = l.calculate();
        assert_eq!(l.clamp_anchor(&d, ScrollAnchor::new(9, 0)), d.anchor_limits.finish());
        assert_eq!(l.clamp_anchor(&d, ScrollAnchor::new(1, 20)), ScrollAnchor::new(1, 20));
    }

    #[test]
    fn test_visible_columns() {
        let widths = [100, 100, 100, 100];
        let l = layout(&widths, 150, false, true);
        let d = l.calculate();
        assert_eq!(l.visible_columns(&d, ScrollAnchor::new(0, 0)), 0..2);
        assert_eq!(l.visible_columns(&d, ScrollAnchor::new(1, 50)), 1..3);
        assert_eq!(l.visible_columns(&d, ScrollAnchor::new(2, 0)), 2..4);
    }
}
