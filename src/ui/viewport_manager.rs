/// ViewportManager - the scroll state of one grid
///
/// Holds the horizontal scroll anchor together with the limits and content
/// size computed for the current column widths, plus the first visible
/// scrollable row. Everything positional is delegated to the Scroll Anchor
/// Calculator; this type only decides when to recompute and keeps the
/// anchor legal afterwards.
///
/// Layout:
/// [fixed columns][fixed gridline][scrollable viewport ............]
///  ^ canvas x = 0                 ^ content_start
use std::ops::Range;
use tracing::{debug, trace};

use crate::config::config::ScrollingConfig;
use crate::ui::viewport::scroll_anchor::{
    AnchorLimits, HorizontalScrollLayout, ScrollAnchor, ScrollDimension,
};

/// Result of a horizontal navigation operation
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// The anchor after the operation
    pub anchor: ScrollAnchor,
    /// Scrollbar position after the operation
    pub viewport_start: u32,
    /// Human-readable description of the operation
    pub description: String,
    /// Whether the operation changed the viewport
    pub viewport_changed: bool,
}

/// Result of a row navigation operation
#[derive(Debug, Clone)]
pub struct RowNavigationResult {
    /// First scrollable row shown after the operation
    pub first_scrollable_row: usize,
    /// Human-readable description of the operation
    pub description: String,
    /// Whether the operation changed the viewport
    pub viewport_changed: bool,
}

pub struct ViewportManager {
    /// Canvas dimensions in pixels
    canvas_width: u32,

    /// Scrolling behaviour
    fixed_column_count: usize,
    fixed_row_count: usize,
    grid_right_aligned: bool,
    scroll_smoothly: bool,
    grid_lines_width: u32,
    fixed_grid_line_width: u32,

    /// Active column widths, fixed columns first
    column_widths: Vec<u32>,

    /// Last computed limits and content size
    dimension: ScrollDimension,
    anchor: ScrollAnchor,

    /// Vertical state
    row_count: usize,
    row_capacity: usize,
    first_scrollable_row: usize,

    /// A layout requested while rendering runs once rendering ends
    rendering: bool,
    layout_pending: bool,
}

impl ViewportManager {
    pub fn new(config: &ScrollingConfig) -> Self {
        Self {
            canvas_width: 0,
            fixed_column_count: config.fixed_column_count,
            fixed_row_count: config.fixed_row_count,
            grid_right_aligned: config.grid_right_aligned,
            scroll_smoothly: config.scroll_horizontally_smoothly,
            grid_lines_width: config.grid_lines_width,
            fixed_grid_line_width: config.fixed_grid_line_width,
            column_widths: Vec::new(),
            dimension: ScrollDimension::default(),
            anchor: ScrollAnchor::new(config.fixed_column_count, 0),
            row_count: 0,
            row_capacity: 0,
            first_scrollable_row: config.fixed_row_count,
            rendering: false,
            layout_pending: false,
        }
    }

    /// Canvas x where scrollable columns begin
    pub fn content_start(&self) -> u32 {
        let fixed = self.fixed_column_count.min(self.column_widths.len());
        if fixed == 0 {
            return 0;
        }
        let widths: u32 = self.column_widths[..fixed].iter().sum();
        let gridlines = self.grid_lines_width.saturating_mul(fixed as u32 - 1);
        widths
            .saturating_add(gridlines)
            .saturating_add(self.fixed_grid_line_width)
    }

    /// Pixels available to scrollable columns
    pub fn viewport_size(&self) -> u32 {
        self.canvas_width.saturating_sub(self.content_start())
    }

    fn layout(&self) -> HorizontalScrollLayout<'_> {
        HorizontalScrollLayout {
            content_start: self.content_start(),
            viewport_size: self.viewport_size(),
            grid_right_aligned: self.grid_right_aligned,
            fixed_column_count: self.fixed_column_count,
            column_widths: &self.column_widths,
            grid_lines_width: self.grid_lines_width,
            scroll_smoothly: self.scroll_smoothly,
        }
    }

    pub fn set_canvas_width(&mut self, width: u32) -> bool {
        if self.canvas_width == width {
            return false;
        }
        self.canvas_width = width;
        self.request_layout()
    }

    /// Replace the active column widths (after columns are created, shown,
    /// hidden, moved or resized)
    pub fn set_column_widths(&mut self, widths: Vec<u32>) -> bool {
        if self.column_widths == widths && !self.layout_pending {
            return false;
        }
        self.column_widths = widths;
        self.request_layout()
    }

    pub fn column_widths(&self) -> &[u32] {
        &self.column_widths
    }

    /// Recompute now, or later if a render is in progress. Returns true
    /// when the layout was recomputed immediately.
    pub fn request_layout(&mut self) -> bool {
        if self.rendering {
            trace!(target: "viewport_manager", "layout requested during render, deferring");
            self.layout_pending = true;
            return false;
        }
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.layout_pending = false;
        let layout = self.layout();
        let dimension = layout.calculate();
        let mut anchor = layout.clamp_anchor(&dimension, self.anchor);
        if !self.scroll_smoothly {
            anchor = layout.clamp_anchor(&dimension, layout.snap_to_column(anchor));
        }
        debug!(target: "viewport_manager",
               "recompute: viewport={} content={} overflowed={} limits={:?} anchor {:?} -> {:?}",
               self.viewport_size(), dimension.content_size, dimension.content_overflowed,
               dimension.anchor_limits, self.anchor, anchor);
        self.dimension = dimension;
        self.anchor = anchor;
    }

    pub fn begin_render(&mut self) {
        self.rendering = true;
    }

    /// Finish a render, running any layout deferred while it was in
    /// progress. Returns true when a deferred layout ran.
    pub fn end_render(&mut self) -> bool {
        self.rendering = false;
        if self.layout_pending {
            debug!(target: "viewport_manager", "end_render: running deferred layout");
            self.recompute();
            true
        } else {
            false
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn is_layout_pending(&self) -> bool {
        self.layout_pending
    }

    pub fn anchor(&self) -> ScrollAnchor {
        self.anchor
    }

    pub fn dimension(&self) -> &ScrollDimension {
        &self.dimension
    }

    pub fn anchor_limits(&self) -> AnchorLimits {
        self.dimension.anchor_limits
    }

    pub fn content_size(&self) -> u32 {
        self.dimension.content_size
    }

    pub fn is_content_overflowed(&self) -> bool {
        self.dimension.content_overflowed
    }

    /// Scrollbar position of the current anchor
    pub fn viewport_start(&self) -> u32 {
        self.layout()
            .viewport_start_from_anchor(&self.dimension, self.anchor)
    }

    pub fn max_viewport_start(&self) -> u32 {
        self.layout().max_viewport_start(&self.dimension)
    }

    /// Scrollable columns at least partly on screen
    pub fn visible_scrollable_columns(&self) -> Range<usize> {
        self.layout().visible_columns(&self.dimension, self.anchor)
    }

    /// Canvas x of an active column's leading edge
    pub fn column_canvas_left(&self, active_index: usize) -> Option<i64> {
        if active_index >= self.column_widths.len() {
            return None;
        }
        if active_index < self.fixed_column_count {
            let left: u32 = self.column_widths[..active_index]
                .iter()
                .map(|w| w.saturating_add(self.grid_lines_width))
                .sum();
            return Some(i64::from(left));
        }
        Some(
            self.layout()
                .column_canvas_left(&self.dimension, self.anchor, active_index),
        )
    }

    /// Move the anchor to the scroll-position side of the limits and report
    fn apply_anchor(&mut self, anchor: ScrollAnchor, action: &str) -> NavigationResult {
        let layout = self.layout();
        let anchor = layout.clamp_anchor(&self.dimension, anchor);
        let changed = anchor != self.anchor;
        let viewport_start = layout.viewport_start_from_anchor(&self.dimension, anchor);
        debug!(target: "viewport_manager",
               "{}: anchor {:?} -> {:?} (viewport_start={})",
               action, self.anchor, anchor, viewport_start);
        self.anchor = anchor;
        NavigationResult {
            anchor,
            viewport_start,
            description: if changed {
                format!("{}: column {} offset {}", action, anchor.index, anchor.offset)
            } else {
                format!("{}: viewport unchanged", action)
            },
            viewport_changed: changed,
        }
    }

    /// Scrollbar input. Stepped scrolling snaps to the nearest column
    /// boundary.
    pub fn set_viewport_start(&mut self, viewport_start: u32) -> NavigationResult {
        let layout = self.layout();
        let position = viewport_start.min(layout.max_viewport_start(&self.dimension));
        let mut anchor = layout.anchor_from_viewport_start(&self.dimension, position);
        if !self.scroll_smoothly {
            anchor = layout.snap_to_column(anchor);
        }
        self.apply_anchor(anchor, "set_viewport_start")
    }

    /// Scroll by whole columns. Positive deltas reveal later columns.
    pub fn scroll_columns_by(&mut self, delta: isize) -> NavigationResult {
        let index = if delta >= 0 {
            self.anchor.index.saturating_add(delta.unsigned_abs())
        } else {
            self.anchor.index.saturating_sub(delta.unsigned_abs())
        };
        self.apply_anchor(ScrollAnchor::new(index, 0), "scroll_columns_by")
    }

    /// Scroll the least amount needed for a column to be fully visible (or,
    /// for a column wider than the viewport, for its leading edge to be)
    pub fn scroll_column_into_view(&mut self, active_index: usize) -> NavigationResult {
        let layout = self.layout();
        let range = layout.scrollable_columns();
        if !range.contains(&active_index) {
            return self.apply_anchor(self.anchor, "scroll_column_into_view");
        }

        let view_start = i64::from(self.viewport_start());
        let view_finish = view_start + i64::from(self.viewport_size());
        let column_left = self.column_canvas_left(active_index).unwrap_or_default()
            - i64::from(self.content_start())
            + view_start;
        let column_right = column_left + i64::from(self.column_widths[active_index]);

        let forward = if column_left < view_start {
            false
        } else if column_right > view_finish {
            true
        } else {
            return self.apply_anchor(self.anchor, "scroll_column_into_view");
        };

        let wanted = if forward && column_right - column_left <= view_finish - view_start {
            column_right - (view_finish - view_start)
        } else {
            column_left
        };
        let position = u32::try_from(wanted.max(0)).unwrap_or(u32::MAX);
        let mut anchor = layout.anchor_from_viewport_start(&self.dimension, position);
        if !self.scroll_smoothly {
            let (lower, upper) = layout.column_boundaries(anchor);
            anchor = if forward { upper } else { lower };
        }
        self.apply_anchor(anchor, "scroll_column_into_view")
    }

    /// Forget the horizontal position (new column set)
    pub fn reset_horizontal(&mut self) {
        self.anchor = self.dimension.anchor_limits.start();
        self.request_layout();
        self.anchor = self.dimension.anchor_limits.start();
    }

    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.clamp_rows();
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of rows the canvas can show, fixed rows included
    pub fn set_row_capacity(&mut self, capacity: usize) {
        self.row_capacity = capacity;
        self.clamp_rows();
    }

    pub fn first_scrollable_row(&self) -> usize {
        self.first_scrollable_row
    }

    fn max_first_scrollable_row(&self) -> usize {
        let scrollable_capacity = self.row_capacity.saturating_sub(self.fixed_row_count);
        self.row_count
            .saturating_sub(scrollable_capacity)
            .max(self.fixed_row_count)
    }

    fn clamp_rows(&mut self) {
        self.first_scrollable_row = self
            .first_scrollable_row
            .clamp(self.fixed_row_count, self.max_first_scrollable_row());
    }

    /// Scrollable rows on screen
    pub fn visible_rows(&self) -> Range<usize> {
        let scrollable_capacity = self.row_capacity.saturating_sub(self.fixed_row_count);
        let end = (self.first_scrollable_row + scrollable_capacity).min(self.row_count);
        self.first_scrollable_row.min(end)..end
    }

    pub fn scroll_rows_by(&mut self, delta: isize) -> RowNavigationResult {
        let old = self.first_scrollable_row;
        self.first_scrollable_row = if delta >= 0 {
            old.saturating_add(delta.unsigned_abs())
        } else {
            old.saturating_sub(delta.unsigned_abs())
        };
        self.clamp_rows();
        let changed = old != self.first_scrollable_row;
        debug!(target: "viewport_manager",
               "scroll_rows_by({}): first_scrollable_row {} -> {}",
               delta, old, self.first_scrollable_row);
        RowNavigationResult {
            first_scrollable_row: self.first_scrollable_row,
            description: if changed {
                format!("Scrolled to row {}", self.first_scrollable_row + 1)
            } else {
                "Viewport unchanged".to_string()
            },
            viewport_changed: changed,
        }
    }

    /// Keep the same rows on screen when rows are inserted above them
    pub fn adjust_for_rows_inserted(&mut self, row_index: usize, count: usize) {
        self.row_count += count;
        if row_index < self.first_scrollable_row && row_index >= self.fixed_row_count {
            self.first_scrollable_row += count;
        }
        self.clamp_rows();
    }

    pub fn adjust_for_rows_deleted(&mut self, row_index: usize, count: usize) {
        self.row_count = self.row_count.saturating_sub(count);
        if row_index + count <= self.first_scrollable_row {
            self.first_scrollable_row -= count;
        } else if row_index < self.first_scrollable_row {
            self.first_scrollable_row = row_index;
        }
        self.clamp_rows();
    }
}
