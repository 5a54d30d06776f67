//! Selection Region Set
//!
//! Cell rectangles (most recent last) plus the row and column selection
//! projections. Mutations are batched: inside `begin_change`/`end_change`
//! they only mark the batch, and the outermost `end_change` raises a single
//! notification. The owner collects it with `take_notification`.

use anyhow::Result;
use tracing::{debug, trace};

use crate::config::config::SelectionConfig;
use crate::state::batch::{ChangeBatch, ChangeClass};
use crate::ui::range_list::RangeList;
use crate::ui::selection_rect::SelectionRect;

#[derive(Debug, Clone)]
pub struct Selection {
    rects: Vec<SelectionRect>,
    rows: RangeList,
    columns: RangeList,
    batch: ChangeBatch,
    notification_pending: bool,
    multiple_selections: bool,
    single_row_selection_mode: bool,
    checkbox_row_selection: bool,
}

/// Everything that identifies a selection state, for change detection
#[derive(PartialEq, Eq)]
struct Snapshot {
    rects: Vec<SelectionRect>,
    rows: RangeList,
    columns: RangeList,
}

impl Selection {
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            rects: Vec::new(),
            rows: RangeList::new(),
            columns: RangeList::new(),
            batch: ChangeBatch::new(ChangeClass::Selection),
            notification_pending: false,
            multiple_selections: config.multiple_selections,
            single_row_selection_mode: config.single_row_selection_mode,
            checkbox_row_selection: config.checkbox_row_selection,
        }
    }

    pub fn multiple_selections(&self) -> bool {
        self.multiple_selections
    }

    pub fn begin_change(&mut self) {
        self.batch.begin();
    }

    pub fn end_change(&mut self) -> Result<()> {
        if self.batch.end()? {
            debug!(target: "selection", "batch closed with changes: {}", self.describe());
            self.notification_pending = true;
        }
        Ok(())
    }

    pub fn is_changing(&self) -> bool {
        self.batch.is_active()
    }

    /// Consume the pending "selection changed" notification, if any
    pub fn take_notification(&mut self) -> bool {
        std::mem::take(&mut self.notification_pending)
    }

    fn changed(&mut self) {
        if self.batch.is_active() {
            self.batch.mark_changed();
        } else {
            self.notification_pending = true;
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            rects: self.rects.clone(),
            rows: self.rows.clone(),
            columns: self.columns.clone(),
        }
    }

    fn changed_since(&mut self, before: Snapshot) -> bool {
        if before != self.snapshot() {
            self.changed();
            true
        } else {
            false
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} rects, rows {}, columns {}",
            self.rects.len(),
            self.rows,
            self.columns
        )
    }

    /// Add a cell rectangle. A negative origin is ignored. Without multiple
    /// selections the new rectangle replaces the existing ones.
    pub fn select(&mut self, origin_x: isize, origin_y: isize, extent_x: isize, extent_y: isize) -> Option<SelectionRect> {
        if origin_x < 0 || origin_y < 0 {
            trace!(target: "selection", "select: negative origin ({}, {}) ignored", origin_x, origin_y);
            return None;
        }
        let rect = SelectionRect::from_origin_extent(
            origin_x.unsigned_abs(),
            origin_y.unsigned_abs(),
            extent_x,
            extent_y,
        );
        if !self.multiple_selections {
            self.rects.clear();
        }
        self.rects.push(rect);
        debug!(target: "selection", "select {}", rect);
        self.changed();
        Some(rect)
    }

    pub fn select_cell(&mut self, x: usize, y: usize) -> Option<SelectionRect> {
        match (isize::try_from(x), isize::try_from(y)) {
            (Ok(x), Ok(y)) => self.select(x, y, 0, 0),
            _ => None,
        }
    }

    pub fn rectangles(&self) -> &[SelectionRect] {
        &self.rects
    }

    pub fn last_selection(&self) -> Option<&SelectionRect> {
        self.rects.last()
    }

    pub fn clear_most_recent_selection(&mut self) -> Option<SelectionRect> {
        let removed = self.rects.pop();
        if removed.is_some() {
            self.changed();
        }
        removed
    }

    /// Clear the selection. Checkbox style row selections survive.
    pub fn clear(&mut self) {
        let before = self.snapshot();
        self.rects.clear();
        self.columns.clear();
        if !self.checkbox_row_selection {
            self.rows.clear();
        }
        self.changed_since(before);
    }

    /// Clear everything, checkbox rows included
    pub fn clear_all(&mut self) {
        let before = self.snapshot();
        self.rects.clear();
        self.columns.clear();
        self.rows.clear();
        self.changed_since(before);
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.rows.is_empty() && self.columns.is_empty()
    }

    /// The one selected cell, when the selection is exactly one
    /// single-cell rectangle
    pub fn single_cell(&self) -> Option<(usize, usize)> {
        match self.rects.as_slice() {
            [rect] if rect.is_single_cell() => Some((rect.left(), rect.top())),
            _ => None,
        }
    }

    /// Select rows `from..=to`
    pub fn select_rows(&mut self, from: usize, to: usize) {
        let before = self.snapshot();
        if self.single_row_selection_mode {
            self.rows.clear();
        }
        self.rows.add(from, to);
        self.changed_since(before);
    }

    pub fn deselect_rows(&mut self, from: usize, to: usize) {
        let before = self.snapshot();
        self.rows.remove(from, to);
        self.changed_since(before);
    }

    /// Returns true if the row is selected afterwards
    pub fn toggle_select_row(&mut self, row: usize) -> bool {
        let selecting = !self.rows.contains(row);
        if selecting && self.single_row_selection_mode {
            self.rows.clear();
        }
        self.rows.toggle(row);
        self.changed();
        selecting
    }

    pub fn select_columns(&mut self, from: usize, to: usize) {
        let before = self.snapshot();
        self.columns.add(from, to);
        self.changed_since(before);
    }

    pub fn deselect_columns(&mut self, from: usize, to: usize) {
        let before = self.snapshot();
        self.columns.remove(from, to);
        self.changed_since(before);
    }

    pub fn toggle_select_column(&mut self, column: usize) -> bool {
        let selected = self.columns.toggle(column);
        self.changed();
        selected
    }

    /// Add rows without applying single row mode (used when re-attaching)
    pub(crate) fn add_rows(&mut self, rows: &[usize]) {
        let before = self.snapshot();
        for &row in rows {
            self.rows.add(row, row);
        }
        self.changed_since(before);
    }

    pub(crate) fn add_columns(&mut self, columns: &[usize]) {
        let before = self.snapshot();
        for &column in columns {
            self.columns.add(column, column);
        }
        self.changed_since(before);
    }

    pub fn is_cell_selected(&self, x: usize, y: usize) -> bool {
        self.rows.contains(y)
            || self.columns.contains(x)
            || self.rects.iter().any(|r| r.contains(x, y))
    }

    pub fn is_row_selected(&self, y: usize) -> bool {
        self.rows.contains(y)
    }

    pub fn is_column_selected(&self, x: usize) -> bool {
        self.columns.contains(x)
    }

    pub fn has_row_selections(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn has_column_selections(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn selected_rows(&self) -> Vec<usize> {
        self.rows.indexes()
    }

    pub fn selected_columns(&self) -> Vec<usize> {
        self.columns.indexes()
    }

    pub fn adjust_for_rows_inserted(&mut self, row_index: usize, count: usize) -> bool {
        let before = self.snapshot();
        for rect in &mut self.rects {
            rect.adjust_rows_inserted(row_index, count);
        }
        self.rows.adjust_inserted(row_index, count);
        self.log_adjustment("rows inserted", row_index, count, before)
    }

    pub fn adjust_for_rows_deleted(&mut self, row_index: usize, count: usize) -> bool {
        let before = self.snapshot();
        self.rects.retain_mut(|rect| rect.adjust_rows_deleted(row_index, count));
        self.rows.adjust_deleted(row_index, count);
        self.log_adjustment("rows deleted", row_index, count, before)
    }

    pub fn adjust_for_rows_moved(&mut self, old_index: usize, new_index: usize, count: usize) -> bool {
        let before = self.snapshot();
        self.rects
            .retain_mut(|rect| rect.adjust_rows_moved(old_index, new_index, count));
        self.rows.adjust_moved(old_index, new_index, count);
        self.log_adjustment("rows moved", old_index, count, before)
    }

    /// Every row is gone, and cell and row selections with them
    pub fn adjust_for_all_rows_deleted(&mut self) -> bool {
        let before = self.snapshot();
        self.rects.clear();
        self.rows.clear();
        self.log_adjustment("all rows deleted", 0, 0, before)
    }

    pub fn adjust_for_all_columns_deleted(&mut self) -> bool {
        let before = self.snapshot();
        self.rects.clear();
        self.columns.clear();
        self.log_adjustment("all columns deleted", 0, 0, before)
    }

    pub fn adjust_for_columns_inserted(&mut self, column_index: usize, count: usize) -> bool {
        let before = self.snapshot();
        for rect in &mut self.rects {
            rect.adjust_columns_inserted(column_index, count);
        }
        self.columns.adjust_inserted(column_index, count);
        self.log_adjustment("columns inserted", column_index, count, before)
    }

    pub fn adjust_for_columns_deleted(&mut self, column_index: usize, count: usize) -> bool {
        let before = self.snapshot();
        self.rects
            .retain_mut(|rect| rect.adjust_columns_deleted(column_index, count));
        self.columns.adjust_deleted(column_index, count);
        self.log_adjustment("columns deleted", column_index, count, before)
    }

    pub fn adjust_for_columns_moved(&mut self, old_index: usize, new_index: usize, count: usize) -> bool {
        let before = self.snapshot();
        self.rects
            .retain_mut(|rect| rect.adjust_columns_moved(old_index, new_index, count));
        self.columns.adjust_moved(old_index, new_index, count);
        self.log_adjustment("columns moved", old_index, count, before)
    }

    fn log_adjustment(&mut self, what: &str, index: usize, count: usize, before: Snapshot) -> bool {
        let changed = self.changed_since(before);
        if changed {
            debug!(target: "selection", "{} at {} (count {}): {}", what, index, count, self.describe());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> Selection {
        Selection::new(&SelectionConfig::default())
    }

    #[test]
    fn test_negative_origin_is_ignored() {
        let mut sel = selection();
        assert!(sel.select(-1, 3, 0, 0).is_none());
        assert!(sel.is_empty());
        assert!(!sel.take_notification());
    }

    #[test]
    fn test_single_selection_replaces_previous() {
        let mut sel = selection();
        sel.select(0, 0, 1, 1);
        sel.select(3, 3, 0, 0);
        assert_eq!(sel.rectangles().len(), 1);
        assert_eq!(sel.single_cell(), Some((3, 3)));
    }

    #[test]
    fn test_multiple_selections_accumulate() {
        let mut sel = Selection::new(&SelectionConfig {
            multiple_selections: true,
            ..SelectionConfig::default()
        });
        sel.select(0, 0, 1, 1);
        sel.select(3, 3, 0, 0);
        assert_eq!(sel.rectangles().len(), 2);
        assert_eq!(sel.single_cell(), None);
        sel.clear_most_recent_selection();
        assert_eq!(sel.last_selection(), Some(&SelectionRect::from_corners(0, 0, 1, 1)));
    }

    #[test]
    fn test_nested_batches_notify_once() {
        let mut sel = selection();
        sel.begin_change();
        sel.begin_change();
        sel.select(1, 1, 0, 0);
        sel.select_rows(2, 4);
        sel.end_change().unwrap();
        assert!(!sel.take_notification());
        sel.end_change().unwrap();
        assert!(sel.take_notification());
        assert!(!sel.take_notification());
    }

    #[test]
    fn test_batch_without_mutation_is_silent() {
        let mut sel = selection();
        sel.begin_change();
        sel.deselect_rows(0, 10);
        sel.end_change().unwrap();
        assert!(!sel.take_notification());
        assert!(sel.end_change().is_err());
    }

    #[test]
    fn test_single_row_selection_mode() {
        let mut sel = Selection::new(&SelectionConfig {
            single_row_selection_mode: true,
            ..SelectionConfig::default()
        });
        sel.select_rows(1, 2);
        sel.select_rows(5, 5);
        assert_eq!(sel.selected_rows(), vec![5]);
        sel.toggle_select_row(7);
        assert_eq!(sel.selected_rows(), vec![7]);
        assert!(!sel.toggle_select_row(7));
        assert!(!sel.has_row_selections());
    }

    #[test]
    fn test_checkbox_rows_survive_clear() {
        let mut sel = Selection::new(&SelectionConfig {
            checkbox_row_selection: true,
            ..SelectionConfig::default()
        });
        sel.select_rows(1, 3);
        sel.select_cell(0, 0);
        sel.select_columns(2, 2);
        sel.clear();
        assert_eq!(sel.selected_rows(), vec![1, 2, 3]);
        assert!(sel.rectangles().is_empty());
        assert!(!sel.has_column_selections());
        sel.clear_all();
        assert!(sel.is_empty());
    }

    #[test]
    fn test_projections_select_cells() {
        let mut sel = selection();
        sel.select_rows(4, 4);
        sel.select_columns(1, 1);
        assert!(sel.is_cell_selected(9, 4));
        assert!(sel.is_cell_selected(1, 9));
        assert!(!sel.is_cell_selected(0, 0));
    }

    #[test]
    fn test_adjustment_applies_to_every_rectangle() {
        let mut sel = Selection::new(&SelectionConfig {
            multiple_selections: true,
            ..SelectionConfig::default()
        });
        sel.select(0, 2, 0, 0);
        sel.select(0, 8, 1, 1);
        sel.select_rows(10, 10);
        sel.take_notification();

        assert!(sel.adjust_for_rows_inserted(0, 2));
        assert_eq!(sel.rectangles()[0].top(), 4);
        assert_eq!(sel.rectangles()[1].top(), 10);
        assert_eq!(sel.selected_rows(), vec![12]);
        assert!(sel.take_notification());

        // Deleting the first rectangle's only row removes it
        assert!(sel.adjust_for_rows_deleted(4, 1));
        assert_eq!(sel.rectangles().len(), 1);
        assert_eq!(sel.rectangles()[0].top(), 9);
    }

    #[test]
    fn test_noop_adjustments_leave_selection_untouched() {
        let mut sel = selection();
        sel.select(1, 5, 2, 4);
        sel.select_columns(3, 3);
        sel.take_notification();
        let before = sel.clone();

        assert!(!sel.adjust_for_rows_inserted(3, 0));
        assert!(!sel.adjust_for_rows_deleted(20, 5));
        assert!(!sel.adjust_for_columns_deleted(10, 2));
        assert!(!sel.adjust_for_columns_inserted(0, 0));
        assert_eq!(sel.rectangles(), before.rectangles());
        assert_eq!(sel.selected_columns(), before.selected_columns());
        assert!(!sel.take_notification());
    }

    #[test]
    fn test_column_move_keeps_selection_on_column() {
        let mut sel = selection();
        sel.select_columns(0, 0);
        sel.select_cell(0, 3);
        // Column 0 moves to position 2
        sel.adjust_for_columns_moved(0, 2, 1);
        assert_eq!(sel.selected_columns(), vec![2]);
        assert_eq!(sel.single_cell(), Some((2, 3)));
    }
}
