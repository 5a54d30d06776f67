//! Column Index Table
//!
//! Bidirectional mapping between "all columns" (schema order) and "active
//! columns" (the shown, reorderable subset). Columns live in one arena
//! (`all`); the active list only holds arena indexes, so reordering or
//! swapping never copies a column.

use tracing::{debug, trace};

use crate::config::config::ColumnsConfig;
use crate::data::datatable::SchemaField;
use crate::ui::viewport::column_width_calculator::ColumnWidthCalculator;

/// A schema column plus its presentation state
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Position in schema order, stable until the schema changes
    pub all_index: usize,
    pub field: SchemaField,
    /// Width in pixels
    pub width: u32,
    /// Whether autosizing may change `width`
    pub autosizing: bool,
    /// Set once autosizing has been applied at least once
    pub autosized: bool,
    /// Widest content measured by the renderer, if any
    pub preferred_width: Option<u32>,
}

impl Column {
    fn new(all_index: usize, field: SchemaField, width: u32, autosizing: bool) -> Self {
        Self {
            all_index,
            field,
            width,
            autosizing,
            autosized: false,
            preferred_width: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }
}

/// Which list a raw index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnIndexKind {
    All,
    Active,
}

/// Where resolved columns go in the active list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPlacement {
    Append,
    /// Insert before this active index (clamped to the list length)
    Before(usize),
    /// Resolve and remove, do not reinsert
    Remove,
}

/// What a show/hide call did to the active list, in terms a selection can
/// follow: removals first (active indexes before the call, descending),
/// then one contiguous insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveColumnsChange {
    pub removed: Vec<usize>,
    pub inserted_at: Option<usize>,
    pub inserted_count: usize,
    /// Set when every shown column was already active: the same change as
    /// single-column moves `(from, to)`, applied in order, where `to` is
    /// the position after removing the column at `from`
    pub moves: Option<Vec<(usize, usize)>>,
}

impl ActiveColumnsChange {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.inserted_count == 0
    }
}

/// Replay a reposition as single moves: each shown column in turn is lifted
/// out and dropped just before `follower` (or at the end)
fn reposition_moves(previous: &[usize], shown: &[usize], follower: Option<usize>) -> Vec<(usize, usize)> {
    let mut work = previous.to_vec();
    let mut moves = Vec::with_capacity(shown.len());
    for idx in shown {
        let Some(from) = work.iter().position(|i| i == idx) else {
            continue;
        };
        work.remove(from);
        let to = follower
            .and_then(|f| work.iter().position(|&i| i == f))
            .unwrap_or(work.len());
        work.insert(to, *idx);
        if from != to {
            moves.push((from, to));
        }
    }
    moves
}

pub struct ColumnIndexTable {
    all: Vec<Column>,
    /// Arena indexes in display order
    active: Vec<usize>,
    columns_created: bool,
    default_width: u32,
    default_autosizing: bool,
}

impl ColumnIndexTable {
    pub fn new(config: &ColumnsConfig) -> Self {
        Self {
            all: Vec::new(),
            active: Vec::new(),
            columns_created: false,
            default_width: config.default_width,
            default_autosizing: config.autosizing,
        }
    }

    /// Rebuild all columns from the schema and reset the active list to
    /// schema order. Width and autosizing state carry over for columns whose
    /// name survives.
    pub fn create_columns(&mut self, schema: &[SchemaField]) {
        let previous = std::mem::take(&mut self.all);
        self.all = schema
            .iter()
            .enumerate()
            .map(|(all_index, field)| match previous.iter().find(|c| c.field.name == field.name) {
                Some(old) => Column {
                    all_index,
                    field: field.clone(),
                    ..old.clone()
                },
                None => Column::new(
                    all_index,
                    field.clone(),
                    self.default_width,
                    self.default_autosizing,
                ),
            })
            .collect();
        self.active = (0..self.all.len()).collect();
        self.columns_created = true;
        debug!(target: "column_index", "Created {} columns", self.all.len());
    }

    pub fn columns_created(&self) -> bool {
        self.columns_created
    }

    pub fn clear(&mut self) {
        self.all.clear();
        self.active.clear();
    }

    pub fn all_column_count(&self) -> usize {
        self.all.len()
    }

    pub fn active_column_count(&self) -> usize {
        self.active.len()
    }

    pub fn all_columns(&self) -> &[Column] {
        &self.all
    }

    pub fn active_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.active.iter().filter_map(move |&idx| self.all.get(idx))
    }

    /// Arena (all) indexes in display order
    pub fn active_all_indexes(&self) -> &[usize] {
        &self.active
    }

    pub fn column(&self, all_index: usize) -> Option<&Column> {
        self.all.get(all_index)
    }

    pub fn active_column(&self, active_index: usize) -> Option<&Column> {
        self.active
            .get(active_index)
            .and_then(|&idx| self.all.get(idx))
    }

    pub fn active_column_names(&self) -> Vec<String> {
        self.active_columns().map(|c| c.field.name.clone()).collect()
    }

    pub fn active_column_widths(&self) -> Vec<u32> {
        self.active_columns().map(|c| c.width).collect()
    }

    pub fn all_index_by_name(&self, name: &str) -> Option<usize> {
        self.all.iter().position(|c| c.field.name == name)
    }

    pub fn active_index_by_all_index(&self, all_index: usize) -> Option<usize> {
        self.active.iter().position(|&idx| idx == all_index)
    }

    pub fn active_index_by_name(&self, name: &str) -> Option<usize> {
        self.active
            .iter()
            .position(|&idx| self.all.get(idx).is_some_and(|c| c.field.name == name))
    }

    /// Resolve raw indexes against one of the lists. Misses are dropped.
    fn resolve(&self, kind: ColumnIndexKind, indexes: &[usize]) -> Vec<usize> {
        indexes
            .iter()
            .filter_map(|&index| match kind {
                ColumnIndexKind::All => (index < self.all.len()).then_some(index),
                ColumnIndexKind::Active => self.active.get(index).copied(),
            })
            .collect()
    }

    /// Show (or, with `ColumnPlacement::Remove`, hide) columns.
    ///
    /// Unless `allow_duplicates` is set, every resolved column is first
    /// removed from the active list and the insertion point moves down once
    /// for each removal in front of it.
    pub fn show_columns(
        &mut self,
        kind: ColumnIndexKind,
        indexes: &[usize],
        placement: ColumnPlacement,
        allow_duplicates: bool,
    ) -> ActiveColumnsChange {
        let mut resolved = self.resolve(kind, indexes);
        if !allow_duplicates {
            let mut seen = Vec::with_capacity(resolved.len());
            resolved.retain(|idx| {
                let first = !seen.contains(idx);
                seen.push(*idx);
                first
            });
        }
        let mut change = ActiveColumnsChange::default();
        if resolved.is_empty() {
            return change;
        }
        let previous = self.active.clone();

        let mut insert_before = match placement {
            ColumnPlacement::Append => Some(self.active.len()),
            ColumnPlacement::Before(index) => Some(index.min(self.active.len())),
            ColumnPlacement::Remove => None,
        };

        if !allow_duplicates || insert_before.is_none() {
            for position in (0..self.active.len()).rev() {
                if resolved.contains(&self.active[position]) {
                    self.active.remove(position);
                    change.removed.push(position);
                    if let Some(before) = insert_before.as_mut() {
                        if position < *before {
                            *before -= 1;
                        }
                    }
                }
            }
        }

        if let Some(before) = insert_before {
            let count = resolved.len();
            let all_were_active = resolved.iter().all(|idx| previous.contains(idx));
            if !allow_duplicates && all_were_active && change.removed.len() == count {
                // The column that will follow the block once it is placed
                let follower = self.active.get(before).copied();
                change.moves = Some(reposition_moves(&previous, &resolved, follower));
            }
            self.active.splice(before..before, resolved);
            change.inserted_at = Some(before);
            change.inserted_count = count;
        }

        debug!(target: "column_index",
               "show_columns({:?}, {:?}, {:?}) -> removed {:?}, inserted {} at {:?}",
               kind, indexes, placement, change.removed, change.inserted_count, change.inserted_at);
        change
    }

    pub fn hide_columns(&mut self, kind: ColumnIndexKind, indexes: &[usize]) -> ActiveColumnsChange {
        self.show_columns(kind, indexes, ColumnPlacement::Remove, false)
    }

    /// Replace the active list with the named columns, in the given order.
    /// Unknown names are skipped.
    pub fn set_active_columns_by_names<S: AsRef<str>>(&mut self, names: &[S]) {
        self.active = names
            .iter()
            .filter_map(|name| self.all_index_by_name(name.as_ref()))
            .collect();
    }

    /// Move the active column at `source` so it sits just before the column
    /// currently at `target`. Returns the column's new active index.
    pub fn move_column_before(&mut self, source: usize, target: usize) -> Option<usize> {
        self.move_column(source, target, false)
    }

    /// Move the active column at `source` so it sits just after the column
    /// currently at `target`. Returns the column's new active index.
    pub fn move_column_after(&mut self, source: usize, target: usize) -> Option<usize> {
        self.move_column(source, target, true)
    }

    fn move_column(&mut self, source: usize, target: usize, after: bool) -> Option<usize> {
        let len = self.active.len();
        if source >= len || target >= len {
            return None;
        }
        let column = self.active.remove(source);
        let mut destination = if source < target { target - 1 } else { target };
        if after {
            destination += 1;
        }
        self.active.insert(destination, column);
        trace!(target: "column_index", "Moved active column {} -> {}", source, destination);
        Some(destination)
    }

    /// Swap two active columns in place
    pub fn swap_columns(&mut self, source: usize, target: usize) -> bool {
        if source >= self.active.len() || target >= self.active.len() {
            return false;
        }
        self.active.swap(source, target);
        true
    }

    pub fn set_column_width(&mut self, active_index: usize, width: u32) -> bool {
        let Some(&all_index) = self.active.get(active_index) else {
            return false;
        };
        match self.all.get_mut(all_index) {
            Some(column) if column.width != width => {
                column.width = width;
                column.autosizing = false;
                true
            }
            _ => false,
        }
    }

    /// Record the widest content the renderer measured for a column
    pub fn set_preferred_width(&mut self, all_index: usize, width: u32) {
        if let Some(column) = self.all.get_mut(all_index) {
            column.preferred_width = Some(width);
        }
    }

    /// Apply autosizing to every active column. Returns whether any width
    /// changed; all active columns are checked regardless.
    pub fn check_column_autosizing(&mut self, force: bool, calculator: &ColumnWidthCalculator) -> bool {
        let mut changed = false;
        for &all_index in &self.active {
            let Some(column) = self.all.get_mut(all_index) else {
                continue;
            };
            if calculator.apply_autosizing(column, force) {
                debug!(target: "column_index", "Autosizing changed width of '{}' to {}", column.field.name, column.width);
                changed = true;
            }
        }
        changed
    }

    /// Insert schema columns at `index`. The new columns become active just
    /// after the last active column that precedes them in schema order.
    /// Returns the active insertion point and count.
    pub fn insert_schema_columns(&mut self, index: usize, fields: &[SchemaField]) -> (usize, usize) {
        let index = index.min(self.all.len());
        let count = fields.len();
        for column in self.all.iter_mut().filter(|c| c.all_index >= index) {
            column.all_index += count;
        }
        for idx in self.active.iter_mut().filter(|idx| **idx >= index) {
            *idx += count;
        }
        let new_columns = fields.iter().enumerate().map(|(offset, field)| {
            Column::new(
                index + offset,
                field.clone(),
                self.default_width,
                self.default_autosizing,
            )
        });
        let new_columns: Vec<Column> = new_columns.collect();
        self.all.splice(index..index, new_columns);

        let active_position = self
            .active
            .iter()
            .rposition(|&idx| idx < index)
            .map_or(0, |position| position + 1);
        self.active
            .splice(active_position..active_position, index..index + count);
        (active_position, count)
    }

    /// Delete schema columns `index..index + count`. Returns the active
    /// indexes the deleted columns occupied, descending.
    pub fn delete_schema_columns(&mut self, index: usize, count: usize) -> Vec<usize> {
        let end = (index + count).min(self.all.len());
        if index >= end {
            return Vec::new();
        }
        let mut removed = Vec::new();
        for position in (0..self.active.len()).rev() {
            let idx = self.active[position];
            if idx >= index && idx < end {
                self.active.remove(position);
                removed.push(position);
            }
        }
        let deleted = end - index;
        self.all.drain(index..end);
        for column in self.all.iter_mut().filter(|c| c.all_index >= end) {
            column.all_index -= deleted;
        }
        for idx in self.active.iter_mut().filter(|idx| **idx >= end) {
            *idx -= deleted;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_table(names: &[&str]) -> ColumnIndexTable {
        let mut table = ColumnIndexTable::new(&ColumnsConfig::default());
        let schema: Vec<SchemaField> = names.iter().map(|n| SchemaField::new(*n)).collect();
        table.create_columns(&schema);
        table
    }

    #[test]
    fn test_create_columns_identity_order() {
        let table = create_table(&["id", "name", "age"]);
        assert!(table.columns_created());
        assert_eq!(table.active_all_indexes(), &[0, 1, 2]);
        assert_eq!(table.active_column_names(), vec!["id", "name", "age"]);
    }

    #[test]
    fn test_create_columns_is_idempotent_and_keeps_widths() {
        let mut table = create_table(&["id", "name"]);
        table.set_column_width(1, 240);
        table.hide_columns(ColumnIndexKind::Active, &[0]);

        let schema = vec![SchemaField::new("id"), SchemaField::new("name")];
        table.create_columns(&schema);
        table.create_columns(&schema);

        assert_eq!(table.active_all_indexes(), &[0, 1]);
        assert_eq!(table.column(1).map(|c| c.width), Some(240));
    }

    #[test]
    fn test_insertion_point_moves_down_for_each_earlier_removal() {
        let mut table = create_table(&["a", "b", "c", "d", "e"]);
        // Move a and b in front of e: both removals happen before index 4
        let change = table.show_columns(
            ColumnIndexKind::All,
            &[0, 1],
            ColumnPlacement::Before(4),
            false,
        );
        assert_eq!(table.active_column_names(), vec!["c", "d", "a", "b", "e"]);
        assert_eq!(change.removed, vec![1, 0]);
        assert_eq!(change.inserted_at, Some(2));
        assert_eq!(change.moves, Some(vec![(0, 3), (0, 3)]));
    }

    #[test]
    fn test_reposition_replays_as_single_moves() {
        let mut table = create_table(&["a", "b", "c", "d"]);
        let change = table.show_columns(
            ColumnIndexKind::All,
            &[2, 0],
            ColumnPlacement::Append,
            false,
        );
        assert_eq!(table.active_column_names(), vec!["b", "d", "c", "a"]);
        assert_eq!(change.moves, Some(vec![(2, 3), (0, 3)]));

        // Bringing back a hidden column is not a pure reposition
        table.hide_columns(ColumnIndexKind::All, &[1]);
        let change = table.show_columns(
            ColumnIndexKind::All,
            &[1, 3],
            ColumnPlacement::Before(0),
            false,
        );
        assert_eq!(change.moves, None);
        assert_eq!(table.active_column_names(), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_duplicates_only_when_requested() {
        let mut table = create_table(&["a", "b"]);
        table.show_columns(ColumnIndexKind::All, &[0], ColumnPlacement::Append, true);
        assert_eq!(table.active_column_names(), vec!["a", "b", "a"]);
        assert_eq!(table.active_index_by_all_index(0), Some(0));

        table.show_columns(ColumnIndexKind::All, &[0], ColumnPlacement::Append, false);
        assert_eq!(table.active_column_names(), vec!["b", "a"]);
    }

    #[test]
    fn test_resolution_misses_are_filtered() {
        let mut table = create_table(&["a", "b"]);
        let change = table.show_columns(ColumnIndexKind::All, &[7, 9], ColumnPlacement::Append, false);
        assert!(change.is_empty());

        let mut empty = ColumnIndexTable::new(&ColumnsConfig::default());
        assert!(empty.hide_columns(ColumnIndexKind::Active, &[0]).is_empty());
    }

    #[test]
    fn test_hide_last_column_leaves_empty_list() {
        let mut table = create_table(&["only"]);
        table.hide_columns(ColumnIndexKind::Active, &[0]);
        assert_eq!(table.active_column_count(), 0);
        assert_eq!(table.active_index_by_name("only"), None);
        assert_eq!(table.all_index_by_name("only"), Some(0));
    }

    #[test]
    fn test_move_before_and_after() {
        let mut table = create_table(&["a", "b", "c", "d"]);
        assert_eq!(table.move_column_before(0, 2), Some(1));
        assert_eq!(table.active_column_names(), vec!["b", "a", "c", "d"]);

        assert_eq!(table.move_column_after(3, 0), Some(1));
        assert_eq!(table.active_column_names(), vec!["b", "d", "a", "c"]);

        assert_eq!(table.move_column_before(0, 9), None);
        assert_eq!(table.active_column_names(), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_swap_preserves_identity() {
        let mut table = create_table(&["a", "b", "c"]);
        table.set_column_width(0, 33);
        assert!(table.swap_columns(0, 2));
        assert_eq!(table.active_column(2).map(|c| (c.all_index, c.width)), Some((0, 33)));
        assert!(!table.swap_columns(5, 0));
    }

    #[test]
    fn test_schema_insert_and_delete_keep_active_order() {
        let mut table = create_table(&["a", "b", "c"]);
        table.move_column_before(2, 0); // c a b
        let (position, count) = table.insert_schema_columns(1, &[SchemaField::new("x")]);
        // x follows a in schema order, so it lands before b
        assert_eq!((position, count), (2, 1));
        assert_eq!(table.active_column_names(), vec!["c", "a", "x", "b"]);
        assert_eq!(table.column(3).map(|c| c.name()), Some("c"));

        let removed = table.delete_schema_columns(0, 2);
        assert_eq!(removed, vec![2, 1]);
        assert_eq!(table.active_column_names(), vec!["c", "b"]);
        assert_eq!(table.active_all_indexes(), &[1, 0]);
    }
}
