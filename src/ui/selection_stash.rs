//! Selection Stash
//!
//! A reindex (for example a sort) keeps row identities but changes row
//! indexes. Before it the selection is captured by row id / column name,
//! after it the closest equivalent selection is rebuilt from those keys.

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::config::config::SelectionConfig;
use crate::data::column_index::ColumnIndexTable;
use crate::data::data_provider::{find_row_index, MainDataModel};
use crate::data::datatable::RowId;
use crate::ui::selection::Selection;

/// Index independent copy of a selection. At most one form is held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StashedSelection {
    #[default]
    None,
    Cell { column_name: String, row_id: RowId },
    Rows(Vec<RowId>),
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StashState {
    #[default]
    Idle,
    Stashing,
    Restoring,
}

#[derive(Debug, Clone)]
pub struct SelectionStash {
    state: StashState,
    stashed: StashedSelection,
    restore_single_cell: bool,
    restore_rows: bool,
    restore_columns: bool,
}

impl SelectionStash {
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            state: StashState::Idle,
            stashed: StashedSelection::None,
            restore_single_cell: config.restore_single_cell_selection,
            restore_rows: config.restore_row_selections,
            restore_columns: config.restore_column_selections,
        }
    }

    pub fn state(&self) -> StashState {
        self.state
    }

    pub fn stashed(&self) -> &StashedSelection {
        &self.stashed
    }

    /// Capture the selection ahead of a reindex. Opens a selection batch
    /// that stays open until `restore`.
    pub fn stash(&mut self, selection: &mut Selection, model: &dyn MainDataModel, columns: &ColumnIndexTable) -> Result<()> {
        self.stash_by(selection, &|row| model.get_row_id_from_index(row), columns)
    }

    /// Same as `stash`, with row ids read from a copy of the row order taken
    /// before the reindex ran
    pub fn stash_from_row_ids(&mut self, selection: &mut Selection, row_ids: &[Option<RowId>], columns: &ColumnIndexTable) -> Result<()> {
        self.stash_by(selection, &|row| row_ids.get(row).cloned().flatten(), columns)
    }

    fn stash_by(&mut self, selection: &mut Selection, row_id: &dyn Fn(usize) -> Option<RowId>, columns: &ColumnIndexTable) -> Result<()> {
        if self.state != StashState::Idle {
            bail!("pre-reindex received while a reindex is already in progress");
        }
        self.state = StashState::Stashing;
        selection.begin_change();

        self.stashed = self.capture(selection, row_id, columns);
        if self.stashed != StashedSelection::None {
            selection.clear_all();
        }
        debug!(target: "stash", "stashed {:?}", self.stashed);
        Ok(())
    }

    fn capture(&self, selection: &Selection, row_id: &dyn Fn(usize) -> Option<RowId>, columns: &ColumnIndexTable) -> StashedSelection {
        if self.restore_single_cell && !selection.multiple_selections() {
            if let Some((x, y)) = selection.single_cell() {
                let column = columns.active_column(x);
                if let (Some(column), Some(row_id)) = (column, row_id(y)) {
                    return StashedSelection::Cell {
                        column_name: column.name().to_string(),
                        row_id,
                    };
                }
            }
        }

        if self.restore_rows && selection.has_row_selections() {
            let ids: Vec<RowId> = selection
                .selected_rows()
                .into_iter()
                .filter_map(row_id)
                .collect();
            if !ids.is_empty() {
                return StashedSelection::Rows(ids);
            }
        }

        if self.restore_columns && selection.has_column_selections() {
            let names: Vec<String> = selection
                .selected_columns()
                .into_iter()
                .filter_map(|index| columns.active_column(index).map(|c| c.name().to_string()))
                .collect();
            if !names.is_empty() {
                return StashedSelection::Columns(names);
            }
        }

        StashedSelection::None
    }

    /// Re-attach whatever was stashed and close the selection batch opened
    /// by `stash`. Keys that no longer resolve are skipped.
    pub fn restore(&mut self, selection: &mut Selection, model: &dyn MainDataModel, columns: &ColumnIndexTable) -> Result<()> {
        if self.state != StashState::Stashing {
            bail!("post-reindex received without a matching pre-reindex");
        }
        self.state = StashState::Restoring;

        match std::mem::take(&mut self.stashed) {
            StashedSelection::None => {}
            StashedSelection::Cell { column_name, row_id } => {
                let column = columns.active_index_by_name(&column_name);
                let row = find_row_index(model, &row_id);
                match (column, row) {
                    (Some(column), Some(row)) => {
                        selection.select_cell(column, row);
                        debug!(target: "stash", "restored cell {}/{} at ({}, {})", column_name, row_id, column, row);
                    }
                    _ => {
                        debug!(target: "stash", "cell {}/{} no longer resolvable", column_name, row_id);
                    }
                }
            }
            StashedSelection::Rows(ids) => {
                let rows: Vec<usize> = ids
                    .iter()
                    .filter_map(|id| find_row_index(model, id))
                    .collect();
                if rows.len() < ids.len() {
                    debug!(target: "stash", "{} of {} stashed rows restored", rows.len(), ids.len());
                }
                selection.add_rows(&rows);
            }
            StashedSelection::Columns(names) => {
                let indexes: Vec<usize> = names
                    .iter()
                    .filter_map(|name| columns.active_index_by_name(name))
                    .collect();
                if indexes.len() < names.len() {
                    debug!(target: "stash", "{} of {} stashed columns restored", indexes.len(), names.len());
                }
                selection.add_columns(&indexes);
            }
        }

        self.state = StashState::Idle;
        selection.end_change()
    }

    /// Drop a stash without restoring it (grid torn down mid reindex)
    pub fn abandon(&mut self, selection: &mut Selection) {
        if self.state == StashState::Idle {
            return;
        }
        warn!(target: "stash", "abandoning stashed selection {:?}", self.stashed);
        self.stashed = StashedSelection::None;
        self.state = StashState::Idle;
        if let Err(e) = selection.end_change() {
            warn!(target: "stash", "selection batch already closed: {}", e);
        }
    }
}
