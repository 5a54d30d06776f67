//! Model Callback Router
//!
//! Listener proxies registered with the schema and data models turn every
//! callback into a `ModelEvent` and queue it on the grid. The grid core
//! then handles events in arrival order: column table and selection are
//! adjusted, change batches are tracked per class, and consolidated
//! notifications go out when the outermost batch closes.

use anyhow::Result;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

use crate::data::data_provider::{DataCallbackListener, DataModel, MainDataModel, SchemaCallbackListener, SchemaModel};
use crate::data::datatable::{RowId, SchemaField};
use crate::grid::{GridCore, GridShared};
use crate::state::events::{GridEvent, ModelEvent, ModelNotification};
use crate::subgrid::SubgridRole;
use crate::trace_model_event;

/// Which model raised an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Schema,
    /// Index into the grid's subgrid list
    Data(usize),
}

/// Model state read when a callback fired, for events whose handling is
/// deferred until the core is released
#[derive(Debug, Clone, Default)]
pub(crate) enum Captured {
    #[default]
    Nothing,
    /// Fields of the inserted schema columns
    Fields(Vec<SchemaField>),
    /// Row id at every main row index before the reindex
    RowIds(Vec<Option<RowId>>),
}

#[derive(Debug, Clone)]
pub(crate) struct QueuedEvent {
    pub(crate) source: EventSource,
    pub(crate) event: ModelEvent,
    pub(crate) captured: Captured,
}

impl GridShared {
    /// Read what a deferred event will need from the models while they
    /// still reflect the callback
    fn capture(&self, source: EventSource, event: &ModelEvent) -> Captured {
        match (source, event) {
            (EventSource::Schema, ModelEvent::ColumnsInserted { index, count }) => {
                let schema = self.schema.get_schema();
                let end = (index + count).min(schema.len());
                Captured::Fields(schema.get(*index..end).unwrap_or_default().to_vec())
            }
            (EventSource::Data(subgrid), ModelEvent::PreReindex) if subgrid == self.main_index => {
                let model = self.main_model.as_ref();
                let row_ids = (0..model.get_row_count())
                    .map(|row| model.get_row_id_from_index(row))
                    .collect();
                Captured::RowIds(row_ids)
            }
            _ => Captured::Nothing,
        }
    }
}

/// Queue an event on the grid and handle it if the core is free. After
/// the grid is gone or destroyed, events are dropped.
fn route(grid: &Weak<GridShared>, source: EventSource, event: ModelEvent) -> Result<()> {
    let Some(shared) = grid.upgrade() else {
        trace!(target: "router", "grid dropped, ignoring {:?}", event);
        return Ok(());
    };
    if shared.destroyed.get() {
        trace!(target: "router", "grid '{}' destroyed, ignoring {:?}", shared.name, event);
        return Ok(());
    }

    // A free core handles the event right away, against the same model state
    let busy = shared.core.try_borrow_mut().is_err();
    let captured = if busy {
        shared.capture(source, &event)
    } else {
        Captured::Nothing
    };
    shared.inbox.borrow_mut().push_back(QueuedEvent {
        source,
        event,
        captured,
    });

    let result = match shared.core.try_borrow_mut() {
        Ok(mut core) => shared.drain_inbox(&mut core),
        Err(_) => {
            // Raised while the core is busy: handled once it is released
            trace!(target: "router", "grid '{}' busy, event queued", shared.name);
            return Ok(());
        }
    };
    shared.flush_events();
    result
}

pub(crate) struct SchemaListener {
    grid: Weak<GridShared>,
}

impl SchemaListener {
    fn route(&self, event: ModelEvent) -> Result<()> {
        route(&self.grid, EventSource::Schema, event)
    }
}

impl SchemaCallbackListener for SchemaListener {
    fn begin_change(&self) -> Result<()> {
        self.route(ModelEvent::SchemaBeginChange)
    }

    fn end_change(&self) -> Result<()> {
        self.route(ModelEvent::SchemaEndChange)
    }

    fn columns_inserted(&self, index: usize, count: usize) -> Result<()> {
        self.route(ModelEvent::ColumnsInserted { index, count })
    }

    fn columns_deleted(&self, index: usize, count: usize) -> Result<()> {
        self.route(ModelEvent::ColumnsDeleted { index, count })
    }

    fn all_columns_deleted(&self) -> Result<()> {
        self.route(ModelEvent::AllColumnsDeleted)
    }

    fn schema_changed(&self) -> Result<()> {
        self.route(ModelEvent::SchemaChanged)
    }

    fn get_active_schema_columns(&self) -> Vec<SchemaField> {
        let Some(shared) = self.grid.upgrade() else {
            return Vec::new();
        };
        let Ok(core) = shared.core.try_borrow() else {
            return Vec::new();
        };
        core.columns
            .active_columns()
            .map(|column| column.field.clone())
            .collect()
    }
}

pub(crate) struct DataListener {
    grid: Weak<GridShared>,
    subgrid: usize,
}

impl DataListener {
    fn route(&self, event: ModelEvent) -> Result<()> {
        route(&self.grid, EventSource::Data(self.subgrid), event)
    }
}

impl DataCallbackListener for DataListener {
    fn begin_change(&self) -> Result<()> {
        self.route(ModelEvent::DataBeginChange)
    }

    fn end_change(&self) -> Result<()> {
        self.route(ModelEvent::DataEndChange)
    }

    fn rows_inserted(&self, row_index: usize, count: usize) -> Result<()> {
        self.route(ModelEvent::RowsInserted { row_index, count })
    }

    fn rows_deleted(&self, row_index: usize, count: usize) -> Result<()> {
        self.route(ModelEvent::RowsDeleted { row_index, count })
    }

    fn all_rows_deleted(&self) -> Result<()> {
        self.route(ModelEvent::AllRowsDeleted)
    }

    fn row_count_changed(&self) -> Result<()> {
        self.route(ModelEvent::RowCountChanged)
    }

    fn rows_moved(&self, old_row_index: usize, new_row_index: usize, count: usize) -> Result<()> {
        self.route(ModelEvent::RowsMoved {
            old_row_index,
            new_row_index,
            count,
        })
    }

    fn invalidate_all(&self) -> Result<()> {
        self.route(ModelEvent::InvalidateAll)
    }

    fn invalidate_rows(&self, row_index: usize, count: usize) -> Result<()> {
        self.route(ModelEvent::InvalidateRows { row_index, count })
    }

    fn invalidate_row(&self, row_index: usize) -> Result<()> {
        self.route(ModelEvent::InvalidateRow { row_index })
    }

    fn invalidate_row_columns(
        &self,
        row_index: usize,
        schema_column_index: usize,
        column_count: usize,
    ) -> Result<()> {
        self.route(ModelEvent::InvalidateRowColumns {
            row_index,
            schema_column_index,
            column_count,
        })
    }

    fn invalidate_row_cells(&self, row_index: usize, schema_column_indexes: &[usize]) -> Result<()> {
        self.route(ModelEvent::InvalidateRowCells {
            row_index,
            schema_column_indexes: schema_column_indexes.to_vec(),
        })
    }

    fn invalidate_cell(&self, schema_column_index: usize, row_index: usize) -> Result<()> {
        self.route(ModelEvent::InvalidateCell {
            schema_column_index,
            row_index,
        })
    }

    fn pre_reindex(&self) -> Result<()> {
        self.route(ModelEvent::PreReindex)
    }

    fn post_reindex(&self) -> Result<()> {
        self.route(ModelEvent::PostReindex)
    }
}

impl GridCore {
    /// Attach listeners to every model that can push changes
    pub(crate) fn subscribe_listeners(&mut self, grid: &Weak<GridShared>) {
        if let Some(source) = self.schema.callback_source() {
            source.add_schema_callback_listener(Rc::new(SchemaListener { grid: grid.clone() }));
            self.schema_subscribed = true;
        }
        for (index, subgrid) in self.subgrids.iter_mut().enumerate() {
            if let Some(source) = subgrid.model.callback_source() {
                source.add_data_callback_listener(Rc::new(DataListener {
                    grid: grid.clone(),
                    subgrid: index,
                }));
                subgrid.subscribed = true;
            }
            debug!(target: "router", "{} subgrid: {}", subgrid.role,
                   if subgrid.subscribed { "subscribed" } else { "polled" });
        }
    }

    fn source_role(&self, source: EventSource) -> Option<SubgridRole> {
        match source {
            EventSource::Schema => None,
            EventSource::Data(index) => self.subgrids.get(index).map(|s| s.role),
        }
    }

    /// Handle one routed model event
    pub(crate) fn handle_model_event(&mut self, source: EventSource, event: ModelEvent, captured: Captured) -> Result<()> {
        let role = self.source_role(source);
        trace_model_event!(role.map_or_else(|| "schema".to_string(), |r| r.to_string()), event);

        let handled = match source {
            EventSource::Schema => self.handle_schema_event(&event, captured),
            EventSource::Data(index) => self.handle_data_event(index, &event, captured),
        };
        handled?;

        if self.config.events.dispatch_model_events {
            self.push_event(GridEvent::Model(ModelNotification::new(role, event)));
        }
        self.collect_notifications();
        Ok(())
    }

    pub fn begin_schema_change(&mut self) {
        self.schema_batch.begin();
        self.selection.begin_change();
    }

    /// Close a schema level and the selection level opened with it. A
    /// stray end fails before either counter moves.
    pub fn end_schema_change(&mut self) -> Result<()> {
        let consolidate = self.schema_batch.end()?;
        self.selection.end_change()?;
        if consolidate {
            self.consolidate_schema();
        }
        Ok(())
    }

    pub fn begin_data_change(&mut self) {
        self.data_batch.begin();
        self.selection.begin_change();
    }

    pub fn end_data_change(&mut self) -> Result<()> {
        let consolidate = self.data_batch.end()?;
        self.selection.end_change()?;
        if consolidate {
            self.consolidate_data();
        }
        Ok(())
    }

    fn in_schema_batch(&mut self, f: impl FnOnce(&mut Self)) -> Result<()> {
        self.begin_schema_change();
        f(self);
        self.schema_batch.mark_changed();
        self.end_schema_change()
    }

    fn in_data_batch(&mut self, f: impl FnOnce(&mut Self)) -> Result<()> {
        self.begin_data_change();
        f(self);
        self.data_batch.mark_changed();
        self.end_data_change()
    }

    fn handle_schema_event(&mut self, event: &ModelEvent, captured: Captured) -> Result<()> {
        match *event {
            ModelEvent::SchemaBeginChange => {
                self.begin_schema_change();
                Ok(())
            }
            ModelEvent::SchemaEndChange => self.end_schema_change(),
            ModelEvent::ColumnsInserted { index, count } => self.in_schema_batch(|core| {
                let fields = match captured {
                    Captured::Fields(fields) => fields,
                    _ => {
                        let schema = core.schema.get_schema();
                        let end = (index + count).min(schema.len());
                        schema.get(index..end).unwrap_or_default().to_vec()
                    }
                };
                let (position, inserted) = core.columns.insert_schema_columns(index, &fields);
                if inserted > 0 {
                    core.selection.adjust_for_columns_inserted(position, inserted);
                }
                core.shape_pending = true;
            }),
            ModelEvent::ColumnsDeleted { index, count } => self.in_schema_batch(|core| {
                // Descending, so each index is still valid when applied
                for position in core.columns.delete_schema_columns(index, count) {
                    core.selection.adjust_for_columns_deleted(position, 1);
                }
                core.shape_pending = true;
            }),
            ModelEvent::AllColumnsDeleted => self.in_schema_batch(|core| {
                core.columns.clear();
                core.selection.adjust_for_all_columns_deleted();
                core.shape_pending = true;
            }),
            ModelEvent::SchemaChanged => self.in_schema_batch(|core| {
                core.recreate_columns_pending = true;
            }),
            _ => {
                warn!(target: "router", "data event {:?} raised by the schema model ignored", event);
                Ok(())
            }
        }
    }

    fn handle_data_event(&mut self, subgrid: usize, event: &ModelEvent, captured: Captured) -> Result<()> {
        let is_main = subgrid == self.main_index;
        match *event {
            ModelEvent::DataBeginChange => {
                self.begin_data_change();
                Ok(())
            }
            ModelEvent::DataEndChange => self.end_data_change(),
            ModelEvent::RowsInserted { row_index, count } => self.in_data_batch(|core| {
                if is_main {
                    core.selection.adjust_for_rows_inserted(row_index, count);
                    core.viewport.adjust_for_rows_inserted(row_index, count);
                }
                core.row_shape_changed(subgrid);
            }),
            ModelEvent::RowsDeleted { row_index, count } => self.in_data_batch(|core| {
                if is_main {
                    core.selection.adjust_for_rows_deleted(row_index, count);
                    core.viewport.adjust_for_rows_deleted(row_index, count);
                }
                core.row_shape_changed(subgrid);
            }),
            ModelEvent::RowsMoved {
                old_row_index,
                new_row_index,
                count,
            } => self.in_data_batch(|core| {
                if is_main {
                    core.selection
                        .adjust_for_rows_moved(old_row_index, new_row_index, count);
                }
                core.row_shape_changed(subgrid);
            }),
            ModelEvent::AllRowsDeleted => self.in_data_batch(|core| {
                if is_main {
                    core.selection.adjust_for_all_rows_deleted();
                    core.viewport.set_row_count(0);
                }
                core.row_shape_changed(subgrid);
            }),
            ModelEvent::RowCountChanged => self.in_data_batch(|core| {
                core.row_shape_changed(subgrid);
            }),
            ModelEvent::InvalidateAll
            | ModelEvent::InvalidateRows { .. }
            | ModelEvent::InvalidateRow { .. }
            | ModelEvent::InvalidateRowColumns { .. }
            | ModelEvent::InvalidateRowCells { .. }
            | ModelEvent::InvalidateCell { .. } => self.in_data_batch(|core| {
                core.state_pending = true;
            }),
            ModelEvent::PreReindex if is_main => self.pre_reindex(captured),
            ModelEvent::PostReindex if is_main => self.post_reindex(),
            ModelEvent::PreReindex | ModelEvent::PostReindex => {
                trace!(target: "router", "reindex from secondary subgrid {} ignored", subgrid);
                Ok(())
            }
            _ => {
                warn!(target: "router", "schema event {:?} raised by a data model ignored", event);
                Ok(())
            }
        }
    }

    fn row_shape_changed(&mut self, subgrid: usize) {
        if let Some(sub) = self.subgrids.get_mut(subgrid) {
            sub.known_row_count = sub.model.row_count();
        }
        self.shape_pending = true;
    }

    /// Stash the selection and hold a data batch open until post-reindex
    fn pre_reindex(&mut self, captured: Captured) -> Result<()> {
        match captured {
            Captured::RowIds(row_ids) => {
                self.stash
                    .stash_from_row_ids(&mut self.selection, &row_ids, &self.columns)?
            }
            _ => self
                .stash
                .stash(&mut self.selection, self.main_model.as_ref(), &self.columns)?,
        }
        self.data_batch.begin();
        self.data_batch.mark_changed();
        self.shape_pending = true;
        Ok(())
    }

    fn post_reindex(&mut self) -> Result<()> {
        self.stash
            .restore(&mut self.selection, self.main_model.as_ref(), &self.columns)?;
        if let Some(sub) = self.subgrids.get_mut(self.main_index) {
            sub.known_row_count = sub.model.row_count();
        }
        if self.data_batch.end()? {
            self.consolidate_data();
        }
        Ok(())
    }

    fn consolidate_schema(&mut self) {
        if self.recreate_columns_pending {
            // Emits ColumnsCreated and re-lays out
            self.create_columns();
            self.shape_pending = false;
            self.push_event(GridEvent::ShapeChanged);
            return;
        }
        if std::mem::take(&mut self.shape_pending) {
            debug!(target: "router", "{}: schema consolidated", self.name);
            self.push_event(GridEvent::ShapeChanged);
            self.relayout();
        }
    }

    fn consolidate_data(&mut self) {
        if std::mem::take(&mut self.shape_pending) {
            debug!(target: "router", "{}: data shape consolidated", self.name);
            self.push_event(GridEvent::ShapeChanged);
            self.relayout();
        }
        if std::mem::take(&mut self.state_pending) {
            self.push_event(GridEvent::StateChanged);
        }
    }

    /// Compare row counts of models without callbacks against what was
    /// last seen and route a row-count change for each difference
    pub fn poll_data_models(&mut self) -> Result<usize> {
        let changed: Vec<usize> = self
            .subgrids
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.subscribed && s.model.row_count() != s.known_row_count)
            .map(|(index, _)| index)
            .collect();
        for &index in &changed {
            debug!(target: "router", "polled {} subgrid row count changed", self.subgrids[index].role);
            self.handle_model_event(EventSource::Data(index), ModelEvent::RowCountChanged, Captured::Nothing)?;
        }
        Ok(changed.len())
    }
}
