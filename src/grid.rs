//! Grid: the coordinator that owns the column table, selection, stash and
//! viewport of one grid instance.
//!
//! `Grid` is a cheap handle around shared state. Model listeners hold only
//! a weak reference to that state, so dropping the last `Grid` handle (or
//! calling `destroy`) silently disconnects them.

use anyhow::{anyhow, bail, Result};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::{debug, info, trace, warn};

use crate::config::config::GridConfig;
use crate::data::column_index::{
    ActiveColumnsChange, ColumnIndexKind, ColumnIndexTable, ColumnPlacement,
};
use crate::data::data_provider::{MainDataModel, SchemaModel};
use crate::data::datatable::{DataValue, SchemaField};
use crate::state::batch::{ChangeBatch, ChangeClass};
use crate::state::dispatcher::{deliver, GridEventDispatcher, GridEventSubscriber};
use crate::state::events::GridEvent;
use crate::state::router::QueuedEvent;
use crate::subgrid::{find_main_subgrid, Subgrid, SubgridRole, SubgridSpec};
use crate::ui::selection::Selection;
use crate::ui::selection_stash::SelectionStash;
use crate::ui::viewport::column_width_calculator::ColumnWidthCalculator;
use crate::ui::viewport_manager::{NavigationResult, RowNavigationResult, ViewportManager};

/// State shared between `Grid` handles and model listeners
pub(crate) struct GridShared {
    pub(crate) name: String,
    pub(crate) core: RefCell<GridCore>,
    /// Model events waiting for the core to become available
    pub(crate) inbox: RefCell<VecDeque<QueuedEvent>>,
    pub(crate) dispatcher: RefCell<GridEventDispatcher>,
    pub(crate) destroyed: Cell<bool>,
    /// Set while subscribers are being called
    pub(crate) flushing: Cell<bool>,
    /// Models, reachable while the core is busy
    pub(crate) schema: Rc<dyn SchemaModel>,
    pub(crate) main_model: Rc<dyn MainDataModel>,
    pub(crate) main_index: usize,
}

impl GridShared {
    /// Hand queued events to subscribers. Neither the core nor the
    /// dispatcher is borrowed while a subscriber runs, so it may call back
    /// into the grid; events it raises are picked up by the same loop.
    pub(crate) fn flush_events(&self) {
        if self.flushing.replace(true) {
            // An outer flush is running and will deliver these
            return;
        }
        loop {
            let events = match self.core.try_borrow_mut() {
                Ok(mut core) => core.take_events(),
                Err(_) => break,
            };
            if events.is_empty() {
                break;
            }
            for event in events {
                let subscribers = self.dispatcher.borrow().subscribers();
                deliver(&subscribers, &event);
                self.dispatcher.borrow_mut().record(event);
            }
        }
        self.flushing.set(false);
    }

    pub(crate) fn drain_inbox(&self, core: &mut GridCore) -> Result<()> {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(queued) = next else {
                return Ok(());
            };
            core.handle_model_event(queued.source, queued.event, queued.captured)?;
        }
    }
}

#[derive(Clone)]
pub struct Grid {
    shared: Rc<GridShared>,
}

impl Grid {
    /// Build a grid over a schema model and its subgrids. Exactly one
    /// subgrid must be the main one.
    pub fn new(
        name: impl Into<String>,
        config: GridConfig,
        schema: Rc<dyn SchemaModel>,
        subgrids: Vec<SubgridSpec>,
    ) -> Result<Self> {
        config.validate()?;
        let (main_index, main_model) = find_main_subgrid(&subgrids)?;
        let name = name.into();
        let history = config.events.event_history_size;
        let models = (schema.clone(), main_model.clone());
        let mut core = GridCore::new(name.clone(), config, schema, subgrids, main_index, main_model);

        let shared = Rc::new_cyclic(move |weak: &Weak<GridShared>| {
            core.subscribe_listeners(weak);
            GridShared {
                name,
                core: RefCell::new(core),
                inbox: RefCell::new(VecDeque::new()),
                dispatcher: RefCell::new(GridEventDispatcher::new(history)),
                destroyed: Cell::new(false),
                flushing: Cell::new(false),
                schema: models.0,
                main_model: models.1,
                main_index,
            }
        });

        let grid = Self { shared };
        grid.update(|core| {
            core.create_columns();
            Ok(())
        })?;
        info!(target: "grid", "Grid '{}' created", grid.name());
        Ok(grid)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Run a mutation against the core. Model events raised meanwhile are
    /// handled before this returns, then consumers are notified.
    pub fn update<R>(&self, f: impl FnOnce(&mut GridCore) -> Result<R>) -> Result<R> {
        if self.shared.destroyed.get() {
            bail!("Grid '{}' has been destroyed", self.name());
        }
        let result = {
            let mut core = self
                .shared
                .core
                .try_borrow_mut()
                .map_err(|_| anyhow!("Grid '{}' is already being updated", self.name()))?;
            let result = f(&mut core);
            core.collect_notifications();
            let drained = self.shared.drain_inbox(&mut core);
            result.and_then(|value| drained.map(|_| value))
        };
        self.shared.flush_events();
        result
    }

    /// Read from the core
    pub fn read<R>(&self, f: impl FnOnce(&GridCore) -> R) -> Result<R> {
        let core = self
            .shared
            .core
            .try_borrow()
            .map_err(|_| anyhow!("Grid '{}' is being updated", self.name()))?;
        Ok(f(&core))
    }

    pub fn subscribe(&self, subscriber: Box<dyn GridEventSubscriber>) {
        self.shared.dispatcher.borrow_mut().subscribe(subscriber);
    }

    pub fn unsubscribe(&self, name: &str) -> usize {
        self.shared.dispatcher.borrow_mut().unsubscribe(name)
    }

    pub fn event_history(&self) -> Vec<GridEvent> {
        self.shared.dispatcher.borrow().get_event_history()
    }

    /// Check models that cannot push changes. Returns how many subgrids
    /// changed row count.
    pub fn poll_data_models(&self) -> Result<usize> {
        self.update(|core| core.poll_data_models())
    }

    /// Disconnect from the models. Later callbacks are dropped silently and
    /// later updates fail.
    pub fn destroy(&self) {
        if self.shared.destroyed.replace(true) {
            return;
        }
        let dropped = {
            let mut inbox = self.shared.inbox.borrow_mut();
            let dropped = inbox.len();
            inbox.clear();
            dropped
        };
        match self.shared.core.try_borrow_mut() {
            Ok(mut core) => core.teardown(),
            Err(_) => warn!(target: "grid", "Grid '{}' destroyed during an update", self.name()),
        }
        info!(target: "grid", "Grid '{}' destroyed ({} queued events dropped)", self.name(), dropped);
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.get()
    }

    /// Whether two handles refer to the same grid
    pub fn ptr_eq(&self, other: &Grid) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("name", &self.shared.name)
            .field("destroyed", &self.shared.destroyed.get())
            .finish()
    }
}

/// Everything a grid owns. Reached through `Grid::update` / `Grid::read`.
pub struct GridCore {
    pub(crate) name: String,
    pub(crate) config: GridConfig,
    pub(crate) schema: Rc<dyn SchemaModel>,
    pub(crate) schema_subscribed: bool,
    pub(crate) subgrids: Vec<Subgrid>,
    pub(crate) main_index: usize,
    pub(crate) main_model: Rc<dyn MainDataModel>,
    pub(crate) columns: ColumnIndexTable,
    pub(crate) width_calculator: ColumnWidthCalculator,
    pub(crate) selection: Selection,
    pub(crate) stash: SelectionStash,
    pub(crate) viewport: ViewportManager,
    pub(crate) schema_batch: ChangeBatch,
    pub(crate) data_batch: ChangeBatch,
    /// Consolidation work accumulated inside batches
    pub(crate) shape_pending: bool,
    pub(crate) state_pending: bool,
    pub(crate) recreate_columns_pending: bool,
    /// Events waiting for delivery to subscribers
    pub(crate) outbox: Vec<GridEvent>,
}

impl GridCore {
    fn new(
        name: String,
        config: GridConfig,
        schema: Rc<dyn SchemaModel>,
        subgrids: Vec<SubgridSpec>,
        main_index: usize,
        main_model: Rc<dyn MainDataModel>,
    ) -> Self {
        Self {
            columns: ColumnIndexTable::new(&config.columns),
            width_calculator: ColumnWidthCalculator::new(&config.columns),
            selection: Selection::new(&config.selection),
            stash: SelectionStash::new(&config.selection),
            viewport: ViewportManager::new(&config.scrolling),
            schema_batch: ChangeBatch::new(ChangeClass::Schema),
            data_batch: ChangeBatch::new(ChangeClass::Data),
            shape_pending: false,
            state_pending: false,
            recreate_columns_pending: false,
            outbox: Vec::new(),
            subgrids: subgrids.into_iter().map(Subgrid::new).collect(),
            schema_subscribed: false,
            name,
            config,
            schema,
            main_index,
            main_model,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &ColumnIndexTable {
        &self.columns
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Direct selection access. Change notifications are collected when
    /// the surrounding `Grid::update` returns.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn stash(&self) -> &SelectionStash {
        &self.stash
    }

    pub fn viewport(&self) -> &ViewportManager {
        &self.viewport
    }

    pub fn main_model(&self) -> &Rc<dyn MainDataModel> {
        &self.main_model
    }

    pub fn schema_model(&self) -> &Rc<dyn SchemaModel> {
        &self.schema
    }

    pub fn subgrids(&self) -> &[Subgrid] {
        &self.subgrids
    }

    pub fn subgrid(&self, role: SubgridRole) -> Option<&Subgrid> {
        self.subgrids.iter().find(|s| s.role == role)
    }

    pub fn main_subgrid(&self) -> &Subgrid {
        &self.subgrids[self.main_index]
    }

    pub fn is_schema_subscribed(&self) -> bool {
        self.schema_subscribed
    }

    pub fn is_changing(&self) -> bool {
        self.schema_batch.is_active() || self.data_batch.is_active()
    }

    pub(crate) fn push_event(&mut self, event: GridEvent) {
        trace!(target: "grid", "{}: queue {}", self.name, event);
        self.outbox.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Turn a pending selection notification into an event
    pub(crate) fn collect_notifications(&mut self) {
        if self.selection.take_notification() {
            self.push_event(GridEvent::SelectionChanged);
        }
    }

    pub(crate) fn teardown(&mut self) {
        self.stash.abandon(&mut self.selection);
        self.outbox.clear();
    }

    /// Rebuild columns from the schema. Selections referring to columns are
    /// dropped since active indexes restart from schema order.
    pub fn create_columns(&mut self) {
        let schema = self.schema.get_schema();
        self.columns.create_columns(&schema);
        self.selection.adjust_for_all_columns_deleted();
        self.recreate_columns_pending = false;
        self.viewport.reset_horizontal();
        let column_count = self.columns.active_column_count();
        debug!(target: "grid", "{}: columns created ({})", self.name, column_count);
        self.push_event(GridEvent::ColumnsCreated { column_count });
        self.relayout();
    }

    /// Push current column widths and row count into the viewport
    pub(crate) fn relayout(&mut self) {
        let before = (self.viewport.anchor(), self.viewport.viewport_start());
        self.viewport
            .set_column_widths(self.columns.active_column_widths());
        self.viewport.set_row_count(self.main_model.get_row_count());
        self.announce_viewport(before);
    }

    fn announce_viewport(&mut self, before: (crate::ui::viewport::ScrollAnchor, u32)) {
        let anchor = self.viewport.anchor();
        let viewport_start = self.viewport.viewport_start();
        if (anchor, viewport_start) != before {
            self.push_event(GridEvent::ViewportChanged {
                anchor,
                viewport_start,
            });
        }
    }

    fn apply_columns_change(&mut self, change: &ActiveColumnsChange) {
        if change.is_empty() {
            return;
        }
        self.selection.begin_change();
        if let Some(moves) = &change.moves {
            // Pure reposition: selections travel with their columns
            for &(from, to) in moves {
                self.selection.adjust_for_columns_moved(from, to, 1);
            }
        } else {
            for &removed in &change.removed {
                self.selection.adjust_for_columns_deleted(removed, 1);
            }
            if let Some(at) = change.inserted_at {
                self.selection
                    .adjust_for_columns_inserted(at, change.inserted_count);
            }
        }
        if let Err(e) = self.selection.end_change() {
            warn!(target: "grid", "selection batch out of step: {}", e);
        }
        self.push_event(GridEvent::ShapeChanged);
        self.relayout();
    }

    pub fn show_columns(
        &mut self,
        kind: ColumnIndexKind,
        indexes: &[usize],
        placement: ColumnPlacement,
        allow_duplicates: bool,
    ) -> ActiveColumnsChange {
        let change = self
            .columns
            .show_columns(kind, indexes, placement, allow_duplicates);
        self.apply_columns_change(&change);
        change
    }

    pub fn hide_columns(&mut self, kind: ColumnIndexKind, indexes: &[usize]) -> ActiveColumnsChange {
        let change = self.columns.hide_columns(kind, indexes);
        self.apply_columns_change(&change);
        change
    }

    pub fn move_column_before(&mut self, source: usize, target: usize) -> Option<usize> {
        let destination = self.columns.move_column_before(source, target)?;
        self.after_column_move(source, destination);
        Some(destination)
    }

    pub fn move_column_after(&mut self, source: usize, target: usize) -> Option<usize> {
        let destination = self.columns.move_column_after(source, target)?;
        self.after_column_move(source, destination);
        Some(destination)
    }

    fn after_column_move(&mut self, source: usize, destination: usize) {
        if source == destination {
            return;
        }
        self.selection
            .adjust_for_columns_moved(source, destination, 1);
        self.push_event(GridEvent::ShapeChanged);
        self.relayout();
    }

    /// Swap two active columns. Selections stay on their positions.
    pub fn swap_columns(&mut self, source: usize, target: usize) -> bool {
        let swapped = self.columns.swap_columns(source, target);
        if swapped && source != target {
            self.push_event(GridEvent::ShapeChanged);
            self.relayout();
        }
        swapped
    }

    pub fn set_column_width(&mut self, active_index: usize, width: u32) -> bool {
        let changed = self.columns.set_column_width(active_index, width);
        if changed {
            self.relayout();
        }
        changed
    }

    /// Record measured content widths (by schema index) and re-run
    /// autosizing
    pub fn update_preferred_widths(&mut self, widths: &[(usize, u32)], force: bool) -> bool {
        for &(all_index, width) in widths {
            self.columns.set_preferred_width(all_index, width);
        }
        self.check_column_autosizing(force)
    }

    pub fn check_column_autosizing(&mut self, force: bool) -> bool {
        let changed = self
            .columns
            .check_column_autosizing(force, &self.width_calculator);
        if changed {
            self.relayout();
        }
        changed
    }

    /// Field behind an active column
    pub fn active_field(&self, active_index: usize) -> Option<&SchemaField> {
        self.columns.active_column(active_index).map(|c| &c.field)
    }

    /// Value of a main subgrid cell addressed by active column and row
    pub fn cell_value(&self, active_index: usize, row_index: usize) -> Option<DataValue> {
        let field = self.active_field(active_index)?;
        if row_index >= self.main_model.get_row_count() {
            return None;
        }
        Some(self.main_model.get_value(field, row_index))
    }

    pub fn set_canvas_size(&mut self, width: u32, row_capacity: usize) {
        let before = (self.viewport.anchor(), self.viewport.viewport_start());
        self.viewport.set_canvas_width(width);
        self.viewport.set_row_capacity(row_capacity);
        self.announce_viewport(before);
    }

    fn navigated(&mut self, result: NavigationResult) -> NavigationResult {
        if result.viewport_changed {
            self.push_event(GridEvent::ViewportChanged {
                anchor: result.anchor,
                viewport_start: result.viewport_start,
            });
        }
        result
    }

    pub fn scroll_columns_by(&mut self, delta: isize) -> NavigationResult {
        let result = self.viewport.scroll_columns_by(delta);
        self.navigated(result)
    }

    pub fn scroll_column_into_view(&mut self, active_index: usize) -> NavigationResult {
        let result = self.viewport.scroll_column_into_view(active_index);
        self.navigated(result)
    }

    pub fn set_viewport_start(&mut self, viewport_start: u32) -> NavigationResult {
        let result = self.viewport.set_viewport_start(viewport_start);
        self.navigated(result)
    }

    pub fn scroll_rows_by(&mut self, delta: isize) -> RowNavigationResult {
        let result = self.viewport.scroll_rows_by(delta);
        if result.viewport_changed {
            self.push_event(GridEvent::ViewportChanged {
                anchor: self.viewport.anchor(),
                viewport_start: self.viewport.viewport_start(),
            });
        }
        result
    }

    /// Mark the start of a paint pass; layouts requested meanwhile wait
    pub fn begin_render(&mut self) {
        self.viewport.begin_render();
    }

    pub fn end_render(&mut self) {
        let before = (self.viewport.anchor(), self.viewport.viewport_start());
        if self.viewport.end_render() {
            self.announce_viewport(before);
        }
    }
}
