use revgrid_core::config::GridConfig;
use revgrid_core::data::datatable::{DataRow, DataTable, DataValue, SchemaField};
use revgrid_core::state::{GridEvent, GridEventSubscriber, RecordingSubscriber};
use revgrid_core::subgrid::{SubgridRole, SubgridSpec};
use revgrid_core::{ColumnIndexKind, ColumnPlacement, Grid, GridRegistry};
use std::cell::RefCell;
use std::rc::Rc;

fn create_table(name: &str, columns: &[&str], rows: usize) -> Rc<DataTable> {
    let fields = columns.iter().map(|c| SchemaField::new(*c)).collect();
    let table = DataTable::new(name, fields);
    for i in 0..rows {
        let values = columns
            .iter()
            .map(|c| DataValue::String(format!("{}{}", c, i)))
            .collect();
        table.add_row(DataRow::new(i as i64, values)).unwrap();
    }
    Rc::new(table)
}

fn create_grid(table: &Rc<DataTable>) -> Grid {
    Grid::new(
        table.name(),
        GridConfig::default(),
        table.clone(),
        vec![SubgridSpec::main(table.clone())],
    )
    .unwrap()
}

fn event_names(grid: &Grid) -> Vec<&'static str> {
    grid.event_history().iter().map(|e| e.name()).collect()
}

#[test]
fn test_exactly_one_main_subgrid_required() {
    let table = create_table("t", &["a"], 1);
    let header = create_table("h", &["a"], 1);

    let none = Grid::new(
        "none",
        GridConfig::default(),
        table.clone(),
        vec![SubgridSpec::secondary(SubgridRole::Header, header.clone())],
    );
    assert!(none.is_err());

    let two = Grid::new(
        "two",
        GridConfig::default(),
        table.clone(),
        vec![SubgridSpec::main(table.clone()), SubgridSpec::main(header.clone())],
    );
    assert!(two.is_err());
    // A failed construction leaves no listener attached
    assert_eq!(table.listener_counts(), (0, 0));
}

#[test]
fn test_creation_announces_columns() {
    let table = create_table("t", &["a", "b", "c"], 2);
    let grid = create_grid(&table);
    let created = grid
        .event_history()
        .iter()
        .any(|e| matches!(e, GridEvent::ColumnsCreated { column_count: 3 }));
    assert!(created);
    assert_eq!(table.listener_counts(), (1, 1));
}

#[test]
fn test_hiding_column_keeps_other_selection_attached() {
    let table = create_table("t", &["a", "b", "c"], 2);
    let grid = create_grid(&table);
    grid.update(|core| {
        core.selection_mut().select_columns(1, 1);
        Ok(())
    })
    .unwrap();

    grid.update(|core| {
        core.hide_columns(ColumnIndexKind::Active, &[0]);
        Ok(())
    })
    .unwrap();

    let (columns, names) = grid
        .read(|core| (core.selection().selected_columns(), core.columns().active_column_names()))
        .unwrap();
    assert_eq!(columns, vec![0]);
    assert_eq!(names, vec!["b", "c"]);
    assert!(event_names(&grid).contains(&"ShapeChanged"));
}

#[test]
fn test_repositioned_column_keeps_selection() {
    let table = create_table("t", &["a", "b", "c"], 2);
    let grid = create_grid(&table);
    grid.update(|core| {
        core.selection_mut().select_columns(0, 0);
        Ok(())
    })
    .unwrap();

    grid.update(|core| {
        core.show_columns(ColumnIndexKind::All, &[0], ColumnPlacement::Append, false);
        Ok(())
    })
    .unwrap();

    let (columns, names) = grid
        .read(|core| (core.selection().selected_columns(), core.columns().active_column_names()))
        .unwrap();
    assert_eq!(names, vec!["b", "c", "a"]);
    assert_eq!(columns, vec![2]);
}

#[test]
fn test_schema_insert_shifts_column_selection() {
    let table = create_table("t", &["a", "b"], 3);
    let grid = create_grid(&table);
    grid.update(|core| {
        core.selection_mut().select_columns(1, 1);
        Ok(())
    })
    .unwrap();

    table
        .insert_column(0, SchemaField::new("new"), DataValue::Null)
        .unwrap();

    let (columns, names) = grid
        .read(|core| (core.selection().selected_columns(), core.columns().active_column_names()))
        .unwrap();
    assert_eq!(columns, vec![2]);
    assert_eq!(names, vec!["new", "a", "b"]);
    let value = grid.read(|core| core.cell_value(2, 1)).unwrap();
    assert_eq!(value, Some(DataValue::String("b1".to_string())));
}

#[test]
fn test_replace_schema_is_one_shape_change() {
    let table = create_table("t", &["a", "b"], 3);
    let grid = create_grid(&table);
    let (recorder, events) = RecordingSubscriber::new("recorder");
    grid.subscribe(Box::new(recorder));
    grid.update(|core| {
        core.selection_mut().select_cell(1, 1);
        Ok(())
    })
    .unwrap();
    events.borrow_mut().clear();

    table
        .replace_schema(vec![SchemaField::new("x"), SchemaField::new("y"), SchemaField::new("z")])
        .unwrap();

    let names = grid.read(|core| core.columns().active_column_names()).unwrap();
    assert_eq!(names, vec!["x", "y", "z"]);
    let empty = grid.read(|core| core.selection().is_empty()).unwrap();
    assert!(empty);

    let recorded = events.borrow();
    assert!(!recorded.iter().any(|e| e.name() == "ColumnsCreated"));
    // One for the schema burst, one for the rows going away
    assert_eq!(recorded.iter().filter(|e| e.name() == "ShapeChanged").count(), 2);
}

#[test]
fn test_header_rename_recreates_columns() {
    let table = create_table("t", &["a", "b"], 1);
    let grid = create_grid(&table);
    grid.update(|core| {
        core.hide_columns(ColumnIndexKind::Active, &[0]);
        Ok(())
    })
    .unwrap();

    table.set_header("b", "Bee").unwrap();

    let names = grid.read(|core| core.columns().active_column_names()).unwrap();
    assert_eq!(names, vec!["a", "b"]);
    let header = grid
        .read(|core| core.active_field(1).map(|f| f.header.clone()))
        .unwrap();
    assert_eq!(header.as_deref(), Some("Bee"));
}

#[test]
fn test_canvas_and_scrolling() {
    let table = create_table("t", &["a", "b", "c", "d", "e"], 10);
    let grid = create_grid(&table);

    grid.update(|core| {
        core.set_canvas_size(250, 4);
        Ok(())
    })
    .unwrap();
    assert!(grid.read(|core| core.viewport().is_content_overflowed()).unwrap());

    let result = grid.update(|core| Ok(core.scroll_columns_by(1))).unwrap();
    assert!(result.viewport_changed);
    assert_eq!((result.anchor.index, result.anchor.offset), (1, 0));
    assert!(event_names(&grid).contains(&"ViewportChanged"));

    let rows = grid.update(|core| Ok(core.scroll_rows_by(100))).unwrap();
    assert_eq!(rows.first_scrollable_row, 6);
    assert_eq!(grid.read(|core| core.viewport().visible_rows()).unwrap(), 6..10);

    // Rows deleted above the viewport pull it up
    table.delete_rows(0, 2).unwrap();
    assert_eq!(grid.read(|core| core.viewport().first_scrollable_row()).unwrap(), 4);
}

/// Subscriber that reads the grid and reacts to shape changes by selecting
/// the first cell
struct FollowUp {
    grid: Grid,
    history_seen: Rc<RefCell<Vec<usize>>>,
}

impl GridEventSubscriber for FollowUp {
    fn on_grid_event(&mut self, event: &GridEvent) {
        self.history_seen
            .borrow_mut()
            .push(self.grid.event_history().len());
        if matches!(event, GridEvent::ShapeChanged) {
            self.grid
                .update(|core| {
                    core.selection_mut().select_cell(0, 0);
                    Ok(())
                })
                .unwrap();
        }
    }

    fn name(&self) -> &str {
        "follow-up"
    }
}

#[test]
fn test_subscriber_may_call_back_into_grid() {
    let table = create_table("t", &["a", "b"], 4);
    let grid = create_grid(&table);
    let history_seen = Rc::new(RefCell::new(Vec::new()));
    grid.subscribe(Box::new(FollowUp {
        grid: grid.clone(),
        history_seen: history_seen.clone(),
    }));

    table.delete_rows(0, 1).unwrap();

    assert!(!history_seen.borrow().is_empty());
    let cell = grid.read(|core| core.selection().single_cell()).unwrap();
    assert_eq!(cell, Some((0, 0)));

    // The selection made from inside the subscriber is delivered after the
    // shape change that caused it
    let names = event_names(&grid);
    let shape = names.iter().rposition(|n| *n == "ShapeChanged").unwrap();
    let selection = names.iter().rposition(|n| *n == "SelectionChanged").unwrap();
    assert!(selection > shape);
    assert_eq!(grid.unsubscribe("follow-up"), 1);
}

#[test]
fn test_cell_value_bounds() {
    let table = create_table("t", &["a", "b"], 2);
    let grid = create_grid(&table);
    let values = grid
        .read(|core| (core.cell_value(1, 0), core.cell_value(2, 0), core.cell_value(0, 2)))
        .unwrap();
    assert_eq!(values, (Some(DataValue::String("b0".to_string())), None, None));
}

#[test]
fn test_update_after_destroy_fails() {
    let table = create_table("t", &["a"], 1);
    let grid = create_grid(&table);
    grid.destroy();
    assert!(grid.is_destroyed());
    assert!(grid.update(|_| Ok(())).is_err());
    // Later model changes are dropped silently
    assert!(table.delete_rows(0, 1).is_ok());
}

#[test]
fn test_registry_lifecycle() {
    let table = create_table("people", &["a"], 1);
    let grid = create_grid(&table);
    let mut registry = GridRegistry::new();

    let id = registry.register(grid.clone());
    assert_eq!(registry.register(grid.clone()), id);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.find_by_name("people"), Some(id));

    let removed = registry.unregister(id, false).unwrap();
    assert!(removed.is_destroyed());
    assert!(registry.is_empty());
    assert!(registry.get(id).is_none());
}
