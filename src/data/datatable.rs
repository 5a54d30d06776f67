use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use crate::data::data_provider::{
    DataCallbackListener, DataCallbackSource, DataModel, MainDataModel, RowIndexLookup,
    SchemaCallbackListener, SchemaCallbackSource, SchemaModel,
};

/// Represents the data type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DataType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
}

/// Column definition as published by a schema model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Stable key of the column
    pub name: String,
    pub header: String,
    pub data_type: DataType,
}

impl SchemaField {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            header: name.clone(),
            name,
            data_type: DataType::String,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(String), // ISO 8601
    Null,
}

impl DataValue {
    /// Ordering used when sorting rows. Nulls sort first, mismatched types
    /// compare equal.
    pub fn compare(&self, other: &DataValue) -> Ordering {
        match (self, other) {
            (DataValue::Integer(a), DataValue::Integer(b)) => a.cmp(b),
            (DataValue::Float(a), DataValue::Float(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (DataValue::Integer(a), DataValue::Float(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (DataValue::Float(a), DataValue::Integer(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (DataValue::String(a), DataValue::String(b)) => a.cmp(b),
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a.cmp(b),
            (DataValue::DateTime(a), DataValue::DateTime(b)) => a.cmp(b),
            (DataValue::Null, DataValue::Null) => Ordering::Equal,
            (DataValue::Null, _) => Ordering::Less,
            (_, DataValue::Null) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(v) => write!(f, "{}", v),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::DateTime(dt) => write!(f, "{}", dt),
            DataValue::Null => write!(f, ""),
        }
    }
}

/// Opaque, model supplied row identifier. Stable across a reindex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowId {
    Integer(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Integer(i) => write!(f, "#{}", i),
            RowId::Text(s) => write!(f, "#{}", s),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Integer(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId::Text(value.to_string())
    }
}

/// A row of values, one per schema field, plus its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub id: RowId,
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(id: impl Into<RowId>, values: Vec<DataValue>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }
}

/// In-memory table implementing the schema, data and main data model
/// capabilities.
///
/// All mutators take `&self`: the table is shared with the grid through an
/// `Rc` and listeners are invoked after internal borrows are released, so a
/// listener may read the table while handling a notification.
pub struct DataTable {
    name: String,
    fields: RefCell<Vec<SchemaField>>,
    rows: RefCell<Vec<DataRow>>,
    data_listeners: RefCell<Vec<Rc<dyn DataCallbackListener>>>,
    schema_listeners: RefCell<Vec<Rc<dyn SchemaCallbackListener>>>,
}

impl fmt::Debug for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("name", &self.name)
            .field("columns", &self.fields.borrow().len())
            .field("rows", &self.rows.borrow().len())
            .finish()
    }
}

impl DataTable {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            fields: RefCell::new(fields),
            rows: RefCell::new(Vec::new()),
            data_listeners: RefCell::new(Vec::new()),
            schema_listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_count(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.fields.borrow().iter().position(|f| f.name == name)
    }

    /// Append a row without notifying listeners (initial population)
    pub fn add_row(&self, row: DataRow) -> Result<()> {
        self.check_row(&row)?;
        self.rows.borrow_mut().push(row);
        Ok(())
    }

    fn check_row(&self, row: &DataRow) -> Result<()> {
        let expected = self.column_count();
        if row.values.len() != expected {
            bail!(
                "Row {} has {} values, table '{}' has {} columns",
                row.id,
                row.values.len(),
                self.name,
                expected
            );
        }
        Ok(())
    }

    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.borrow().iter().map(|r| r.id.clone()).collect()
    }

    pub fn insert_rows(&self, row_index: usize, rows: Vec<DataRow>) -> Result<()> {
        if row_index > self.row_count() {
            bail!(
                "Insert position {} beyond row count {}",
                row_index,
                self.row_count()
            );
        }
        for row in &rows {
            self.check_row(row)?;
        }
        let count = rows.len();
        {
            let mut existing = self.rows.borrow_mut();
            existing.splice(row_index..row_index, rows);
        }
        debug!(target: "datatable", "{}: inserted {} rows at {}", self.name, count, row_index);
        self.notify_data(|l| l.rows_inserted(row_index, count))
    }

    pub fn delete_rows(&self, row_index: usize, count: usize) -> Result<()> {
        let end = row_index + count;
        if end > self.row_count() {
            bail!(
                "Delete range {}..{} beyond row count {}",
                row_index,
                end,
                self.row_count()
            );
        }
        self.rows.borrow_mut().drain(row_index..end);
        debug!(target: "datatable", "{}: deleted {} rows at {}", self.name, count, row_index);
        self.notify_data(|l| l.rows_deleted(row_index, count))
    }

    /// Move `count` rows starting at `old_row_index` so the first of them
    /// ends up at `new_row_index`
    pub fn move_rows(&self, old_row_index: usize, new_row_index: usize, count: usize) -> Result<()> {
        let len = self.row_count();
        if old_row_index + count > len || new_row_index + count > len {
            bail!(
                "Move of {} rows from {} to {} out of range for {} rows",
                count,
                old_row_index,
                new_row_index,
                len
            );
        }
        {
            let mut rows = self.rows.borrow_mut();
            let moved: Vec<DataRow> = rows.drain(old_row_index..old_row_index + count).collect();
            rows.splice(new_row_index..new_row_index, moved);
        }
        self.notify_data(|l| l.rows_moved(old_row_index, new_row_index, count))
    }

    pub fn clear_rows(&self) -> Result<()> {
        self.rows.borrow_mut().clear();
        self.notify_data(|l| l.all_rows_deleted())
    }

    pub fn set_value(&self, row_index: usize, column_name: &str, value: DataValue) -> Result<()> {
        let column_index = self
            .get_column_index(column_name)
            .ok_or_else(|| anyhow!("Unknown column '{}'", column_name))?;
        {
            let mut rows = self.rows.borrow_mut();
            let row = rows
                .get_mut(row_index)
                .ok_or_else(|| anyhow!("Row index {} out of bounds", row_index))?;
            if let Some(slot) = row.values.get_mut(column_index) {
                *slot = value;
            }
        }
        self.notify_data(|l| l.invalidate_cell(column_index, row_index))
    }

    /// Sort rows by a column. Row identities survive; indexes do not, so the
    /// change is announced as a reindex.
    pub fn sort_by(&self, column_name: &str, ascending: bool) -> Result<()> {
        let column_index = self
            .get_column_index(column_name)
            .ok_or_else(|| anyhow!("Unknown column '{}'", column_name))?;

        self.notify_data(|l| l.pre_reindex())?;
        {
            let mut rows = self.rows.borrow_mut();
            rows.sort_by(|a, b| {
                let cmp = match (a.values.get(column_index), b.values.get(column_index)) {
                    (Some(va), Some(vb)) => va.compare(vb),
                    _ => Ordering::Equal,
                };
                if ascending {
                    cmp
                } else {
                    cmp.reverse()
                }
            });
        }
        debug!(target: "datatable", "{}: sorted by '{}' (ascending={})", self.name, column_name, ascending);
        self.notify_data(|l| l.post_reindex())
    }

    /// Insert a column at schema position `index`, filling existing rows
    /// with `default`
    pub fn insert_column(&self, index: usize, field: SchemaField, default: DataValue) -> Result<()> {
        if index > self.column_count() {
            bail!("Column position {} beyond column count {}", index, self.column_count());
        }
        self.fields.borrow_mut().insert(index, field);
        for row in self.rows.borrow_mut().iter_mut() {
            row.values.insert(index, default.clone());
        }
        self.notify_schema(|l| l.columns_inserted(index, 1))
    }

    pub fn add_column(&self, field: SchemaField, default: DataValue) -> Result<()> {
        self.insert_column(self.column_count(), field, default)
    }

    pub fn remove_column(&self, name: &str) -> Result<()> {
        let index = self
            .get_column_index(name)
            .ok_or_else(|| anyhow!("Unknown column '{}'", name))?;
        self.fields.borrow_mut().remove(index);
        for row in self.rows.borrow_mut().iter_mut() {
            if index < row.values.len() {
                row.values.remove(index);
            }
        }
        self.notify_schema(|l| l.columns_deleted(index, 1))
    }

    /// Swap in a new schema. Existing rows no longer fit it and are dropped.
    pub fn replace_schema(&self, fields: Vec<SchemaField>) -> Result<()> {
        let count = fields.len();
        self.notify_schema(|l| l.begin_change())?;
        *self.fields.borrow_mut() = fields;
        self.rows.borrow_mut().clear();
        debug!(target: "datatable", "{}: schema replaced with {} columns", self.name, count);
        let result = self
            .notify_schema(|l| l.all_columns_deleted())
            .and_then(|_| self.notify_schema(|l| l.columns_inserted(0, count)))
            .and_then(|_| self.notify_data(|l| l.all_rows_deleted()));
        let end = self.notify_schema(|l| l.end_change());
        result.and(end)
    }

    /// Change a column's header text. Announced as a general schema change.
    pub fn set_header(&self, name: &str, header: impl Into<String>) -> Result<()> {
        {
            let mut fields = self.fields.borrow_mut();
            let field = fields
                .iter_mut()
                .find(|f| f.name == name)
                .ok_or_else(|| anyhow!("Unknown column '{}'", name))?;
            field.header = header.into();
        }
        self.notify_schema(|l| l.schema_changed())
    }

    /// Run several mutations as one change burst. Listeners see a single
    /// begin/end pair around everything `f` does.
    pub fn apply<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&Self) -> Result<()>,
    {
        self.notify_schema(|l| l.begin_change())?;
        self.notify_data(|l| l.begin_change())?;
        let result = f(self);
        let data_end = self.notify_data(|l| l.end_change());
        let schema_end = self.notify_schema(|l| l.end_change());
        result.and(data_end).and(schema_end)
    }

    /// Listener handles the table currently notifies (schema, data)
    pub fn listener_counts(&self) -> (usize, usize) {
        (
            self.schema_listeners.borrow().len(),
            self.data_listeners.borrow().len(),
        )
    }

    fn notify_data<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&dyn DataCallbackListener) -> Result<()>,
    {
        let listeners: Vec<Rc<dyn DataCallbackListener>> = self.data_listeners.borrow().clone();
        for listener in &listeners {
            f(listener.as_ref())?;
        }
        Ok(())
    }

    fn notify_schema<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&dyn SchemaCallbackListener) -> Result<()>,
    {
        let listeners: Vec<Rc<dyn SchemaCallbackListener>> =
            self.schema_listeners.borrow().clone();
        for listener in &listeners {
            f(listener.as_ref())?;
        }
        Ok(())
    }
}

impl SchemaModel for DataTable {
    fn get_schema(&self) -> Vec<SchemaField> {
        self.fields.borrow().clone()
    }

    fn callback_source(&self) -> Option<&dyn SchemaCallbackSource> {
        Some(self)
    }
}

impl SchemaCallbackSource for DataTable {
    fn add_schema_callback_listener(&self, listener: Rc<dyn SchemaCallbackListener>) {
        self.schema_listeners.borrow_mut().push(listener);
    }
}

impl DataModel for DataTable {
    fn get_row_count(&self) -> usize {
        self.row_count()
    }

    fn get_value(&self, field: &SchemaField, row_index: usize) -> DataValue {
        let Some(column_index) = self.get_column_index(&field.name) else {
            return DataValue::Null;
        };
        self.rows
            .borrow()
            .get(row_index)
            .and_then(|row| row.values.get(column_index).cloned())
            .unwrap_or(DataValue::Null)
    }

    fn callback_source(&self) -> Option<&dyn DataCallbackSource> {
        Some(self)
    }
}

impl DataCallbackSource for DataTable {
    fn add_data_callback_listener(&self, listener: Rc<dyn DataCallbackListener>) {
        self.data_listeners.borrow_mut().push(listener);
    }
}

impl MainDataModel for DataTable {
    fn get_row_id_from_index(&self, row_index: usize) -> Option<RowId> {
        self.rows.borrow().get(row_index).map(|r| r.id.clone())
    }

    fn row_index_lookup(&self) -> Option<&dyn RowIndexLookup> {
        Some(self)
    }
}

impl RowIndexLookup for DataTable {
    fn get_row_index_from_id(&self, id: &RowId) -> Option<usize> {
        self.rows.borrow().iter().position(|r| &r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_table() -> DataTable {
        let table = DataTable::new(
            "people",
            vec![
                SchemaField::new("name"),
                SchemaField::new("age").with_type(DataType::Integer),
            ],
        );
        for (i, (name, age)) in [("carol", 41), ("alice", 29), ("bob", 35)].iter().enumerate() {
            table
                .add_row(DataRow::new(
                    i as i64,
                    vec![DataValue::String(name.to_string()), DataValue::Integer(*age)],
                ))
                .unwrap();
        }
        table
    }

    #[test]
    fn test_add_row_rejects_wrong_width() {
        let table = create_test_table();
        let result = table.add_row(DataRow::new(9, vec![DataValue::Null]));
        assert!(result.is_err());
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_sort_keeps_row_ids() {
        let table = create_test_table();
        table.sort_by("age", true).unwrap();
        assert_eq!(
            table.row_ids(),
            vec![RowId::Integer(1), RowId::Integer(2), RowId::Integer(0)]
        );
        assert_eq!(table.get_row_index_from_id(&RowId::Integer(0)), Some(2));
    }

    #[test]
    fn test_move_rows() {
        let table = create_test_table();
        table.move_rows(0, 2, 1).unwrap();
        assert_eq!(
            table.row_ids(),
            vec![RowId::Integer(1), RowId::Integer(2), RowId::Integer(0)]
        );
        assert!(table.move_rows(2, 2, 5).is_err());
    }

    #[test]
    fn test_get_value_by_field() {
        let table = create_test_table();
        let age = SchemaField::new("age");
        assert_eq!(table.get_value(&age, 1), DataValue::Integer(29));
        assert_eq!(table.get_value(&age, 10), DataValue::Null);
        assert_eq!(table.get_value(&SchemaField::new("missing"), 0), DataValue::Null);
    }

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(
            DataValue::Null.compare(&DataValue::Integer(1)),
            Ordering::Less
        );
        assert_eq!(
            DataValue::Integer(2).compare(&DataValue::Float(1.5)),
            Ordering::Greater
        );
    }
}
