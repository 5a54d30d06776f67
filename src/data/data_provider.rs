//! Model capability traits
//!
//! The grid never owns its data. It talks to one schema model and one data
//! model per subgrid through the traits below. Optional capabilities (change
//! callbacks, id -> index lookup) are exposed as explicit accessor methods
//! returning `Option<&dyn ...>`, so whether the router subscribes or polls is
//! decided by a visible branch instead of probing.

use anyhow::Result;
use std::rc::Rc;

use crate::data::datatable::{DataValue, RowId, SchemaField};

/// Source of the column definitions, in schema order
pub trait SchemaModel {
    /// Get every column defined by the schema
    fn get_schema(&self) -> Vec<SchemaField>;

    /// Callback subscription capability, if the model can push changes
    fn callback_source(&self) -> Option<&dyn SchemaCallbackSource> {
        None
    }
}

/// A schema model that can push change notifications
pub trait SchemaCallbackSource {
    fn add_schema_callback_listener(&self, listener: Rc<dyn SchemaCallbackListener>);
}

/// Receiver of schema change notifications.
///
/// Every method returns a `Result` so a contract violation detected while
/// routing the notification reaches the model that raised it.
pub trait SchemaCallbackListener {
    fn begin_change(&self) -> Result<()>;
    fn end_change(&self) -> Result<()>;
    fn columns_inserted(&self, index: usize, count: usize) -> Result<()>;
    fn columns_deleted(&self, index: usize, count: usize) -> Result<()>;
    fn all_columns_deleted(&self) -> Result<()>;
    fn schema_changed(&self) -> Result<()>;

    /// The columns the grid currently shows, in display order
    fn get_active_schema_columns(&self) -> Vec<SchemaField>;
}

/// Row oriented data access used by every subgrid
pub trait DataModel {
    /// Get the total number of rows
    fn get_row_count(&self) -> usize;

    /// Get a single cell value. Out of range requests return `DataValue::Null`
    fn get_value(&self, field: &SchemaField, row_index: usize) -> DataValue;

    /// Callback subscription capability, if the model can push changes
    fn callback_source(&self) -> Option<&dyn DataCallbackSource> {
        None
    }
}

/// The data model of the main subgrid. Rows carry stable identifiers that
/// survive a reindex.
pub trait MainDataModel: DataModel {
    /// Get the identifier of the row currently at `row_index`
    fn get_row_id_from_index(&self, row_index: usize) -> Option<RowId>;

    /// Direct id -> index lookup capability. When absent, callers fall back
    /// to a linear scan over `get_row_id_from_index`.
    fn row_index_lookup(&self) -> Option<&dyn RowIndexLookup> {
        None
    }
}

pub trait RowIndexLookup {
    fn get_row_index_from_id(&self, id: &RowId) -> Option<usize>;
}

/// Resolve a row id to its current index, using the model's lookup when it
/// has one and a linear scan otherwise
pub fn find_row_index(model: &dyn MainDataModel, id: &RowId) -> Option<usize> {
    match model.row_index_lookup() {
        Some(lookup) => lookup.get_row_index_from_id(id),
        None => (0..model.get_row_count())
            .find(|&index| model.get_row_id_from_index(index).as_ref() == Some(id)),
    }
}

/// A data model that can push change notifications
pub trait DataCallbackSource {
    fn add_data_callback_listener(&self, listener: Rc<dyn DataCallbackListener>);
}

/// Receiver of data change notifications
pub trait DataCallbackListener {
    fn begin_change(&self) -> Result<()>;
    fn end_change(&self) -> Result<()>;
    fn rows_inserted(&self, row_index: usize, count: usize) -> Result<()>;
    fn rows_deleted(&self, row_index: usize, count: usize) -> Result<()>;
    fn all_rows_deleted(&self) -> Result<()>;
    fn row_count_changed(&self) -> Result<()>;
    fn rows_moved(&self, old_row_index: usize, new_row_index: usize, count: usize) -> Result<()>;
    fn invalidate_all(&self) -> Result<()>;
    fn invalidate_rows(&self, row_index: usize, count: usize) -> Result<()>;
    fn invalidate_row(&self, row_index: usize) -> Result<()>;
    fn invalidate_row_columns(
        &self,
        row_index: usize,
        schema_column_index: usize,
        column_count: usize,
    ) -> Result<()>;
    fn invalidate_row_cells(&self, row_index: usize, schema_column_indexes: &[usize])
        -> Result<()>;
    fn invalidate_cell(&self, schema_column_index: usize, row_index: usize) -> Result<()>;

    /// Only meaningful for the main model; other subgrids ignore it
    fn pre_reindex(&self) -> Result<()>;
    fn post_reindex(&self) -> Result<()>;
}
