//! Data layer
//!
//! Model capability traits the grid consumes, an in-memory table
//! implementing them, and the column index table mapping schema order to
//! display order.

pub mod column_index;
pub mod data_provider;
pub mod datatable;
