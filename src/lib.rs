//! Viewport index and selection-consistency engine for a virtualized grid
//!
//! A [`Grid`] keeps the mapping between schema columns and displayed
//! columns, the horizontal scroll anchor, and the selection consistent
//! while external models insert, delete, move and reindex rows.

pub mod config;
pub mod data;
pub mod grid;
pub mod registry;
pub mod state;
pub mod subgrid;
pub mod ui;
pub mod utils;

pub use config::GridConfig;
pub use data::column_index::{ColumnIndexKind, ColumnIndexTable, ColumnPlacement};
pub use data::data_provider::{DataModel, MainDataModel, SchemaModel};
pub use data::datatable::{DataRow, DataTable, DataValue, RowId, SchemaField};
pub use grid::{Grid, GridCore};
pub use registry::{GridId, GridRegistry};
pub use state::{GridEvent, GridEventSubscriber, ModelEvent};
pub use subgrid::{SubgridRole, SubgridSpec};
pub use ui::selection::Selection;
pub use ui::viewport::{AnchorLimits, HorizontalScrollLayout, ScrollAnchor, ScrollDimension};
