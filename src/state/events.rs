//! Model callbacks and grid notifications

use chrono::{DateTime, Local};
use std::fmt;

use crate::state::batch::ChangeClass;
use crate::subgrid::SubgridRole;
use crate::ui::viewport::scroll_anchor::ScrollAnchor;

/// Fixed vocabulary every schema/data model callback is normalized into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// Schema model opened a change burst
    SchemaBeginChange,
    SchemaEndChange,
    ColumnsInserted { index: usize, count: usize },
    ColumnsDeleted { index: usize, count: usize },
    AllColumnsDeleted,
    SchemaChanged,

    /// Data model opened a change burst
    DataBeginChange,
    DataEndChange,
    RowsInserted { row_index: usize, count: usize },
    RowsDeleted { row_index: usize, count: usize },
    AllRowsDeleted,
    RowCountChanged,
    RowsMoved {
        old_row_index: usize,
        new_row_index: usize,
        count: usize,
    },
    InvalidateAll,
    InvalidateRows { row_index: usize, count: usize },
    InvalidateRow { row_index: usize },
    InvalidateRowColumns {
        row_index: usize,
        schema_column_index: usize,
        column_count: usize,
    },
    InvalidateRowCells {
        row_index: usize,
        schema_column_indexes: Vec<usize>,
    },
    InvalidateCell {
        schema_column_index: usize,
        row_index: usize,
    },

    /// Row order is about to be (or has been) rebuilt; row ids survive
    PreReindex,
    PostReindex,
}

impl ModelEvent {
    pub fn class(&self) -> ChangeClass {
        match self {
            Self::SchemaBeginChange
            | Self::SchemaEndChange
            | Self::ColumnsInserted { .. }
            | Self::ColumnsDeleted { .. }
            | Self::AllColumnsDeleted
            | Self::SchemaChanged => ChangeClass::Schema,
            _ => ChangeClass::Data,
        }
    }

    /// Whether the event changes the number or order of rows/columns
    pub fn changes_shape(&self) -> bool {
        matches!(
            self,
            Self::ColumnsInserted { .. }
                | Self::ColumnsDeleted { .. }
                | Self::AllColumnsDeleted
                | Self::SchemaChanged
                | Self::RowsInserted { .. }
                | Self::RowsDeleted { .. }
                | Self::AllRowsDeleted
                | Self::RowCountChanged
                | Self::RowsMoved { .. }
                | Self::PreReindex
                | Self::PostReindex
        )
    }

    /// Row or column range the event refers to
    pub fn payload(&self) -> EventPayload {
        match *self {
            Self::ColumnsInserted { index, count } | Self::ColumnsDeleted { index, count } => {
                EventPayload::Columns { index, count }
            }
            Self::RowsInserted { row_index, count }
            | Self::RowsDeleted { row_index, count }
            | Self::InvalidateRows { row_index, count } => EventPayload::Rows {
                index: row_index,
                count,
            },
            Self::RowsMoved {
                old_row_index,
                new_row_index,
                count,
            } => EventPayload::RowsMoved {
                old_index: old_row_index,
                new_index: new_row_index,
                count,
            },
            Self::InvalidateRow { row_index } => EventPayload::Rows {
                index: row_index,
                count: 1,
            },
            Self::InvalidateRowColumns {
                row_index,
                schema_column_index,
                column_count,
            } => EventPayload::Cells {
                row_index,
                column_index: schema_column_index,
                column_count,
            },
            Self::InvalidateRowCells { row_index, .. } => EventPayload::Rows {
                index: row_index,
                count: 1,
            },
            Self::InvalidateCell {
                schema_column_index,
                row_index,
            } => EventPayload::Cells {
                row_index,
                column_index: schema_column_index,
                column_count: 1,
            },
            _ => EventPayload::None,
        }
    }
}

/// Range information carried by a pass-through notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPayload {
    None,
    Rows { index: usize, count: usize },
    Columns { index: usize, count: usize },
    RowsMoved { old_index: usize, new_index: usize, count: usize },
    Cells { row_index: usize, column_index: usize, column_count: usize },
}

/// A handled model callback re-emitted to consumers
#[derive(Debug, Clone)]
pub struct ModelNotification {
    pub timestamp: DateTime<Local>,
    /// `None` for schema model events
    pub subgrid: Option<SubgridRole>,
    pub event: ModelEvent,
    pub payload: EventPayload,
}

impl ModelNotification {
    pub fn new(subgrid: Option<SubgridRole>, event: ModelEvent) -> Self {
        Self {
            timestamp: Local::now(),
            subgrid,
            payload: event.payload(),
            event,
        }
    }
}

/// Notifications delivered to grid event subscribers
#[derive(Debug, Clone)]
pub enum GridEvent {
    /// Columns were (re)created from the schema
    ColumnsCreated { column_count: usize },

    /// Row or column count/order changed
    ShapeChanged,

    /// Cell content changed; shape is unaffected
    StateChanged,

    SelectionChanged,

    ViewportChanged {
        anchor: ScrollAnchor,
        viewport_start: u32,
    },

    /// Pass-through of a handled model callback
    Model(ModelNotification),
}

impl GridEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ColumnsCreated { .. } => "ColumnsCreated",
            Self::ShapeChanged => "ShapeChanged",
            Self::StateChanged => "StateChanged",
            Self::SelectionChanged => "SelectionChanged",
            Self::ViewportChanged { .. } => "ViewportChanged",
            Self::Model(_) => "Model",
        }
    }
}

impl fmt::Display for GridEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnsCreated { column_count } => write!(f, "ColumnsCreated({})", column_count),
            Self::ViewportChanged {
                anchor,
                viewport_start,
            } => write!(
                f,
                "ViewportChanged({}+{} @ {})",
                anchor.index, anchor.offset, viewport_start
            ),
            Self::Model(n) => write!(f, "Model({:?})", n.event),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classes() {
        assert_eq!(
            ModelEvent::ColumnsInserted { index: 0, count: 1 }.class(),
            ChangeClass::Schema
        );
        assert_eq!(ModelEvent::PreReindex.class(), ChangeClass::Data);
        assert!(!ModelEvent::InvalidateAll.changes_shape());
        assert!(ModelEvent::RowCountChanged.changes_shape());
    }

    #[test]
    fn test_payloads() {
        assert_eq!(
            ModelEvent::RowsDeleted { row_index: 3, count: 4 }.payload(),
            EventPayload::Rows { index: 3, count: 4 }
        );
        assert_eq!(ModelEvent::AllRowsDeleted.payload(), EventPayload::None);
        let n = ModelNotification::new(Some(SubgridRole::Main), ModelEvent::InvalidateCell {
            schema_column_index: 2,
            row_index: 7,
        });
        assert_eq!(
            n.payload,
            EventPayload::Cells {
                row_index: 7,
                column_index: 2,
                column_count: 1
            }
        );
    }
}
