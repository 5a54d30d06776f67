//! Horizontal layout helpers used by the viewport manager

pub mod column_width_calculator;
pub mod scroll_anchor;

pub use column_width_calculator::ColumnWidthCalculator;
pub use scroll_anchor::{AnchorLimits, HorizontalScrollLayout, ScrollAnchor, ScrollDimension};
