//! Selection and viewport state of a grid

pub mod range_list;
pub mod selection;
pub mod selection_rect;
pub mod selection_stash;
pub mod viewport;
pub mod viewport_manager;
