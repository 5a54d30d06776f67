use crate::config::config::ColumnsConfig;
use crate::data::column_index::Column;

/// Turns the content width a renderer measured for a column into the width
/// autosizing should give it
#[derive(Debug, Clone)]
pub struct ColumnWidthCalculator {
    min_width: u32,
    max_width: u32,
    padding: u32,
}

impl ColumnWidthCalculator {
    pub fn new(config: &ColumnsConfig) -> Self {
        Self {
            min_width: config.min_width,
            max_width: config.max_width.max(config.min_width),
            padding: config.autosize_padding,
        }
    }

    /// Width autosizing wants for `preferred` pixels of content
    pub fn autosize_width(&self, preferred: u32) -> u32 {
        preferred
            .saturating_add(self.padding)
            .clamp(self.min_width, self.max_width)
    }

    /// Apply autosizing to one column and report whether its width changed.
    ///
    /// A column that was already autosized only grows, so content scrolling
    /// out of view does not make columns jitter. `force` resizes to fit
    /// either way.
    pub fn apply_autosizing(&self, column: &mut Column, force: bool) -> bool {
        if !column.autosizing {
            return false;
        }
        let Some(preferred) = column.preferred_width else {
            return false;
        };
        let wanted = self.autosize_width(preferred);
        let resize = force || !column.autosized || wanted > column.width;
        column.autosized = true;
        if resize && wanted != column.width {
            column.width = wanted;
            true
        } else {
            false
        }
    }
}
