use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: ColumnsConfig,
    pub scrolling: ScrollingConfig,
    pub selection: SelectionConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Width in pixels given to newly created columns
    pub default_width: u32,

    /// Autosizing never shrinks a column below this
    pub min_width: u32,

    /// Autosizing never grows a column beyond this
    pub max_width: u32,

    /// Padding added to the measured content width when autosizing
    pub autosize_padding: u32,

    /// Whether new columns start with autosizing enabled
    pub autosizing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollingConfig {
    /// Leading columns excluded from horizontal scrolling
    pub fixed_column_count: usize,

    /// Leading rows excluded from vertical scrolling
    pub fixed_row_count: usize,

    /// Anchor the viewport on the trailing (right) edge
    pub grid_right_aligned: bool,

    /// Allow a partially visible leading column (false = whole columns only)
    pub scroll_horizontally_smoothly: bool,

    /// Width of the vertical gridline drawn between columns
    pub grid_lines_width: u32,

    /// Width of the gridline separating fixed columns from scrollable ones
    pub fixed_grid_line_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Keep earlier cell selections when a new one is added
    pub multiple_selections: bool,

    /// Selecting a row first clears every other row selection
    pub single_row_selection_mode: bool,

    /// Checkbox style row selection: clearing the selection keeps rows
    pub checkbox_row_selection: bool,

    /// Re-attach a single selected cell after a reindex
    pub restore_single_cell_selection: bool,

    /// Re-attach selected rows (by row id) after a reindex
    pub restore_row_selections: bool,

    /// Re-attach selected columns (by name) after a reindex
    pub restore_column_selections: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Re-emit every handled model callback as a consumer notification
    pub dispatch_model_events: bool,

    /// Number of consumer events kept for debugging
    pub event_history_size: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: ColumnsConfig::default(),
            scrolling: ScrollingConfig::default(),
            selection: SelectionConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            default_width: 100,
            min_width: 5,
            max_width: 400,
            autosize_padding: 8,
            autosizing: true,
        }
    }
}

impl Default for ScrollingConfig {
    fn default() -> Self {
        Self {
            fixed_column_count: 0,
            fixed_row_count: 0,
            grid_right_aligned: false,
            scroll_horizontally_smoothly: true,
            grid_lines_width: 1,
            fixed_grid_line_width: 2,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            multiple_selections: false,
            single_row_selection_mode: false,
            checkbox_row_selection: false,
            restore_single_cell_selection: true,
            restore_row_selections: true,
            restore_column_selections: true,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            dispatch_model_events: false,
            event_history_size: 100,
        }
    }
}

impl GridConfig {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save_to_path(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: GridConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::get_config_path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("revgrid").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.min_width > self.columns.max_width {
            bail!(
                "columns.min_width ({}) is greater than columns.max_width ({})",
                self.columns.min_width,
                self.columns.max_width
            );
        }
        if self.events.event_history_size == 0 {
            bail!("events.event_history_size must be at least 1");
        }
        Ok(())
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Grid Configuration File
# Location: ~/.config/revgrid/config.toml (Linux)
#           %APPDATA%\revgrid\config.toml (Windows)

[columns]
# Width in pixels for new columns
default_width = 100

# Autosizing bounds and padding (pixels)
min_width = 5
max_width = 400
autosize_padding = 8

# New columns size themselves to their content
autosizing = true

[scrolling]
# Columns/rows that never scroll
fixed_column_count = 0
fixed_row_count = 0

# Anchor the viewport on the right edge instead of the left
grid_right_aligned = false

# false = only whole columns are ever shown at the scrolling edge
scroll_horizontally_smoothly = true

# Gridline widths in pixels
grid_lines_width = 1
fixed_grid_line_width = 2

[selection]
multiple_selections = false
single_row_selection_mode = false

# Keep row selections when the selection is cleared (checkbox column)
checkbox_row_selection = false

# Re-attach selections after the data is re-sorted or re-indexed
restore_single_cell_selection = true
restore_row_selections = true
restore_column_selections = true

[events]
# Forward every data/schema model callback to event subscribers
dispatch_model_events = false
event_history_size = 100
"#
        .to_string()
    }
}
