use revgrid_core::config::GridConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = GridConfig::default();
    config.scrolling.fixed_column_count = 3;
    config.scrolling.grid_right_aligned = true;
    config.selection.checkbox_row_selection = true;
    config.events.dispatch_model_events = true;
    config.save_to_path(&path).unwrap();

    let loaded = GridConfig::load_from_path(&path).unwrap();
    assert_eq!(loaded.scrolling.fixed_column_count, 3);
    assert!(loaded.scrolling.grid_right_aligned);
    assert!(loaded.selection.checkbox_row_selection);
    assert!(loaded.events.dispatch_model_events);
    assert_eq!(loaded.columns.default_width, config.columns.default_width);
}

#[test]
fn test_load_rejects_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[scrolling\nfixed_column_count = ").unwrap();
    assert!(GridConfig::load_from_path(&path).is_err());
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[events]\nevent_history_size = 0\n").unwrap();
    assert!(GridConfig::load_from_path(&path).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(GridConfig::load_from_path(&dir.path().join("absent.toml")).is_err());
}
