//! Configuration module
//!
//! Grid behaviour settings (columns, scrolling, selection, events) loaded
//! from TOML.

pub mod config;

pub use config::GridConfig;
