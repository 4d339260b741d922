//! # Storage Layer
//!
//! Persistence and state ownership for the task tracker.
//!
//! ## Storage Format
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Users + tasks | Pretty-printed JSON document | `task_data.json` (configurable) |
//! | Config | TOML | `<config dir>/task-tracker/config.toml` |
//!
//! ## Write Policy
//!
//! - Every successful mutation rewrites the whole document (auto-save)
//! - Writes are atomic (temp file + rename)
//! - A single process is assumed; there is no file locking
//!
//! ## Key Types
//!
//! - [`TaskManager`] - Owns users and tasks, enforces business rules
//! - [`DataFile`] - Reads/writes the JSON document
//! - [`Config`] - Resolves where the data file lives

mod config;
mod json;
mod manager;

pub use config::{Config, ConfigError, DEFAULT_DATA_FILE};
pub use json::{DataFile, StoreDocument};
pub use manager::{ManagerError, ManagerResult, TaskManager};
