//! Parsing and validation of `bramble.toml` build settings.
//!
//! This crate reads the settings file and produces a strongly-typed
//! [`BuildSettings`] value. Only the `[cache]` table is interpreted here; it
//! configures where configuration cache entries live, how many sessions run
//! concurrently, and how reported problems are treated.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_settings, load_settings_from_str, SETTINGS_FILE};
pub use types::*;
