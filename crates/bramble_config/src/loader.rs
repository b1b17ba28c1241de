//! Settings file loading and validation.

use crate::error::ConfigError;
use crate::types::BuildSettings;
use std::path::Path;

/// Name of the settings file at the project root.
pub const SETTINGS_FILE: &str = "bramble.toml";

/// Loads and validates `bramble.toml` from a project directory.
///
/// A project without a settings file gets the default settings; any other
/// read failure is an error.
pub fn load_settings(project_dir: &Path) -> Result<BuildSettings, ConfigError> {
    let settings_path = project_dir.join(SETTINGS_FILE);
    match std::fs::read_to_string(&settings_path) {
        Ok(content) => load_settings_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BuildSettings::default()),
        Err(e) => Err(ConfigError::IoError(e)),
    }
}

/// Parses and validates `bramble.toml` content from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_settings_from_str(content: &str) -> Result<BuildSettings, ConfigError> {
    let settings: BuildSettings =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Validates that settings values are usable.
fn validate_settings(settings: &BuildSettings) -> Result<(), ConfigError> {
    let cache = &settings.cache;
    if cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.dir must not be empty".to_string(),
        ));
    }
    if cache.workers == 0 {
        return Err(ConfigError::ValidationError(
            "cache.workers must be at least 1".to_string(),
        ));
    }
    if cache.max_problems == 0 {
        return Err(ConfigError::ValidationError(
            "cache.max_problems must be at least 1".to_string(),
        ));
    }
    Ok(())
}
