//! Settings loader with environment variable expansion

use super::{ConfigError, HarnessSettings};
use std::path::Path;

/// Settings loader
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<HarnessSettings, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate settings from YAML text.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<HarnessSettings, ConfigError> {
        let settings: HarnessSettings = if content.trim().is_empty() {
            HarnessSettings::default()
        } else {
            serde_yaml::from_str(content)?
        };
        settings.validate()?;
        Ok(settings)
    }
}
