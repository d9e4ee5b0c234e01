use std::path::Path;

use rein_core::{DEFAULT_PREFIX, POSTGRES_MAX_IDENTIFIER_LEN};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "rein.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinSettings {
    /// Prefix for managed constraint names.
    pub prefix: String,
    pub max_identifier_len: usize,
    /// Emit JSON log lines instead of text.
    pub log_json: bool,
}

impl Default for ReinSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            max_identifier_len: POSTGRES_MAX_IDENTIFIER_LEN,
            log_json: false,
        }
    }
}

impl ReinSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }
}

/// Load settings from `path`, or defaults when the file does not exist.
pub fn load_settings(path: &Path) -> Result<ReinSettings, SettingsError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        return ReinSettings::from_toml_str(&content);
    }
    Ok(ReinSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = ReinSettings::from_toml_str("prefix = \"lib\"\n").expect("parse");
        assert_eq!(settings.prefix, "lib");
        assert_eq!(settings.max_identifier_len, 63);
        assert!(!settings.log_json);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings =
            load_settings(Path::new("does/not/exist/rein.toml")).expect("defaults");
        assert_eq!(settings, ReinSettings::default());
    }

    #[test]
    fn malformed_settings_are_rejected() {
        assert!(ReinSettings::from_toml_str("max_identifier_len = \"long\"").is_err());
    }
}
