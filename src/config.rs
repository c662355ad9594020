//! Engine configuration
//!
//! Settings can be built in code or loaded from TOML, YAML or JSON. Every
//! field has a default, so a config file only needs the keys it changes.

use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Text rendering of a DataFrame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows shown before the output is truncated
    pub max_rows: usize,
    /// Digits after the decimal point for float cells
    pub float_precision: usize,
    /// Text shown for missing values
    pub na_repr: String,
    /// Minimum width of each cell
    pub column_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_rows: 10,
            float_precision: 3,
            na_repr: "NA".to_string(),
            column_width: 10,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub display: DisplayConfig,
    /// Emit a `debug!` record for every pipeline step
    pub log_steps: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            log_steps: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty YAML document deserializes to unit, not to a map
        if text.trim().is_empty() {
            warn!("Empty YAML configuration, using defaults");
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load and validate a config file, choosing the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&text)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported configuration format: {}",
                    path.display()
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values the serializer cannot constrain
    pub fn validate(&self) -> Result<()> {
        if self.display.max_rows == 0 {
            return Err(Error::Config("display.max_rows must be at least 1".to_string()));
        }
        if self.display.float_precision > 17 {
            return Err(Error::Config(
                "display.float_precision must be at most 17".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("[display]\nmax_rows = 3\n").unwrap();
        assert_eq!(config.display.max_rows, 3);
        assert_eq!(config.display.na_repr, "NA");
        assert!(config.log_steps);
    }

    #[test]
    fn yaml_and_json_parse() {
        let yaml = EngineConfig::from_yaml_str("log_steps: false\ndisplay:\n  na_repr: \"-\"\n").unwrap();
        assert!(!yaml.log_steps);
        assert_eq!(yaml.display.na_repr, "-");

        let json = EngineConfig::from_json_str(r#"{"display": {"float_precision": 1}}"#).unwrap();
        assert_eq!(json.display.float_precision, 1);
    }

    #[test]
    fn validate_rejects_zero_rows() {
        let mut config = EngineConfig::default();
        config.display.max_rows = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
