//! Configuration structures for the counter-series system.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source parsing options, including column names.
    pub loader: LoaderConfig,
    /// Aggregation options.
    pub aggregation: AggregationConfig,
    /// Session store options.
    pub session: SessionConfig,
}

impl Config {
    /// Parse a (possibly partial) JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.loader.validate()?;
        self.session.validate()
    }
}

/// Names of the three source columns the loader looks up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Timestamp column.
    pub timestamp: String,
    /// Counter A delta column.
    pub counter_a: String,
    /// Counter B delta column.
    pub counter_b: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp: "HH:MM:SS.mmmuuun".to_string(),
            counter_a: "COUN".to_string(),
            counter_b: "ENER".to_string(),
        }
    }
}

impl ColumnConfig {
    fn validate(&self) -> Result<()> {
        let names = [&self.timestamp, &self.counter_a, &self.counter_b];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(Error::config("column names must not be empty"));
        }
        if self.timestamp == self.counter_a
            || self.timestamp == self.counter_b
            || self.counter_a == self.counter_b
        {
            return Err(Error::config("column names must be distinct"));
        }
        Ok(())
    }
}

/// Delimited-source parsing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Column names to look up.
    pub columns: ColumnConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            columns: ColumnConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::config(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )))
        }
    }

    fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        self.columns.validate()
    }
}

/// Aggregation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Fail when dated events span more than one calendar day.
    pub reject_multi_day: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            reject_multi_day: true,
        }
    }
}

/// Session store options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a stored table stays valid after insertion.
    pub ttl_secs: u64,
    /// Maximum number of live sessions.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            max_sessions: 64,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(Error::config("session.ttl_secs must be positive"));
        }
        if self.max_sessions == 0 {
            return Err(Error::config("session.max_sessions must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.loader.columns.timestamp, "HH:MM:SS.mmmuuun");
        assert_eq!(config.loader.columns.counter_a, "COUN");
        assert_eq!(config.loader.delimiter, ',');
        assert!(config.aggregation.reject_multi_day);
        assert_eq!(config.session.ttl_secs, 1800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = Config::from_json_str(
            r#"{"aggregation": {"reject_multi_day": false}, "session": {"ttl_secs": 60}}"#,
        )
        .unwrap();
        assert!(!config.aggregation.reject_multi_day);
        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.session.max_sessions, 64);
        assert_eq!(config.loader.columns, ColumnConfig::default());
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = Config::from_json_str(r#"{"loader": {"columns": {"counter_a": "X", "counter_b": "X"}}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let loader = LoaderConfig {
            delimiter: '§',
            ..LoaderConfig::default()
        };
        assert!(loader.delimiter_byte().is_err());
        assert_eq!(LoaderConfig::default().delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let err = Config::from_json_str(r#"{"session": {"ttl_secs": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"loader": {{"delimiter": ";"}}}}"#).unwrap();
        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.loader.delimiter, ';');
    }
}
