use anyhow::{Context, Result};
use clap::Parser;
use counter_core::Config;
use std::path::PathBuf;

/// Aggregate a counter event log into a dense per-second table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Event source: delimited text with a header row.
    pub input: PathBuf,

    /// JSON configuration file; command-line flags override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub delimiter: Option<char>,

    #[arg(long)]
    pub timestamp_column: Option<String>,

    #[arg(long)]
    pub counter_a_column: Option<String>,

    #[arg(long)]
    pub counter_b_column: Option<String>,

    /// Fold dated events from different days onto one time-of-day axis.
    #[arg(long)]
    pub allow_multi_day: bool,

    /// Second to look up; repeatable.
    #[arg(long = "second", allow_hyphen_values = true)]
    pub seconds: Vec<String>,

    /// Write the table snapshot as JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write the four chart series as JSON.
    #[arg(long)]
    pub series: Option<PathBuf>,

    /// Rows shown at each end of the preview.
    #[arg(long, default_value = "10")]
    pub preview: usize,
}

impl Args {
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(delimiter) = self.delimiter {
            config.loader.delimiter = delimiter;
        }
        if let Some(name) = &self.timestamp_column {
            config.loader.columns.timestamp = name.clone();
        }
        if let Some(name) = &self.counter_a_column {
            config.loader.columns.counter_a = name.clone();
        }
        if let Some(name) = &self.counter_b_column {
            config.loader.columns.counter_b = name.clone();
        }
        if self.allow_multi_day {
            config.aggregation.reject_multi_day = false;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["counter-series", "events.csv"]);
        let config = args.to_config().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(args.preview, 10);
        assert!(args.seconds.is_empty());
    }

    #[test]
    fn test_flag_overrides() {
        let args = Args::parse_from([
            "counter-series",
            "events.csv",
            "--delimiter",
            ";",
            "--counter-a-column",
            "hits",
            "--allow-multi-day",
            "--second",
            "5",
            "--second",
            "-1",
        ]);
        let config = args.to_config().unwrap();
        assert_eq!(config.loader.delimiter, ';');
        assert_eq!(config.loader.columns.counter_a, "hits");
        assert!(!config.aggregation.reject_multi_day);
        assert_eq!(args.seconds, vec!["5", "-1"]);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"loader": {{"delimiter": "\t", "columns": {{"counter_b": "energy"}}}}}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::parse_from(["counter-series", "events.csv", "--config", &path, "--delimiter", "|"]);
        let config = args.to_config().unwrap();
        assert_eq!(config.loader.delimiter, '|');
        assert_eq!(config.loader.columns.counter_b, "energy");
    }

    #[test]
    fn test_conflicting_columns_rejected() {
        let args = Args::parse_from(["counter-series", "events.csv", "--counter-a-column", "ENER"]);
        assert!(args.to_config().is_err());
    }
}
