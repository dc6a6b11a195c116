mod cli;
mod display;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use counter_aggregation::{chart_series, CounterLabels, DenseTable, SecondAggregator, TableSummary};
use counter_ingestion::EventLoader;
use counter_session::TableSnapshot;
use display::{display_lookup, display_summary, display_table};
use std::fs;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.to_config()?;
    info!("Loading {} with config: {:?}", args.input.display(), config);

    let table = build_table(&args, &config)?;
    let labels = CounterLabels::from(&config.loader.columns);

    display_summary(&TableSummary::from_table(&table), &labels);
    display_table(&table, args.preview, &labels);
    for raw in &args.seconds {
        display_lookup(&table.lookup_str(raw), &labels);
    }

    write_outputs(&args, &table, &labels)?;
    Ok(())
}

fn build_table(args: &Args, config: &counter_core::Config) -> Result<DenseTable> {
    let events = EventLoader::new(config.loader.clone())
        .load_path(&args.input)
        .with_context(|| format!("failed to load events from {}", args.input.display()))?;
    let table = SecondAggregator::new(config.aggregation.clone())
        .aggregate(&events)
        .context("failed to aggregate events")?;
    info!(
        events = events.len(),
        rows = table.len(),
        lo = table.lo(),
        hi = table.hi(),
        "built dense table"
    );
    Ok(table)
}

fn write_outputs(args: &Args, table: &DenseTable, labels: &CounterLabels) -> Result<()> {
    if let Some(path) = &args.export {
        let json = TableSnapshot::from_table(table).to_json_pretty()?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote table snapshot to {}", path.display());
    }
    if let Some(path) = &args.series {
        let json = serde_json::to_string_pretty(&chart_series(table, labels))?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote chart series to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_session::table_from_json;
    use std::ffi::OsStr;
    use std::io::Write;

    fn source(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_pipeline_writes_snapshot_and_series() {
        let input = source("HH:MM:SS.mmmuuun,COUN,ENER\n00:00:01.2,5,2\n00:00:01.7,3,0\n00:00:03.0,1,1\n");
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("table.json");
        let series = dir.path().join("series.json");

        let args = Args::parse_from([
            OsStr::new("counter-series"),
            input.path().as_os_str(),
            OsStr::new("--export"),
            export.as_os_str(),
            OsStr::new("--series"),
            series.as_os_str(),
        ]);
        let config = args.to_config().unwrap();
        let table = build_table(&args, &config).unwrap();
        write_outputs(&args, &table, &CounterLabels::from(&config.loader.columns)).unwrap();

        let restored = table_from_json(&fs::read_to_string(&export).unwrap()).unwrap();
        assert_eq!(restored, table);
        assert_eq!(restored.row(2).unwrap().cumulative_a, 8);

        let charts: serde_json::Value = serde_json::from_str(&fs::read_to_string(&series).unwrap()).unwrap();
        assert_eq!(charts.as_array().unwrap().len(), 4);
        assert_eq!(charts[0]["title"], "ENER vs Seconds");
    }

    #[test]
    fn test_multi_day_needs_flag() {
        let input = source("time;hits;energy\n2024-01-01 23:59:59;1;0\n2024-01-02 00:00:01;1;0\n");
        let path = input.path().to_string_lossy().to_string();
        let base = [
            "counter-series",
            path.as_str(),
            "--delimiter",
            ";",
            "--timestamp-column",
            "time",
            "--counter-a-column",
            "hits",
            "--counter-b-column",
            "energy",
        ]
        .map(String::from);

        let args = Args::parse_from(base.iter());
        let err = build_table(&args, &args.to_config().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to aggregate"));

        let args = Args::parse_from(base.iter().cloned().chain(["--allow-multi-day".to_string()]));
        let table = build_table(&args, &args.to_config().unwrap()).unwrap();
        assert_eq!((table.lo(), table.hi()), (1, 86_399));
    }

    #[test]
    fn test_missing_input_reports_path() {
        let args = Args::parse_from(["counter-series", "/nonexistent/events.csv"]);
        let err = build_table(&args, &args.to_config().unwrap()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/events.csv"));
    }
}
