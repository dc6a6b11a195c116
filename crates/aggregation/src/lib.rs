//! Second-bucket aggregation for the counter-series system.
//!
//! This crate handles:
//! - Per-second bucketing of counter events (summing reduction)
//! - Dense, zero-filled table construction over `[lo, hi]`
//! - Cumulative running totals and constant-time point lookup
//! - Chart series and summary statistics for consumers

pub mod aggregator;
pub mod bucket;
pub mod series;
pub mod summary;
pub mod table;

pub use aggregator::{aggregate, SecondAggregator};
pub use bucket::{SecondBucket, SecondBuckets};
pub use series::{chart_series, ChartSeries, CounterLabels, SeriesKind};
pub use summary::{CounterStats, Peak, TableSummary};
pub use table::DenseTable;
