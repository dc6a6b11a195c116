//! Plot-ready series extracted from a dense table.
//!
//! Rendering is left to the consumer; this only shapes the data.

use counter_core::{ColumnConfig, Counter, Second};
use serde::{Deserialize, Serialize};

use crate::table::DenseTable;

/// X-axis label shared by every series.
pub const SECONDS_LABEL: &str = "Seconds";

/// Display names for the two counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterLabels {
    pub a: String,
    pub b: String,
}

impl CounterLabels {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self { a: a.into(), b: b.into() }
    }

    pub fn label(&self, counter: Counter) -> &str {
        match counter {
            Counter::A => &self.a,
            Counter::B => &self.b,
        }
    }
}

impl Default for CounterLabels {
    fn default() -> Self {
        Self::from(&ColumnConfig::default())
    }
}

impl From<&ColumnConfig> for CounterLabels {
    fn from(columns: &ColumnConfig) -> Self {
        Self::new(columns.counter_a.clone(), columns.counter_b.clone())
    }
}

/// Which derived column a series plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Count,
    Cumulative,
}

/// One line chart's worth of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub counter: Counter,
    pub kind: SeriesKind,
    /// `(second, value)` pairs, ascending by second.
    pub points: Vec<(Second, u64)>,
}

impl ChartSeries {
    /// Build the series for one counter column.
    pub fn for_column(
        table: &DenseTable,
        labels: &CounterLabels,
        counter: Counter,
        kind: SeriesKind,
    ) -> Self {
        let name = labels.label(counter);
        let (title, y_label) = match kind {
            SeriesKind::Count => (
                format!("{} vs {}", name, SECONDS_LABEL),
                format!("{}_Count", name),
            ),
            SeriesKind::Cumulative => (
                format!("Cumulative {} vs {}", name, SECONDS_LABEL),
                format!("{}_Cumulative", name),
            ),
        };

        let points = table
            .iter()
            .map(|row| {
                let value = match kind {
                    SeriesKind::Count => row.count(counter),
                    SeriesKind::Cumulative => row.cumulative(counter),
                };
                (row.second, value)
            })
            .collect();

        Self {
            title,
            x_label: SECONDS_LABEL.to_string(),
            y_label,
            counter,
            kind,
            points,
        }
    }

    /// Largest y value, for axis scaling.
    pub fn max_value(&self) -> u64 {
        self.points.iter().map(|&(_, v)| v).max().unwrap_or(0)
    }
}

/// The standard four charts: B count, A count, B cumulative, A cumulative.
pub fn chart_series(table: &DenseTable, labels: &CounterLabels) -> Vec<ChartSeries> {
    [
        (Counter::B, SeriesKind::Count),
        (Counter::A, SeriesKind::Count),
        (Counter::B, SeriesKind::Cumulative),
        (Counter::A, SeriesKind::Cumulative),
    ]
    .into_iter()
    .map(|(counter, kind)| ChartSeries::for_column(table, labels, counter, kind))
    .collect()
}
