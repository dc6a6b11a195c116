//! Summary statistics over a dense table.

use counter_core::{Counter, Second};
use serde::{Deserialize, Serialize};

use crate::table::DenseTable;

/// Busiest second for one counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peak {
    pub second: Second,
    pub count: u64,
}

/// Per-counter statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterStats {
    /// Total increments over the window.
    pub total: u64,
    /// Busiest second (earliest on ties).
    pub peak: Peak,
    /// Seconds with a non-zero count.
    pub active_seconds: u64,
    /// Mean increments per second over the whole window.
    pub mean_rate: f64,
}

/// Whole-table statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    /// First second in the window.
    pub first_second: Second,
    /// Last second in the window.
    pub last_second: Second,
    /// Number of seconds in the window.
    pub span_seconds: u64,
    /// Seconds where either counter moved.
    pub active_seconds: u64,
    /// Seconds where neither counter moved.
    pub idle_seconds: u64,
    /// Longest run of consecutive idle seconds.
    pub longest_idle_run: u64,
    pub counter_a: CounterStats,
    pub counter_b: CounterStats,
}

impl TableSummary {
    /// Compute statistics in a single pass.
    pub fn from_table(table: &DenseTable) -> Self {
        let mut summary = TableSummary {
            first_second: table.lo(),
            last_second: table.hi(),
            span_seconds: table.len() as u64,
            ..Default::default()
        };

        let mut current_idle = 0u64;
        for row in table {
            if row.is_idle() {
                summary.idle_seconds += 1;
                current_idle += 1;
                summary.longest_idle_run = summary.longest_idle_run.max(current_idle);
            } else {
                summary.active_seconds += 1;
                current_idle = 0;
            }

            for counter in Counter::all() {
                let count = row.count(counter);
                let stats = summary.stats_mut(counter);
                if count > 0 {
                    stats.active_seconds += 1;
                }
                if count > stats.peak.count {
                    stats.peak = Peak {
                        second: row.second,
                        count,
                    };
                }
            }
        }

        for counter in Counter::all() {
            let total = table.total(counter);
            let span = summary.span_seconds;
            let stats = summary.stats_mut(counter);
            stats.total = total;
            // Zero-count counters report the window start as their peak.
            if stats.peak.count == 0 {
                stats.peak.second = table.lo();
            }
            stats.mean_rate = if span > 0 {
                total as f64 / span as f64
            } else {
                0.0
            };
        }

        summary
    }

    pub fn stats(&self, counter: Counter) -> &CounterStats {
        match counter {
            Counter::A => &self.counter_a,
            Counter::B => &self.counter_b,
        }
    }

    fn stats_mut(&mut self, counter: Counter) -> &mut CounterStats {
        match counter {
            Counter::A => &mut self.counter_a,
            Counter::B => &mut self.counter_b,
        }
    }
}
