//! Second-bucket aggregation engine.
//!
//! Stateless: each call owns its input and produces an independent table.

use counter_core::{AggregationConfig, Error, Event, Result};
use tracing::{debug, info};

use crate::bucket::SecondBuckets;
use crate::table::DenseTable;

/// Turns an event sequence into a dense per-second table.
#[derive(Debug, Clone, Default)]
pub struct SecondAggregator {
    config: AggregationConfig,
}

impl SecondAggregator {
    /// Create a new aggregator.
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// Aggregation options in use.
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Bucket, densify and accumulate.
    pub fn aggregate(&self, events: &[Event]) -> Result<DenseTable> {
        if events.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.config.reject_multi_day {
            check_single_day(events)?;
        }

        let buckets = SecondBuckets::from_events(events)?;
        debug!(events = events.len(), occupied = buckets.len(), "bucketed events");

        let table = DenseTable::from_buckets(&buckets)?;
        info!(
            lo = table.lo(),
            hi = table.hi(),
            rows = table.len(),
            "aggregated events into dense table"
        );
        Ok(table)
    }
}

/// Aggregate with default options.
pub fn aggregate(events: &[Event]) -> Result<DenseTable> {
    SecondAggregator::default().aggregate(events)
}

/// Dated events must share one calendar day; undated events never conflict.
fn check_single_day(events: &[Event]) -> Result<()> {
    let mut dates = events.iter().filter_map(|e| e.date);
    let Some(first) = dates.next() else {
        return Ok(());
    };
    match dates.find(|d| *d != first) {
        Some(other) => Err(Error::MultiDayInput { first, other }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use counter_core::Lookup;

    fn at(s: u32, a: u64, b: u64) -> Event {
        Event::new(NaiveTime::from_num_seconds_from_midnight_opt(s, 0).unwrap(), a, b)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_empty_input_error() {
        assert!(matches!(aggregate(&[]).unwrap_err(), Error::EmptyInput));
    }

    #[test]
    fn test_same_day_dates_accepted() {
        let table = aggregate(&[at(1, 1, 0).with_date(day(3)), at(2, 1, 0).with_date(day(3))]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_multi_day_rejected_by_default() {
        let err = aggregate(&[at(86_399, 1, 0).with_date(day(3)), at(0, 1, 0).with_date(day(4))])
            .unwrap_err();
        match err {
            Error::MultiDayInput { first, other } => {
                assert_eq!(first, day(3));
                assert_eq!(other, day(4));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multi_day_folds_when_allowed() {
        let aggregator = SecondAggregator::new(AggregationConfig {
            reject_multi_day: false,
        });
        let table = aggregator
            .aggregate(&[at(5, 1, 0).with_date(day(3)), at(5, 2, 0).with_date(day(4))])
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].count_a, 3);
    }

    #[test]
    fn test_undated_mixed_with_dated() {
        let table = aggregate(&[at(1, 1, 0), at(2, 1, 0).with_date(day(3))]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cumulative_overflow_reported() {
        let err = aggregate(&[at(1, u64::MAX, 0), at(2, 1, 0)]).unwrap_err();
        assert!(matches!(err, Error::Overflow { second: 2, .. }));
    }

    #[test]
    fn test_full_day_span() {
        let table = aggregate(&[at(0, 1, 1), at(86_399, 1, 1)]).unwrap();
        assert_eq!(table.len(), 86_400);
        assert!(matches!(table.lookup(43_200), Lookup::Found(s) if s.count_a == 0 && s.cumulative_a == 1));
    }
}
