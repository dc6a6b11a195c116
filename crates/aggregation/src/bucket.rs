//! Per-second bucketing of counter events.
//!
//! Summing reduction keyed by time-of-day second. The result depends only on
//! the multiset of (second, delta) pairs, never on arrival order.

use counter_core::{Counter, Error, Event, Result, Second};
use std::collections::BTreeMap;

/// Accumulated deltas for one second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondBucket {
    pub sum_a: u64,
    pub sum_b: u64,
    /// Number of events that landed in this second.
    pub events: u64,
}

impl SecondBucket {
    fn add(&mut self, second: Second, event: &Event) -> Result<()> {
        self.sum_a = self
            .sum_a
            .checked_add(event.counter_a)
            .ok_or(Error::Overflow { counter: Counter::A, second })?;
        self.sum_b = self
            .sum_b
            .checked_add(event.counter_b)
            .ok_or(Error::Overflow { counter: Counter::B, second })?;
        self.events += 1;
        Ok(())
    }
}

/// Sparse map from second offset to its bucket. Seconds without events have no entry.
#[derive(Debug, Clone, Default)]
pub struct SecondBuckets {
    buckets: BTreeMap<Second, SecondBucket>,
}

impl SecondBuckets {
    /// Create an empty bucket map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket a whole event sequence.
    pub fn from_events(events: &[Event]) -> Result<Self> {
        let mut buckets = Self::new();
        buckets.add_events(events)?;
        Ok(buckets)
    }

    /// Add one event to its second's bucket.
    pub fn add_event(&mut self, event: &Event) -> Result<()> {
        let second = event.second();
        self.buckets.entry(second).or_default().add(second, event)
    }

    /// Add multiple events.
    pub fn add_events(&mut self, events: &[Event]) -> Result<()> {
        for event in events {
            self.add_event(event)?;
        }
        Ok(())
    }

    /// Smallest and largest occupied second.
    pub fn bounds(&self) -> Option<(Second, Second)> {
        let lo = *self.buckets.keys().next()?;
        let hi = *self.buckets.keys().next_back()?;
        Some((lo, hi))
    }

    pub fn get(&self, second: Second) -> Option<&SecondBucket> {
        self.buckets.get(&second)
    }

    /// Number of occupied seconds.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Occupied seconds in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Second, &SecondBucket)> {
        self.buckets.iter().map(|(&s, b)| (s, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn event(h: u32, m: u32, s: u32, milli: u32, a: u64, b: u64) -> Event {
        Event::new(NaiveTime::from_hms_milli_opt(h, m, s, milli).unwrap(), a, b)
    }

    #[test]
    fn test_same_second_sums() {
        let buckets = SecondBuckets::from_events(&[
            event(0, 0, 1, 0, 5, 2),
            event(0, 0, 1, 999, 3, 0),
        ])
        .unwrap();

        assert_eq!(buckets.len(), 1);
        let bucket = buckets.get(1).unwrap();
        assert_eq!(bucket.sum_a, 8);
        assert_eq!(bucket.sum_b, 2);
        assert_eq!(bucket.events, 2);
    }

    #[test]
    fn test_sparse_keys_and_bounds() {
        let buckets = SecondBuckets::from_events(&[
            event(0, 1, 0, 0, 1, 0),
            event(0, 0, 3, 0, 1, 0),
        ])
        .unwrap();

        assert_eq!(buckets.bounds(), Some((3, 60)));
        assert!(buckets.get(4).is_none());
        let keys: Vec<Second> = buckets.iter().map(|(s, _)| s).collect();
        assert_eq!(keys, vec![3, 60]);
    }

    #[test]
    fn test_empty_has_no_bounds() {
        let buckets = SecondBuckets::new();
        assert!(buckets.is_empty());
        assert_eq!(buckets.bounds(), None);
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = SecondBuckets::from_events(&[
            event(0, 0, 2, 0, 0, u64::MAX),
            event(0, 0, 2, 0, 0, 1),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Overflow { counter: Counter::B, second: 2 }));
    }
}
