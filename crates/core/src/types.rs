//! Core data types for the counter-series system.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole-second offset from midnight, also used as a lookup key.
pub type Second = i64;

/// Number of seconds in one calendar day.
pub const SECONDS_PER_DAY: Second = 86_400;

/// Convert a time of day to its whole-second offset.
///
/// Sub-second precision is discarded, and a leap second (`23:59:60`) folds
/// into `23:59:59`.
#[inline]
pub fn second_of_day(time: NaiveTime) -> Second {
    (time.hour() as Second) * 3600 + (time.minute() as Second) * 60 + time.second() as Second
}

/// One of the two independent counters carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Counter {
    A,
    B,
}

impl Counter {
    pub fn all() -> [Counter; 2] {
        [Counter::A, Counter::B]
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::A => write!(f, "A"),
            Counter::B => write!(f, "B"),
        }
    }
}

/// A single parsed source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Calendar date, when the source timestamp carried one.
    pub date: Option<NaiveDate>,
    /// Wall-clock time of day.
    pub time: NaiveTime,
    /// Increments of counter A in this event.
    pub counter_a: u64,
    /// Increments of counter B in this event.
    pub counter_b: u64,
}

impl Event {
    /// Create an undated event.
    pub fn new(time: NaiveTime, counter_a: u64, counter_b: u64) -> Self {
        Self {
            date: None,
            time,
            counter_a,
            counter_b,
        }
    }

    /// Attach a calendar date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Second offset this event is bucketed under.
    #[inline]
    pub fn second(&self) -> Second {
        second_of_day(self.time)
    }

    /// Delta for the given counter.
    #[inline]
    pub fn delta(&self, counter: Counter) -> u64 {
        match counter {
            Counter::A => self.counter_a,
            Counter::B => self.counter_b,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(date) = self.date {
            write!(f, "date={}, ", date.format("%Y-%m-%d"))?;
        }
        write!(
            f,
            "time={}, counter_a={}, counter_b={}",
            self.time.format("%H:%M:%S%.6f"),
            self.counter_a,
            self.counter_b
        )
    }
}

/// One second of the dense output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseRow {
    pub second: Second,
    /// Counter A increments within this second.
    pub count_a: u64,
    /// Counter B increments within this second.
    pub count_b: u64,
    /// Counter A running total through this second.
    pub cumulative_a: u64,
    /// Counter B running total through this second.
    pub cumulative_b: u64,
}

impl DenseRow {
    #[inline]
    pub fn count(&self, counter: Counter) -> u64 {
        match counter {
            Counter::A => self.count_a,
            Counter::B => self.count_b,
        }
    }

    #[inline]
    pub fn cumulative(&self, counter: Counter) -> u64 {
        match counter {
            Counter::A => self.cumulative_a,
            Counter::B => self.cumulative_b,
        }
    }

    /// True when no events landed in this second.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.count_a == 0 && self.count_b == 0
    }

    /// The four derived fields, without the key.
    pub fn sample(&self) -> SecondSample {
        SecondSample {
            count_a: self.count_a,
            cumulative_a: self.cumulative_a,
            count_b: self.count_b,
            cumulative_b: self.cumulative_b,
        }
    }
}

/// Derived fields returned by a point lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondSample {
    pub count_a: u64,
    pub cumulative_a: u64,
    pub count_b: u64,
    pub cumulative_b: u64,
}

/// Outcome of a point lookup against a dense table.
///
/// A second inside the observed window with no events is `Found` with zero
/// counts; only seconds outside the window are `OutOfRange`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup {
    Found(SecondSample),
    OutOfRange { second: Second, lo: Second, hi: Second },
    NotInteger { input: String },
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The sample, if the second was inside the window.
    pub fn found(&self) -> Option<&SecondSample> {
        match self {
            Lookup::Found(sample) => Some(sample),
            _ => None,
        }
    }
}
