//! Dense one-row-per-second table.
//!
//! Rows cover every second in `[lo, hi]` exactly once, ascending. Seconds
//! without events are zero-filled, and cumulative columns are a running sum
//! over the dense counts.

use counter_core::{Counter, DenseRow, Error, Lookup, Result, Second, SECONDS_PER_DAY};
use std::num::IntErrorKind;
use tracing::debug;

use crate::bucket::SecondBuckets;

/// Immutable gap-free per-second table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseTable {
    lo: Second,
    hi: Second,
    rows: Vec<DenseRow>,
}

/// Running totals carried across rows.
#[derive(Debug, Default)]
struct RunningTotals {
    a: u64,
    b: u64,
}

impl RunningTotals {
    fn advance(&mut self, second: Second, count_a: u64, count_b: u64) -> Result<DenseRow> {
        self.a = self
            .a
            .checked_add(count_a)
            .ok_or(Error::Overflow { counter: Counter::A, second })?;
        self.b = self
            .b
            .checked_add(count_b)
            .ok_or(Error::Overflow { counter: Counter::B, second })?;
        Ok(DenseRow {
            second,
            count_a,
            count_b,
            cumulative_a: self.a,
            cumulative_b: self.b,
        })
    }
}

impl DenseTable {
    /// Densify a bucket map over its full `[lo, hi]` range.
    pub fn from_buckets(buckets: &SecondBuckets) -> Result<Self> {
        let (lo, hi) = buckets.bounds().ok_or(Error::EmptyInput)?;

        let mut totals = RunningTotals::default();
        let mut rows = Vec::with_capacity((hi - lo + 1) as usize);
        for second in lo..=hi {
            let (count_a, count_b) = buckets
                .get(second)
                .map(|b| (b.sum_a, b.sum_b))
                .unwrap_or((0, 0));
            rows.push(totals.advance(second, count_a, count_b)?);
        }

        debug!(lo, hi, occupied = buckets.len(), rows = rows.len(), "built dense table");
        Ok(Self { lo, hi, rows })
    }

    /// Rebuild a table from previously computed rows, checking every table invariant.
    pub fn from_rows(rows: Vec<DenseRow>) -> Result<Self> {
        let first = rows.first().ok_or_else(|| Error::data("table has no rows"))?;
        let lo = first.second;

        if lo < 0 || rows.len() > SECONDS_PER_DAY as usize || lo > SECONDS_PER_DAY - rows.len() as Second {
            return Err(Error::data(format!(
                "{} rows from second {} fall outside [0, {})",
                rows.len(),
                lo,
                SECONDS_PER_DAY
            )));
        }

        let mut totals = RunningTotals::default();
        for (i, row) in rows.iter().enumerate() {
            let expected_second = lo + i as Second;
            if row.second != expected_second {
                return Err(Error::data(format!(
                    "row {} has second {}, expected {}",
                    i, row.second, expected_second
                )));
            }
            let expected = totals
                .advance(row.second, row.count_a, row.count_b)
                .map_err(|e| Error::data(e.to_string()))?;
            if row.cumulative_a != expected.cumulative_a || row.cumulative_b != expected.cumulative_b {
                return Err(Error::data(format!(
                    "cumulative mismatch at second {}: got ({}, {}), expected ({}, {})",
                    row.second,
                    row.cumulative_a,
                    row.cumulative_b,
                    expected.cumulative_a,
                    expected.cumulative_b
                )));
            }
        }

        let hi = lo + rows.len() as Second - 1;
        Ok(Self { lo, hi, rows })
    }

    /// First second in the table.
    pub fn lo(&self) -> Second {
        self.lo
    }

    /// Last second in the table.
    pub fn hi(&self) -> Second {
        self.hi
    }

    pub fn rows(&self) -> &[DenseRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DenseRow> {
        self.rows.iter()
    }

    /// Number of rows (`hi - lo + 1`).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; a table is never built from empty input.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, second: Second) -> bool {
        self.lo <= second && second <= self.hi
    }

    /// Row for a second, in constant time.
    pub fn row(&self, second: Second) -> Option<&DenseRow> {
        if !self.contains(second) {
            return None;
        }
        self.rows.get((second - self.lo) as usize)
    }

    /// Point lookup. Seconds outside `[lo, hi]` are `OutOfRange`, never a zero row.
    pub fn lookup(&self, second: Second) -> Lookup {
        match self.row(second) {
            Some(row) => Lookup::Found(row.sample()),
            None => Lookup::OutOfRange {
                second,
                lo: self.lo,
                hi: self.hi,
            },
        }
    }

    /// Point lookup from user-supplied text.
    ///
    /// Integers too large for `i64` are out of range, reported with the
    /// second saturated to `i64::MAX` or `i64::MIN`.
    pub fn lookup_str(&self, input: &str) -> Lookup {
        match input.trim().parse::<Second>() {
            Ok(second) => self.lookup(second),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => self.lookup(Second::MAX),
                IntErrorKind::NegOverflow => self.lookup(Second::MIN),
                _ => Lookup::NotInteger {
                    input: input.to_string(),
                },
            },
        }
    }

    /// Final running total for a counter.
    pub fn total(&self, counter: Counter) -> u64 {
        self.rows.last().map(|r| r.cumulative(counter)).unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a DenseTable {
    type Item = &'a DenseRow;
    type IntoIter = std::slice::Iter<'a, DenseRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
