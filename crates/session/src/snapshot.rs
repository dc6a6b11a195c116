//! Lossless JSON snapshot of a dense table.
//!
//! Used to hand a computed table from one request to a follow-up query.
//! Every integer survives exactly, and loading re-checks the table invariants.

use counter_aggregation::DenseTable;
use counter_core::{DenseRow, Error, Result, Second};
use serde::{Deserialize, Serialize};

/// Serializable form of a [`DenseTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub lo: Second,
    pub hi: Second,
    pub rows: Vec<DenseRow>,
}

impl TableSnapshot {
    pub fn from_table(table: &DenseTable) -> Self {
        Self {
            lo: table.lo(),
            hi: table.hi(),
            rows: table.rows().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and rebuild the table.
    pub fn into_table(self) -> Result<DenseTable> {
        if self.lo > self.hi {
            return Err(Error::data(format!(
                "snapshot bounds inverted: lo {} > hi {}",
                self.lo, self.hi
            )));
        }
        let (lo, hi) = (self.lo, self.hi);
        let table = DenseTable::from_rows(self.rows)?;
        if table.lo() != lo || table.hi() != hi {
            return Err(Error::data(format!(
                "snapshot bounds [{}, {}] disagree with rows [{}, {}]",
                lo,
                hi,
                table.lo(),
                table.hi()
            )));
        }
        Ok(table)
    }
}

impl From<&DenseTable> for TableSnapshot {
    fn from(table: &DenseTable) -> Self {
        Self::from_table(table)
    }
}

/// Serialize a table to compact JSON.
pub fn table_to_json(table: &DenseTable) -> Result<String> {
    TableSnapshot::from_table(table).to_json()
}

/// Parse and validate a table from JSON.
pub fn table_from_json(json: &str) -> Result<DenseTable> {
    TableSnapshot::from_json(json)?.into_table()
}
