//! Data ingestion for the counter-series system.
//!
//! This crate handles:
//! - Delimited text and spreadsheet workbook loading (columns located by header name)
//! - Timestamp cell parsing (time of day, full date-time or spreadsheet serial)
//! - Counter delta cell parsing

pub mod loader;
pub mod timestamp;
pub mod workbook;

pub use loader::{load_events, EventLoader};
pub use timestamp::{
    counter_from_f64, parse_counter, parse_timestamp, timestamp_from_serial, ParsedTimestamp,
};
pub use workbook::is_workbook_path;
