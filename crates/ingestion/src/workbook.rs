//! Spreadsheet workbook cells.
//!
//! Only the first worksheet is read. Its first non-empty row is the header.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use counter_core::{Error, Result};
use std::io::Cursor;
use std::path::Path;

use crate::timestamp::{counter_from_f64, parse_counter, parse_timestamp, timestamp_from_serial, ParsedTimestamp};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Whether a path names a workbook rather than delimited text.
pub fn is_workbook_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

/// Cell grid of the first worksheet.
pub(crate) fn first_sheet(bytes: Vec<u8>) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::malformed(format!("unreadable workbook: {e}")))?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::malformed("workbook has no worksheets"))?
        .map_err(|e| Error::malformed(format!("unreadable worksheet: {e}")))
}

pub(crate) fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|cell| matches!(cell, Data::Empty))
}

/// Cell text as it appears in error messages and headers.
pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => dt.as_f64().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Timestamp from a date/time cell, a serial number or text.
pub(crate) fn timestamp_cell(cell: &Data) -> std::result::Result<ParsedTimestamp, String> {
    let parsed = match cell {
        Data::DateTime(dt) if !dt.is_duration() => timestamp_from_serial(dt.as_f64()),
        Data::Float(serial) => timestamp_from_serial(*serial),
        Data::String(s) | Data::DateTimeIso(s) => parse_timestamp(s),
        Data::Empty => return Err("empty cell".to_string()),
        _ => None,
    };
    parsed.ok_or_else(|| "unrecognized timestamp".to_string())
}

/// Counter delta from a numeric or text cell.
pub(crate) fn counter_cell(cell: &Data) -> std::result::Result<u64, String> {
    match cell {
        Data::Int(v) => u64::try_from(*v).map_err(|_| "negative counter delta".to_string()),
        Data::Float(v) => counter_from_f64(*v),
        Data::String(s) => parse_counter(s),
        Data::Empty => Err("empty cell".to_string()),
        _ => Err("not a non-negative integer".to_string()),
    }
}
