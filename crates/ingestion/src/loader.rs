//! Event table loading from delimited text and spreadsheet workbooks.
//!
//! Columns are located by header name, so column order and extra columns do
//! not matter. Any bad cell aborts the whole load.

use calamine::Data;
use counter_core::{ColumnConfig, Error, Event, LoaderConfig, Result};
use csv::{ByteRecord, ReaderBuilder, Trim};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::timestamp::{parse_counter, parse_timestamp, ParsedTimestamp};
use crate::workbook::{self, cell_text, counter_cell, first_sheet, is_blank_row, timestamp_cell};

static EMPTY_CELL: Data = Data::Empty;

/// Header positions of the three required columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    timestamp: usize,
    counter_a: usize,
    counter_b: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], columns: &ColumnConfig) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let wanted = [&columns.timestamp, &columns.counter_a, &columns.counter_b];
        let missing: Vec<&str> = wanted
            .iter()
            .filter(|name| find(name.as_str()).is_none())
            .map(|name| name.as_str())
            .collect();

        match (
            find(columns.timestamp.as_str()),
            find(columns.counter_a.as_str()),
            find(columns.counter_b.as_str()),
        ) {
            (Some(timestamp), Some(counter_a), Some(counter_b)) => Ok(Self {
                timestamp,
                counter_a,
                counter_b,
            }),
            _ => Err(Error::malformed(format!(
                "missing column(s): {} (found: {})",
                missing.join(", "),
                headers.join(", ")
            ))),
        }
    }
}

/// Loads an ordered event sequence from a delimited text or workbook source.
pub struct EventLoader {
    config: LoaderConfig,
}

impl EventLoader {
    /// Create a new loader.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load events from a file. Workbook extensions (`.xlsx`, `.xls`, ...)
    /// are read as spreadsheets, anything else as delimited text.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Vec<Event>> {
        let path = path.as_ref();
        if workbook::is_workbook_path(path) {
            return self.load_workbook(path);
        }
        debug!(path = %path.display(), "opening delimited event source");
        let file = File::open(path)?;
        self.load_reader(file)
    }

    /// Load events from the first worksheet of a workbook file.
    pub fn load_workbook(&self, path: impl AsRef<Path>) -> Result<Vec<Event>> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening workbook event source");
        self.load_workbook_bytes(fs::read(path)?)
    }

    /// Load events from workbook file contents.
    pub fn load_workbook_bytes(&self, bytes: Vec<u8>) -> Result<Vec<Event>> {
        let sheet = first_sheet(bytes)?;
        let mut rows = sheet.rows().filter(|row| !is_blank_row(row));

        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| Error::malformed("worksheet has no header row"))?
            .iter()
            .map(cell_text)
            .collect();
        let index = ColumnIndex::resolve(&headers, &self.config.columns)?;

        let mut events = Vec::new();
        for (i, cells) in rows.enumerate() {
            events.push(self.parse_cells(i + 1, cells, index)?);
        }
        log_loaded(&events);
        Ok(events)
    }

    /// Load events from in-memory text.
    pub fn load_str(&self, source: &str) -> Result<Vec<Event>> {
        self.load_reader(source.as_bytes())
    }

    /// Load delimited text from any reader.
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Vec<Event>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter_byte()?)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = reader
            .byte_headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| {
                std::str::from_utf8(h)
                    .map(str::to_string)
                    .map_err(|_| Error::malformed("header row is not valid UTF-8"))
            })
            .collect::<Result<Vec<_>>>()?;
        if headers.is_empty() {
            return Err(Error::malformed("source has no header row"));
        }
        let index = ColumnIndex::resolve(&headers, &self.config.columns)?;

        let mut events = Vec::new();
        let mut record = ByteRecord::new();
        let mut row = 0;
        while reader.read_byte_record(&mut record).map_err(csv_error)? {
            row += 1;
            events.push(self.parse_record(row, &record, index)?);
        }
        log_loaded(&events);
        Ok(events)
    }

    fn parse_record(&self, row: usize, record: &ByteRecord, index: ColumnIndex) -> Result<Event> {
        let columns = &self.config.columns;

        let raw_ts = text_cell(record, row, index.timestamp, &columns.timestamp)?;
        let ts = parse_timestamp(raw_ts).ok_or_else(|| {
            Error::parse(row, &columns.timestamp, raw_ts, "unrecognized timestamp")
        })?;

        let raw_a = text_cell(record, row, index.counter_a, &columns.counter_a)?;
        let counter_a =
            parse_counter(raw_a).map_err(|reason| Error::parse(row, &columns.counter_a, raw_a, reason))?;

        let raw_b = text_cell(record, row, index.counter_b, &columns.counter_b)?;
        let counter_b =
            parse_counter(raw_b).map_err(|reason| Error::parse(row, &columns.counter_b, raw_b, reason))?;

        Ok(event(ts, counter_a, counter_b))
    }

    fn parse_cells(&self, row: usize, cells: &[Data], index: ColumnIndex) -> Result<Event> {
        let columns = &self.config.columns;
        let get = |idx: usize| cells.get(idx).unwrap_or(&EMPTY_CELL);

        let raw_ts = get(index.timestamp);
        let ts = timestamp_cell(raw_ts)
            .map_err(|reason| Error::parse(row, &columns.timestamp, cell_text(raw_ts), reason))?;

        let raw_a = get(index.counter_a);
        let counter_a = counter_cell(raw_a)
            .map_err(|reason| Error::parse(row, &columns.counter_a, cell_text(raw_a), reason))?;

        let raw_b = get(index.counter_b);
        let counter_b = counter_cell(raw_b)
            .map_err(|reason| Error::parse(row, &columns.counter_b, cell_text(raw_b), reason))?;

        Ok(event(ts, counter_a, counter_b))
    }
}

impl Default for EventLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

/// Load events from a file with the given configuration.
pub fn load_events(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<Vec<Event>> {
    EventLoader::new(config.clone()).load_path(path)
}

fn event(ts: ParsedTimestamp, counter_a: u64, counter_b: u64) -> Event {
    Event {
        date: ts.date,
        time: ts.time,
        counter_a,
        counter_b,
    }
}

fn log_loaded(events: &[Event]) {
    if events.is_empty() {
        warn!("event source has a header but no data rows");
    } else {
        info!(events = events.len(), "loaded event table");
    }
}

fn text_cell<'r>(record: &'r ByteRecord, row: usize, idx: usize, column: &str) -> Result<&'r str> {
    let bytes = record
        .get(idx)
        .ok_or_else(|| Error::parse(row, column, "", "missing field"))?;
    std::str::from_utf8(bytes)
        .map_err(|_| Error::parse(row, column, String::from_utf8_lossy(bytes), "invalid UTF-8"))
}

fn csv_error(err: csv::Error) -> Error {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            other => Error::malformed(format!("{:?}", other)),
        }
    } else {
        Error::malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::io::Write;

    const HEADER: &str = "HH:MM:SS.mmmuuun,COUN,ENER";

    fn load(source: &str) -> Result<Vec<Event>> {
        EventLoader::default().load_str(source)
    }

    #[test]
    fn test_basic_load() {
        let events = load(&format!(
            "{HEADER}\n00:00:01.000100,5,2\n00:00:01.900000,3,0\n00:00:03.000000,1,1\n"
        ))
        .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].counter_a, 5);
        assert_eq!(events[0].counter_b, 2);
        assert_eq!(events[1].second(), 1);
        assert_eq!(events[2].second(), 3);
        assert_eq!(events[2].date, None);
    }

    #[test]
    fn test_columns_by_name_any_order_extra_ignored() {
        let events = load("ENER, Extra ,COUN,HH:MM:SS.mmmuuun\n7,x,9,10:00:00\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].counter_a, 9);
        assert_eq!(events[0].counter_b, 7);
        assert_eq!(events[0].second(), 36_000);
    }

    #[test]
    fn test_unsorted_rows_kept_in_source_order() {
        let events = load(&format!("{HEADER}\n00:00:05,1,0\n00:00:02,2,0\n")).unwrap();
        assert_eq!(events[0].second(), 5);
        assert_eq!(events[1].second(), 2);
    }

    #[test]
    fn test_dated_timestamps() {
        let events = load(&format!("{HEADER}\n2024-01-02 00:00:01.5,1,1\n")).unwrap();
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(events[0].time, NaiveTime::from_hms_milli_opt(0, 0, 1, 500).unwrap());
    }

    #[test]
    fn test_missing_column() {
        let err = load("HH:MM:SS.mmmuuun,COUN\n00:00:01,1\n").unwrap_err();
        match err {
            Error::MalformedInput(msg) => assert!(msg.contains("ENER")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_source_is_malformed() {
        assert!(matches!(load("").unwrap_err(), Error::MalformedInput(_)));
    }

    #[test]
    fn test_header_only_yields_no_events() {
        assert!(load(HEADER).unwrap().is_empty());
    }

    #[test]
    fn test_bad_timestamp_reports_row() {
        let err = load(&format!("{HEADER}\n00:00:01,1,1\nnot-a-time,1,1\n")).unwrap_err();
        match err {
            Error::Parse { row, column, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "HH:MM:SS.mmmuuun");
                assert_eq!(value, "not-a-time");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_counter_reports_row_and_column() {
        let err = load(&format!("{HEADER}\n00:00:01,1,1\n00:00:02,1,1\n00:00:03,1,-4\n")).unwrap_err();
        assert_eq!(err.row(), Some(3));
        assert!(matches!(err, Error::Parse { ref column, .. } if column == "ENER"));
    }

    #[test]
    fn test_short_record_is_parse_error() {
        let err = load(&format!("{HEADER}\n00:00:01,1\n")).unwrap_err();
        assert_eq!(err.row(), Some(1));
    }

    #[test]
    fn test_custom_delimiter_and_columns() {
        let config = LoaderConfig {
            delimiter: ';',
            columns: ColumnConfig {
                timestamp: "time".to_string(),
                counter_a: "hits".to_string(),
                counter_b: "energy".to_string(),
            },
        };
        let events = EventLoader::new(config)
            .load_str("time;hits;energy\n00:01:00;2.0;4\n")
            .unwrap();
        assert_eq!(events[0].counter_a, 2);
        assert_eq!(events[0].second(), 60);
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "00:00:10,1,2").unwrap();
        let events = load_events(file.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(events.len(), 1);
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[test]
    fn test_invalid_utf8_cell_reports_row() {
        let mut source = format!("{HEADER}\n00:00:01,1,1\n00:00:02,").into_bytes();
        source.extend_from_slice(b"\xff\xfe,1\n");
        let err = EventLoader::default().load_reader(source.as_slice()).unwrap_err();
        match err {
            Error::Parse { row, column, reason, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "COUN");
                assert_eq!(reason, "invalid UTF-8");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_workbook_by_extension() {
        let events = EventLoader::default().load_path(fixture("events.xlsx")).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].time, NaiveTime::from_hms_milli_opt(0, 0, 1, 250).unwrap());
        assert_eq!((events[0].counter_a, events[0].counter_b), (5, 2));
        assert_eq!(events[1].time, NaiveTime::from_hms_milli_opt(0, 0, 1, 750).unwrap());
        assert_eq!(events[2].second(), 3);
        assert_eq!(events[2].counter_a, 1);
        assert!(events.iter().all(|e| e.date.is_none()));
    }

    #[test]
    fn test_workbook_bad_counter_reports_row() {
        let err = EventLoader::default()
            .load_workbook(fixture("bad_counter.xlsx"))
            .unwrap_err();
        match err {
            Error::Parse { row, column, reason, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "COUN");
                assert_eq!(reason, "negative counter delta");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_workbook_missing_column() {
        let config = LoaderConfig {
            columns: ColumnConfig {
                counter_b: "energy".to_string(),
                ..ColumnConfig::default()
            },
            ..LoaderConfig::default()
        };
        let err = EventLoader::new(config)
            .load_path(fixture("events.xlsx"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(ref msg) if msg.contains("energy")));
    }

    #[test]
    fn test_missing_workbook_is_io_error() {
        let err = EventLoader::default()
            .load_path("/definitely/not/here.xlsx")
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EventLoader::default()
            .load_path("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
