//! PyO3 bindings for the counter-series engine.
//!
//! Exposes to Python:
//! - Event loading from delimited text and spreadsheet workbooks
//! - Per-second aggregation into a dense table, with lookup
//! - Table snapshots, chart series and summaries
//! - A session store for follow-up queries

use pyo3::exceptions::{PyKeyError, PyOSError, PyValueError};
use pyo3::prelude::*;

use counter_aggregation::{
    ChartSeries as RustChartSeries, CounterLabels, DenseTable as RustDenseTable,
    SecondAggregator, TableSummary as RustTableSummary,
};
use counter_core::{
    AggregationConfig, Config, Counter, DenseRow as RustDenseRow, Error as RustError,
    Event as RustEvent, Lookup, SecondSample as RustSecondSample, SessionConfig,
};
use counter_ingestion::{parse_timestamp, EventLoader};
use counter_session::{table_from_json, table_to_json, SessionId, SessionStore as RustSessionStore};

fn to_py_err(err: RustError) -> PyErr {
    match err {
        RustError::SessionNotFound(id) => PyKeyError::new_err(id),
        RustError::Io(e) => PyOSError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One input record: a timestamp and two counter increments.
#[pyclass]
#[derive(Clone)]
pub struct Event {
    inner: RustEvent,
}

#[pymethods]
impl Event {
    #[new]
    fn new(timestamp: &str, counter_a: u64, counter_b: u64) -> PyResult<Self> {
        let parsed = parse_timestamp(timestamp)
            .ok_or_else(|| PyValueError::new_err(format!("unrecognised timestamp '{timestamp}'")))?;
        let mut inner = RustEvent::new(parsed.time, counter_a, counter_b);
        inner.date = parsed.date;
        Ok(Event { inner })
    }

    #[getter]
    fn time(&self) -> String {
        self.inner.time.format("%H:%M:%S%.6f").to_string()
    }

    #[getter]
    fn date(&self) -> Option<String> {
        self.inner.date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    #[getter]
    fn counter_a(&self) -> u64 {
        self.inner.counter_a
    }

    #[getter]
    fn counter_b(&self) -> u64 {
        self.inner.counter_b
    }

    /// Whole-second offset from midnight.
    #[getter]
    fn second(&self) -> i64 {
        self.inner.second()
    }

    fn __repr__(&self) -> String {
        format!("Event({})", self.inner)
    }
}

impl From<RustEvent> for Event {
    fn from(inner: RustEvent) -> Self {
        Event { inner }
    }
}

/// One second of the dense table.
#[pyclass]
#[derive(Clone)]
pub struct DenseRow {
    #[pyo3(get)]
    pub second: i64,
    #[pyo3(get)]
    pub count_a: u64,
    #[pyo3(get)]
    pub count_b: u64,
    #[pyo3(get)]
    pub cumulative_a: u64,
    #[pyo3(get)]
    pub cumulative_b: u64,
}

#[pymethods]
impl DenseRow {
    fn __repr__(&self) -> String {
        format!(
            "DenseRow(second={}, count_a={}, count_b={}, cumulative_a={}, cumulative_b={})",
            self.second, self.count_a, self.count_b, self.cumulative_a, self.cumulative_b
        )
    }
}

impl From<&RustDenseRow> for DenseRow {
    fn from(r: &RustDenseRow) -> Self {
        DenseRow {
            second: r.second,
            count_a: r.count_a,
            count_b: r.count_b,
            cumulative_a: r.cumulative_a,
            cumulative_b: r.cumulative_b,
        }
    }
}

/// Lookup result for one second.
#[pyclass]
#[derive(Clone)]
pub struct SecondSample {
    #[pyo3(get)]
    pub count_a: u64,
    #[pyo3(get)]
    pub cumulative_a: u64,
    #[pyo3(get)]
    pub count_b: u64,
    #[pyo3(get)]
    pub cumulative_b: u64,
}

#[pymethods]
impl SecondSample {
    fn __repr__(&self) -> String {
        format!(
            "SecondSample(count_a={}, cumulative_a={}, count_b={}, cumulative_b={})",
            self.count_a, self.cumulative_a, self.count_b, self.cumulative_b
        )
    }
}

impl From<RustSecondSample> for SecondSample {
    fn from(s: RustSecondSample) -> Self {
        SecondSample {
            count_a: s.count_a,
            cumulative_a: s.cumulative_a,
            count_b: s.count_b,
            cumulative_b: s.cumulative_b,
        }
    }
}

fn found(lookup: Lookup) -> Option<SecondSample> {
    match lookup {
        Lookup::Found(sample) => Some(sample.into()),
        Lookup::OutOfRange { .. } | Lookup::NotInteger { .. } => None,
    }
}

/// Data for one line chart.
#[pyclass]
#[derive(Clone)]
pub struct ChartSeries {
    #[pyo3(get)]
    pub title: String,
    #[pyo3(get)]
    pub x_label: String,
    #[pyo3(get)]
    pub y_label: String,
    #[pyo3(get)]
    pub seconds: Vec<i64>,
    #[pyo3(get)]
    pub values: Vec<u64>,
}

#[pymethods]
impl ChartSeries {
    fn __repr__(&self) -> String {
        format!("ChartSeries(title={:?}, points={})", self.title, self.seconds.len())
    }
}

impl From<RustChartSeries> for ChartSeries {
    fn from(c: RustChartSeries) -> Self {
        let (seconds, values) = c.points.into_iter().unzip();
        ChartSeries {
            title: c.title,
            x_label: c.x_label,
            y_label: c.y_label,
            seconds,
            values,
        }
    }
}

/// Window and per-counter statistics.
#[pyclass]
#[derive(Clone)]
pub struct TableSummary {
    #[pyo3(get)]
    pub first_second: i64,
    #[pyo3(get)]
    pub last_second: i64,
    #[pyo3(get)]
    pub span_seconds: u64,
    #[pyo3(get)]
    pub active_seconds: u64,
    #[pyo3(get)]
    pub idle_seconds: u64,
    #[pyo3(get)]
    pub longest_idle_run: u64,
    #[pyo3(get)]
    pub total_a: u64,
    #[pyo3(get)]
    pub total_b: u64,
    /// (second, count) of the busiest second.
    #[pyo3(get)]
    pub peak_a: (i64, u64),
    #[pyo3(get)]
    pub peak_b: (i64, u64),
    #[pyo3(get)]
    pub mean_rate_a: f64,
    #[pyo3(get)]
    pub mean_rate_b: f64,
}

impl From<RustTableSummary> for TableSummary {
    fn from(s: RustTableSummary) -> Self {
        let a = s.stats(Counter::A);
        let b = s.stats(Counter::B);
        TableSummary {
            first_second: s.first_second,
            last_second: s.last_second,
            span_seconds: s.span_seconds,
            active_seconds: s.active_seconds,
            idle_seconds: s.idle_seconds,
            longest_idle_run: s.longest_idle_run,
            total_a: a.total,
            total_b: b.total,
            peak_a: (a.peak.second, a.peak.count),
            peak_b: (b.peak.second, b.peak.count),
            mean_rate_a: a.mean_rate,
            mean_rate_b: b.mean_rate,
        }
    }
}

// ============================================================================
// Python-exposed Engine Classes
// ============================================================================

/// Dense per-second table with O(1) lookup.
#[pyclass]
#[derive(Clone)]
pub struct DenseTable {
    inner: RustDenseTable,
}

#[pymethods]
impl DenseTable {
    #[getter]
    fn lo(&self) -> i64 {
        self.inner.lo()
    }

    #[getter]
    fn hi(&self) -> i64 {
        self.inner.hi()
    }

    /// Row values for `second`, or None outside [lo, hi].
    fn lookup(&self, second: i64) -> Option<SecondSample> {
        found(self.inner.lookup(second))
    }

    /// All rows in ascending second order.
    fn rows(&self) -> Vec<DenseRow> {
        self.inner.iter().map(DenseRow::from).collect()
    }

    fn to_json(&self) -> PyResult<String> {
        table_to_json(&self.inner).map_err(to_py_err)
    }

    /// Rebuild a table from `to_json` output, re-checking its invariants.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        Ok(DenseTable {
            inner: table_from_json(json).map_err(to_py_err)?,
        })
    }

    /// Count and cumulative series for both counters.
    #[pyo3(signature = (counter_a_label="COUN", counter_b_label="ENER"))]
    fn chart_series(&self, counter_a_label: &str, counter_b_label: &str) -> Vec<ChartSeries> {
        let labels = CounterLabels::new(counter_a_label, counter_b_label);
        counter_aggregation::chart_series(&self.inner, &labels)
            .into_iter()
            .map(ChartSeries::from)
            .collect()
    }

    fn summary(&self) -> TableSummary {
        RustTableSummary::from_table(&self.inner).into()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "DenseTable(lo={}, hi={}, rows={})",
            self.inner.lo(),
            self.inner.hi(),
            self.inner.len()
        )
    }
}

/// Tables kept between an upload and its follow-up queries.
#[pyclass]
pub struct SessionStore {
    inner: RustSessionStore,
}

#[pymethods]
impl SessionStore {
    #[new]
    #[pyo3(signature = (ttl_secs=1800, max_sessions=64))]
    fn new(ttl_secs: u64, max_sessions: usize) -> PyResult<Self> {
        let config = Config {
            session: SessionConfig {
                ttl_secs,
                max_sessions,
            },
            ..Config::default()
        };
        config.validate().map_err(to_py_err)?;
        Ok(SessionStore {
            inner: RustSessionStore::new(config.session),
        })
    }

    /// Store a table and return its session id.
    fn insert(&self, table: &DenseTable) -> String {
        self.inner.insert(table.inner.clone()).to_string()
    }

    fn get(&self, session_id: &str) -> PyResult<DenseTable> {
        let id: SessionId = session_id.parse().map_err(to_py_err)?;
        let table = self.inner.get(&id).map_err(to_py_err)?;
        Ok(DenseTable {
            inner: (*table).clone(),
        })
    }

    fn lookup(&self, session_id: &str, second: i64) -> PyResult<Option<SecondSample>> {
        let id: SessionId = session_id.parse().map_err(to_py_err)?;
        Ok(found(self.inner.lookup(&id, second).map_err(to_py_err)?))
    }

    fn remove(&self, session_id: &str) -> bool {
        session_id
            .parse::<SessionId>()
            .map(|id| self.inner.remove(&id))
            .unwrap_or(false)
    }

    /// Drop expired sessions; returns how many were removed.
    fn evict_expired(&self) -> usize {
        self.inner.evict_expired()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Load events from a delimited text file with a header row, or from the
/// first worksheet of a workbook (`.xlsx`, `.xls`, `.ods`, ...).
#[pyfunction]
#[pyo3(signature = (path, delimiter=',', timestamp_column=None, counter_a_column=None, counter_b_column=None))]
fn load_events_csv(
    path: &str,
    delimiter: char,
    timestamp_column: Option<String>,
    counter_a_column: Option<String>,
    counter_b_column: Option<String>,
) -> PyResult<Vec<Event>> {
    let mut config = Config::default();
    config.loader.delimiter = delimiter;
    if let Some(name) = timestamp_column {
        config.loader.columns.timestamp = name;
    }
    if let Some(name) = counter_a_column {
        config.loader.columns.counter_a = name;
    }
    if let Some(name) = counter_b_column {
        config.loader.columns.counter_b = name;
    }
    config.validate().map_err(to_py_err)?;

    let events = EventLoader::new(config.loader)
        .load_path(path)
        .map_err(to_py_err)?;
    Ok(events.into_iter().map(Event::from).collect())
}

/// Aggregate events into a dense per-second table.
#[pyfunction]
#[pyo3(signature = (events, reject_multi_day=true))]
fn aggregate(events: Vec<Event>, reject_multi_day: bool) -> PyResult<DenseTable> {
    let events: Vec<RustEvent> = events.into_iter().map(|e| e.inner).collect();
    let aggregator = SecondAggregator::new(AggregationConfig { reject_multi_day });
    Ok(DenseTable {
        inner: aggregator.aggregate(&events).map_err(to_py_err)?,
    })
}

/// Route engine logs to stderr. Returns False if logging was already set up.
#[pyfunction]
#[pyo3(signature = (filter="info"))]
fn init_logging(filter: &str) -> PyResult<bool> {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok())
}

// ============================================================================
// Module Definition
// ============================================================================

/// Counter Series - per-second counter aggregation for Python.
#[pymodule]
fn counter_series(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<Event>()?;
    m.add_class::<DenseRow>()?;
    m.add_class::<SecondSample>()?;
    m.add_class::<ChartSeries>()?;
    m.add_class::<TableSummary>()?;

    // Engine classes
    m.add_class::<DenseTable>()?;
    m.add_class::<SessionStore>()?;

    // Functions
    m.add_function(wrap_pyfunction!(load_events_csv, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    Ok(())
}
