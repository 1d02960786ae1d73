//! CSV Log Source

use crate::coerce::{
    optional_text, parse_check_type, parse_port, parse_response_time, parse_success,
    parse_timestamp,
};
use crate::error::LogError;
use crate::record::CheckRecord;
use csv::{ByteRecord, ReaderBuilder, Trim};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Supplier of check records
pub trait LogSource {
    /// Load every record currently in the log
    fn load(&self) -> Result<Vec<CheckRecord>, LogError>;

    /// Whether the underlying log exists at all
    fn exists(&self) -> bool {
        true
    }

    /// Last write time of the log, when known
    fn last_modified(&self) -> Option<SystemTime> {
        None
    }
}

/// Check log stored as a CSV file with a header row
#[derive(Debug, Clone)]
pub struct CsvLogSource {
    path: PathBuf,
}

impl CsvLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSource for CsvLogSource {
    fn load(&self) -> Result<Vec<CheckRecord>, LogError> {
        if !self.path.exists() {
            return Err(LogError::NotFound(self.path.clone()));
        }

        info!("Loading check log from {}", self.path.display());
        let file = File::open(&self.path)?;
        let records = read_records(file)?;
        info!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn last_modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}

/// Column positions resolved from the header row
struct Columns {
    timestamp: usize,
    check_type: usize,
    success: usize,
    check_name: Option<usize>,
    target_host: Option<usize>,
    target_port: Option<usize>,
    response_time: Option<usize>,
    details: Option<usize>,
}

impl Columns {
    fn resolve(headers: &ByteRecord) -> Result<Self, LogError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_ascii_lowercase()
            })
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |column: &'static str| {
            find(column.to_ascii_lowercase().as_str()).ok_or(LogError::MissingColumn(column))
        };

        Ok(Self {
            timestamp: require("Timestamp")?,
            check_type: require("CheckType")?,
            success: require("Success")?,
            check_name: find("checkname"),
            target_host: find("targethost"),
            target_port: find("targetport"),
            response_time: find("responsetimems"),
            details: find("details"),
        })
    }
}

/// Parse check records from any CSV reader.
///
/// Malformed cells are coerced; only an unreadable stream or a header
/// without the required columns is an error.
pub fn read_records<R: Read>(input: R) -> Result<Vec<CheckRecord>, LogError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader.byte_headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        debug!("Check log has no header row");
        return Ok(Vec::new());
    }
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    let mut row = ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut row) {
            Ok(true) => records.push(to_record(&row, &columns)),
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => warn!("Skipping unreadable row: {}", e),
        }
    }

    Ok(records)
}

fn field(row: &ByteRecord, idx: Option<usize>) -> Cow<'_, str> {
    idx.and_then(|i| row.get(i))
        .map(String::from_utf8_lossy)
        .unwrap_or(Cow::Borrowed(""))
}

fn to_record(row: &ByteRecord, columns: &Columns) -> CheckRecord {
    let cell = |idx: Option<usize>| field(row, idx);

    CheckRecord {
        timestamp: parse_timestamp(&cell(Some(columns.timestamp))),
        check_type: parse_check_type(&cell(Some(columns.check_type))),
        check_name: cell(columns.check_name).trim().to_string(),
        target_host: optional_text(&cell(columns.target_host)),
        target_port: parse_port(&cell(columns.target_port)),
        success: parse_success(&cell(Some(columns.success))),
        response_time_ms: parse_response_time(&cell(columns.response_time)),
        details: optional_text(&cell(columns.details)),
    }
}
