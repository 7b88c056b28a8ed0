//! Tabular reads of stored objects
//!
//! Objects are parsed into a [`Table`]: a header row plus text cells. CSV
//! reads report failure as an absent table, spreadsheet reads as a
//! [`ReadFailure`] record; neither raises.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use jiff::Timestamp;
use jiff::civil::{Date, DateTime, Time};
use jiff::tz::TimeZone;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::{RemoteKey, RemotePath};
use crate::scan::{ScanMode, ScanOutcome, scan_by_pattern};
use crate::traits::ObjectStore;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// In-memory table with string cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse CSV content whose first record is the header row
    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(Error::Table("No columns to parse from file".to_string()));
        }

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(Error::Table(format!(
                    "Expected {} fields in line {}, saw {}",
                    headers.len(),
                    index + 2,
                    record.len()
                )));
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Parse the first worksheet of a spreadsheet (xls, xlsx, xlsb, ods)
    pub fn from_excel_bytes(data: Vec<u8>) -> Result<Self> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(data)).map_err(|e| Error::Table(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::Table("Workbook has no worksheets".to_string()))?
            .map_err(|e| Error::Table(e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();
        let rows = rows
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        Ok(Self::new(headers, rows))
    }

    pub fn read_csv_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;
        Self::from_csv_bytes(&data)
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) if dt.is_duration() => duration_text(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .and_then(|naive| Timestamp::from_millisecond(naive.and_utc().timestamp_millis()).ok())
            .map(|ts| datetime_text(TimeZone::UTC.to_datetime(ts)))
            .unwrap_or_else(|| dt.to_string()),
        Data::DateTimeIso(iso) => iso
            .parse::<DateTime>()
            .or_else(|_| iso.parse::<Date>().map(|d| d.to_datetime(Time::midnight())))
            .map(datetime_text)
            .unwrap_or_else(|_| iso.clone()),
        other => other.to_string(),
    }
}

/// Dates at midnight render as `YYYY-MM-DD`, anything else with the time
fn datetime_text(dt: DateTime) -> String {
    if dt.time() == Time::midnight() {
        dt.date().strftime("%Y-%m-%d").to_string()
    } else {
        dt.strftime("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Elapsed-time cells, as `[h]:mm:ss`
fn duration_text(days: f64) -> String {
    let seconds = (days * 86_400.0).round() as i64;
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Which object a read targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    /// Full object key
    Key(String),
    /// File name below a scope prefix
    Name { prefix: String, name: String },
}

impl ObjectRef {
    /// Build a reference from optional parts; a name wins over a key.
    ///
    /// Fails when neither a name nor a key is given.
    pub fn from_parts(prefix: Option<&str>, name: Option<&str>, key: Option<&str>) -> Result<Self> {
        match (name, key) {
            (Some(name), _) => Ok(ObjectRef::Name {
                prefix: prefix.unwrap_or_default().to_string(),
                name: name.to_string(),
            }),
            (None, Some(key)) => Ok(ObjectRef::Key(key.to_string())),
            (None, None) => Err(Error::InvalidInput(
                "Either 'file_name' or 'file_key' must be provided.".to_string(),
            )),
        }
    }

    /// The object key this reference resolves to
    pub fn key(&self) -> String {
        match self {
            ObjectRef::Key(key) => key.clone(),
            ObjectRef::Name { prefix, name } => RemoteKey::from_prefix(prefix).child(name).to_string(),
        }
    }
}

/// Error record returned by spreadsheet reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadFailure {
    pub success: bool,
    pub error: String,
}

impl ReadFailure {
    pub fn new(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

impl std::error::Error for ReadFailure {}

/// Pick an entry by position; negative indices count from the end
pub fn select_index(entries: &[String], index: isize) -> Result<&String> {
    let len = entries.len() as isize;
    let position = if index < 0 { len + index } else { index };
    if position < 0 || position >= len {
        return Err(Error::NotFound(format!(
            "No entry at index {index} among {len} matches"
        )));
    }
    Ok(&entries[position as usize])
}

/// Fetch an object and parse it as CSV.
///
/// Any fetch or parse failure is logged and yields `None`.
pub async fn read_csv<S>(store: &S, bucket: &str, object: &ObjectRef) -> Option<Table>
where
    S: ObjectStore + ?Sized,
{
    let path = RemotePath::new(bucket, object.key());
    let result = match store.get_object(&path).await {
        Ok(data) => Table::from_csv_bytes(&data),
        Err(e) => Err(e),
    };

    match result {
        Ok(table) => {
            let (rows, columns) = table.shape();
            tracing::info!("Successfully read file: {}", path.key);
            tracing::info!("Table shape: ({rows}, {columns})");
            Some(table)
        }
        Err(e) => {
            tracing::warn!("Error reading file {}: {e}", path.key);
            None
        }
    }
}

/// Read the CSV at `index` among the keys matching `pattern`.
///
/// Negative `index` values count from the end (`-1` is the last match). A failed scan
/// or an index outside the matches is an error; a failed read is `Ok(None)`.
pub async fn read_csv_by_pattern<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    pattern: &Regex,
    index: isize,
) -> Result<Option<Table>>
where
    S: ObjectStore + ?Sized,
{
    let keys = scan_by_pattern(store, bucket, prefix, pattern, ScanMode::Key)
        .await
        .into_result()?;
    let key = select_index(&keys, index)?;
    Ok(read_csv(store, bucket, &ObjectRef::Key(key.clone())).await)
}

/// Fetch `prefix/name` and parse it as a spreadsheet
pub async fn read_excel<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    name: &str,
) -> std::result::Result<Table, ReadFailure>
where
    S: ObjectStore + ?Sized,
{
    let key = RemoteKey::from_prefix(prefix).child(name).to_string();
    let data = store
        .get_object(&RemotePath::new(bucket, key))
        .await
        .map_err(ReadFailure::new)?;
    Table::from_excel_bytes(data).map_err(ReadFailure::new)
}

/// Read the spreadsheet at `index` among the names matching `pattern`.
///
/// Selection failures are reported as a [`ReadFailure`] as well.
pub async fn read_excel_by_pattern<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    pattern: &Regex,
    index: isize,
) -> std::result::Result<Table, ReadFailure>
where
    S: ObjectStore + ?Sized,
{
    let names = match scan_by_pattern(store, bucket, prefix, pattern, ScanMode::Name).await {
        ScanOutcome::Matches(names) => names,
        ScanOutcome::Empty => {
            return Err(ReadFailure::new(format!(
                "No files matching the regex '{}' found in the bucket '{bucket}' with prefix '{prefix}'",
                pattern.as_str()
            )));
        }
        ScanOutcome::Failed(e) => return Err(ReadFailure::new(e)),
    };
    let name = select_index(&names, index).map_err(ReadFailure::new)?;
    read_excel(store, bucket, prefix, name).await
}
