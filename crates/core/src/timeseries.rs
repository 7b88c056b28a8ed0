//! Time-series CSV merge
//!
//! Appends the rows of a newer export that fall strictly after the last date
//! of an older export, and writes the result under a name derived from the
//! older file.

use std::path::{Path, PathBuf};

use jiff::civil::Date;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::table::Table;

/// Date column used by the dataset exports
pub const DEFAULT_DATE_COLUMN: &str = "일자";

const DATE_FORMAT: &str = "%Y-%m-%d";
const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// Options for [`merge_timeseries_csv`]
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Column holding the row date
    pub date_column: String,
    /// Output file name; derived from the old file name when `None`
    pub file_name: Option<String>,
    /// Output folder; derived from the merged date range when `None`
    pub folder: Option<PathBuf>,
    /// Parent of the derived output folder
    pub output_root: PathBuf,
    /// Date stamped into derived names; the local date when `None`
    pub today: Option<Date>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            file_name: None,
            folder: None,
            output_root: PathBuf::from("."),
            today: None,
        }
    }
}

/// Result of a merge
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    /// Merged table, dates formatted as `YYYY-MM-DD`
    pub table: Table,
    /// Where the merged CSV was written
    pub path: PathBuf,
    /// Rows taken from the new file
    pub appended_rows: usize,
    pub first_date: String,
    pub last_date: String,
}

/// Parse a date cell.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD` and `YYYYMMDD`, with an
/// optional trailing time part after a space or `T`.
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    let day = match raw.find([' ', 'T']) {
        Some(pos) => &raw[..pos],
        None => raw,
    };

    if day.len() == 8 && day.bytes().all(|b| b.is_ascii_digit()) {
        let year: i16 = day[0..4].parse().ok()?;
        let month: i8 = day[4..6].parse().ok()?;
        let dom: i8 = day[6..8].parse().ok()?;
        return Date::new(year, month, dom).ok();
    }

    let mut parts = day.split(['-', '/', '.']);
    let year: i16 = parts.next()?.parse().ok()?;
    let month: i8 = parts.next()?.parse().ok()?;
    let dom: i8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Date::new(year, month, dom).ok()
}

/// Merge two time-series CSV files.
///
/// Both tables are assumed sorted by date ascending. Rows of the new table
/// dated after the old table's last row are appended; columns are aligned by
/// name. Fails if either table is empty, lacks the date column or holds an
/// unparseable date.
pub fn merge_timeseries_csv(
    old_path: &Path,
    new_path: &Path,
    options: &MergeOptions,
) -> Result<MergeOutcome> {
    let old = Table::read_csv_file(old_path)?;
    let new = Table::read_csv_file(new_path)?;

    if old.is_empty() {
        return Err(Error::InvalidInput(format!(
            "The file {} is empty.",
            old_path.display()
        )));
    }
    if new.is_empty() {
        return Err(Error::InvalidInput(format!(
            "The file {} is empty.",
            new_path.display()
        )));
    }

    let column = options.date_column.as_str();
    let old_dates = parse_date_column(&old, column, old_path)?;
    let new_dates = parse_date_column(&new, column, new_path)?;

    let boundary = old_dates
        .last()
        .copied()
        .ok_or_else(|| Error::InvalidInput(format!("The file {} is empty.", old_path.display())))?;

    let headers = union_headers(old.headers(), new.headers());
    let date_index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| Error::InvalidInput(format!("Missing date column '{column}'")))?;

    let mut rows = Vec::with_capacity(old.len() + new.len());
    for (row, date) in old.rows().iter().zip(&old_dates) {
        rows.push(align_row(old.headers(), row, &headers, date_index, *date));
    }

    let mut appended_rows = 0;
    for (row, date) in new.rows().iter().zip(&new_dates) {
        if *date > boundary {
            rows.push(align_row(new.headers(), row, &headers, date_index, *date));
            appended_rows += 1;
        }
    }

    let first = old_dates[0];
    let last = rows
        .last()
        .and_then(|row: &Vec<String>| parse_date(&row[date_index]))
        .unwrap_or(boundary);
    let table = Table::new(headers, rows);

    let today = options.today.unwrap_or_else(|| jiff::Zoned::now().date());
    let old_name = old_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let names = OutputNames::derive(&old_name, first, last, today);

    let folder = options
        .folder
        .clone()
        .unwrap_or_else(|| options.output_root.join(&names.folder));
    let file_name = options.file_name.clone().unwrap_or(names.file);

    std::fs::create_dir_all(&folder)?;
    let path = folder.join(file_name);
    table.write_csv_file(&path)?;
    tracing::info!("Merged file saved as {}", path.display());

    Ok(MergeOutcome {
        table,
        path,
        appended_rows,
        first_date: format_date(first, DATE_FORMAT),
        last_date: format_date(last, DATE_FORMAT),
    })
}

fn parse_date_column(table: &Table, column: &str, path: &Path) -> Result<Vec<Date>> {
    let index = table.column_index(column).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Missing date column '{column}' in {}",
            path.display()
        ))
    })?;

    table
        .rows()
        .iter()
        .enumerate()
        .map(|(line, row)| {
            parse_date(&row[index]).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Unparseable date '{}' in {} line {}",
                    row[index],
                    path.display(),
                    line + 2
                ))
            })
        })
        .collect()
}

fn union_headers(old: &[String], new: &[String]) -> Vec<String> {
    let mut headers = old.to_vec();
    for header in new {
        if !headers.contains(header) {
            headers.push(header.clone());
        }
    }
    headers
}

fn align_row(
    source_headers: &[String],
    row: &[String],
    headers: &[String],
    date_index: usize,
    date: Date,
) -> Vec<String> {
    let mut aligned: Vec<String> = headers
        .iter()
        .map(|h| {
            source_headers
                .iter()
                .position(|s| s == h)
                .map(|i| row[i].clone())
                .unwrap_or_default()
        })
        .collect();
    aligned[date_index] = format_date(date, DATE_FORMAT);
    aligned
}

fn format_date(date: Date, format: &str) -> String {
    date.strftime(format).to_string()
}

/// Names derived for a merged file
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutputNames {
    file: String,
    folder: String,
}

impl OutputNames {
    /// `menu2160-code100060-to20240103-save20240104.csv` merged up to
    /// 2024-01-05 on 2024-01-06 becomes
    /// `menu2160-code100060-to20240105-save20240106.csv` in
    /// `dataset-timeseries-menu2160-from20240101-to20240105-merge20240106`.
    fn derive(old_name: &str, first: Date, last: Date, today: Date) -> Self {
        let base = old_name
            .split("-to")
            .next()
            .unwrap_or(old_name)
            .trim_end_matches(".csv");
        let menu = base.split('-').next().unwrap_or(base);
        let first = format_date(first, COMPACT_DATE_FORMAT);
        let last = format_date(last, COMPACT_DATE_FORMAT);
        let today = format_date(today, COMPACT_DATE_FORMAT);

        Self {
            file: format!("{base}-to{last}-save{today}.csv"),
            folder: format!("dataset-timeseries-{menu}-from{first}-to{last}-merge{today}"),
        }
    }
}
