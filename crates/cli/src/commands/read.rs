//! read command - Load a CSV or spreadsheet object into a table

use clap::{Args, ValueEnum};
use s3fc_core::{
    ObjectRef, ReadFailure, Table, read_csv, read_csv_by_pattern, read_excel,
    read_excel_by_pattern,
};
use serde::Serialize;

use super::{StoreArgs, compile, connect, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReadFormat {
    #[default]
    Csv,
    /// First sheet of an xls, xlsx or ods workbook
    Excel,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Location (bucket[/prefix])
    pub path: String,

    /// File name below the prefix
    #[arg(long, conflicts_with = "pattern")]
    pub name: Option<String>,

    /// Full object key, ignoring the prefix
    #[arg(long, conflicts_with = "pattern")]
    pub key: Option<String>,

    /// Read one of the objects matching this regex instead
    #[arg(long)]
    pub pattern: Option<String>,

    /// Which match to read; negative values count from the end
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub index: isize,

    #[arg(long, value_enum, default_value_t = ReadFormat::Csv)]
    pub format: ReadFormat,

    /// Print at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ReadOutput<'a> {
    rows_total: usize,
    columns: usize,
    headers: &'a [String],
    rows: &'a [Vec<String>],
}

pub async fn execute(args: ReadArgs, store: &StoreArgs, formatter: &Formatter) -> ExitCode {
    let location = match parse_location(&args.path, formatter) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let pattern = match args.pattern.as_deref().map(|p| compile(p, formatter)) {
        Some(Ok(p)) => Some(p),
        Some(Err(code)) => return code,
        None => None,
    };
    let object = if pattern.is_none() {
        match ObjectRef::from_parts(
            Some(&location.key),
            args.name.as_deref(),
            args.key.as_deref(),
        ) {
            Ok(object) => Some(object),
            Err(e) => return report(formatter, "Nothing to read", &e),
        }
    } else {
        None
    };

    let client = match connect(store, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };
    let bucket = location.bucket.as_str();
    let prefix = location.key.as_str();

    let table = match (args.format, pattern, object) {
        (ReadFormat::Csv, Some(pattern), _) => {
            match read_csv_by_pattern(&client, bucket, prefix, &pattern, args.index).await {
                Ok(Some(table)) => table,
                Ok(None) => return csv_unreadable(formatter),
                Err(e) => return report(formatter, "Failed to select a CSV", &e),
            }
        }
        (ReadFormat::Csv, None, Some(object)) => match read_csv(&client, bucket, &object).await {
            Some(table) => table,
            None => return csv_unreadable(formatter),
        },
        (ReadFormat::Excel, Some(pattern), _) => {
            match read_excel_by_pattern(&client, bucket, prefix, &pattern, args.index).await {
                Ok(table) => table,
                Err(failure) => return excel_failure(formatter, &failure),
            }
        }
        (ReadFormat::Excel, None, Some(object)) => {
            let result = match &object {
                ObjectRef::Name { prefix, name } => read_excel(&client, bucket, prefix, name).await,
                ObjectRef::Key(key) => read_excel(&client, bucket, "", key).await,
            };
            match result {
                Ok(table) => table,
                Err(failure) => return excel_failure(formatter, &failure),
            }
        }
        (_, None, None) => return ExitCode::UsageError,
    };

    print_table(formatter, &table, args.limit);
    ExitCode::Success
}

fn csv_unreadable(formatter: &Formatter) -> ExitCode {
    formatter.error("Failed to read the CSV object; rerun with --debug for details");
    ExitCode::GeneralError
}

fn excel_failure(formatter: &Formatter, failure: &ReadFailure) -> ExitCode {
    if formatter.is_json() {
        formatter.json(failure);
    } else {
        formatter.error(&format!("Failed to read spreadsheet: {failure}"));
    }
    ExitCode::GeneralError
}

fn print_table(formatter: &Formatter, table: &Table, limit: Option<usize>) {
    let (rows_total, columns) = table.shape();
    let shown = limit.unwrap_or(rows_total).min(rows_total);
    let rows = &table.rows()[..shown];

    if formatter.is_json() {
        formatter.json(&ReadOutput {
            rows_total,
            columns,
            headers: table.headers(),
            rows,
        });
        return;
    }

    formatter.table(table.headers(), rows);
    formatter.println(&format!(
        "({rows_total} rows x {columns} columns{})",
        if shown < rows_total {
            format!(", showing {shown}")
        } else {
            String::new()
        }
    ));
}
