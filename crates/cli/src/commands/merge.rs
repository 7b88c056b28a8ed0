//! merge command - Append newer rows of a time-series CSV to an older one
//!
//! Works on local files only; no store connection is made.

use std::path::PathBuf;

use clap::Args;
use jiff::civil::Date;
use s3fc_core::{MergeOptions, merge_timeseries_csv};
use serde::Serialize;

use super::{load_config, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Older CSV; its name seeds the output names
    pub old: PathBuf,

    /// Newer CSV whose later rows are appended
    pub new: PathBuf,

    /// Output file name instead of the derived one
    #[arg(long)]
    pub file_name: Option<String>,

    /// Output folder instead of the derived one
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Parent directory of the derived output folder
    #[arg(long, default_value = ".")]
    pub output_root: PathBuf,

    /// Date column name (defaults to the configured one)
    #[arg(long)]
    pub date_column: Option<String>,

    /// Date stamped into derived names, YYYY-MM-DD
    #[arg(long)]
    pub today: Option<Date>,
}

#[derive(Debug, Serialize)]
struct MergeOutput {
    path: String,
    rows: usize,
    columns: usize,
    appended_rows: usize,
    first_date: String,
    last_date: String,
}

pub fn execute(args: MergeArgs, formatter: &Formatter) -> ExitCode {
    let date_column = match args.date_column {
        Some(column) => column,
        None => match load_config(formatter) {
            Ok(config) => config.merge.date_column,
            Err(code) => return code,
        },
    };

    let options = MergeOptions {
        date_column,
        file_name: args.file_name,
        folder: args.folder,
        output_root: args.output_root,
        today: args.today,
    };

    let outcome = match merge_timeseries_csv(&args.old, &args.new, &options) {
        Ok(o) => o,
        Err(e) => return report(formatter, "Merge failed", &e),
    };

    let (rows, columns) = outcome.table.shape();
    let output = MergeOutput {
        path: outcome.path.display().to_string(),
        rows,
        columns,
        appended_rows: outcome.appended_rows,
        first_date: outcome.first_date,
        last_date: outcome.last_date,
    };

    if formatter.is_json() {
        formatter.json(&output);
    } else {
        formatter.success(&format!(
            "Merged {} new row(s); {} rows from {} to {}",
            output.appended_rows, output.rows, output.first_date, output.last_date
        ));
        formatter.println(&format!(
            "Saved to {}",
            formatter.style_path(&output.path)
        ));
    }

    ExitCode::Success
}
