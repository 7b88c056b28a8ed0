//! cp / mv commands - Relocate objects matching a regex
//!
//! Per-object failures do not stop the batch; they are listed and turn the
//! exit code into `PartialFailure`.

use clap::Args;
use s3fc_core::{RelocateMode, RelocateReport, relocate_by_pattern};

use super::{StoreArgs, compile, connect, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct RelocateArgs {
    /// Source location (bucket[/prefix])
    pub source: String,

    /// Regex searched in each full source key
    pub pattern: String,

    /// Target location (bucket[/prefix]); the source prefix is replaced by it
    pub target: String,
}

pub async fn execute(
    args: RelocateArgs,
    mode: RelocateMode,
    store: &StoreArgs,
    formatter: &Formatter,
) -> ExitCode {
    let source = match parse_location(&args.source, formatter) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let target = match parse_location(&args.target, formatter) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let pattern = match compile(&args.pattern, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match connect(store, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let report_data = match relocate_by_pattern(
        &client,
        &source.bucket,
        &target.bucket,
        &pattern,
        &source.key,
        &target.key,
        mode,
    )
    .await
    {
        Ok(r) => r,
        Err(e) => return report(formatter, &format!("Failed to {mode} objects"), &e),
    };

    print_report(formatter, &report_data);

    if report_data.is_complete() {
        ExitCode::Success
    } else {
        ExitCode::PartialFailure
    }
}

fn print_report(formatter: &Formatter, report: &RelocateReport) {
    if formatter.is_json() {
        formatter.json(report);
        return;
    }

    if report.relocated.is_empty() && report.failed.is_empty() {
        formatter.println("No matches found.");
        return;
    }

    for item in &report.relocated {
        formatter.println(&format!(
            "{} -> {}",
            formatter.style_key(&item.source.to_string()),
            formatter.style_name(&item.target.to_string())
        ));
    }
    for failure in &report.failed {
        formatter.error(&format!("{}: {}", failure.source, failure.error));
    }

    let verb = match report.mode {
        RelocateMode::Copy => "Copied",
        RelocateMode::Move => "Moved",
    };
    if report.failed.is_empty() {
        formatter.success(&format!("{verb} {} object(s)", report.relocated.len()));
    } else {
        formatter.warning(&format!(
            "{verb} {} object(s), {} failed",
            report.relocated.len(),
            report.failed.len()
        ));
    }
}
