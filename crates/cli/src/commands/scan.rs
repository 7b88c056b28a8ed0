//! scan command - List keys matching a regex
//!
//! Listing failures are reported as a warning and an empty result, matching
//! the library's scan semantics.

use clap::Args;
use s3fc_core::{ScanMode, scan_by_pattern};
use serde::Serialize;

use super::{StoreArgs, compile, connect, parse_location};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Location to scan (bucket[/prefix])
    pub path: String,

    /// Regex searched in each full key
    pub pattern: String,

    /// Output full keys or trailing names (key, name)
    #[arg(long, default_value = "key")]
    pub mode: String,
}

#[derive(Debug, Serialize)]
struct ScanOutput {
    bucket: String,
    prefix: String,
    pattern: String,
    mode: String,
    entries: Vec<String>,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(args: ScanArgs, store: &StoreArgs, formatter: &Formatter) -> ExitCode {
    let location = match parse_location(&args.path, formatter) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let pattern = match compile(&args.pattern, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };

    // An unknown mode is not fatal: report it and print nothing found
    let mode = match args.mode.parse::<ScanMode>() {
        Ok(mode) => mode,
        Err(message) => {
            formatter.warning(&message);
            print_output(
                formatter,
                ScanOutput {
                    bucket: location.bucket,
                    prefix: location.key,
                    pattern: args.pattern,
                    mode: args.mode,
                    entries: Vec::new(),
                    count: 0,
                    error: Some(message),
                },
            );
            return ExitCode::Success;
        }
    };

    let client = match connect(store, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let outcome = scan_by_pattern(&client, &location.bucket, &location.key, &pattern, mode).await;
    let error = if let s3fc_core::ScanOutcome::Failed(e) = &outcome {
        formatter.warning(&format!("Scan failed: {e}"));
        Some(e.to_string())
    } else {
        None
    };

    let entries = outcome.into_entries();
    print_output(
        formatter,
        ScanOutput {
            bucket: location.bucket,
            prefix: location.key,
            pattern: args.pattern,
            mode: mode.to_string(),
            count: entries.len(),
            entries,
            error,
        },
    );

    ExitCode::Success
}

fn print_output(formatter: &Formatter, output: ScanOutput) {
    if formatter.is_json() {
        formatter.json(&output);
        return;
    }

    if output.entries.is_empty() {
        formatter.println("No matches found.");
        return;
    }
    for entry in &output.entries {
        formatter.println(&formatter.style_key(entry));
    }
    formatter.println(&format!("\nTotal: {} match(es)", output.count));
}
