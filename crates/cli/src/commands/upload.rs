//! upload command - Put local files matching a regex into a bucket

use std::path::PathBuf;

use clap::Args;
use s3fc_core::{UploadedFile, upload_by_pattern};
use serde::Serialize;

use super::{StoreArgs, compile, connect, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local directory to scan (one level, files only)
    pub source: PathBuf,

    /// Regex searched in each file name
    pub pattern: String,

    /// Destination (bucket[/prefix])
    pub dest: String,

    /// Subdirectory of the source directory to scan instead
    #[arg(long)]
    pub subfolder: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    files: Vec<UploadedFile>,
    total_count: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

pub async fn execute(args: UploadArgs, store: &StoreArgs, formatter: &Formatter) -> ExitCode {
    let location = match parse_location(&args.dest, formatter) {
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

    let prefix = Some(location.key.as_str()).filter(|p| !p.is_empty());
    let files = match upload_by_pattern(
        &client,
        &args.source,
        &pattern,
        &location.bucket,
        prefix,
        args.subfolder.as_deref(),
    )
    .await
    {
        Ok(files) => files,
        Err(e) => return report(formatter, "Upload failed", &e),
    };

    let total_size: u64 = files.iter().map(|f| f.size_bytes).sum();
    let output = UploadOutput {
        total_count: files.len(),
        total_size_bytes: total_size,
        total_size_human: humansize::format_size(total_size, humansize::BINARY),
        files,
    };

    if formatter.is_json() {
        formatter.json(&output);
    } else if output.files.is_empty() {
        formatter.println("No matching local files.");
    } else {
        for file in &output.files {
            formatter.println(&format!(
                "{} -> {}",
                formatter.style_path(&file.local_path.display().to_string()),
                formatter.style_name(&file.remote.to_string())
            ));
        }
        formatter.success(&format!(
            "Uploaded {} file(s), {}",
            output.total_count, output.total_size_human
        ));
    }

    ExitCode::Success
}
