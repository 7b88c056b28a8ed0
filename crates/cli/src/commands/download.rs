//! download command - Fetch objects matching a regex into a local directory

use std::path::PathBuf;

use clap::Args;
use s3fc_core::{DownloadedFile, download_by_pattern};
use serde::Serialize;

use super::{StoreArgs, compile, connect, parse_location, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Location to scan (bucket[/prefix])
    pub path: String,

    /// Regex searched in each full key
    pub pattern: String,

    /// Destination directory
    #[arg(long, short = 'd', default_value = ".")]
    pub dest: PathBuf,

    /// Subdirectory of the destination to write into
    #[arg(long)]
    pub subfolder: Option<String>,
}

#[derive(Debug, Serialize)]
struct DownloadOutput {
    files: Vec<DownloadedFile>,
    total_count: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

pub async fn execute(args: DownloadArgs, store: &StoreArgs, formatter: &Formatter) -> ExitCode {
    let location = match parse_location(&args.path, formatter) {
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

    let files = match download_by_pattern(
        &client,
        &location.bucket,
        &location.key,
        &pattern,
        &args.dest,
        args.subfolder.as_deref(),
    )
    .await
    {
        Ok(files) => files,
        Err(e) => return report(formatter, "Download failed", &e),
    };

    let total_size: u64 = files.iter().map(|f| f.size_bytes).sum();
    let output = DownloadOutput {
        total_count: files.len(),
        total_size_bytes: total_size,
        total_size_human: humansize::format_size(total_size, humansize::BINARY),
        files,
    };

    if formatter.is_json() {
        formatter.json(&output);
    } else if output.files.is_empty() {
        formatter.println("No matches found.");
    } else {
        for file in &output.files {
            let size = humansize::format_size(file.size_bytes, humansize::BINARY);
            formatter.println(&format!(
                "{:>10} {} -> {}",
                formatter.style_size(&size),
                formatter.style_key(&file.key),
                formatter.style_path(&file.local_path.display().to_string())
            ));
        }
        formatter.success(&format!(
            "Downloaded {} file(s), {}",
            output.total_count, output.total_size_human
        ));
    }

    ExitCode::Success
}
