//! mkdir command - Create a folder marker object

use clap::Args;
use s3fc_core::create_folder;

use super::{StoreArgs, connect, report};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Bucket to create the folder in
    pub bucket: String,

    /// Folder key, e.g. reports/2024
    pub folder: String,
}

pub async fn execute(args: MkdirArgs, store: &StoreArgs, formatter: &Formatter) -> ExitCode {
    let client = match connect(store, formatter).await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match create_folder(&client, &args.bucket, &args.folder).await {
        Ok(path) => {
            if formatter.is_json() {
                formatter.json(&serde_json::json!({
                    "status": "success",
                    "bucket": path.bucket,
                    "key": path.key,
                }));
            } else {
                formatter.success(&format!(
                    "Created folder {}",
                    formatter.style_name(&path.to_string())
                ));
            }
            ExitCode::Success
        }
        Err(e) => report(formatter, "Failed to create folder", &e),
    }
}
