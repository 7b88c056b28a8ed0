//! Command implementations
//!
//! Each subcommand lives in its own module and returns an [`ExitCode`].

mod download;
mod merge;
mod mkdir;
mod read;
mod relocate;
mod scan;
mod upload;

use clap::{Args, Subcommand};
use regex::Regex;
use s3fc_core::{Config, ConfigManager, Error, RelocateMode, StoreSettings};
use s3fc_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Store connection overrides, layered over the config file
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// S3-compatible endpoint URL
    #[arg(long, global = true, env = "S3FC_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region
    #[arg(long, global = true, env = "S3FC_REGION")]
    pub region: Option<String>,

    /// Shared credentials profile
    #[arg(long, global = true, env = "S3FC_PROFILE")]
    pub profile: Option<String>,
}

impl StoreArgs {
    fn apply(&self, settings: &mut StoreSettings) {
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = Some(endpoint.clone());
        }
        if let Some(region) = &self.region {
            settings.region = Some(region.clone());
        }
        if let Some(profile) = &self.profile {
            settings.profile = Some(profile.clone());
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List keys matching a regex
    Scan(scan::ScanArgs),

    /// Download objects matching a regex
    Download(download::DownloadArgs),

    /// Upload local files matching a regex
    Upload(upload::UploadArgs),

    /// Copy objects matching a regex to another bucket or prefix
    Cp(relocate::RelocateArgs),

    /// Move objects matching a regex to another bucket or prefix
    Mv(relocate::RelocateArgs),

    /// Create a folder marker object
    Mkdir(mkdir::MkdirArgs),

    /// Read a CSV or spreadsheet object into a table
    Read(read::ReadArgs),

    /// Append newer rows of a time-series CSV to an older one
    Merge(merge::MergeArgs),
}

/// Execute a command
pub async fn execute(cmd: Commands, store: StoreArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match cmd {
        Commands::Scan(args) => scan::execute(args, &store, &formatter).await,
        Commands::Download(args) => download::execute(args, &store, &formatter).await,
        Commands::Upload(args) => upload::execute(args, &store, &formatter).await,
        Commands::Cp(args) => relocate::execute(args, RelocateMode::Copy, &store, &formatter).await,
        Commands::Mv(args) => relocate::execute(args, RelocateMode::Move, &store, &formatter).await,
        Commands::Mkdir(args) => mkdir::execute(args, &store, &formatter).await,
        Commands::Read(args) => read::execute(args, &store, &formatter).await,
        Commands::Merge(args) => merge::execute(args, &formatter),
    }
}

/// Print `context: error` and pick the matching exit code
pub fn report(formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from_error(error)
}

/// Load the config file
pub fn load_config(formatter: &Formatter) -> Result<Config, ExitCode> {
    ConfigManager::new()
        .and_then(|manager| manager.load())
        .map_err(|e| report(formatter, "Failed to load config", &e))
}

/// Build an S3 client from the config file and the command-line overrides
pub async fn connect(store: &StoreArgs, formatter: &Formatter) -> Result<S3Client, ExitCode> {
    let mut settings = load_config(formatter)?.store;
    store.apply(&mut settings);
    tracing::debug!(
        endpoint = ?settings.endpoint,
        region = ?settings.region,
        profile = ?settings.profile,
        "Connecting to object store"
    );

    S3Client::new(&settings)
        .await
        .map_err(|e| report(formatter, "Failed to create S3 client", &e))
}

/// Compile a regex given on the command line
pub fn compile(pattern: &str, formatter: &Formatter) -> Result<Regex, ExitCode> {
    s3fc_core::compile_pattern(pattern).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::UsageError
    })
}

/// Parse a `bucket[/prefix]` argument
pub fn parse_location(
    input: &str,
    formatter: &Formatter,
) -> Result<s3fc_core::RemotePath, ExitCode> {
    s3fc_core::RemotePath::parse(input).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::UsageError
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_args_override_settings() {
        let mut settings = StoreSettings {
            endpoint: Some("http://file:9000".to_string()),
            region: Some("us-east-1".to_string()),
            ..Default::default()
        };
        let args = StoreArgs {
            region: Some("ap-northeast-2".to_string()),
            ..Default::default()
        };
        args.apply(&mut settings);
        assert_eq!(settings.endpoint.as_deref(), Some("http://file:9000"));
        assert_eq!(settings.region.as_deref(), Some("ap-northeast-2"));
        assert!(settings.profile.is_none());
    }

    #[test]
    fn test_compile_rejects_invalid_regex() {
        let formatter = Formatter::default();
        assert_eq!(compile("(", &formatter).err(), Some(ExitCode::UsageError));
        assert!(compile(r"\.csv$", &formatter).is_ok());
    }

    #[test]
    fn test_parse_location() {
        let formatter = Formatter::default();
        let path = parse_location("s3://bucket/data/2024", &formatter).unwrap();
        assert_eq!(path.bucket, "bucket");
        assert_eq!(path.key, "data/2024");
        assert!(parse_location("", &formatter).is_err());
    }
}
