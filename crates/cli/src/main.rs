//! s3fc - regex-scoped file control for S3-compatible object storage

mod commands;
mod exit_code;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{Commands, StoreArgs};
use crate::output::OutputConfig;

/// Scan, transfer, relocate and read objects selected by regular expressions
#[derive(Parser, Debug)]
#[command(name = "s3fc", version, about, long_about = None)]
struct Cli {
    /// Print strict JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = commands::execute(cli.command, cli.store, output_config).await;
    std::process::exit(code.as_i32());
}

/// `RUST_LOG` wins over `--debug`
fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let default_directive = if debug {
        "warn,s3fc=debug,s3fc_core=debug,s3fc_s3=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["s3fc", "scan", "bucket/data", "csv$", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Scan(_)));
    }

    #[test]
    fn test_store_overrides() {
        let cli = Cli::try_parse_from([
            "s3fc",
            "--endpoint",
            "http://localhost:9000",
            "mkdir",
            "bucket",
            "reports",
        ])
        .unwrap();
        assert_eq!(cli.store.endpoint.as_deref(), Some("http://localhost:9000"));
    }
}
