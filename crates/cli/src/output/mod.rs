//! Output handling
//!
//! Every command prints through a [`Formatter`] so that `--json`, `--quiet`
//! and `--no-color` behave the same everywhere.

mod formatter;

pub use formatter::Formatter;

/// Output settings taken from the global flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Strict JSON on stdout, no colors
    pub json: bool,
    pub no_color: bool,
    /// Suppress everything except errors
    pub quiet: bool,
}
