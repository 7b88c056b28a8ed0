//! Copy or move matching objects between buckets
//!
//! Unlike download and upload, relocation isolates failures per key: a key
//! that cannot be copied (or deleted) is recorded and the batch continues.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::{RemoteKey, RemotePath, normalize_prefix};
use crate::scan::{ScanMode, scan_by_pattern};
use crate::traits::ObjectStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelocateMode {
    /// Copy and keep the source
    #[default]
    Copy,
    /// Copy, then delete the source once the copy succeeded
    Move,
}

impl fmt::Display for RelocateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocateMode::Copy => write!(f, "copy"),
            RelocateMode::Move => write!(f, "move"),
        }
    }
}

impl FromStr for RelocateMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "copy" => Ok(RelocateMode::Copy),
            "move" => Ok(RelocateMode::Move),
            _ => Err(format!("Invalid relocate mode: {s}")),
        }
    }
}

/// Source and destination of one relocated object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    pub source: RemotePath,
    pub target: RemotePath,
}

/// A key that could not be relocated
#[derive(Debug, Clone, Serialize)]
pub struct RelocationFailure {
    pub source: RemotePath,
    pub target: RemotePath,
    pub error: String,
}

/// Per-key outcome of a relocation batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelocateReport {
    pub mode: RelocateMode,
    pub relocated: Vec<Relocation>,
    pub failed: Vec<RelocationFailure>,
}

impl RelocateReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compute where `key` lands when moved from `source_prefix` to
/// `target_prefix`.
///
/// The source prefix is removed segment by segment from the front of the key
/// and the target prefix is prepended. A key outside the source prefix keeps
/// its full path below the target prefix.
pub fn target_key(key: &str, source_prefix: &str, target_prefix: &str) -> String {
    let key = RemoteKey::parse(key);
    let source_root = RemoteKey::from_prefix(source_prefix);
    let target_root = RemoteKey::from_prefix(target_prefix);

    let rest = key.strip_prefix(&source_root).unwrap_or(key);
    target_root.join(&rest).to_string()
}

/// Copy or move every object under `source_bucket`/`source_prefix` whose key
/// matches `pattern` into `target_bucket`/`target_prefix`.
///
/// In [`RelocateMode::Move`] the source is deleted only after its copy
/// succeeded. Per-key failures are logged and collected; only a failed scan
/// aborts the call.
pub async fn relocate_by_pattern<S>(
    store: &S,
    source_bucket: &str,
    target_bucket: &str,
    pattern: &Regex,
    source_prefix: &str,
    target_prefix: &str,
    mode: RelocateMode,
) -> Result<RelocateReport>
where
    S: ObjectStore + ?Sized,
{
    let keys = scan_by_pattern(store, source_bucket, source_prefix, pattern, ScanMode::Key)
        .await
        .into_result()?;

    let mut report = RelocateReport {
        mode,
        ..Default::default()
    };

    if keys.is_empty() {
        tracing::info!(
            "No files to relocate from bucket '{}' with prefix '{}'",
            source_bucket,
            source_prefix
        );
        return Ok(report);
    }

    for key in keys {
        let source = RemotePath::new(source_bucket, key.as_str());
        let target = RemotePath::new(
            target_bucket,
            target_key(&key, source_prefix, target_prefix),
        );

        match relocate_one(store, &source, &target, mode).await {
            Ok(()) => report.relocated.push(Relocation { source, target }),
            Err(e) => {
                tracing::warn!("Failed to {mode} file {}: {e}", source.key);
                report.failed.push(RelocationFailure {
                    source,
                    target,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

async fn relocate_one<S>(
    store: &S,
    source: &RemotePath,
    target: &RemotePath,
    mode: RelocateMode,
) -> Result<()>
where
    S: ObjectStore + ?Sized,
{
    store.copy_object(source, target).await?;
    tracing::info!("Copied file: {} to {}", source.key, target.key);

    if mode == RelocateMode::Move {
        store.delete_object(source).await?;
        tracing::info!("Moved file: {} to {}", source.key, target.key);
    }

    Ok(())
}

/// Copy matching objects, keeping the sources
pub async fn copy_by_pattern<S>(
    store: &S,
    source_bucket: &str,
    target_bucket: &str,
    pattern: &Regex,
    source_prefix: &str,
    target_prefix: &str,
) -> Result<RelocateReport>
where
    S: ObjectStore + ?Sized,
{
    relocate_by_pattern(
        store,
        source_bucket,
        target_bucket,
        pattern,
        source_prefix,
        target_prefix,
        RelocateMode::Copy,
    )
    .await
}

/// Move matching objects, deleting each source after its copy
pub async fn move_by_pattern<S>(
    store: &S,
    source_bucket: &str,
    target_bucket: &str,
    pattern: &Regex,
    source_prefix: &str,
    target_prefix: &str,
) -> Result<RelocateReport>
where
    S: ObjectStore + ?Sized,
{
    relocate_by_pattern(
        store,
        source_bucket,
        target_bucket,
        pattern,
        source_prefix,
        target_prefix,
        RelocateMode::Move,
    )
    .await
}

/// Create a folder marker (zero-byte object ending in `/`)
pub async fn create_folder<S>(store: &S, bucket: &str, folder: &str) -> Result<RemotePath>
where
    S: ObjectStore + ?Sized,
{
    let key = normalize_prefix(folder);
    if key.is_empty() {
        return Err(Error::InvalidInput(
            "Folder name cannot be empty".to_string(),
        ));
    }

    let path = RemotePath::new(bucket, key);
    store.put_object(&path, Vec::new(), None).await?;
    tracing::info!("Subfolder '{}' created in bucket '{}'.", path.key, bucket);
    Ok(path)
}
