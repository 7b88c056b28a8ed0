//! Bulk download and upload driven by pattern scans

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::{RemoteKey, RemotePath, key_name};
use crate::scan::{ScanMode, scan_by_pattern};
use crate::traits::ObjectStore;

/// A file written by [`download_by_pattern`]
#[derive(Debug, Clone, Serialize)]
pub struct DownloadedFile {
    pub key: String,
    pub local_path: PathBuf,
    pub size_bytes: u64,
}

/// An object written by [`upload_by_pattern`]
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub local_path: PathBuf,
    pub remote: RemotePath,
    pub size_bytes: u64,
}

/// What [`scan_local_files`] returns for each match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocalScanMode {
    #[default]
    Name,
    Path,
}

/// List files directly inside `dir` whose names match `pattern`.
///
/// Not recursive; directories are skipped. Results are sorted.
pub fn scan_local_files(dir: &Path, pattern: &Regex, mode: LocalScanMode) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(dir.display().to_string()),
        _ => Error::Io(e),
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        // Follows symlinks; dangling links are skipped.
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if pattern.is_match(&name) {
            names.push(name);
        }
    }

    let mut matches: Vec<String> = match mode {
        LocalScanMode::Name => names,
        LocalScanMode::Path => names
            .into_iter()
            .map(|name| dir.join(name).to_string_lossy().into_owned())
            .collect(),
    };
    matches.sort();
    Ok(matches)
}

/// Download every object under `bucket`/`prefix` whose key matches `pattern`.
///
/// Files land in `local_dir` (or `local_dir/subfolder`) under the key's
/// trailing name, overwriting whatever is there. The first fetch or write
/// failure aborts the batch. A failed scan is returned as an error.
pub async fn download_by_pattern<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    pattern: &Regex,
    local_dir: &Path,
    subfolder: Option<&str>,
) -> Result<Vec<DownloadedFile>>
where
    S: ObjectStore + ?Sized,
{
    let keys = scan_by_pattern(store, bucket, prefix, pattern, ScanMode::Key)
        .await
        .into_result()?;
    tracing::info!(
        "Found {} files in {} that match the regex pattern.",
        keys.len(),
        bucket
    );

    let target_dir = match subfolder {
        Some(sub) if !sub.is_empty() => local_dir.join(sub),
        _ => local_dir.to_path_buf(),
    };
    tokio::fs::create_dir_all(&target_dir).await?;

    let mut downloaded = Vec::with_capacity(keys.len());
    for key in keys {
        let name = key_name(&key);
        if name.is_empty() {
            tracing::debug!(key = %key, "Skipping folder marker");
            continue;
        }

        tracing::info!("- Downloading {key}...");
        let data = store.get_object(&RemotePath::new(bucket, key.as_str())).await?;
        let local_path = target_dir.join(name);
        tokio::fs::write(&local_path, &data).await?;
        tracing::info!("- Save Complete: {}", local_path.display());

        downloaded.push(DownloadedFile {
            key,
            local_path,
            size_bytes: data.len() as u64,
        });
    }

    Ok(downloaded)
}

/// Upload every file in `local_dir` (or `local_dir/subfolder`) whose name
/// matches `pattern`.
///
/// Files are uploaded in name order to `prefix/<name>`, or `<name>` when no
/// prefix is given. Existing objects are replaced. The first failure aborts
/// the batch.
pub async fn upload_by_pattern<S>(
    store: &S,
    local_dir: &Path,
    pattern: &Regex,
    bucket: &str,
    prefix: Option<&str>,
    subfolder: Option<&str>,
) -> Result<Vec<UploadedFile>>
where
    S: ObjectStore + ?Sized,
{
    let source_dir = match subfolder {
        Some(sub) if !sub.is_empty() => local_dir.join(sub),
        _ => local_dir.to_path_buf(),
    };

    let names = scan_local_files(&source_dir, pattern, LocalScanMode::Name)?;
    if names.is_empty() {
        tracing::info!(
            "No files found in {} that match the regex pattern.",
            source_dir.display()
        );
        return Ok(Vec::new());
    }
    tracing::info!(
        "Found {} files in {} that match the regex pattern.",
        names.len(),
        source_dir.display()
    );

    let root = RemoteKey::from_prefix(prefix.unwrap_or_default());
    let mut uploaded = Vec::with_capacity(names.len());
    for name in names {
        let local_path = source_dir.join(&name);
        let data = tokio::fs::read(&local_path).await?;
        let size_bytes = data.len() as u64;
        let remote = RemotePath::new(bucket, root.child(&name).to_string());
        let content_type = mime_guess::from_path(&local_path)
            .first()
            .map(|mime| mime.essence_str().to_string());

        store.put_object(&remote, data, content_type).await?;
        tracing::info!("Uploaded {} to {}", local_path.display(), remote);

        uploaded.push(UploadedFile {
            local_path,
            remote,
            size_bytes,
        });
    }

    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FailOn, MemoryStore, StoreCall};
    use crate::scan::compile_pattern;
    use tempfile::TempDir;

    #[test]
    fn test_scan_local_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.csv", "a.csv", "c.txt", "menu.csv"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("dir.csv")).unwrap();

        let pattern = compile_pattern(r"\.csv").unwrap();
        let names = scan_local_files(dir.path(), &pattern, LocalScanMode::Name).unwrap();
        assert_eq!(names, ["a.csv", "b.csv", "menu.csv"]);

        let paths = scan_local_files(dir.path(), &pattern, LocalScanMode::Path).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("a.csv"));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_local_files_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let source = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        std::fs::write(source.path().join("real.csv"), "x").unwrap();
        std::fs::create_dir(source.path().join("folder.csv")).unwrap();
        symlink(source.path().join("real.csv"), dir.path().join("linked.csv")).unwrap();
        symlink(source.path().join("folder.csv"), dir.path().join("folder.csv")).unwrap();
        symlink(source.path().join("gone.csv"), dir.path().join("dangling.csv")).unwrap();

        let pattern = compile_pattern(r"\.csv$").unwrap();
        let names = scan_local_files(dir.path(), &pattern, LocalScanMode::Name).unwrap();
        assert_eq!(names, ["linked.csv"]);
    }

    #[test]
    fn test_scan_local_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        let pattern = compile_pattern(r".").unwrap();
        let err = scan_local_files(&dir.path().join("nope"), &pattern, LocalScanMode::Name)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_download_by_pattern_writes_trailing_names() {
        let store = MemoryStore::with_objects(
            "bucket",
            [
                ("in/", ""),
                ("in/menu2160-a.csv", "a"),
                ("in/deep/menu2160-b.csv", "bb"),
                ("in/menu2205.csv", "c"),
            ],
        );
        let dir = TempDir::new().unwrap();
        let pattern = compile_pattern(r"menu2160").unwrap();

        let files =
            download_by_pattern(&store, "bucket", "in", &pattern, dir.path(), Some("sub"))
                .await
                .unwrap();

        assert_eq!(files.len(), 2);
        let target = dir.path().join("sub");
        assert_eq!(std::fs::read(target.join("menu2160-a.csv")).unwrap(), b"a");
        assert_eq!(std::fs::read(target.join("menu2160-b.csv")).unwrap(), b"bb");
        assert!(!target.join("menu2205.csv").exists());
        assert_eq!(files[0].size_bytes, 2);
    }

    #[tokio::test]
    async fn test_download_overwrites_existing_file() {
        let store = MemoryStore::with_objects("bucket", [("x/report.csv", "new")]);
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("report.csv"), "old").unwrap();

        let pattern = compile_pattern(r"report").unwrap();
        download_by_pattern(&store, "bucket", "x/", &pattern, dir.path(), None)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("report.csv")).unwrap(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_download_aborts_on_first_failure() {
        let store = MemoryStore::with_objects(
            "bucket",
            [("p/a.csv", "a"), ("p/b.csv", "b"), ("p/c.csv", "c")],
        );
        store.fail_on(FailOn::Get, "p/b.csv").await;
        let dir = TempDir::new().unwrap();
        let pattern = compile_pattern(r"\.csv$").unwrap();

        let result = download_by_pattern(&store, "bucket", "p", &pattern, dir.path(), None).await;

        assert!(result.is_err());
        assert!(dir.path().join("a.csv").exists());
        assert!(!dir.path().join("c.csv").exists());
    }

    #[tokio::test]
    async fn test_download_surfaces_scan_failure() {
        let store = MemoryStore::with_objects("bucket", [("p/a.csv", "a")]);
        store.fail_listing_with_auth().await;
        let dir = TempDir::new().unwrap();
        let pattern = compile_pattern(r".").unwrap();

        let err = download_by_pattern(&store, "bucket", "p", &pattern, dir.path(), None)
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_upload_by_pattern_orders_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["c.csv", "a.csv", "b.csv", "skip.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let store = MemoryStore::new();
        store.create_bucket("bucket").await;
        let pattern = compile_pattern(r"\.csv$").unwrap();

        let uploaded = upload_by_pattern(&store, dir.path(), &pattern, "bucket", Some("out"), None)
            .await
            .unwrap();

        let keys: Vec<_> = uploaded.iter().map(|u| u.remote.key.as_str()).collect();
        assert_eq!(keys, ["out/a.csv", "out/b.csv", "out/c.csv"]);

        let calls = store.calls().await;
        assert_eq!(calls[0], StoreCall::Put(RemotePath::new("bucket", "out/a.csv")));
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test]
    async fn test_upload_without_prefix_uses_bare_name() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("data.csv"), "x").unwrap();
        let store = MemoryStore::new();
        store.create_bucket("bucket").await;
        let pattern = compile_pattern(r"data").unwrap();

        let uploaded = upload_by_pattern(&store, dir.path(), &pattern, "bucket", None, Some("sub"))
            .await
            .unwrap();

        assert_eq!(uploaded.len(), 1);
        assert_eq!(store.keys("bucket").await, ["data.csv"]);
    }

    #[tokio::test]
    async fn test_upload_prefix_is_not_double_slashed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x").unwrap();
        let store = MemoryStore::new();
        store.create_bucket("bucket").await;
        let pattern = compile_pattern(r"a").unwrap();

        upload_by_pattern(&store, dir.path(), &pattern, "bucket", Some("out//"), None)
            .await
            .unwrap();

        assert_eq!(store.keys("bucket").await, ["out/a.csv"]);
    }
}
