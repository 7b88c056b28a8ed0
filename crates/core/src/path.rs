//! Remote path handling
//!
//! Object stores have no real directories: a "folder" is just a key that ends
//! with `/`. This module keeps prefix arithmetic in one place so that a prefix
//! always carries exactly one trailing separator and keys are rewritten by
//! segment rather than by substring replacement.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Key separator used by every supported object store
pub const SEPARATOR: char = '/';

/// Normalize a scope prefix so that it ends with exactly one separator.
///
/// An empty prefix stays empty (the bucket root). A prefix made only of
/// separators also collapses to the root.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}{SEPARATOR}")
    }
}

/// Trailing name component of a key (`a/b/c.csv` -> `c.csv`).
///
/// Folder marker keys yield an empty name.
pub fn key_name(key: &str) -> &str {
    key.rsplit(SEPARATOR).next().unwrap_or(key)
}

/// An object location: bucket plus key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemotePath {
    pub bucket: String,
    pub key: String,
}

impl RemotePath {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse `bucket[/key]` or `s3://bucket[/key]`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.strip_prefix("s3://").unwrap_or(input);
        if trimmed.is_empty() {
            return Err(Error::InvalidPath("Path cannot be empty".to_string()));
        }

        let (bucket, key) = match trimmed.split_once(SEPARATOR) {
            Some((bucket, key)) => (bucket, key),
            None => (trimmed, ""),
        };

        if bucket.is_empty() {
            return Err(Error::InvalidPath(format!(
                "Bucket name is required: '{input}'"
            )));
        }

        Ok(Self::new(bucket, key))
    }

    /// Trailing name component of the key
    pub fn name(&self) -> &str {
        key_name(&self.key)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// A key split into its path segments.
///
/// Interior empty segments are preserved so that `parse` followed by
/// `to_string` reproduces the original key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteKey {
    segments: Vec<String>,
    folder: bool,
}

impl RemoteKey {
    pub fn parse(key: &str) -> Self {
        if key.is_empty() {
            return Self::default();
        }

        let (body, folder) = match key.strip_suffix(SEPARATOR) {
            Some(body) => (body, true),
            None => (key, false),
        };

        let segments = if body.is_empty() {
            Vec::new()
        } else {
            body.split(SEPARATOR).map(str::to_string).collect()
        };

        Self { segments, folder }
    }

    /// Key for a scope prefix, normalized first
    pub fn from_prefix(prefix: &str) -> Self {
        Self::parse(&normalize_prefix(prefix))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_folder(&self) -> bool {
        self.folder
    }

    /// Last segment, empty for folder markers
    pub fn name(&self) -> &str {
        if self.folder {
            return "";
        }
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Remove `prefix` from the front of this key.
    ///
    /// Returns `None` when the key does not live under the prefix. Matching
    /// is done per segment, so `data` never matches `data-archive/x`.
    pub fn strip_prefix(&self, prefix: &RemoteKey) -> Option<RemoteKey> {
        if !self.segments.starts_with(&prefix.segments) {
            return None;
        }
        Some(Self {
            segments: self.segments[prefix.segments.len()..].to_vec(),
            folder: self.folder,
        })
    }

    /// Append `rest` below this key
    pub fn join(&self, rest: &RemoteKey) -> RemoteKey {
        let mut segments = self.segments.clone();
        segments.extend(rest.segments.iter().cloned());
        let folder = if rest.segments.is_empty() {
            self.folder || rest.folder
        } else {
            rest.folder
        };
        Self { segments, folder }
    }

    /// Append a single file name below this key
    pub fn child(&self, name: &str) -> RemoteKey {
        self.join(&RemoteKey::parse(name))
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.segments.join("/");
        if self.folder && !self.segments.is_empty() {
            write!(f, "{body}{SEPARATOR}")
        } else {
            f.write_str(&body)
        }
    }
}
