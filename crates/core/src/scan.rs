//! Regex-scoped remote object scanner
//!
//! Every bulk operation starts here: page through a bucket listing, keep the
//! keys whose full path matches a pattern, and hand back either the keys or
//! their trailing names.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::{key_name, normalize_prefix};
use crate::traits::ObjectStore;

/// Compile a search pattern, reporting the offending pattern on failure
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// What a scan returns for each matching object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Full object key
    #[default]
    Key,
    /// Trailing name component of the key
    Name,
}

impl ScanMode {
    pub const VARIANTS: [&'static str; 2] = ["key", "name"];

    fn project(self, key: String) -> String {
        match self {
            ScanMode::Key => key,
            ScanMode::Name => key_name(&key).to_string(),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Key => write!(f, "key"),
            ScanMode::Name => write!(f, "name"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "key" => Ok(ScanMode::Key),
            "name" => Ok(ScanMode::Name),
            _ => Err(format!(
                "Invalid option '{s}'. Available options: {}",
                ScanMode::VARIANTS.join(", ")
            )),
        }
    }
}

/// Result of a scan.
///
/// `Empty` means the listing succeeded and nothing matched; `Failed` means
/// the listing itself failed. Both expose an empty entry list.
#[derive(Debug)]
pub enum ScanOutcome {
    Matches(Vec<String>),
    Empty,
    Failed(Error),
}

impl ScanOutcome {
    /// Matching entries, empty unless the scan found something
    pub fn entries(&self) -> &[String] {
        match self {
            ScanOutcome::Matches(entries) => entries,
            ScanOutcome::Empty | ScanOutcome::Failed(_) => &[],
        }
    }

    pub fn into_entries(self) -> Vec<String> {
        match self {
            ScanOutcome::Matches(entries) => entries,
            ScanOutcome::Empty | ScanOutcome::Failed(_) => Vec::new(),
        }
    }

    /// Surface a failed scan as an error; an empty scan is `Ok(vec![])`
    pub fn into_result(self) -> Result<Vec<String>> {
        match self {
            ScanOutcome::Matches(entries) => Ok(entries),
            ScanOutcome::Empty => Ok(Vec::new()),
            ScanOutcome::Failed(err) => Err(err),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScanOutcome::Failed(_))
    }
}

/// Scan `bucket` under `prefix` for keys matching `pattern`.
///
/// The pattern is searched for anywhere in the full key. The folder marker
/// object for the prefix itself is never returned. Listing failures,
/// credential problems included, are logged and returned as
/// [`ScanOutcome::Failed`] instead of an error.
pub async fn scan_by_pattern<S>(
    store: &S,
    bucket: &str,
    prefix: &str,
    pattern: &Regex,
    mode: ScanMode,
) -> ScanOutcome
where
    S: ObjectStore + ?Sized,
{
    let normalized = normalize_prefix(prefix);

    let keys = match collect_matching_keys(store, bucket, &normalized, pattern).await {
        Ok(keys) => keys,
        Err(e) => {
            if e.is_auth() {
                tracing::warn!(bucket, prefix, error = %e, "Credentials not available for scan");
            } else {
                tracing::warn!(bucket, prefix, error = %e, "Scan failed");
            }
            return ScanOutcome::Failed(e);
        }
    };

    if keys.is_empty() {
        tracing::info!(
            "No files matching the regex '{}' found in the bucket '{}' with prefix '{}'",
            pattern.as_str(),
            bucket,
            prefix
        );
        return ScanOutcome::Empty;
    }

    let entries: Vec<String> = keys.into_iter().map(|key| mode.project(key)).collect();
    tracing::info!(
        "{} files matching the regex '{}' in the bucket '{}' with prefix '{}'",
        entries.len(),
        pattern.as_str(),
        bucket,
        prefix
    );

    ScanOutcome::Matches(entries)
}

async fn collect_matching_keys<S>(
    store: &S,
    bucket: &str,
    normalized_prefix: &str,
    pattern: &Regex,
) -> Result<Vec<String>>
where
    S: ObjectStore + ?Sized,
{
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let page = store
            .list_page(bucket, normalized_prefix, continuation_token.take())
            .await?;

        tracing::debug!(
            bucket,
            prefix = normalized_prefix,
            entries = page.entries.len(),
            "Listed page"
        );

        keys.extend(
            page.entries
                .into_iter()
                .map(|entry| entry.key)
                .filter(|key| key.as_str() != normalized_prefix && pattern.is_match(key)),
        );

        match page.continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::{ListPage, MockObjectStore, ObjectEntry};

    fn fixture() -> MemoryStore {
        MemoryStore::with_objects(
            "bucket",
            [
                ("data/", ""),
                ("data/menu2160-a.csv", "x"),
                ("data/menu2160-b.csv", "x"),
                ("data/menu2205-a.xls", "x"),
                ("data/nested/menu2160-c.csv", "x"),
                ("other/menu2160-z.csv", "x"),
            ],
        )
    }

    #[test]
    fn test_scan_mode_from_str() {
        assert_eq!("key".parse::<ScanMode>().unwrap(), ScanMode::Key);
        assert_eq!("NAME".parse::<ScanMode>().unwrap(), ScanMode::Name);
        let err = "path".parse::<ScanMode>().unwrap_err();
        assert!(err.contains("Available options: key, name"));
    }

    #[test]
    fn test_compile_pattern_rejects_invalid() {
        let err = compile_pattern("menu(").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "menu("));
    }

    #[tokio::test]
    async fn test_scan_returns_keys_in_listing_order() {
        let store = fixture();
        let pattern = compile_pattern(r"menu2160").unwrap();
        let outcome = scan_by_pattern(&store, "bucket", "data", &pattern, ScanMode::Key).await;

        assert_eq!(
            outcome.entries(),
            [
                "data/menu2160-a.csv",
                "data/menu2160-b.csv",
                "data/nested/menu2160-c.csv"
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_name_mode() {
        let store = fixture();
        let pattern = compile_pattern(r"\.csv$").unwrap();
        let outcome = scan_by_pattern(&store, "bucket", "data/", &pattern, ScanMode::Name).await;

        assert_eq!(
            outcome.into_entries(),
            ["menu2160-a.csv", "menu2160-b.csv", "menu2160-c.csv"]
        );
    }

    #[tokio::test]
    async fn test_scan_never_returns_prefix_marker() {
        let store = fixture();
        // "data/" itself matches this pattern
        let pattern = compile_pattern(r"data").unwrap();
        let outcome = scan_by_pattern(&store, "bucket", "data", &pattern, ScanMode::Key).await;

        assert_eq!(outcome.len(), 4);
        assert!(!outcome.entries().iter().any(|k| k == "data/"));
    }

    #[tokio::test]
    async fn test_scan_unmatched_is_empty_not_failed() {
        let store = fixture();
        let pattern = compile_pattern(r"menu9999").unwrap();
        let outcome = scan_by_pattern(&store, "bucket", "data", &pattern, ScanMode::Key).await;

        assert!(matches!(outcome, ScanOutcome::Empty));
        assert!(outcome.into_result().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_auth_failure_is_swallowed() {
        let store = fixture();
        store.fail_listing_with_auth().await;
        let pattern = compile_pattern(r".*").unwrap();
        let outcome = scan_by_pattern(&store, "bucket", "data", &pattern, ScanMode::Key).await;

        assert!(outcome.is_failed());
        assert!(outcome.entries().is_empty());
        assert!(outcome.into_result().unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_scan_follows_continuation_tokens() {
        let store = fixture().with_page_size(1);
        let pattern = compile_pattern(r"menu2160").unwrap();
        let outcome = scan_by_pattern(&store, "bucket", "", &pattern, ScanMode::Key).await;

        assert_eq!(outcome.len(), 4);
    }

    #[tokio::test]
    async fn test_scan_requests_normalized_prefix() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_page()
            .withf(|bucket, prefix, token| bucket == "b" && prefix == "in/" && token.is_none())
            .times(1)
            .returning(|_, _, _| {
                Ok(ListPage {
                    entries: vec![
                        ObjectEntry::new("in/", Some(0)),
                        ObjectEntry::new("in/a.csv", Some(3)),
                    ],
                    continuation_token: None,
                })
            });

        let pattern = compile_pattern(r"in").unwrap();
        let outcome = scan_by_pattern(&store, "b", "in", &pattern, ScanMode::Key).await;
        assert_eq!(outcome.entries(), ["in/a.csv"]);
    }
}
