//! In-memory object store.
//!
//! Objects are kept in a `BTreeMap` per bucket behind a [`RwLock`], so the
//! trait methods work on `&self`. Listing order is lexicographic by key, the
//! same order S3 returns. Useful for tests and dry runs that need an
//! [`ObjectStore`] without network access.
//!
//! Failures can be injected per key to exercise error paths:
//!
//! ```
//! use s3fc_core::{MemoryStore, ObjectStore, RemotePath};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> s3fc_core::Result<()> {
//! let store = MemoryStore::with_objects("bucket", [("data/a.csv", "x\n1\n")]);
//! let data = store.get_object(&RemotePath::new("bucket", "data/a.csv")).await?;
//! assert_eq!(data, b"x\n1\n");
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::{ListPage, ObjectEntry, ObjectStore};

/// Operation kinds that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    List,
    Get,
    Put,
    Copy,
    Delete,
}

/// A recorded mutating call, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put(RemotePath),
    Copy { src: RemotePath, dst: RemotePath },
    Delete(RemotePath),
}

#[derive(Default)]
struct State {
    buckets: HashMap<String, BTreeMap<String, Vec<u8>>>,
    failures: HashSet<(FailOn, String)>,
    fail_all_lists: bool,
    calls: Vec<StoreCall>,
}

/// Object store backed by process memory
pub struct MemoryStore {
    state: RwLock<State>,
    page_size: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            page_size: 1000,
        }
    }

    /// Create a store with one bucket pre-populated
    pub fn with_objects(
        bucket: &str,
        objects: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut state = State::default();
        let entries = state.buckets.entry(bucket.to_string()).or_default();
        for (key, data) in objects {
            entries.insert(key.into(), data.into());
        }
        Self {
            state: RwLock::new(state),
            page_size: 1000,
        }
    }

    /// Limit how many entries a single listing page returns
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create an empty bucket
    pub async fn create_bucket(&self, bucket: &str) {
        self.state
            .write()
            .await
            .buckets
            .entry(bucket.to_string())
            .or_default();
    }

    /// Make `op` fail for the given key (the prefix for `FailOn::List`)
    pub async fn fail_on(&self, op: FailOn, key: &str) {
        self.state
            .write()
            .await
            .failures
            .insert((op, key.to_string()));
    }

    /// Make every listing fail with a credentials error
    pub async fn fail_listing_with_auth(&self) {
        self.state.write().await.fail_all_lists = true;
    }

    /// Keys currently stored in a bucket, sorted
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Mutating calls made so far
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.read().await.calls.clone()
    }

    fn injected(state: &State, op: FailOn, key: &str) -> Result<()> {
        if state.failures.contains(&(op, key.to_string())) {
            return Err(Error::Network(format!("injected {op:?} failure for {key}")));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        let state = self.state.read().await;
        if state.fail_all_lists {
            return Err(Error::Auth("Credentials not available".to_string()));
        }
        Self::injected(&state, FailOn::List, prefix)?;

        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| Error::NotFound(format!("Bucket not found: {bucket}")))?;

        // The token is the last key of the previous page
        let mut remaining: Vec<ObjectEntry> = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| {
                continuation_token
                    .as_deref()
                    .is_none_or(|after| key.as_str() > after)
            })
            .map(|(key, data)| ObjectEntry::new(key.clone(), Some(data.len() as i64)))
            .take(self.page_size + 1)
            .collect();

        let continuation_token = if remaining.len() > self.page_size {
            remaining.truncate(self.page_size);
            remaining.last().map(|e| e.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            entries: remaining,
            continuation_token,
        })
    }

    async fn get_object(&self, path: &RemotePath) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        Self::injected(&state, FailOn::Get, &path.key)?;
        state
            .buckets
            .get(&path.bucket)
            .and_then(|objects| objects.get(&path.key))
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn put_object(
        &self,
        path: &RemotePath,
        data: Vec<u8>,
        _content_type: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        Self::injected(&state, FailOn::Put, &path.key)?;
        let objects = state
            .buckets
            .get_mut(&path.bucket)
            .ok_or_else(|| Error::NotFound(format!("Bucket not found: {}", path.bucket)))?;
        objects.insert(path.key.clone(), data);
        state.calls.push(StoreCall::Put(path.clone()));
        Ok(())
    }

    async fn copy_object(&self, src: &RemotePath, dst: &RemotePath) -> Result<()> {
        let mut state = self.state.write().await;
        Self::injected(&state, FailOn::Copy, &src.key)?;
        let data = state
            .buckets
            .get(&src.bucket)
            .and_then(|objects| objects.get(&src.key))
            .cloned()
            .ok_or_else(|| Error::NotFound(src.to_string()))?;
        let objects = state
            .buckets
            .get_mut(&dst.bucket)
            .ok_or_else(|| Error::NotFound(format!("Bucket not found: {}", dst.bucket)))?;
        objects.insert(dst.key.clone(), data);
        state.calls.push(StoreCall::Copy {
            src: src.clone(),
            dst: dst.clone(),
        });
        Ok(())
    }

    async fn delete_object(&self, path: &RemotePath) -> Result<()> {
        let mut state = self.state.write().await;
        Self::injected(&state, FailOn::Delete, &path.key)?;
        if let Some(objects) = state.buckets.get_mut(&path.bucket) {
            objects.remove(&path.key);
        }
        state.calls.push(StoreCall::Delete(path.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_paginates_in_key_order() {
        let store = MemoryStore::with_objects(
            "b",
            [("p/c", "3"), ("p/a", "1"), ("p/b", "2"), ("q/x", "9")],
        )
        .with_page_size(2);

        let first = store.list_page("b", "p/", None).await.unwrap();
        let keys: Vec<_> = first.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["p/a", "p/b"]);
        assert_eq!(first.continuation_token.as_deref(), Some("p/b"));

        let second = store
            .list_page("b", "p/", first.continuation_token)
            .await
            .unwrap();
        let keys: Vec<_> = second.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["p/c"]);
        assert!(second.continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_missing_bucket_is_not_found() {
        let store = MemoryStore::new();
        let err = store.list_page("nope", "", None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::with_objects("b", [("k", "v")]);
        store.fail_on(FailOn::Get, "k").await;
        let err = store
            .get_object(&RemotePath::new("b", "k"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_copy_and_delete_are_recorded() {
        let store = MemoryStore::with_objects("src", [("a", "1")]);
        store.create_bucket("dst").await;

        let src = RemotePath::new("src", "a");
        let dst = RemotePath::new("dst", "b");
        store.copy_object(&src, &dst).await.unwrap();
        store.delete_object(&src).await.unwrap();

        assert_eq!(store.keys("dst").await, ["b"]);
        assert!(store.keys("src").await.is_empty());
        assert_eq!(
            store.calls().await,
            [
                StoreCall::Copy {
                    src: src.clone(),
                    dst
                },
                StoreCall::Delete(src)
            ]
        );
    }
}
