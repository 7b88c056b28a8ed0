//! ObjectStore trait definition
//!
//! The storage primitives every s3fc operation is built on. The S3 adapter
//! lives in `s3fc-s3`; `MemoryStore` implements the same trait for tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::path::RemotePath;

/// One object returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectEntry {
    /// Full object key
    pub key: String,

    /// Object size in bytes, when the listing reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, size_bytes: Option<i64>) -> Self {
        Self {
            key: key.into(),
            size_bytes,
        }
    }
}

/// One page of a recursive listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects on this page, in listing order
    pub entries: Vec<ObjectEntry>,

    /// Token for the next page, `None` on the last page
    pub continuation_token: Option<String>,
}

/// Storage primitives used by the scanner and transfer operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of objects under `prefix` (recursive, no delimiter)
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage>;

    /// Fetch the full content of an object
    async fn get_object(&self, path: &RemotePath) -> Result<Vec<u8>>;

    /// Store an object, replacing any existing one
    async fn put_object(
        &self,
        path: &RemotePath,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()>;

    /// Server-side copy, possibly across buckets
    async fn copy_object(&self, src: &RemotePath, dst: &RemotePath) -> Result<()>;

    async fn delete_object(&self, path: &RemotePath) -> Result<()>;
}
