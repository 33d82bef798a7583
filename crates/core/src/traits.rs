//! ObjectStore trait definition
//!
//! This trait defines the interface for S3-compatible storage operations.
//! It allows the CLI to be decoupled from the specific S3 SDK implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::key::ByteRange;

/// Metadata for an object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Whether this is a directory marker
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size.max(0) as u64, humansize::BINARY)),
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a directory marker
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(0),
            size_human: None,
            last_modified: None,
            etag: None,
            storage_class: None,
            content_type: None,
            is_dir: true,
        }
    }
}

/// Result of a list operation (one page)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResult {
    /// Listed objects
    pub items: Vec<ObjectInfo>,

    /// Whether the result is truncated (more items available)
    pub truncated: bool,

    /// Continuation token for pagination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Options for list operations
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: Option<String>,

    /// Only list keys after this one
    pub start_after: Option<String>,

    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

/// A key that the store refused to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFailure {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// Outcome of a batch delete
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Keys the store reported as deleted
    pub deleted: Vec<String>,

    /// Per-object failures
    pub failures: Vec<DeleteFailure>,
}

impl DeleteReport {
    /// Whether every requested key was deleted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a bucket deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketRemoval {
    /// The bucket was deleted
    Removed,
    /// The bucket did not exist
    Missing,
    /// Emptying the bucket failed for some objects; the bucket was kept
    Blocked(Vec<DeleteFailure>),
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
/// Errors from the store are passed through untranslated apart from their
/// classification into [`crate::Error`] variants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create a bucket, optionally pinned to a region
    async fn create_bucket(&self, bucket: &str, region: Option<String>) -> Result<()>;

    /// Delete a bucket, emptying it first when `force` is set
    async fn delete_bucket(&self, bucket: &str, force: bool) -> Result<BucketRemoval>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// List one page of objects in a bucket
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult>;

    /// Store an in-memory body under a key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo>;

    /// Check if an object exists
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Delete a batch of objects
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<DeleteReport>;

    /// Read a byte range of an object into memory
    async fn get_object_range(&self, bucket: &str, key: &str, range: ByteRange)
    -> Result<Vec<u8>>;

    /// Generate a presigned URL for uploading an object
    async fn presigned_upload_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String>;

    /// Generate a presigned URL for downloading an object
    async fn presigned_download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String>;

    /// Upload a local file
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<String>,
    ) -> Result<ObjectInfo>;

    /// Download an object to a local file
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> Result<ObjectInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_file() {
        let info = ObjectInfo::file("test.txt", 1024);
        assert_eq!(info.key, "test.txt");
        assert_eq!(info.size_bytes, Some(1024));
        assert_eq!(info.size_human.as_deref(), Some("1 KiB"));
        assert!(!info.is_dir);
    }

    #[test]
    fn test_object_info_dir() {
        let info = ObjectInfo::dir("path/to/dir/");
        assert_eq!(info.key, "path/to/dir/");
        assert!(info.is_dir);
        assert_eq!(info.size_bytes, Some(0));
    }

    #[test]
    fn test_delete_report_complete() {
        let mut report = DeleteReport {
            deleted: vec!["a".into()],
            failures: vec![],
        };
        assert!(report.is_complete());

        report.failures.push(DeleteFailure {
            key: "b".into(),
            code: "AccessDenied".into(),
            message: "Access Denied".into(),
        });
        assert!(!report.is_complete());
    }

    #[test]
    fn test_object_info_json_skips_empty_fields() {
        let json = serde_json::to_value(ObjectInfo::dir("a/")).unwrap();
        assert_eq!(json["key"], "a/");
        assert!(json.get("etag").is_none());
        assert!(json.get("last_modified").is_none());
    }
}
