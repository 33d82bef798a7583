//! sss-core: Core library for the sss object storage CLI
//!
//! This crate provides the core functionality for the sss CLI, including:
//! - Configuration and connection settings
//! - Object key rules (prefix joining, directory markers, byte ranges)
//! - ObjectStore trait for S3 operations
//! - The recursive folder uploader
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! so the uploader can be tested against in-memory stores.

pub mod config;
pub mod error;
pub mod key;
pub mod traits;
pub mod upload;

pub use config::{Config, ConfigManager, Defaults, Settings, SettingsOverrides};
pub use error::{Error, Result};
pub use key::{ByteRange, is_root_sentinel, join_key, key_basename, marker_key, normalize_prefix};
pub use traits::{
    BucketRemoval, DeleteFailure, DeleteReport, ListOptions, ListResult, ObjectInfo, ObjectStore,
};
pub use upload::{FolderUploader, UploadReport};
