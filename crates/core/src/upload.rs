//! Recursive folder upload
//!
//! Mirrors a local directory tree into a bucket. Each directory visited under
//! a non-root prefix gets a zero-length marker object at `<prefix>/`, written
//! before any of its children. Files are uploaded one at a time.
//!
//! The walk is depth-first, pre-order, with children visited in name order.
//! It is fail-fast: the first store error aborts the walk and objects already
//! written stay in place.

use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::key::{join_key, marker_key, normalize_prefix};
use crate::traits::ObjectStore;

/// Summary of a completed folder upload
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    /// Destination bucket
    pub bucket: String,

    /// Effective prefix, `None` when uploading to the bucket root
    pub prefix: Option<String>,

    /// Directory marker keys, in the order they were written
    pub markers: Vec<String>,

    /// Uploaded file keys, in the order they were written
    pub files: Vec<String>,

    /// Total bytes uploaded
    pub total_bytes: u64,
}

type Observer<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// Uploads a local directory tree into a bucket
pub struct FolderUploader<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    observer: Option<&'a Observer<'a>>,
}

impl<'a, S: ObjectStore + ?Sized> FolderUploader<'a, S> {
    /// Create an uploader on top of a store
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            observer: None,
        }
    }

    /// Call `observer` with each key once it has been written
    pub fn with_observer(mut self, observer: &'a Observer<'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Upload `local_path` into `bucket` under `target`
    ///
    /// When `target` is `None` the base name of `local_path` is used. A target
    /// of `""`, `"."`, `"/"` or `"./"` uploads to the bucket root and writes no
    /// directory markers at any level.
    pub async fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        target: Option<&str>,
    ) -> Result<UploadReport> {
        let is_dir = tokio::fs::metadata(local_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(Error::InvalidInput(format!(
                "Folder path is invalid: {}",
                local_path.display()
            )));
        }

        let effective = match target {
            Some(t) => t.to_string(),
            None => local_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let prefix = normalize_prefix(&effective);

        tracing::debug!(
            path = %local_path.display(),
            bucket,
            prefix = prefix.as_deref().unwrap_or(""),
            "starting folder upload"
        );

        let mut report = UploadReport {
            bucket: bucket.to_string(),
            prefix: prefix.clone(),
            ..Default::default()
        };

        // Markers are written only when the walk does not start at the root
        let with_markers = prefix.is_some();
        self.visit(local_path.to_path_buf(), bucket, prefix, with_markers, &mut report)
            .await?;

        Ok(report)
    }

    fn visit<'b>(
        &'b self,
        dir: PathBuf,
        bucket: &'b str,
        prefix: Option<String>,
        with_markers: bool,
        report: &'b mut UploadReport,
    ) -> BoxFuture<'b, Result<()>> {
        async move {
            if let (true, Some(p)) = (with_markers, prefix.as_deref()) {
                let key = marker_key(p);
                tracing::debug!(bucket, key = %key, "creating directory marker");
                self.store.put_object(bucket, &key, Vec::new(), None).await?;
                self.notify(&key);
                report.markers.push(key);
            }

            for (name, path) in read_children(&dir).await? {
                let key = join_key(prefix.as_deref(), &name);
                let is_dir = tokio::fs::metadata(&path).await?.is_dir();

                if is_dir {
                    self.visit(path, bucket, Some(key), with_markers, report)
                        .await?;
                } else {
                    tracing::debug!(bucket, key = %key, path = %path.display(), "uploading file");
                    let info = self.store.upload_file(bucket, &key, &path, None).await?;
                    report.total_bytes += info.size_bytes.unwrap_or(0).max(0) as u64;
                    self.notify(&key);
                    report.files.push(key);
                }
            }

            Ok(())
        }
        .boxed()
    }

    fn notify(&self, key: &str) {
        if let Some(observer) = self.observer {
            observer(key);
        }
    }
}

/// Immediate children of a directory, sorted by name
async fn read_children(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut children = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().into_string().map_err(|raw| {
            Error::InvalidInput(format!(
                "File name is not valid UTF-8: {}",
                dir.join(raw).display()
            ))
        })?;
        children.push((name, entry.path()));
    }

    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ByteRange;
    use crate::traits::{
        BucketRemoval, DeleteReport, ListOptions, ListResult, MockObjectStore, ObjectInfo,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Put { bucket: String, key: String, len: usize },
        Upload { bucket: String, key: String, path: PathBuf },
    }

    /// In-memory store that records the calls made by the uploader
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
        fail_on_key: Option<String>,
    }

    impl RecordingStore {
        fn failing_on(key: &str) -> Self {
            Self {
                fail_on_key: Some(key.to_string()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self, key: &str) -> Result<()> {
            if self.fail_on_key.as_deref() == Some(key) {
                return Err(Error::Network(format!("connection reset writing {key}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn create_bucket(&self, _bucket: &str, _region: Option<String>) -> Result<()> {
            unimplemented!()
        }

        async fn delete_bucket(&self, _bucket: &str, _force: bool) -> Result<BucketRemoval> {
            unimplemented!()
        }

        async fn bucket_exists(&self, _bucket: &str) -> Result<bool> {
            unimplemented!()
        }

        async fn list_objects(&self, _bucket: &str, _options: ListOptions) -> Result<ListResult> {
            unimplemented!()
        }

        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            data: Vec<u8>,
            _content_type: Option<String>,
        ) -> Result<ObjectInfo> {
            self.check(key)?;
            self.calls.lock().unwrap().push(Call::Put {
                bucket: bucket.to_string(),
                key: key.to_string(),
                len: data.len(),
            });
            Ok(ObjectInfo::dir(key))
        }

        async fn object_exists(&self, _bucket: &str, _key: &str) -> Result<bool> {
            unimplemented!()
        }

        async fn delete_objects(&self, _bucket: &str, _keys: Vec<String>) -> Result<DeleteReport> {
            unimplemented!()
        }

        async fn get_object_range(
            &self,
            _bucket: &str,
            _key: &str,
            _range: ByteRange,
        ) -> Result<Vec<u8>> {
            unimplemented!()
        }

        async fn presigned_upload_url(
            &self,
            _bucket: &str,
            _key: &str,
            _expires_in: Duration,
        ) -> Result<String> {
            unimplemented!()
        }

        async fn presigned_download_url(
            &self,
            _bucket: &str,
            _key: &str,
            _expires_in: Duration,
        ) -> Result<String> {
            unimplemented!()
        }

        async fn upload_file(
            &self,
            bucket: &str,
            key: &str,
            path: &Path,
            _content_type: Option<String>,
        ) -> Result<ObjectInfo> {
            self.check(key)?;
            let size = std::fs::metadata(path)?.len() as i64;
            self.calls.lock().unwrap().push(Call::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                path: path.to_path_buf(),
            });
            Ok(ObjectInfo::file(key, size))
        }

        async fn download_file(&self, _bucket: &str, _key: &str, _path: &Path) -> Result<ObjectInfo> {
            unimplemented!()
        }
    }

    fn put(key: &str) -> Call {
        Call::Put {
            bucket: "bucket1".into(),
            key: key.into(),
            len: 0,
        }
    }

    fn upload(key: &str, path: PathBuf) -> Call {
        Call::Upload {
            bucket: "bucket1".into(),
            key: key.into(),
            path,
        }
    }

    /// root/{file1.txt, sub/{file2.txt}}
    fn sample_tree() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("file1.txt"), b"hello").unwrap();
        std::fs::write(root.join("sub").join("file2.txt"), b"world!").unwrap();
        (temp, root)
    }

    #[tokio::test]
    async fn test_upload_with_target_writes_markers_in_order() {
        let (_temp, root) = sample_tree();
        let store = RecordingStore::default();

        let report = FolderUploader::new(&store)
            .upload(&root, "bucket1", Some("target"))
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![
                put("target/"),
                upload("target/file1.txt", root.join("file1.txt")),
                put("target/sub/"),
                upload("target/sub/file2.txt", root.join("sub").join("file2.txt")),
            ]
        );
        assert_eq!(report.prefix.as_deref(), Some("target"));
        assert_eq!(report.markers, vec!["target/", "target/sub/"]);
        assert_eq!(report.files, vec!["target/file1.txt", "target/sub/file2.txt"]);
        assert_eq!(report.total_bytes, 11);
    }

    #[tokio::test]
    async fn test_upload_to_root_writes_no_markers() {
        let (_temp, root) = sample_tree();

        for sentinel in ["", ".", "/", "./"] {
            let store = RecordingStore::default();
            let report = FolderUploader::new(&store)
                .upload(&root, "bucket1", Some(sentinel))
                .await
                .unwrap();

            assert_eq!(
                store.calls(),
                vec![
                    upload("file1.txt", root.join("file1.txt")),
                    upload("sub/file2.txt", root.join("sub").join("file2.txt")),
                ],
                "sentinel {sentinel:?}"
            );
            assert!(report.prefix.is_none());
            assert!(report.markers.is_empty());
        }
    }

    #[tokio::test]
    async fn test_default_prefix_is_folder_name() {
        let (_temp, root) = sample_tree();
        let store = RecordingStore::default();

        FolderUploader::new(&store)
            .upload(&root, "bucket1", None)
            .await
            .unwrap();

        let calls = store.calls();
        assert_eq!(calls[0], put("root/"));
        assert_eq!(calls[1], upload("root/file1.txt", root.join("file1.txt")));
        assert_eq!(calls[2], put("root/sub/"));
    }

    #[tokio::test]
    async fn test_target_with_trailing_slash_has_no_double_slash() {
        let (_temp, root) = sample_tree();
        let store = RecordingStore::default();

        let report = FolderUploader::new(&store)
            .upload(&root, "bucket1", Some("backups/2024/"))
            .await
            .unwrap();

        assert_eq!(report.markers, vec!["backups/2024/", "backups/2024/sub/"]);
        for key in report.markers.iter().chain(report.files.iter()) {
            assert!(!key.contains("//"), "{key}");
            assert!(!key.starts_with('/'), "{key}");
        }
    }

    #[tokio::test]
    async fn test_target_with_repeated_slashes_is_collapsed() {
        let (_temp, root) = sample_tree();
        let store = RecordingStore::default();

        let report = FolderUploader::new(&store)
            .upload(&root, "bucket1", Some("a//b"))
            .await
            .unwrap();

        assert_eq!(report.prefix.as_deref(), Some("a/b"));
        assert_eq!(report.markers, vec!["a/b/", "a/b/sub/"]);
        assert_eq!(report.files, vec!["a/b/file1.txt", "a/b/sub/file2.txt"]);
    }

    #[tokio::test]
    async fn test_every_directory_gets_one_marker_before_children() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tree");
        std::fs::create_dir_all(root.join("a").join("b").join("c")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("a").join("b").join("c").join("deep.txt"), b"x").unwrap();
        std::fs::write(root.join("a").join("top.txt"), b"y").unwrap();

        let store = RecordingStore::default();
        FolderUploader::new(&store)
            .upload(&root, "bucket1", Some("t"))
            .await
            .unwrap();

        let keys: Vec<String> = store
            .calls()
            .into_iter()
            .map(|c| match c {
                Call::Put { key, .. } | Call::Upload { key, .. } => key,
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                "t/",
                "t/a/",
                "t/a/b/",
                "t/a/b/c/",
                "t/a/b/c/deep.txt",
                "t/a/top.txt",
                "t/empty/",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_path_is_invalid_input_without_store_calls() {
        let temp = TempDir::new().unwrap();
        // No expectations: any store call panics
        let store = MockObjectStore::new();

        let err = FolderUploader::new(&store)
            .upload(&temp.path().join("missing"), "bucket1", Some("target"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_file_path_is_invalid_input_without_store_calls() {
        let (_temp, root) = sample_tree();
        let store = MockObjectStore::new();

        let err = FolderUploader::new(&store)
            .upload(&root.join("file1.txt"), "bucket1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_root_marker_failure_stops_the_walk() {
        let (_temp, root) = sample_tree();
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .times(1)
            .returning(|_, _, _, _| Err(Error::Auth("Access Denied".into())));
        store.expect_upload_file().never();

        let err = FolderUploader::new(&store)
            .upload(&root, "bucket1", Some("target"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_subdirectory_marker_failure_skips_descendants_and_later_siblings() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(root.join("b_dir")).unwrap();
        std::fs::write(root.join("a.txt"), b"a").unwrap();
        std::fs::write(root.join("b_dir").join("inner.txt"), b"i").unwrap();
        std::fs::write(root.join("c.txt"), b"c").unwrap();

        let store = RecordingStore::failing_on("target/b_dir/");
        let err = FolderUploader::new(&store)
            .upload(&root, "bucket1", Some("target"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert_eq!(
            store.calls(),
            vec![put("target/"), upload("target/a.txt", root.join("a.txt"))]
        );
    }

    #[tokio::test]
    async fn test_file_failure_is_surfaced_and_earlier_objects_remain() {
        let (_temp, root) = sample_tree();
        let store = RecordingStore::failing_on("target/sub/file2.txt");

        let err = FolderUploader::new(&store)
            .upload(&root, "bucket1", Some("target"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert_eq!(store.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_observer_sees_every_written_key() {
        let (_temp, root) = sample_tree();
        let store = RecordingStore::default();
        let seen = Mutex::new(Vec::new());
        let observer = |key: &str| seen.lock().unwrap().push(key.to_string());

        FolderUploader::new(&store)
            .with_observer(&observer)
            .upload(&root, "bucket1", Some("."))
            .await
            .unwrap();

        assert_eq!(
            seen.into_inner().unwrap(),
            vec!["file1.txt", "sub/file2.txt"]
        );
    }
}
