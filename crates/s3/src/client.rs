//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from sss-core.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, Delete,
    ObjectIdentifier,
};
use tokio::io::AsyncWriteExt;

use sss_core::{
    BucketRemoval, ByteRange, DeleteFailure, DeleteReport, Error, ListOptions, ListResult,
    ObjectInfo, ObjectStore, Result, Settings,
};

use crate::error::map_sdk_error;
use crate::transfer::{MultipartConfig, upload_multipart};

/// Maximum number of keys accepted by a single DeleteObjects request
const DELETE_BATCH_SIZE: usize = 1000;

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    multipart: MultipartConfig,
}

impl S3Client {
    /// Create a new S3 client from connection settings
    pub async fn new(settings: &Settings) -> Result<Self> {
        let endpoint = settings.endpoint_url()?;

        let credentials = aws_credential_types::Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None, // session token
            None, // expiry
            "sss-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(settings.signing_region().to_string()))
            .endpoint_url(&endpoint)
            .load()
            .await;

        // Path-style addressing works with every S3-compatible server
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        tracing::debug!(endpoint = %endpoint, region = settings.signing_region(), "created S3 client");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            multipart: MultipartConfig::default(),
        })
    }

    /// Override the multipart settings used by `upload_file`
    pub fn with_multipart(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }

    /// Collect every key in a bucket, following continuation tokens
    async fn all_keys(&self, bucket: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token = None;

        loop {
            let page = self
                .list_objects(
                    bucket,
                    ListOptions {
                        continuation_token: continuation_token.take(),
                        ..Default::default()
                    },
                )
                .await?;
            keys.extend(page.items.into_iter().map(|item| item.key));

            match page.continuation_token {
                Some(token) if page.truncated => continuation_token = Some(token),
                _ => break,
            }
        }

        Ok(keys)
    }
}

/// Content type for a local file, falling back to application/octet-stream
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn presigning_config(expires_in: Duration) -> Result<PresigningConfig> {
    PresigningConfig::expires_in(expires_in)
        .map_err(|e| Error::InvalidInput(format!("Invalid expiry {expires_in:?}: {e}")))
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

/// Sibling file a download streams into before it is renamed into place
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Stream a body to `path`; on any failure the destination is left untouched
async fn save_body(body: ByteStream, path: &Path) -> Result<u64> {
    let partial = partial_path(path);
    let result = async {
        let written = write_body(body, &partial).await?;
        tokio::fs::rename(&partial, path).await?;
        Ok(written)
    }
    .await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            tracing::debug!(path = %partial.display(), "no partial download to remove: {e}");
        }
    }
    result
}

async fn write_body(mut body: ByteStream, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| Error::Network(e.to_string()))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn timestamp(dt: &aws_sdk_s3::primitives::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn create_bucket(&self, bucket: &str, region: Option<String>) -> Result<()> {
        let mut request = self
            .inner
            .create_bucket()
            .bucket(bucket)
            .acl(BucketCannedAcl::Private);

        if let Some(region) = region.filter(|r| !r.is_empty()) {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket))?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str, force: bool) -> Result<BucketRemoval> {
        if !self.bucket_exists(bucket).await? {
            return Ok(BucketRemoval::Missing);
        }

        if force {
            let keys = self.all_keys(bucket).await?;
            tracing::debug!(bucket, count = keys.len(), "emptying bucket before removal");
            let report = self.delete_objects(bucket, keys).await?;
            if !report.is_complete() {
                return Ok(BucketRemoval::Blocked(report.failures));
            }
        }

        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket))?;

        Ok(BucketRemoval::Removed)
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match map_sdk_error(e, bucket) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(options.prefix.filter(|p| !p.is_empty()))
            .set_start_after(options.start_after.filter(|s| !s.is_empty()))
            .set_max_keys(options.max_keys)
            .set_continuation_token(options.continuation_token)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let key = object.key().unwrap_or_default();
                let mut info = if key.ends_with('/') {
                    ObjectInfo::dir(key)
                } else {
                    ObjectInfo::file(key, object.size().unwrap_or(0))
                };
                info.last_modified = object.last_modified().and_then(timestamp);
                info.etag = object.e_tag().map(trim_etag);
                info.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
                info
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        let size = data.len() as i64;
        let target = format!("{bucket}/{key}");

        let response = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type.clone())
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &target))?;

        let mut info = if key.ends_with('/') {
            ObjectInfo::dir(key)
        } else {
            ObjectInfo::file(key, size)
        };
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = content_type;
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let target = format!("{bucket}/{key}");
        match self.inner.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) => match map_sdk_error(e, &target) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<DeleteReport> {
        let keys: Vec<String> = keys.into_iter().filter(|k| !k.is_empty()).collect();
        let mut report = DeleteReport::default();

        for batch in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = batch
                .iter()
                .map(|k| {
                    ObjectIdentifier::builder()
                        .key(k)
                        .build()
                        .map_err(|e| Error::General(e.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| Error::General(e.to_string()))?;

            let response = self
                .inner
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| map_sdk_error(e, bucket))?;

            report.deleted.extend(
                response
                    .deleted()
                    .iter()
                    .filter_map(|d| d.key().map(|k| k.to_string())),
            );
            report
                .failures
                .extend(response.errors().iter().map(|e| DeleteFailure {
                    key: e.key().unwrap_or_default().to_string(),
                    code: e.code().unwrap_or_default().to_string(),
                    message: e.message().unwrap_or_default().to_string(),
                }));
        }

        if !report.failures.is_empty() {
            let failed: Vec<&str> = report.failures.iter().map(|f| f.key.as_str()).collect();
            tracing::warn!(bucket, "failed to delete some objects: {failed:?}");
        }

        Ok(report)
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        range: ByteRange,
    ) -> Result<Vec<u8>> {
        range.validate()?;
        let target = format!("{bucket}/{key}");
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_range(range.to_header())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &target))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn presigned_upload_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let config = presigning_config(expires_in)?;
        let request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        Ok(request.uri().to_string())
    }

    async fn presigned_download_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let config = presigning_config(expires_in)?;
        let request = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        Ok(request.uri().to_string())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        let size = tokio::fs::metadata(path).await?.len();
        let content_type = content_type.unwrap_or_else(|| guess_content_type(path));

        let etag = if self.multipart.needs_multipart(size) {
            upload_multipart(
                &self.inner,
                bucket,
                key,
                path,
                size,
                &content_type,
                &self.multipart,
            )
            .await?
        } else {
            let body = ByteStream::from_path(path)
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e)))?;

            let response = self
                .inner
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_type(&content_type)
                .body(body)
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

            response.e_tag().map(trim_etag)
        };

        let mut info = ObjectInfo::file(key, size as i64);
        info.etag = etag;
        info.content_type = Some(content_type);
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> Result<ObjectInfo> {
        let target = format!("{bucket}/{key}");
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &target))?;

        let etag = response.e_tag().map(trim_etag);
        let content_type = response.content_type().map(str::to_string);
        let last_modified = response.last_modified().and_then(timestamp);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let written = save_body(response.body, path).await?;

        let mut info = ObjectInfo::file(key, written as i64);
        info.etag = etag;
        info.content_type = content_type;
        info.last_modified = last_modified;

        Ok(info)
    }
}
