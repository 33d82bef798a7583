//! Multipart upload support
//!
//! Files larger than one part are sent with the S3 multipart API, one part at
//! a time. A failed upload is aborted so no orphaned parts are left behind.

use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use sss_core::{Error, Result};
use tokio::io::AsyncReadExt;

use crate::error::map_sdk_error;

/// Default part size: 8 MiB
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: usize = 10_000;

/// Multipart upload configuration
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Part size in bytes; files up to this size use a single PUT
    pub part_size: u64,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    /// Whether a file of this size needs a multipart upload
    pub fn needs_multipart(&self, file_size: u64) -> bool {
        file_size > self.part_size
    }

    /// Calculate appropriate part size for a file
    pub fn calculate_part_size(&self, file_size: u64) -> u64 {
        if file_size <= MIN_PART_SIZE {
            return MIN_PART_SIZE;
        }

        let parts = file_size.div_ceil(self.part_size);

        if parts <= MAX_PARTS as u64 {
            self.part_size
        } else {
            // Need larger parts to fit within 10,000 limit
            let required_size = file_size.div_ceil(MAX_PARTS as u64);
            required_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Calculate number of parts for a file
pub fn calculate_parts(file_size: u64, part_size: u64) -> usize {
    file_size.div_ceil(part_size) as usize
}

/// Get byte range `[start, end)` for a 1-based part number
pub fn part_byte_range(part_number: i32, part_size: u64, total_size: u64) -> (u64, u64) {
    let start = (part_number as u64 - 1) * part_size;
    let end = (start + part_size).min(total_size);
    (start, end)
}

/// Upload `path` to `bucket/key` in parts, returning the final ETag
pub(crate) async fn upload_multipart(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    path: &Path,
    total_size: u64,
    content_type: &str,
    config: &MultipartConfig,
) -> Result<Option<String>> {
    let target = format!("{bucket}/{key}");
    let created = client
        .create_multipart_upload()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, &target))?;

    let upload_id = created
        .upload_id()
        .ok_or_else(|| Error::General(format!("No upload id returned for {target}")))?
        .to_string();

    let part_size = config.calculate_part_size(total_size);
    tracing::debug!(
        object = %target,
        upload_id = %upload_id,
        part_size,
        parts = calculate_parts(total_size, part_size),
        "starting multipart upload"
    );

    let parts = match upload_parts(client, bucket, key, &upload_id, path, total_size, part_size)
        .await
    {
        Ok(parts) => parts,
        Err(e) => {
            if let Err(abort_err) = client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                tracing::warn!(object = %target, upload_id = %upload_id, "failed to abort multipart upload: {abort_err}");
            }
            return Err(e);
        }
    };

    let completed = CompletedMultipartUpload::builder()
        .set_parts(Some(parts))
        .build();

    let response = client
        .complete_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(&upload_id)
        .multipart_upload(completed)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, &target))?;

    Ok(response.e_tag().map(|t| t.trim_matches('"').to_string()))
}

async fn upload_parts(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
    path: &Path,
    total_size: u64,
    part_size: u64,
) -> Result<Vec<CompletedPart>> {
    let target = format!("{bucket}/{key}");
    let mut file = tokio::fs::File::open(path).await?;
    let count = calculate_parts(total_size, part_size);
    let mut completed = Vec::with_capacity(count);

    for part_number in 1..=count as i32 {
        let (start, end) = part_byte_range(part_number, part_size, total_size);
        let mut buf = vec![0u8; (end - start) as usize];
        file.read_exact(&mut buf).await?;

        let response = client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(buf))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &target))?;

        tracing::trace!(object = %target, part_number, "uploaded part");
        completed.push(
            CompletedPart::builder()
                .part_number(part_number)
                .set_e_tag(response.e_tag().map(str::to_string))
                .build(),
        );
    }

    Ok(completed)
}
