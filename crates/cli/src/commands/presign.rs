//! Presigned URL commands: get-upload-url, get-download-url

use std::time::Duration;

use clap::Args;
use serde::Serialize;

use super::{Context, require_non_empty};
use crate::exit_code::ExitCode;

/// Longest validity accepted by SigV4 presigning: 7 days
const MAX_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Generate a presigned URL
#[derive(Args, Debug)]
pub struct PresignArgs {
    /// Object key
    pub object_name: String,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Validity in seconds
    #[arg(long, default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..=MAX_EXPIRY_SECS))]
    pub seconds: u64,
}

/// HTTP method the URL is signed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Put,
    Get,
}

#[derive(Debug, Serialize)]
struct PresignOutput {
    method: Method,
    bucket: String,
    key: String,
    url: String,
    expires_in_secs: u64,
}

/// Execute get-upload-url (`Put`) or get-download-url (`Get`)
pub async fn execute(args: PresignArgs, method: Method, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.object_name, "Object name", ctx.formatter) {
        return code;
    }
    let bucket = ctx.bucket(args.bucket);
    let expires_in = Duration::from_secs(args.seconds);

    let result = match method {
        Method::Put => {
            ctx.store
                .presigned_upload_url(&bucket, &args.object_name, expires_in)
                .await
        }
        Method::Get => {
            ctx.store
                .presigned_download_url(&bucket, &args.object_name, expires_in)
                .await
        }
    };

    match result {
        Ok(url) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&PresignOutput {
                    method,
                    bucket,
                    key: args.object_name,
                    url,
                    expires_in_secs: args.seconds,
                });
            } else {
                ctx.formatter.println(&url);
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(
            &format!("Failed to presign '{bucket}/{}'", args.object_name),
            &e,
        ),
    }
}
