//! Bucket commands: create-bucket, delete-bucket, exists-bucket

use clap::Args;
use serde::Serialize;
use sss_core::{BucketRemoval, DeleteFailure};

use super::{Context, require_non_empty};
use crate::exit_code::ExitCode;

/// Create a bucket
#[derive(Args, Debug)]
pub struct CreateBucketArgs {
    /// Bucket name
    pub bucket: String,

    /// Location constraint for the new bucket
    #[arg(long)]
    pub region: Option<String>,
}

/// Delete a bucket
#[derive(Args, Debug)]
pub struct DeleteBucketArgs {
    /// Bucket name
    pub bucket: String,

    /// Remove every object in the bucket first
    #[arg(long)]
    pub force: bool,
}

/// Check whether a bucket exists
#[derive(Args, Debug)]
pub struct ExistsBucketArgs {
    /// Bucket name
    pub bucket: String,
}

#[derive(Debug, Serialize)]
struct BucketOutput {
    status: &'static str,
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<DeleteFailure>,
}

#[derive(Debug, Serialize)]
struct ExistsOutput {
    bucket: String,
    exists: bool,
}

/// Execute the create-bucket command
pub async fn create(args: CreateBucketArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.bucket, "Bucket name", ctx.formatter) {
        return code;
    }

    match ctx
        .store
        .create_bucket(&args.bucket, args.region.clone())
        .await
    {
        Ok(()) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&BucketOutput {
                    status: "created",
                    bucket: args.bucket,
                    region: args.region,
                    failures: Vec::new(),
                });
            } else {
                ctx.formatter
                    .success(&format!("Bucket '{}' created successfully.", args.bucket));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Failed to create bucket '{}'", args.bucket), &e),
    }
}

/// Execute the delete-bucket command
pub async fn delete(args: DeleteBucketArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.bucket, "Bucket name", ctx.formatter) {
        return code;
    }

    let removal = match ctx.store.delete_bucket(&args.bucket, args.force).await {
        Ok(removal) => removal,
        Err(e) => return ctx.fail(&format!("Failed to delete bucket '{}'", args.bucket), &e),
    };

    if ctx.formatter.is_json() {
        let (status, failures) = match removal {
            BucketRemoval::Removed => ("removed", Vec::new()),
            BucketRemoval::Missing => ("missing", Vec::new()),
            BucketRemoval::Blocked(failures) => ("blocked", failures),
        };
        let code = if failures.is_empty() {
            ExitCode::Success
        } else {
            ExitCode::Conflict
        };
        ctx.formatter.json(&BucketOutput {
            status,
            bucket: args.bucket,
            region: None,
            failures,
        });
        return code;
    }

    match removal {
        BucketRemoval::Removed => {
            ctx.formatter
                .success(&format!("Bucket '{}' removed successfully.", args.bucket));
            ExitCode::Success
        }
        BucketRemoval::Missing => {
            ctx.formatter.warning(&format!(
                "Bucket '{}' does not exist, nothing to remove.",
                args.bucket
            ));
            ExitCode::Success
        }
        BucketRemoval::Blocked(failures) => {
            for failure in &failures {
                ctx.formatter.error(&format!(
                    "Failed to delete '{}': {} {}",
                    failure.key, failure.code, failure.message
                ));
            }
            ctx.formatter.error(&format!(
                "Bucket '{}' was kept: {} object(s) could not be deleted.",
                args.bucket,
                failures.len()
            ));
            ExitCode::Conflict
        }
    }
}

/// Execute the exists-bucket command
pub async fn exists(args: ExistsBucketArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.bucket, "Bucket name", ctx.formatter) {
        return code;
    }

    match ctx.store.bucket_exists(&args.bucket).await {
        Ok(exists) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&ExistsOutput {
                    bucket: args.bucket,
                    exists,
                });
            } else {
                ctx.formatter.println(&exists.to_string());
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Failed to check bucket '{}'", args.bucket), &e),
    }
}
