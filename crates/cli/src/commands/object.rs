//! Object commands: exists-object, remove-objects, get-data, get-json

use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use sss_core::{ByteRange, DeleteReport, Error};

use super::{Context, require_non_empty};
use crate::exit_code::ExitCode;

/// Check whether an object exists
#[derive(Args, Debug)]
pub struct ExistsObjectArgs {
    /// Object key
    pub object_name: String,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,
}

/// Remove objects
#[derive(Args, Debug)]
pub struct RemoveObjectsArgs {
    /// Object keys to remove
    #[arg(required = true, num_args = 1..)]
    pub object_names: Vec<String>,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,
}

/// Write object data to stdout
#[derive(Args, Debug)]
pub struct GetDataArgs {
    /// Object key
    pub object_name: String,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// First byte to read
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Number of bytes to read; 0 reads to the end
    #[arg(long, default_value_t = 0)]
    pub length: u64,
}

/// Read an object as JSON
#[derive(Args, Debug)]
pub struct GetJsonArgs {
    /// Object key
    pub object_name: String,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExistsOutput {
    bucket: String,
    key: String,
    exists: bool,
}

#[derive(Debug, Serialize)]
struct RemoveOutput {
    bucket: String,
    #[serde(flatten)]
    report: DeleteReport,
}

/// Execute the exists-object command
pub async fn exists(args: ExistsObjectArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.object_name, "Object name", ctx.formatter) {
        return code;
    }
    let bucket = ctx.bucket(args.bucket);

    match ctx.store.object_exists(&bucket, &args.object_name).await {
        Ok(exists) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&ExistsOutput {
                    bucket,
                    key: args.object_name,
                    exists,
                });
            } else {
                ctx.formatter.println(&exists.to_string());
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(
            &format!("Failed to check object '{bucket}/{}'", args.object_name),
            &e,
        ),
    }
}

/// Execute the remove-objects command
pub async fn remove(args: RemoveObjectsArgs, ctx: &Context<'_>) -> ExitCode {
    let keys: Vec<String> = args
        .object_names
        .into_iter()
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        ctx.formatter.error("No object names given");
        return ExitCode::UsageError;
    }
    let bucket = ctx.bucket(args.bucket);

    let report = match ctx.store.delete_objects(&bucket, keys).await {
        Ok(report) => report,
        Err(e) => return ctx.fail(&format!("Failed to remove objects from '{bucket}'"), &e),
    };

    let code = if report.is_complete() {
        ExitCode::Success
    } else {
        ExitCode::Conflict
    };

    if ctx.formatter.is_json() {
        ctx.formatter.json(&RemoveOutput { bucket, report });
        return code;
    }

    for key in &report.deleted {
        ctx.formatter.success(&format!("Removed '{bucket}/{key}'"));
    }
    for failure in &report.failures {
        ctx.formatter.error(&format!(
            "Failed to remove '{bucket}/{}': {} {}",
            failure.key, failure.code, failure.message
        ));
    }

    code
}

/// Execute the get-data command
pub async fn get_data(args: GetDataArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.object_name, "Object name", ctx.formatter) {
        return code;
    }
    let range = ByteRange::new(args.offset, args.length);
    if let Err(e) = range.validate() {
        return ctx.fail("Invalid byte range", &e);
    }
    let bucket = ctx.bucket(args.bucket);
    tracing::debug!(bucket = %bucket, key = %args.object_name, range = %range, "reading object");

    match ctx
        .store
        .get_object_range(&bucket, &args.object_name, range)
        .await
    {
        Ok(data) => {
            // Raw bytes bypass the formatter so binary content survives
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(&data).and_then(|()| stdout.flush()) {
                ctx.formatter
                    .error(&format!("Failed to write to stdout: {e}"));
                return ExitCode::GeneralError;
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(
            &format!("Failed to read object '{bucket}/{}'", args.object_name),
            &e,
        ),
    }
}

/// Execute the get-json command
pub async fn get_json(args: GetJsonArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.object_name, "Object name", ctx.formatter) {
        return code;
    }
    let bucket = ctx.bucket(args.bucket);
    let target = format!("{bucket}/{}", args.object_name);

    let data = match ctx
        .store
        .get_object_range(&bucket, &args.object_name, ByteRange::default())
        .await
    {
        Ok(data) => data,
        Err(e) => return ctx.fail(&format!("Failed to read object '{target}'"), &e),
    };

    match parse_json(&data) {
        Ok(value) => {
            ctx.formatter.json(&value);
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Object '{target}' is not valid JSON"), &e),
    }
}

/// Parse object data as JSON; an empty object reads as `null`
fn parse_json(data: &[u8]) -> Result<serde_json::Value, Error> {
    if data.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_slice(data)?)
}
