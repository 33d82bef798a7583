//! list-objects command
//!
//! Lists every object under an optional prefix, following continuation
//! tokens until the listing is complete.

use clap::Args;
use serde::Serialize;
use sss_core::{ListOptions, ObjectInfo};

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::object_table;

/// List objects in a bucket
#[derive(Args, Debug)]
pub struct ListObjectsArgs {
    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Only list keys starting with this prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Start listing after this key
    #[arg(short, long, default_value = "")]
    pub start: String,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    bucket: String,
    items: Vec<ObjectInfo>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: i64,
    total_size_human: String,
}

impl Summary {
    fn of(items: &[ObjectInfo]) -> Self {
        let total_size_bytes: i64 = items
            .iter()
            .filter(|i| !i.is_dir)
            .filter_map(|i| i.size_bytes)
            .sum();
        Self {
            total_objects: items.iter().filter(|i| !i.is_dir).count(),
            total_size_bytes,
            total_size_human: humansize::format_size(
                total_size_bytes.max(0) as u64,
                humansize::BINARY,
            ),
        }
    }
}

/// Execute the list-objects command
pub async fn execute(args: ListObjectsArgs, ctx: &Context<'_>) -> ExitCode {
    let bucket = ctx.bucket(args.bucket);
    let options = ListOptions {
        prefix: Some(args.prefix),
        start_after: Some(args.start),
        ..Default::default()
    };

    let mut items = Vec::new();
    let mut continuation_token: Option<String> = None;

    // Paginate through all results
    loop {
        let page_options = ListOptions {
            continuation_token: continuation_token.take(),
            ..options.clone()
        };

        match ctx.store.list_objects(&bucket, page_options).await {
            Ok(page) => {
                items.extend(page.items);
                match page.continuation_token {
                    Some(token) if page.truncated => continuation_token = Some(token),
                    _ => break,
                }
            }
            Err(e) => return ctx.fail(&format!("Failed to list objects in '{bucket}'"), &e),
        }
    }

    tracing::debug!(bucket = %bucket, count = items.len(), "listed objects");
    let summary = Summary::of(&items);

    if ctx.formatter.is_json() {
        ctx.formatter.json(&ListOutput {
            bucket,
            items,
            summary,
        });
    } else {
        ctx.formatter.println(&object_table(&items).to_string());
        ctx.formatter.println(&ctx.formatter.dim(&format!(
            "Total: {} objects, {}",
            summary.total_objects, summary.total_size_human
        )));
    }

    ExitCode::Success
}
