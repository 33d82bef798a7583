//! File transfer commands: upload-file, download-file

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use sss_core::key_basename;

use super::{Context, require_non_empty};
use crate::exit_code::ExitCode;

/// Upload a local file
#[derive(Args, Debug)]
pub struct UploadFileArgs {
    /// Object key to write
    pub object_name: String,

    /// Local file to upload
    pub path: PathBuf,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Content type (guessed from the file extension when omitted)
    #[arg(long)]
    pub content_type: Option<String>,
}

/// Download an object
#[derive(Args, Debug)]
pub struct DownloadFileArgs {
    /// Object key to read
    pub object_name: String,

    /// Destination file (defaults to the last segment of the key)
    pub path: Option<PathBuf>,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,
}

#[derive(Debug, Serialize)]
struct TransferOutput {
    status: &'static str,
    source: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

/// Execute the upload-file command
pub async fn upload(args: UploadFileArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.object_name, "Object name", ctx.formatter) {
        return code;
    }
    if !args.path.is_file() {
        ctx.formatter
            .error(&format!("Not a file: {}", args.path.display()));
        return ExitCode::UsageError;
    }

    let bucket = ctx.bucket(args.bucket);
    let source = args.path.display().to_string();
    let target = format!("{bucket}/{}", args.object_name);

    match ctx
        .store
        .upload_file(&bucket, &args.object_name, &args.path, args.content_type)
        .await
    {
        Ok(info) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&TransferOutput {
                    status: "uploaded",
                    source,
                    target,
                    size_bytes: info.size_bytes,
                    size_human: info.size_human,
                    etag: info.etag,
                    content_type: info.content_type,
                });
            } else {
                ctx.formatter.println(&format!(
                    "{source} -> {target} ({})",
                    info.size_human.unwrap_or_default()
                ));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Failed to upload {source}"), &e),
    }
}

/// Execute the download-file command
pub async fn download(args: DownloadFileArgs, ctx: &Context<'_>) -> ExitCode {
    if let Some(code) = require_non_empty(&args.object_name, "Object name", ctx.formatter) {
        return code;
    }

    let Some(path) = destination(&args.object_name, args.path) else {
        ctx.formatter.error(&format!(
            "Cannot derive a file name from '{}', pass a destination path",
            args.object_name
        ));
        return ExitCode::UsageError;
    };

    let bucket = ctx.bucket(args.bucket);
    let source = format!("{bucket}/{}", args.object_name);
    let target = path.display().to_string();

    match ctx
        .store
        .download_file(&bucket, &args.object_name, &path)
        .await
    {
        Ok(info) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&TransferOutput {
                    status: "downloaded",
                    source,
                    target,
                    size_bytes: info.size_bytes,
                    size_human: info.size_human,
                    etag: info.etag,
                    content_type: info.content_type,
                });
            } else {
                ctx.formatter.println(&format!(
                    "{source} -> {target} ({})",
                    info.size_human.unwrap_or_default()
                ));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Failed to download {source}"), &e),
    }
}

/// Local path for a download: the explicit path, or the key's last segment
fn destination(key: &str, explicit: Option<PathBuf>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path),
        None => {
            let name = key_basename(key);
            (!name.is_empty() && name != "." && name != "..").then(|| PathBuf::from(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands, StoreCommands};
    use super::*;
    use clap::Parser;

    #[test]
    fn test_destination_defaults_to_basename() {
        assert_eq!(
            destination("reports/2024/q1.csv", None),
            Some(PathBuf::from("q1.csv"))
        );
        assert_eq!(destination("top.txt", None), Some(PathBuf::from("top.txt")));
    }

    #[test]
    fn test_destination_explicit_path_wins() {
        assert_eq!(
            destination("a/b.txt", Some(PathBuf::from("/tmp/out.txt"))),
            Some(PathBuf::from("/tmp/out.txt"))
        );
    }

    #[test]
    fn test_destination_rejects_nameless_keys() {
        assert_eq!(destination("..", None), None);
    }

    #[test]
    fn test_parse_upload_file() {
        let cli = Cli::try_parse_from([
            "sss",
            "upload-file",
            "docs/readme.md",
            "./README.md",
            "--content-type",
            "text/markdown",
        ])
        .unwrap();
        match cli.command {
            Commands::Store(StoreCommands::UploadFile(args)) => {
                assert_eq!(args.object_name, "docs/readme.md");
                assert_eq!(args.path, PathBuf::from("./README.md"));
                assert_eq!(args.content_type.as_deref(), Some("text/markdown"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_download_file_without_path() {
        let cli = Cli::try_parse_from(["sss", "download-file", "a/b.txt"]).unwrap();
        match cli.command {
            Commands::Store(StoreCommands::DownloadFile(args)) => {
                assert_eq!(args.object_name, "a/b.txt");
                assert!(args.path.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
