//! upload-folder command
//!
//! Mirrors a local directory into a bucket with directory markers.

use std::path::PathBuf;

use clap::Args;
use sss_core::{FolderUploader, UploadReport};

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::ProgressBar;

/// Upload a local folder recursively
#[derive(Args, Debug)]
pub struct UploadFolderArgs {
    /// Local directory to upload
    pub path: PathBuf,

    /// Bucket (defaults to the configured bucket)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Key prefix to upload under; defaults to the folder name.
    /// "", ".", "/" or "./" upload to the bucket root without markers
    #[arg(short, long)]
    pub target: Option<String>,
}

/// Execute the upload-folder command
pub async fn execute(args: UploadFolderArgs, ctx: &Context<'_>) -> ExitCode {
    let bucket = ctx.bucket(args.bucket);
    let spinner = ProgressBar::spinner(
        ctx.formatter.config(),
        &format!("Uploading {}", args.path.display()),
    );
    let observer = |key: &str| spinner.step(key);

    let result = FolderUploader::new(ctx.store)
        .with_observer(&observer)
        .upload(&args.path, &bucket, args.target.as_deref())
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&report);
            } else {
                ctx.formatter.success(&summary(&report));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(
            &format!("Failed to upload folder {}", args.path.display()),
            &e,
        ),
    }
}

fn summary(report: &UploadReport) -> String {
    let destination = match &report.prefix {
        Some(prefix) => format!("{}/{prefix}/", report.bucket),
        None => format!("{}/", report.bucket),
    };
    format!(
        "Uploaded {} files ({}) and {} folder markers to {destination}",
        report.files.len(),
        humansize::format_size(report.total_bytes, humansize::BINARY),
        report.markers.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands, StoreCommands};
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_upload_folder_root_target() {
        let cli =
            Cli::try_parse_from(["sss", "upload-folder", "./site", "--target", "."]).unwrap();
        match cli.command {
            Commands::Store(StoreCommands::UploadFolder(args)) => {
                assert_eq!(args.path, PathBuf::from("./site"));
                assert_eq!(args.target.as_deref(), Some("."));
                assert!(args.bucket.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_summary_with_prefix() {
        let report = UploadReport {
            bucket: "b1".into(),
            prefix: Some("site".into()),
            markers: vec!["site/".into(), "site/css/".into()],
            files: vec!["site/index.html".into()],
            total_bytes: 2048,
        };
        assert_eq!(
            summary(&report),
            "Uploaded 1 files (2 KiB) and 2 folder markers to b1/site/"
        );
    }

    #[test]
    fn test_summary_at_root() {
        let report = UploadReport {
            bucket: "b1".into(),
            ..Default::default()
        };
        assert!(summary(&report).ends_with("to b1/"));
    }
}
