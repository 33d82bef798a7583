//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Store commands share one connection built from the resolved settings;
//! `config` and `completions` run without contacting the store.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sss_core::{ConfigManager, Defaults, Error, ObjectStore, Settings, SettingsOverrides};
use sss_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{ColorMode, Formatter, OutputConfig};

mod bucket;
pub mod completions;
mod config;
mod folder;
mod list;
mod object;
mod presign;
mod transfer;

/// sss - S3-compatible object storage CLI
///
/// Bucket and object operations, presigned URLs and recursive folder upload
/// against any S3-compatible service.
#[derive(Parser, Debug)]
#[command(name = "sss")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinners
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Configuration file (default: <config dir>/sss/config.toml)
    #[arg(long, global = true, env = "SSS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection overrides, taking precedence over the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Store endpoint URL
    #[arg(long = "oss-endpoint", env = "OSS_ENDPOINT", global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Access key ID
    #[arg(
        long = "oss-access-key",
        env = "OSS_ACCESS_KEY",
        global = true,
        hide_env_values = true,
        value_name = "KEY"
    )]
    pub access_key: Option<String>,

    /// Secret access key
    #[arg(
        long = "oss-secret-key",
        env = "OSS_SECRET_KEY",
        global = true,
        hide_env_values = true,
        value_name = "SECRET"
    )]
    pub secret_key: Option<String>,

    /// Region used for signing; empty clears the configured one
    #[arg(long = "oss-region", env = "OSS_REGION", global = true, value_name = "REGION")]
    pub region: Option<String>,

    /// Bucket used when a command does not name one
    #[arg(long = "oss-bucket", env = "OSS_BUCKET", global = true, value_name = "BUCKET")]
    pub bucket: Option<String>,

    /// Use https when the endpoint has no scheme
    #[arg(
        long = "oss-secure",
        env = "OSS_SECURE",
        global = true,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub secure: Option<bool>,
}

impl From<ConnectionArgs> for SettingsOverrides {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            access_key: args.access_key,
            secret_key: args.secret_key,
            region: args.region,
            bucket: args.bucket,
            secure: args.secure,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Store(StoreCommands),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Commands that talk to the object store
#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Create a bucket
    CreateBucket(bucket::CreateBucketArgs),

    /// Delete a bucket
    DeleteBucket(bucket::DeleteBucketArgs),

    /// Check whether a bucket exists
    ExistsBucket(bucket::ExistsBucketArgs),

    /// List objects in a bucket
    ListObjects(list::ListObjectsArgs),

    /// Check whether an object exists
    ExistsObject(object::ExistsObjectArgs),

    /// Remove one or more objects
    #[command(visible_alias = "remove-object")]
    RemoveObjects(object::RemoveObjectsArgs),

    /// Write object data (or a byte range of it) to stdout
    GetData(object::GetDataArgs),

    /// Read an object as JSON
    GetJson(object::GetJsonArgs),

    /// Upload a local file
    UploadFile(transfer::UploadFileArgs),

    /// Download an object to a local file
    DownloadFile(transfer::DownloadFileArgs),

    /// Generate a presigned upload URL
    GetUploadUrl(presign::PresignArgs),

    /// Generate a presigned download URL
    GetDownloadUrl(presign::PresignArgs),

    /// Upload a local folder recursively
    UploadFolder(folder::UploadFolderArgs),
}

/// Shared state handed to every store command
pub struct Context<'a> {
    pub store: &'a dyn ObjectStore,
    pub settings: &'a Settings,
    pub formatter: &'a Formatter,
}

impl Context<'_> {
    /// The bucket named on the command line, or the configured default
    pub fn bucket(&self, explicit: Option<String>) -> String {
        resolve_bucket(explicit, self.settings)
    }

    /// Print a failure and map it to its exit code
    pub fn fail(&self, context: &str, err: &Error) -> ExitCode {
        fail(self.formatter, context, err)
    }
}

fn resolve_bucket(explicit: Option<String>, settings: &Settings) -> String {
    explicit
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| settings.bucket.clone())
}

fn fail(formatter: &Formatter, context: &str, err: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {err}"));
    ExitCode::from(err)
}

/// Reject an empty positional value before any remote call
fn require_non_empty(value: &str, what: &str, formatter: &Formatter) -> Option<ExitCode> {
    if value.is_empty() {
        formatter.error(&format!("{what} cannot be empty"));
        Some(ExitCode::UsageError)
    } else {
        None
    }
}

/// Merge command-line output flags with the config file defaults
pub fn output_config(cli: &Cli, defaults: &Defaults) -> OutputConfig {
    OutputConfig {
        json: cli.json || defaults.output.eq_ignore_ascii_case("json"),
        color: if cli.no_color {
            ColorMode::Never
        } else {
            ColorMode::from_config(&defaults.color)
        },
        no_progress: cli.no_progress || !defaults.progress,
        quiet: cli.quiet,
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => return fail(&Formatter::default(), "Failed to locate configuration", &e),
        },
    };

    let config = match manager.load() {
        Ok(config) => config,
        Err(e) => return fail(&Formatter::default(), "Failed to load configuration", &e),
    };

    let formatter = Formatter::new(output_config(&cli, &config.defaults));

    let mut settings = config.storage.clone();
    settings.apply(cli.connection.into());

    let command = match cli.command {
        Commands::Store(command) => command,
        Commands::Config(command) => {
            return config::execute(command, &manager, config, &settings, &formatter);
        }
        Commands::Completions(args) => return completions::execute(args),
    };

    let client = match S3Client::new(&settings).await {
        Ok(client) => client,
        Err(e) => return fail(&formatter, "Failed to create S3 client", &e),
    };

    let ctx = Context {
        store: &client,
        settings: &settings,
        formatter: &formatter,
    };

    match command {
        StoreCommands::CreateBucket(args) => bucket::create(args, &ctx).await,
        StoreCommands::DeleteBucket(args) => bucket::delete(args, &ctx).await,
        StoreCommands::ExistsBucket(args) => bucket::exists(args, &ctx).await,
        StoreCommands::ListObjects(args) => list::execute(args, &ctx).await,
        StoreCommands::ExistsObject(args) => object::exists(args, &ctx).await,
        StoreCommands::RemoveObjects(args) => object::remove(args, &ctx).await,
        StoreCommands::GetData(args) => object::get_data(args, &ctx).await,
        StoreCommands::GetJson(args) => object::get_json(args, &ctx).await,
        StoreCommands::UploadFile(args) => transfer::upload(args, &ctx).await,
        StoreCommands::DownloadFile(args) => transfer::download(args, &ctx).await,
        StoreCommands::GetUploadUrl(args) => presign::execute(args, presign::Method::Put, &ctx).await,
        StoreCommands::GetDownloadUrl(args) => {
            presign::execute(args, presign::Method::Get, &ctx).await
        }
        StoreCommands::UploadFolder(args) => folder::execute(args, &ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["sss", "exists-bucket", "b1", "--json", "--oss-bucket", "other"]);
        assert!(cli.json);
        assert_eq!(cli.connection.bucket.as_deref(), Some("other"));
    }

    #[test]
    fn test_oss_secure_forms() {
        let cli = parse(&["sss", "--oss-secure", "exists-bucket", "b1"]);
        assert_eq!(cli.connection.secure, Some(true));

        let cli = parse(&["sss", "--oss-secure=no", "exists-bucket", "b1"]);
        assert_eq!(cli.connection.secure, Some(false));
    }

    #[test]
    fn test_connection_args_into_overrides() {
        let cli = parse(&[
            "sss",
            "--oss-endpoint",
            "minio.local:9000",
            "--oss-region",
            "",
            "exists-bucket",
            "b1",
        ]);
        let overrides = SettingsOverrides::from(cli.connection);
        assert_eq!(overrides.endpoint.as_deref(), Some("minio.local:9000"));
        assert_eq!(overrides.region.as_deref(), Some(""));
    }

    #[test]
    fn test_remove_object_alias() {
        let cli = parse(&["sss", "remove-object", "a.txt"]);
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommands::RemoveObjects(_))
        ));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["sss", "sync-folder"]).is_err());
    }

    #[test]
    fn test_resolve_bucket() {
        let settings = Settings::default();
        assert_eq!(resolve_bucket(None, &settings), "default");
        assert_eq!(resolve_bucket(Some(String::new()), &settings), "default");
        assert_eq!(resolve_bucket(Some("b1".into()), &settings), "b1");
    }

    #[test]
    fn test_output_config_merges_defaults() {
        let cli = parse(&["sss", "--no-color", "exists-bucket", "b1"]);
        let defaults = Defaults {
            output: "json".into(),
            color: "always".into(),
            progress: false,
        };
        let config = output_config(&cli, &defaults);
        assert!(config.json);
        assert_eq!(config.color, ColorMode::Never);
        assert!(config.no_progress);

        let config = output_config(&cli, &Defaults::default());
        assert!(!config.json);
        assert!(!config.no_progress);
    }

    #[test]
    fn test_require_non_empty() {
        let formatter = Formatter::default();
        assert_eq!(
            require_non_empty("", "Object name", &formatter),
            Some(ExitCode::UsageError)
        );
        assert_eq!(require_non_empty("a", "Object name", &formatter), None);
    }
}
