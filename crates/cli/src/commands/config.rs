//! config command - Inspect or create the configuration file

use clap::{Args, Subcommand};
use serde::Serialize;
use sss_core::{Config, ConfigManager, Settings};

use super::fail;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

const REDACTED: &str = "********";

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective connection settings
    Show,

    /// Write a configuration file with the current settings
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    config_file: String,
    exists: bool,
    storage: Settings,
}

/// Execute a config subcommand
///
/// `settings` are the fully resolved settings: file, environment and flags.
pub fn execute(
    command: ConfigCommands,
    manager: &ConfigManager,
    config: Config,
    settings: &Settings,
    formatter: &Formatter,
) -> ExitCode {
    match command {
        ConfigCommands::Show => show(manager, settings, formatter),
        ConfigCommands::Init(args) => init(args, manager, config, settings, formatter),
    }
}

fn show(manager: &ConfigManager, settings: &Settings, formatter: &Formatter) -> ExitCode {
    let path = manager.config_path();
    let storage = redacted(settings);

    if formatter.is_json() {
        formatter.json(&ShowOutput {
            config_file: path.display().to_string(),
            exists: path.exists(),
            storage,
        });
        return ExitCode::Success;
    }

    let endpoint = settings
        .endpoint_url()
        .unwrap_or_else(|_| settings.endpoint.clone());
    formatter.println(&format!(
        "{} {}",
        formatter.dim("config file:"),
        path.display()
    ));
    formatter.println(&format!("{} {endpoint}", formatter.dim("endpoint:   ")));
    formatter.println(&format!(
        "{} {}",
        formatter.dim("access key: "),
        storage.access_key
    ));
    formatter.println(&format!(
        "{} {}",
        formatter.dim("secret key: "),
        storage.secret_key
    ));
    formatter.println(&format!(
        "{} {}",
        formatter.dim("region:     "),
        settings.signing_region()
    ));
    formatter.println(&format!("{} {}", formatter.dim("bucket:     "), settings.bucket));
    ExitCode::Success
}

fn init(
    args: InitArgs,
    manager: &ConfigManager,
    mut config: Config,
    settings: &Settings,
    formatter: &Formatter,
) -> ExitCode {
    let path = manager.config_path();
    if path.exists() && !args.force {
        formatter.error(&format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
        return ExitCode::Conflict;
    }

    config.storage = settings.clone();
    if let Err(e) = manager.save(&config) {
        return fail(formatter, "Failed to write configuration", &e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "created",
            "config_file": path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Configuration written to {}", path.display()));
    }
    ExitCode::Success
}

fn redacted(settings: &Settings) -> Settings {
    Settings {
        secret_key: REDACTED.to_string(),
        ..settings.clone()
    }
}
