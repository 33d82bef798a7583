//! Configuration management
//!
//! This module handles loading and saving the sss configuration file and
//! resolving the connection settings used to build the store client.
//! The configuration file is stored in TOML format at ~/.config/sss/config.toml.
//!
//! Settings are layered: built-in defaults, then the `[storage]` table of the
//! configuration file, then [`SettingsOverrides`] collected from the
//! environment and command line.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
///
/// Bumping this version requires a migration step in [`ConfigManager::load`].
pub const SCHEMA_VERSION: u32 = 1;

/// Region used for request signing when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

const DEFAULT_OUTPUT: &str = "human";
const DEFAULT_COLOR: &str = "auto";
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9000";
const DEFAULT_ACCESS_KEY: &str = "OSS_ACCESS_KEY";
const DEFAULT_SECRET_KEY: &str = "OSS_SECRET_KEY";
const DEFAULT_BUCKET: &str = "default";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Object store connection settings
    #[serde(default)]
    pub storage: Settings,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress spinners
    #[serde(default = "default_true")]
    pub progress: bool,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
        }
    }
}

/// Connection settings for the object store
///
/// Constructed once at startup and passed by reference to whatever builds the
/// store client.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Endpoint URL; the scheme may be omitted
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Access key ID
    #[serde(default = "default_access_key")]
    pub access_key: String,

    /// Secret access key
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Region, if the store needs one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Bucket used when a command does not name one
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Use TLS when the endpoint carries no scheme
    #[serde(default)]
    pub secure: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_access_key() -> String {
    DEFAULT_ACCESS_KEY.to_string()
}

fn default_secret_key() -> String {
    DEFAULT_SECRET_KEY.to_string()
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_key: default_access_key(),
            secret_key: default_secret_key(),
            region: None,
            bucket: default_bucket(),
            secure: false,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Values that take precedence over the configuration file
///
/// Each `None` leaves the underlying setting untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub secure: Option<bool>,
}

impl Settings {
    /// Apply overrides on top of these settings
    pub fn apply(&mut self, overrides: SettingsOverrides) {
        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(access_key) = overrides.access_key {
            self.access_key = access_key;
        }
        if let Some(secret_key) = overrides.secret_key {
            self.secret_key = secret_key;
        }
        if let Some(region) = overrides.region {
            // An empty value clears a region set in the config file
            self.region = (!region.is_empty()).then_some(region);
        }
        if let Some(bucket) = overrides.bucket {
            self.bucket = bucket;
        }
        if let Some(secure) = overrides.secure {
            self.secure = secure;
        }
    }

    /// Resolve the endpoint into a full URL
    ///
    /// The `secure` flag picks the scheme when the endpoint has none.
    pub fn endpoint_url(&self) -> Result<String> {
        let raw = self.endpoint.trim();
        if raw.is_empty() {
            return Err(Error::Config("Endpoint cannot be empty".into()));
        }

        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            let scheme = if self.secure { "https" } else { "http" };
            format!("{scheme}://{raw}")
        };

        let url = url::Url::parse(&candidate)?;
        match url.scheme() {
            "https" => {}
            "http" => {
                if self.secure {
                    tracing::warn!(endpoint = %candidate, "secure is set but the endpoint uses http");
                }
            }
            other => {
                return Err(Error::Config(format!(
                    "Unsupported endpoint scheme '{other}', expected http or https"
                )));
            }
        }

        Ok(candidate.trim_end_matches('/').to_string())
    }

    /// Region used for request signing
    pub fn signing_region(&self) -> &str {
        self.region
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REGION)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            storage: Settings::default(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("sss").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade sss.",
                config.schema_version, SCHEMA_VERSION
            )));
        }
        config.schema_version = SCHEMA_VERSION;

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.defaults.color, "auto");
        assert!(config.defaults.progress);
        assert_eq!(config.storage.endpoint, "http://127.0.0.1:9000");
        assert_eq!(config.storage.bucket, "default");
        assert!(config.storage.region.is_none());
        assert!(!config.storage.secure);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.storage, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.storage.endpoint = "https://s3.example.com".to_string();
        config.storage.region = Some("eu-west-1".to_string());
        config.storage.bucket = "photos".to_string();

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.storage, config.storage);
    }

    #[test]
    fn test_partial_storage_table_uses_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[storage]\nbucket = \"logs\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.storage.bucket, "logs");
        assert_eq!(config.storage.endpoint, "http://127.0.0.1:9000");
        assert_eq!(config.storage.access_key, "OSS_ACCESS_KEY");
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("newer than supported")
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut settings = Settings {
            region: Some("eu-west-1".to_string()),
            ..Default::default()
        };
        settings.apply(SettingsOverrides {
            endpoint: Some("minio.local:9000".to_string()),
            bucket: Some("bucket1".to_string()),
            region: Some(String::new()),
            secure: Some(true),
            ..Default::default()
        });

        assert_eq!(settings.endpoint, "minio.local:9000");
        assert_eq!(settings.bucket, "bucket1");
        assert!(settings.region.is_none());
        assert!(settings.secure);
        assert_eq!(settings.access_key, "OSS_ACCESS_KEY");
    }

    #[test]
    fn test_endpoint_url_scheme_from_secure_flag() {
        let mut settings = Settings {
            endpoint: "minio.local:9000".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.endpoint_url().unwrap(), "http://minio.local:9000");

        settings.secure = true;
        assert_eq!(settings.endpoint_url().unwrap(), "https://minio.local:9000");

        settings.endpoint = "http://127.0.0.1:9000/".to_string();
        assert_eq!(settings.endpoint_url().unwrap(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_endpoint_url_rejects_bad_values() {
        let mut settings = Settings {
            endpoint: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(settings.endpoint_url(), Err(Error::Config(_))));

        settings.endpoint = "ftp://files.example.com".to_string();
        assert!(matches!(settings.endpoint_url(), Err(Error::Config(_))));

        settings.endpoint = "http://".to_string();
        assert!(matches!(settings.endpoint_url(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_signing_region() {
        let mut settings = Settings::default();
        assert_eq!(settings.signing_region(), DEFAULT_REGION);

        settings.region = Some("cn-north-1".to_string());
        assert_eq!(settings.signing_region(), "cn-north-1");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = Settings {
            secret_key: "super-secret".to_string(),
            ..Default::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("super-secret"));
    }
}
