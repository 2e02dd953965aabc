//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, else `<config dir>/drivedupe/config.toml`)
//! 3. Environment variables prefixed `DRIVEDUPE_` (nested keys split on `__`,
//!    e.g. `DRIVEDUPE_DRIVE__PAGE_SIZE=200`)
//! 4. CLI flags ([`Config::apply_scan_args`])

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, ScanArgs};
use crate::duplicates::{FinderConfig, ResolveScope};
use crate::source::drive::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS, MAX_PAGE_SIZE};
use crate::source::DriveConfig;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DRIVEDUPE_";

/// Configuration validation failures.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("drive.page_size must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
    InvalidPageSize(u32),

    #[error("drive.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("scan.min_size ({min}) is larger than scan.max_size ({max})")]
    InvalidSizeRange { min: u64, max: u64 },
}

/// Drive API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    /// Base URL of the Drive v3 REST API.
    pub api_base_url: String,
    /// Files requested per listing page.
    pub page_size: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// OAuth access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// JSON file holding an `access_token` field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: MAX_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            access_token: None,
            token_file: None,
        }
    }
}

/// Scan settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Ignore files smaller than this when grouping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// Ignore files larger than this when grouping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Which files get their path resolved.
    pub resolve: ResolveScope,
    /// Report format.
    pub output: OutputFormat,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drive: DriveSettings,
    pub scan: ScanSettings,
}

impl Config {
    /// Load the layered configuration.
    ///
    /// An explicit `path` must exist. Without one, the default config file is
    /// used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing, a layer fails to
    /// parse, or the merged values fail [`Config::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Config file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            }
            None => Self::default_path().filter(|p| p.exists()),
        };

        if let Some(ref f) = file {
            log::debug!("Loading config from {}", f.display());
        }

        let config: Config = Self::figment(file.as_deref())
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment for defaults, an optional TOML file and the environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "drivedupe", "drivedupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drive.page_size == 0 || self.drive.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize(self.drive.page_size));
        }
        if self.drive.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let (Some(min), Some(max)) = (self.scan.min_size, self.scan.max_size) {
            if min > max {
                return Err(ConfigError::InvalidSizeRange { min, max });
            }
        }
        Ok(())
    }

    /// Overlay the flags given to `drivedupe scan`.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged values fail [`Config::validate`].
    pub fn apply_scan_args(&mut self, args: &ScanArgs) -> Result<(), ConfigError> {
        if let Some(ref token) = args.access_token {
            self.drive.access_token = Some(token.clone());
        }
        if let Some(ref path) = args.token_file {
            self.drive.token_file = Some(path.clone());
            // An explicit token file beats a token from config or env.
            self.drive.access_token = None;
        }
        if let Some(page_size) = args.page_size {
            self.drive.page_size = page_size;
        }
        if args.min_size.is_some() {
            self.scan.min_size = args.min_size;
        }
        if args.max_size.is_some() {
            self.scan.max_size = args.max_size;
        }
        if let Some(scope) = args.resolve {
            self.scan.resolve = scope;
        }
        if let Some(output) = args.output {
            self.scan.output = output;
        }
        self.validate()
    }

    /// Drive client settings for the given token.
    #[must_use]
    pub fn drive_config(&self, access_token: impl Into<String>) -> DriveConfig {
        DriveConfig::new(access_token)
            .with_api_base_url(self.drive.api_base_url.clone())
            .with_page_size(self.drive.page_size)
            .with_timeout(Duration::from_secs(self.drive.timeout_secs))
    }

    /// Finder settings from the scan section.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_min_size(self.scan.min_size)
            .with_max_size(self.scan.max_size)
            .with_resolve_scope(self.scan.resolve)
    }

    /// Write the configuration as TOML, leaving out the access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut persisted = self.clone();
        persisted.drive.access_token = None;
        let content = toml::to_string_pretty(&persisted).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn scan_args(extra: &[&str]) -> ScanArgs {
        let mut argv = vec!["drivedupe", "scan"];
        argv.extend_from_slice(extra);
        match crate::cli::Cli::try_parse_from(argv).unwrap().command {
            crate::cli::Commands::Scan(args) => args,
            crate::cli::Commands::Load(_) => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.drive.page_size, 1000);
        assert_eq!(config.drive.timeout_secs, 30);
        assert_eq!(config.scan.resolve, ResolveScope::All);
        assert_eq!(config.scan.output, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.drive.page_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPageSize(0)));

        config.drive.page_size = 1001;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPageSize(1001)));

        config.drive.page_size = 100;
        config.drive.timeout_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        config.drive.timeout_secs = 5;
        config.scan.min_size = Some(10);
        config.scan.max_size = Some(5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSizeRange { min: 10, max: 5 })
        ));
    }

    #[test]
    fn test_apply_scan_args_overrides() {
        let mut config = Config::default();
        config.drive.access_token = Some("from-config".into());

        let args = scan_args(&[
            "--token-file",
            "token.json",
            "--page-size",
            "50",
            "--resolve",
            "duplicates",
            "--output",
            "csv",
            "--min-size",
            "1KB",
        ]);
        config.apply_scan_args(&args).unwrap();

        assert_eq!(config.drive.token_file, Some(PathBuf::from("token.json")));
        assert_eq!(config.drive.page_size, 50);
        assert_eq!(config.scan.resolve, ResolveScope::Duplicates);
        assert_eq!(config.scan.output, OutputFormat::Csv);
        assert_eq!(config.scan.min_size, Some(1000));
    }

    #[test]
    fn test_apply_scan_args_keeps_unset_values() {
        let mut config = Config::default();
        config.scan.output = OutputFormat::Json;
        config.scan.max_size = Some(500);

        config.apply_scan_args(&scan_args(&[])).unwrap();

        assert_eq!(config.scan.output, OutputFormat::Json);
        assert_eq!(config.scan.max_size, Some(500));
    }

    #[test]
    fn test_drive_config_from_settings() {
        let mut config = Config::default();
        config.drive.page_size = 25;
        config.drive.timeout_secs = 7;
        let drive = config.drive_config("tok");
        assert_eq!(drive.page_size, 25);
        assert_eq!(drive.timeout, Duration::from_secs(7));
        assert_eq!(drive.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_save_writes_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.scan.resolve = ResolveScope::Duplicates;
        config.drive.access_token = Some("secret".to_string());
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[drive]"));
        assert!(content.contains("resolve = \"duplicates\""));
        assert!(!content.contains("access_token"));
        assert!(!content.contains("secret"));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }
}
