//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and DITTO_*
//! environment variables, and merging them with proper precedence rules:
//! CLI flags override environment variables, which override config files,
//! which override built-in defaults.

use crate::dictionary::Dictionary;
use crate::error::DittoError;
use crate::types::{LookupProtocol, ScanConfig, MAX_CONCURRENCY};
use crate::utils::parse_timeout_string;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,

    /// Extra substitutions appended to the built-in dictionary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<HashMap<String, Vec<String>>>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Worker count (0 = one per core)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Maximum number of candidates (0 = no limit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Registration lookup timeout (e.g. "5s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// DNS timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_timeout: Option<String>,

    /// "whois" or "rdap"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_referral: Option<bool>,

    /// Show registration details by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_info: Option<bool>,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default CSV report path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_file: Option<String>,

    /// Pretty-print JSON by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_pretty: Option<bool>,
}

impl DefaultsConfig {
    /// Overlay the values set here onto `config`.
    ///
    /// Values are expected to have passed validation; unparseable ones are skipped.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(limit) = self.limit {
            config = config.with_limit(limit);
        }
        if let Some(secs) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_lookup_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.dns_timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_dns_timeout(Duration::from_secs(secs));
        }
        if let Some(protocol) = self.protocol.as_deref().and_then(|p| p.parse().ok()) {
            config = config.with_protocol(protocol);
        }
        if let Some(follow) = self.follow_referral {
            config = config.with_follow_referral(follow);
        }
        config
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DittoError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DittoError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DittoError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that fail to load are logged and skipped.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let discovered = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in discovered.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        if self.verbose {
            for path in &loaded_files {
                tracing::info!("Loaded configuration from {}", path.display());
            }
        }

        merged_config
    }

    /// Local configuration in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./ditto.toml", "./.ditto.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Global configuration in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".ditto.toml");
        path.exists().then_some(path)
    }

    /// XDG configuration, `$XDG_CONFIG_HOME/ditto/config.toml`.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("ditto").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    concurrency: higher.concurrency.or(lower.concurrency),
                    limit: higher.limit.or(lower.limit),
                    timeout: higher.timeout.or(lower.timeout),
                    dns_timeout: higher.dns_timeout.or(lower.dns_timeout),
                    protocol: higher.protocol.or(lower.protocol),
                    follow_referral: higher.follow_referral.or(lower.follow_referral),
                    whois_info: higher.whois_info.or(lower.whois_info),
                }),
                (lower, higher) => higher.or(lower),
            },
            output: match (lower.output, higher.output) {
                (Some(lower), Some(higher)) => Some(OutputConfig {
                    csv_file: higher.csv_file.or(lower.csv_file),
                    json_pretty: higher.json_pretty.or(lower.json_pretty),
                }),
                (lower, higher) => higher.or(lower),
            },
            dictionary: match (lower.dictionary, higher.dictionary) {
                (Some(mut lower), Some(higher)) => {
                    lower.extend(higher);
                    Some(lower)
                }
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DittoError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency > MAX_CONCURRENCY {
                    return Err(DittoError::config(format!(
                        "Concurrency must be between 0 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            for timeout in [&defaults.timeout, &defaults.dns_timeout].into_iter().flatten() {
                if parse_timeout_string(timeout).is_none() {
                    return Err(DittoError::config(format!(
                        "Invalid timeout format '{}'. Use a positive duration like '5s', '30s', '2m'",
                        timeout
                    )));
                }
            }

            if let Some(protocol) = &defaults.protocol {
                protocol.parse::<LookupProtocol>()?;
            }
        }

        if let Some(extra) = &config.dictionary {
            Dictionary::new().merge_strings(extra)?;
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub limit: Option<usize>,
    pub timeout: Option<String>,
    pub protocol: Option<LookupProtocol>,
    pub csv: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay the values set here onto `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(limit) = self.limit {
            config = config.with_limit(limit);
        }
        if let Some(secs) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config = config.with_lookup_timeout(Duration::from_secs(secs));
        }
        if let Some(protocol) = self.protocol {
            config = config.with_protocol(protocol);
        }
        config
    }
}

/// Load configuration from DITTO_* environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    if let Ok(val) = env::var("DITTO_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency <= MAX_CONCURRENCY => {
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!(
                "Invalid DITTO_CONCURRENCY='{}', must be 0-{}",
                val,
                MAX_CONCURRENCY
            ),
        }
    }

    if let Ok(val) = env::var("DITTO_LIMIT") {
        match val.trim().parse::<usize>() {
            Ok(limit) => env_config.limit = Some(limit),
            Err(_) => tracing::warn!("Invalid DITTO_LIMIT='{}', must be a number", val),
        }
    }

    if let Ok(val) = env::var("DITTO_TIMEOUT") {
        if parse_timeout_string(&val).is_some() {
            env_config.timeout = Some(val);
        } else {
            tracing::warn!(
                "Invalid DITTO_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            );
        }
    }

    if let Ok(val) = env::var("DITTO_PROTOCOL") {
        match val.parse::<LookupProtocol>() {
            Ok(protocol) => env_config.protocol = Some(protocol),
            Err(e) => tracing::warn!("Ignoring DITTO_PROTOCOL: {}", e),
        }
    }

    env_config.csv = non_empty_var("DITTO_CSV");
    env_config.config = non_empty_var("DITTO_CONFIG");

    tracing::debug!("Environment configuration: {:?}", env_config);
    env_config
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
