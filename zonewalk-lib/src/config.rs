//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, reading the
//! `ZW_*` environment variables and merging both with proper precedence rules.

use crate::error::ZoneWalkError;
use crate::resolvers::parse_endpoint;
use crate::types::{Endpoint, WalkConfig, MAX_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Where resolvers come from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<ResolversConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Per-query timeout (as string, e.g., "500ms", "2s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Use the online resolver feed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

/// Resolver sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolversConfig {
    /// Static resolvers as `ip` or `ip:port`, replacing the built-in list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<String>>,

    /// Resolver reliability feed used with `online`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
}

impl FileConfig {
    /// Layer the values set in this file over `config`.
    ///
    /// Files are validated on load, so a value that still fails to parse
    /// here is reported as a configuration error.
    pub fn apply_to(&self, mut config: WalkConfig) -> Result<WalkConfig, ZoneWalkError> {
        if let Some(defaults) = &self.defaults {
            if let Some(concurrency) = defaults.concurrency {
                config = config.with_concurrency(concurrency);
            }
            if let Some(retries) = defaults.retries {
                config = config.with_retries(retries);
            }
            if let Some(timeout) = &defaults.timeout {
                let timeout = parse_timeout_string(timeout).ok_or_else(|| {
                    ZoneWalkError::config(format!("Invalid timeout format '{}'", timeout))
                })?;
                config = config.with_timeout(timeout);
            }
            if let Some(online) = defaults.online {
                config = config.with_online_resolvers(online);
            }
        }

        if let Some(resolvers) = &self.resolvers {
            if let Some(servers) = &resolvers.servers {
                config = config.with_static_resolvers(parse_servers(servers)?);
            }
            if let Some(feed_url) = &resolvers.feed_url {
                config = config.with_feed_url(feed_url.clone());
            }
        }

        Ok(config)
    }

    /// Verbose flag from `[defaults]`, if any.
    pub fn verbose(&self) -> Option<bool> {
        self.defaults.as_ref().and_then(|d| d.verbose)
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if reading, parsing or
    /// validation fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ZoneWalkError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ZoneWalkError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ZoneWalkError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)
            .map_err(|e| ZoneWalkError::config(format!("Failed to parse TOML configuration: {}", e)))?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that exist but fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    if self.verbose {
                        debug!(path = %path.display(), "loaded config file");
                    }
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => warn!("Ignoring config file {}: {}", path.display(), e),
            }
        }

        merged_config
    }

    /// Local configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./zonewalk.toml", "./.zonewalk.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".zonewalk.toml");
        path.exists().then_some(path)
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("zonewalk").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    retries: higher_defaults.retries.or(lower_defaults.retries),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    online: higher_defaults.online.or(lower_defaults.online),
                    verbose: higher_defaults.verbose.or(lower_defaults.verbose),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            resolvers: match (lower.resolvers, higher.resolvers) {
                (Some(lower_resolvers), Some(higher_resolvers)) => Some(ResolversConfig {
                    servers: higher_resolvers.servers.or(lower_resolvers.servers),
                    feed_url: higher_resolvers.feed_url.or(lower_resolvers.feed_url),
                }),
                (lower_resolvers, higher_resolvers) => higher_resolvers.or(lower_resolvers),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ZoneWalkError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(ZoneWalkError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(ZoneWalkError::config(format!(
                        "Invalid timeout format '{}'. Use format like '500ms', '2s', '1m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(resolvers) = &config.resolvers {
            if let Some(servers) = &resolvers.servers {
                if servers.is_empty() {
                    return Err(ZoneWalkError::config("Resolver list 'servers' cannot be empty"));
                }
                parse_servers(servers)?;
            }

            if let Some(feed_url) = &resolvers.feed_url {
                validate_feed_url(feed_url)?;
            }
        }

        Ok(())
    }
}

fn parse_servers(servers: &[String]) -> Result<Vec<Endpoint>, ZoneWalkError> {
    servers.iter().map(|s| parse_endpoint(s)).collect()
}

fn validate_feed_url(url: &str) -> Result<(), ZoneWalkError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ZoneWalkError::config(format!(
            "Feed URL '{}' must start with http:// or https://",
            url
        )))
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via ZW_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub retries: Option<u32>,
    pub timeout: Option<Duration>,
    pub online: Option<bool>,
    pub feed_url: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Layer the values set in the environment over `config`.
    pub fn apply_to(&self, mut config: WalkConfig) -> WalkConfig {
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(retries) = self.retries {
            config = config.with_retries(retries);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(online) = self.online {
            config = config.with_online_resolvers(online);
        }
        if let Some(feed_url) = &self.feed_url {
            config = config.with_feed_url(feed_url.clone());
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Parses all ZW_* environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    env_config_from(|key| env::var(key).ok(), verbose)
}

fn env_config_from<F>(lookup: F, verbose: bool) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("ZW_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if (1..=MAX_CONCURRENCY).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
                if verbose {
                    debug!("Using ZW_CONCURRENCY={}", concurrency);
                }
            }
            _ => warn!(
                "Invalid ZW_CONCURRENCY='{}', must be 1-{}",
                val, MAX_CONCURRENCY
            ),
        }
    }

    if let Some(val) = lookup("ZW_RETRIES") {
        match val.trim().parse::<u32>() {
            Ok(retries) => {
                env_config.retries = Some(retries);
                if verbose {
                    debug!("Using ZW_RETRIES={}", retries);
                }
            }
            Err(_) => warn!("Invalid ZW_RETRIES='{}', must be a non-negative integer", val),
        }
    }

    if let Some(val) = lookup("ZW_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => {
                env_config.timeout = Some(timeout);
                if verbose {
                    debug!("Using ZW_TIMEOUT={}", val);
                }
            }
            None => warn!(
                "Invalid ZW_TIMEOUT='{}', use format like '500ms', '2s', '1m'",
                val
            ),
        }
    }

    if let Some(val) = lookup("ZW_ONLINE") {
        match parse_bool(&val) {
            Some(online) => {
                env_config.online = Some(online);
                if verbose {
                    debug!("Using ZW_ONLINE={}", online);
                }
            }
            None => warn!("Invalid ZW_ONLINE='{}', use true/false", val),
        }
    }

    if let Some(url) = lookup("ZW_FEED_URL") {
        match validate_feed_url(url.trim()) {
            Ok(()) => {
                if verbose {
                    debug!("Using ZW_FEED_URL={}", url.trim());
                }
                env_config.feed_url = Some(url.trim().to_string());
            }
            Err(e) => warn!("Ignoring ZW_FEED_URL: {}", e),
        }
    }

    if let Some(path) = lookup("ZW_CONFIG") {
        if !path.trim().is_empty() {
            if verbose {
                debug!("Using ZW_CONFIG={}", path);
            }
            env_config.config = Some(path);
        }
    }

    env_config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "500ms", "2s" or "1m".
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let duration = if let Some(ms) = timeout_str.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(s) = timeout_str.strip_suffix('s') {
        s.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(m) = timeout_str.strip_suffix('m') {
        m.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        timeout_str.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    (!duration.is_zero()).then_some(duration)
}
