//! TOML-based configuration persistence for the `purifier` tool.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Purifier\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/purifier/config.toml` or `~/.config/purifier/config.toml`
//! - macOS:    `~/Library/Application Support/Purifier/config.toml`
//!
//! Example file:
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [network]
//! http_timeout_secs = 5
//! discovery_timeout_secs = 3
//! ssdp_group = "239.255.255.250:1900"
//! multicast_ttl = 2
//! search_target = "urn:philips-com:device:DiProduct:1"
//!
//! [appliance]
//! host = "192.168.1.20"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section, or
//! a file written by an older version all load cleanly.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use purifier_core::protocol::ssdp::DEFAULT_SEARCH_TARGET;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::network::discovery::DiscoveryConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field parsed as TOML but holds an unusable value.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub appliance: ApplianceConfig,
}

/// General behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is unset, e.g. `"info"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Timeouts and discovery socket settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Per-request timeout for appliance and description HTTP calls.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// How long a discovery run listens for replies.
    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,
    /// `ip:port` the search request is sent to.
    #[serde(default = "default_ssdp_group")]
    pub ssdp_group: String,
    /// Multicast TTL of the search request.
    #[serde(default = "default_multicast_ttl")]
    pub multicast_ttl: u32,
    /// SSDP search target (`ST` header).
    #[serde(default = "default_search_target")]
    pub search_target: String,
}

/// The appliance used when no host is given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApplianceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_http_timeout_secs() -> u64 {
    5
}
fn default_discovery_timeout_secs() -> u64 {
    3
}
fn default_ssdp_group() -> String {
    "239.255.255.250:1900".to_string()
}
fn default_multicast_ttl() -> u32 {
    2
}
fn default_search_target() -> String {
    DEFAULT_SEARCH_TARGET.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
            discovery_timeout_secs: default_discovery_timeout_secs(),
            ssdp_group: default_ssdp_group(),
            multicast_ttl: default_multicast_ttl(),
            search_target: default_search_target(),
        }
    }
}

impl NetworkConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    /// Socket settings for a discovery run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `ssdp_group` is not an
    /// `ip:port` pair.
    pub fn discovery_config(&self) -> Result<DiscoveryConfig, ConfigError> {
        let group: SocketAddr =
            self.ssdp_group
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "network.ssdp_group",
                    value: self.ssdp_group.clone(),
                })?;
        Ok(DiscoveryConfig {
            group,
            multicast_ttl: self.multicast_ttl,
            ..DiscoveryConfig::default()
        })
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not yet exist.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `Purifier` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Purifier"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("purifier"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Purifier")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
