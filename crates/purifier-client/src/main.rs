//! `purifier` command-line tool: entry point.
//!
//! Finds air purifiers on the LAN and reads or controls one of them over its
//! encrypted HTTP API.
//!
//! # Usage
//!
//! ```text
//! purifier discover [--timeout SECS] [--search-target ST]
//! purifier status   --host HOST
//! purifier read     --host HOST --endpoint NAME
//! purifier set      --host HOST [--json] KEY=VALUE...
//! purifier init-config [--host HOST] [--force]
//! ```
//!
//! `--host` may also come from the `PURIFIER_HOST` environment variable or
//! from `[appliance] host` in the config file, in that order.
//!
//! # What happens at startup
//!
//! 1. The config file is loaded (defaults if it does not exist).
//! 2. `tracing_subscriber` is initialised.  `RUST_LOG` wins; otherwise the
//!    configured `log_level` applies.
//! 3. The subcommand runs against a `reqwest` transport whose per-request
//!    timeout comes from the config.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use purifier_client::application::control::{air_field_value, ApplianceClient};
use purifier_client::application::transport::Transport;
use purifier_client::infrastructure::network::discovery::SsdpDiscovery;
use purifier_client::infrastructure::network::http::ReqwestTransport;
use purifier_client::infrastructure::storage::config::{self, AppConfig};
use purifier_core::ApplianceEndpoint;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Discover and control networked air purifiers.
#[derive(Debug, Parser)]
#[command(name = "purifier", version)]
struct Cli {
    /// Read configuration from this file instead of the platform default.
    #[arg(long, global = true, env = "PURIFIER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the LAN for appliances and print one line per device.
    Discover {
        /// Seconds to wait for replies [default: from config, 3].
        #[arg(long)]
        timeout: Option<u64>,

        /// SSDP search target [default: from config].
        #[arg(long)]
        search_target: Option<String>,
    },

    /// Print the decrypted `air` status and a readable summary.
    Status {
        /// Appliance address (`ip` or `ip:port`).
        #[arg(long, env = "PURIFIER_HOST")]
        host: Option<String>,
    },

    /// Print the decrypted JSON of one endpoint.
    Read {
        /// Appliance address (`ip` or `ip:port`).
        #[arg(long, env = "PURIFIER_HOST")]
        host: Option<String>,

        /// Endpoint name: firmware, userinfo, wifi, air, device, filter.
        #[arg(long, default_value = "air")]
        endpoint: ApplianceEndpoint,
    },

    /// Write `KEY=VALUE` pairs to the `air` endpoint.
    ///
    /// Values are sent as strings (`pwr=1` sends `"1"`), except `cl`
    /// (boolean) and `rhset`, `aqil`, `dt` (integers).
    Set {
        /// Appliance address (`ip` or `ip:port`).
        #[arg(long, env = "PURIFIER_HOST")]
        host: Option<String>,

        /// Parse every value as JSON instead, falling back to a string.
        #[arg(long)]
        json: bool,

        /// One or more `KEY=VALUE` assignments.
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },

    /// Write a config file holding the defaults (and `--host`, if given).
    ///
    /// The file goes to `--config` or the platform default path.
    InitConfig {
        /// Appliance address to store as `[appliance] host`.
        #[arg(long)]
        host: Option<String>,

        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Splits `KEY=VALUE`; the value stays raw text until [`build_payload`].
fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {arg:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {arg:?}"));
    }
    Ok((key.to_string(), raw.to_string()))
}

/// Builds the `air` document for `set`.
///
/// With `json` every value goes through `serde_json` (text that is not JSON
/// stays a string); otherwise [`air_field_value`] types each key.
fn build_payload(values: Vec<(String, String)>, json: bool) -> anyhow::Result<Value> {
    let mut payload = Map::new();
    for (key, raw) in values {
        let value = if json {
            serde_json::from_str(&raw).unwrap_or(Value::String(raw))
        } else {
            air_field_value(&key, &raw).map_err(anyhow::Error::msg)?
        };
        payload.insert(key, value);
    }
    Ok(Value::Object(payload))
}

/// Writes a fresh config file to `path`, refusing to overwrite without `force`.
fn init_config(path: &Path, host: Option<String>, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to replace it", path.display());
    }
    let mut cfg = AppConfig::default();
    cfg.appliance.host = host.filter(|h| !h.trim().is_empty());
    config::save_config_to(path, &cfg)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Picks the appliance address: command line / environment first, then config.
fn resolve_host(arg: Option<String>, cfg: &AppConfig) -> anyhow::Result<String> {
    match arg.or_else(|| cfg.appliance.host.clone()) {
        Some(host) if !host.trim().is_empty() => Ok(host.trim().to_string()),
        _ => bail!("no appliance host given; pass --host, set PURIFIER_HOST, or set [appliance] host in the config file"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    let (cfg, config_warning) = match loaded {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.general.log_level)),
        )
        .init();

    if let Some(e) = config_warning {
        warn!("using default configuration: {e}");
    }

    let transport: Arc<dyn Transport> = Arc::new(
        ReqwestTransport::new(cfg.network.http_timeout())
            .context("failed to create HTTP client")?,
    );

    match cli.command {
        Command::Discover {
            timeout,
            search_target,
        } => {
            let discovery_cfg = cfg.network.discovery_config()?;
            let timeout = timeout
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| cfg.network.discovery_timeout());
            let search_target = search_target.unwrap_or_else(|| cfg.network.search_target.clone());

            let devices = SsdpDiscovery::new(discovery_cfg, transport)
                .discover(&search_target, timeout)
                .await?;
            if devices.is_empty() {
                info!("no devices answered within {}s", timeout.as_secs());
            }
            for device in devices {
                println!("{}\t{}", device.network_location, device.description());
            }
        }

        Command::Status { host } => {
            let host = resolve_host(host, &cfg)?;
            let client = ApplianceClient::connect(transport, host).await?;
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status.raw)?);
            println!();
            println!("{status}");
        }

        Command::Read { host, endpoint } => {
            if !endpoint.is_encrypted() {
                bail!("the {endpoint} endpoint is used for the key exchange and cannot be read");
            }
            let host = resolve_host(host, &cfg)?;
            let client = ApplianceClient::connect(transport, host).await?;
            let value = client.read(endpoint).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Command::Set { host, json, values } => {
            let host = resolve_host(host, &cfg)?;
            let payload = build_payload(values, json)?;
            let client = ApplianceClient::connect(transport, host).await?;
            let reply = client.write(ApplianceEndpoint::Air, &payload).await?;
            if !reply.is_null() {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            }
        }

        Command::InitConfig { host, force } => {
            let path = match cli.config {
                Some(path) => path,
                None => config::config_file_path()?,
            };
            init_config(&path, host, force)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_payload(args: &[&str]) -> Value {
        let cli = Cli::parse_from(args.iter().copied());
        match cli.command {
            Command::Set { json, values, .. } => build_payload(values, json).unwrap(),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_assignment_keeps_raw_value() {
        assert_eq!(
            parse_assignment("mode=P").unwrap(),
            ("mode".to_string(), "P".to_string())
        );
        assert_eq!(
            parse_assignment("ddp=a=b").unwrap(),
            ("ddp".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn test_set_sends_numeric_looking_switches_as_strings() {
        // Act
        let payload = set_payload(&["purifier", "set", "--host", "h", "pwr=1", "om=2", "mode=P"]);

        // Assert
        assert_eq!(payload, json!({ "pwr": "1", "om": "2", "mode": "P" }));
    }

    #[test]
    fn test_set_single_power_value_is_string() {
        let payload = set_payload(&["purifier", "set", "--host", "h", "pwr=1"]);

        assert_eq!(payload.to_string(), r#"{"pwr":"1"}"#);
    }

    #[test]
    fn test_set_types_child_lock_and_brightness() {
        let payload = set_payload(&["purifier", "set", "--host", "h", "cl=true", "aqil=100"]);

        assert_eq!(payload, json!({ "cl": true, "aqil": 100 }));
    }

    #[test]
    fn test_set_with_json_flag_parses_values_as_json() {
        let payload = set_payload(&["purifier", "set", "--host", "h", "--json", "pwr=1", "om=t"]);

        assert_eq!(payload, json!({ "pwr": 1, "om": "t" }));
    }

    #[test]
    fn test_build_payload_rejects_malformed_typed_value() {
        let values = vec![("dt".to_string(), "soon".to_string())];

        assert!(build_payload(values, false).is_err());
    }

    #[test]
    fn test_parse_assignment_rejects_missing_equals_or_key() {
        assert!(parse_assignment("pwr").is_err());
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn test_resolve_host_prefers_argument_over_config() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.appliance.host = Some("10.0.0.1".to_string());

        // Act / Assert
        assert_eq!(
            resolve_host(Some("10.0.0.2".to_string()), &cfg).unwrap(),
            "10.0.0.2"
        );
        assert_eq!(resolve_host(None, &cfg).unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_resolve_host_without_any_source_is_error() {
        assert!(resolve_host(None, &AppConfig::default()).is_err());
    }

    #[test]
    fn test_cli_parses_set_with_multiple_values() {
        let cli = Cli::parse_from(["purifier", "set", "--host", "10.0.0.3", "pwr=1", "om=s"]);

        match cli.command {
            Command::Set { host, json, values } => {
                assert_eq!(host.as_deref(), Some("10.0.0.3"));
                assert!(!json);
                assert_eq!(values.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_endpoint_name() {
        let cli = Cli::parse_from(["purifier", "read", "--host", "h", "--endpoint", "filter"]);

        match cli.command {
            Command::Read { endpoint, .. } => assert_eq!(endpoint, ApplianceEndpoint::Filter),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_init_config_writes_host_and_refuses_to_overwrite() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        // Act
        init_config(&path, Some("10.0.0.7".to_string()), false).unwrap();
        let second = init_config(&path, None, false);

        // Assert
        let loaded = config::load_config_from(&path).unwrap();
        assert_eq!(loaded.appliance.host.as_deref(), Some("10.0.0.7"));
        assert!(second.is_err());
    }

    #[test]
    fn test_init_config_force_replaces_existing_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        init_config(&path, Some("10.0.0.7".to_string()), false).unwrap();

        // Act
        init_config(&path, None, true).unwrap();

        // Assert
        let loaded = config::load_config_from(&path).unwrap();
        assert_eq!(loaded.appliance.host, None);
    }

    #[test]
    fn test_cli_parses_init_config_with_global_config_path() {
        let cli = Cli::parse_from(["purifier", "init-config", "--host", "h", "--config", "/tmp/p.toml"]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
        match cli.command {
            Command::InitConfig { host, force } => {
                assert_eq!(host.as_deref(), Some("h"));
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
