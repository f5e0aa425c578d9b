//! Configuration file management.
//!
//! Values resolve with the precedence: command-line flag, environment
//! variable (handled by clap), configuration file, built-in default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ggs_core::{ConnectionConfig, LocatorConfig, ScanOptions};
use ggs_types::DEFAULT_NAME_HINT;

use crate::cli::DeviceArgs;

/// Default scan duration in seconds.
pub const DEFAULT_SCAN_TIMEOUT: u64 = 8;

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 20;

/// Default notification wait in seconds for `control`.
pub const DEFAULT_WAIT: f64 = 2.0;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default device address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Name hint used when scanning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Scan duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_timeout: Option<u64>,

    /// Connection timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,

    /// Seconds to wait for notifications after `control`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<f64>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the default config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ggs")
            .join("config.toml")
    }

    /// A config populated with the built-in defaults, as written by `config init`.
    pub fn with_defaults() -> Self {
        Self {
            device: None,
            name: Some(DEFAULT_NAME_HINT.to_string()),
            scan_timeout: Some(DEFAULT_SCAN_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            wait: Some(DEFAULT_WAIT),
            no_color: false,
        }
    }

    /// Load config from `path`; a missing file yields the default config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Load config, falling back to defaults with a warning if it is unreadable.
    pub fn load(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}", e);
                Self::default()
            }
        }
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Fully resolved device arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Explicit address, if any.
    pub address: Option<String>,
    /// Name hint for scanning.
    pub name: String,
    /// Scan duration.
    pub scan_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Resolved {
    /// Locator settings for the hint-and-fallback policy used by `control` and `console`.
    pub fn locator(&self) -> LocatorConfig {
        LocatorConfig::default()
            .name_hint(Some(self.name.clone()))
            .scan(ScanOptions::default().duration(self.scan_timeout))
    }

    /// Connection settings.
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::default().connection_timeout(self.connect_timeout)
    }
}

/// Resolve device arguments against the config file and defaults.
pub fn resolve_device_args(args: &DeviceArgs, config: &Config) -> Resolved {
    Resolved {
        address: args.address.clone().or_else(|| config.device.clone()),
        name: args
            .name
            .clone()
            .or_else(|| config.name.clone())
            .unwrap_or_else(|| DEFAULT_NAME_HINT.to_string()),
        scan_timeout: Duration::from_secs(
            args.scan_timeout
                .or(config.scan_timeout)
                .unwrap_or(DEFAULT_SCAN_TIMEOUT),
        ),
        connect_timeout: Duration::from_secs(
            args.timeout
                .or(config.connect_timeout)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        ),
    }
}

/// Resolve the notification wait: flag, then config, then default.
pub fn resolve_wait(wait: Option<f64>, config: &Config) -> Duration {
    wait.or(config.wait)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(Duration::from_secs_f64(DEFAULT_WAIT))
}
