//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ggs")]
#[command(author, version, about = "Control Spider Farmer GGS grow-light controllers over Bluetooth LE", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Use this configuration file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Reusable device location and connection arguments
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// BLE address (e.g. 90:E5:B1:B7:86:E6); scans when omitted
    #[arg(short, long, env = "GGS_DEVICE")]
    pub address: Option<String>,

    /// Name hint used when scanning [default: SF-GGS-CB]
    #[arg(short, long, env = "GGS_NAME")]
    pub name: Option<String>,

    /// Scan duration in seconds [default: 8]
    #[arg(long, value_name = "SECONDS")]
    pub scan_timeout: Option<u64>,

    /// Connection timeout in seconds [default: 20]
    #[arg(short = 'T', long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a one-shot light command and/or request status
    Control {
        #[command(flatten)]
        device: DeviceArgs,

        /// Light on (1) or off (0); defaults to 1 when --level is given
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
        on: Option<u8>,

        /// Light level (0-100)
        #[arg(short, long)]
        level: Option<i64>,

        /// Only request status (getDevSta); light flags are ignored
        #[arg(long)]
        status_only: bool,

        /// Request status after setting the light
        #[arg(long)]
        pull_status_after: bool,

        /// Seconds to wait for notifications [default: 2.0]
        #[arg(short, long, value_name = "SECONDS", value_parser = parse_wait)]
        wait: Option<f64>,
    },

    /// Interactive console for live control
    Console {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Print status notifications until interrupted
    Listen {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Scan for nearby BLE devices
    Scan {
        /// Scan duration in seconds [default: 8]
        #[arg(short, long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// Name hint to highlight [default: SF-GGS-CB]
        #[arg(short, long, env = "GGS_NAME")]
        name: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Show current configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse the notification wait with validation
fn parse_wait(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    match std::time::Duration::try_from_secs_f64(secs) {
        Ok(_) => Ok(secs),
        Err(_) => Err(format!("Invalid wait '{}'. Must be zero or more seconds", s)),
    }
}
