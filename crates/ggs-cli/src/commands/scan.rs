//! Scan command implementation.

use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use ggs_core::{ScanOptions, scan};
use ggs_types::DEFAULT_NAME_HINT;

use crate::config::{Config, DEFAULT_SCAN_TIMEOUT};
use crate::format::format_scan_text;
use crate::style;

pub async fn cmd_scan(
    timeout: Option<u64>,
    name: Option<String>,
    config: &Config,
    no_color: bool,
    quiet: bool,
) -> Result<()> {
    let duration = Duration::from_secs(
        timeout
            .or(config.scan_timeout)
            .unwrap_or(DEFAULT_SCAN_TIMEOUT),
    );
    let hint = name
        .or_else(|| config.name.clone())
        .unwrap_or_else(|| DEFAULT_NAME_HINT.to_string());

    // Show spinner for interactive output (unless quiet)
    let spinner = (!quiet && io::stderr().is_terminal()).then(|| style::scanning_spinner(duration));

    let result = scan::scan_for_devices(&ScanOptions::default().duration(duration)).await;

    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    let mut devices = result.context("Failed to scan for devices")?;
    scan::sort_by_strength(&mut devices);

    print!("{}", format_scan_text(&devices, &hint, no_color));
    Ok(())
}
