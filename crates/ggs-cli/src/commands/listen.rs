//! Listen command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use ggs_core::{LocatorConfig, Session};
use ggs_types::payload;
use tokio_util::sync::CancellationToken;

use crate::cli::DeviceArgs;
use crate::config::{Config, Resolved, resolve_device_args};
use crate::format::format_listen;
use crate::util::{is_cancelled, locate_and_connect};

/// Per-pass scan duration when listening.
const LISTEN_SCAN_SECS: u64 = 3;

/// Exact-name locating: three short passes and no signal-strength fallback.
fn listen_locator(device_args: &DeviceArgs, resolved: &Resolved) -> LocatorConfig {
    let mut locator = LocatorConfig::strict(resolved.name.clone());
    let secs = device_args.scan_timeout.unwrap_or(LISTEN_SCAN_SECS);
    locator.scan = locator.scan.duration(Duration::from_secs(secs));
    locator
}

/// Ctrl-C is how a listen run ends, whether it lands while connecting or
/// while listening.
fn stop_on_interrupt(result: Result<()>, quiet: bool) -> Result<()> {
    match result {
        Err(e) if is_cancelled(&e) => {
            if !quiet {
                eprintln!("Stopped.");
            }
            Ok(())
        }
        other => other,
    }
}

pub async fn cmd_listen(
    device_args: &DeviceArgs,
    config: &Config,
    no_color: bool,
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    stop_on_interrupt(listen(device_args, config, no_color, quiet, cancel).await, quiet)
}

async fn listen(
    device_args: &DeviceArgs,
    config: &Config,
    no_color: bool,
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let resolved = resolve_device_args(device_args, config);
    let locator = listen_locator(device_args, &resolved);

    let device = locate_and_connect(&resolved, &locator, !quiet, cancel).await?;

    let session = Session::open(
        device,
        Box::new(move |data: &[u8]| {
            println!("{}", format_listen(&payload::decode(data), no_color));
        }),
    )
    .await
    .context("Failed to subscribe to status notifications")?;

    if !quiet {
        eprintln!("Listening... (Ctrl-C to stop)");
    }

    session
        .run(cancel, |_| std::future::pending::<ggs_core::Result<()>>())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ggs_core::NameMatch;

    fn args(scan_timeout: Option<u64>) -> DeviceArgs {
        DeviceArgs {
            address: None,
            name: None,
            scan_timeout,
            timeout: None,
        }
    }

    #[test]
    fn test_listen_locator_is_strict() {
        let device_args = args(None);
        let resolved = resolve_device_args(&device_args, &Config::default());
        let locator = listen_locator(&device_args, &resolved);

        assert_eq!(locator.name_hint.as_deref(), Some("SF-GGS-CB"));
        assert_eq!(locator.name_match, NameMatch::Exact);
        assert_eq!(locator.scan.attempts, 3);
        assert_eq!(locator.scan.duration, Duration::from_secs(3));
        assert!(!locator.fallback_to_strongest);
    }

    #[test]
    fn test_listen_locator_scan_override() {
        let device_args = args(Some(6));
        let resolved = resolve_device_args(&device_args, &Config::default());
        let locator = listen_locator(&device_args, &resolved);
        assert_eq!(locator.scan.duration, Duration::from_secs(6));
        assert_eq!(locator.scan.attempts, 3);
    }

    #[test]
    fn test_interrupt_before_session_is_clean_stop() {
        let interrupted: Result<()> = Err(ggs_core::Error::Cancelled.into());
        assert!(stop_on_interrupt(interrupted, true).is_ok());
    }

    #[test]
    fn test_other_errors_still_fail() {
        let failed: Result<()> = Err(ggs_core::Error::device_not_found("SF-GGS-CB").into());
        assert!(stop_on_interrupt(failed, true).is_err());
    }
}
