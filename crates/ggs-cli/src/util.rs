//! Utility functions for CLI operations.

use std::future::Future;
use std::io::{self, IsTerminal};

use anyhow::{Result, anyhow};
use ggs_core::{Device, LocatorConfig, scan};
use ggs_types::GattProfile;
use tokio_util::sync::CancellationToken;

use crate::config::Resolved;
use crate::style;

/// A token that is cancelled on the first Ctrl-C.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::debug!("Received Ctrl-C");
                trigger.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    token
}

/// Run `fut` unless `cancel` fires first.
pub async fn unless_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ggs_core::Error::Cancelled.into()),
        result = fut => result,
    }
}

/// Whether `err` is the operator interrupting the run.
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ggs_core::Error>()
        .is_some_and(ggs_core::Error::is_cancelled)
}

/// Locate the controller and connect to it, with helpful error messages.
///
/// A Ctrl-C during the connect phase releases any half-open link before
/// returning [`ggs_core::Error::Cancelled`].
pub async fn locate_and_connect(
    resolved: &Resolved,
    locator: &LocatorConfig,
    show_progress: bool,
    cancel: &CancellationToken,
) -> Result<Device> {
    let adapter = scan::get_adapter().await.map_err(|e| {
        anyhow!(
            "No usable Bluetooth adapter.\n\nCause: {}\n\n\
             Possible causes:\n  \
             - Bluetooth may be disabled -- check system settings\n  \
             - This process may lack Bluetooth permissions",
            e
        )
    })?;

    let located = unless_cancelled(cancel, async {
        scan::locate(&adapter, resolved.address.as_deref(), locator)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to find device '{}'.\n\nCause: {}\n\n\
                     Possible causes:\n  \
                     - The controller may be powered off or out of range\n  \
                     - The controller may be connected to another host (e.g. the phone app)\n\n\
                     Tip: Run 'ggs scan' to list nearby devices",
                    locator.name_hint.as_deref().unwrap_or("-"),
                    e
                )
            })
    })
    .await?;

    let spinner = (show_progress && io::stderr().is_terminal())
        .then(|| style::connecting_spinner(&located.identifier));

    let result = Device::connect_with_adapter_cancellable(
        adapter,
        &located.identifier,
        GattProfile::default(),
        resolved.connection(),
        cancel,
    )
    .await;

    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    result.map_err(|e| {
        if e.is_cancelled() {
            return anyhow::Error::from(e);
        }
        anyhow!(
            "Failed to connect to {}.\n\nCause: {}\n\n\
             Possible causes:\n  \
             - The controller may have gone out of range\n  \
             - The controller may be connected to another host\n  \
             - The Bluetooth connection was interrupted",
            located.identifier,
            e
        )
    })
}
