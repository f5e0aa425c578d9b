//! One-shot control command implementation.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use ggs_core::{GrowController, Session};
use ggs_types::{Command, WriteMode, payload};
use tokio_util::sync::CancellationToken;

use crate::cli::DeviceArgs;
use crate::config::{Config, resolve_device_args, resolve_wait};
use crate::format::{format_notify, format_write};
use crate::util::locate_and_connect;

/// Light and status flags of the `control` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlArgs {
    pub on: Option<u8>,
    pub level: Option<i64>,
    pub status_only: bool,
    pub pull_status_after: bool,
}

/// The commands a `control` run writes, in order.
///
/// - `--status-only`: a single `getDevSta`; light flags are ignored.
/// - `--on` and/or `--level`: one `setLight`, with `on` defaulting to 1.
/// - `--pull-status-after`: a trailing `getDevSta`.
pub fn batch_plan(args: &ControlArgs) -> Vec<Command> {
    if args.status_only {
        return vec![Command::get_status()];
    }

    let mut plan = Vec::new();
    if args.on.is_some() || args.level.is_some() {
        let on = args.on.unwrap_or(1) != 0;
        plan.push(Command::set_light(on, args.level));
    }
    if args.pull_status_after {
        plan.push(Command::get_status());
    }
    plan
}

/// Write each command with response, echoing it, then wait for notifications.
///
/// The first failed write aborts the run.
pub async fn execute_plan<D, W>(
    device: &D,
    plan: &[Command],
    wait: Duration,
    no_color: bool,
    out: &mut W,
) -> ggs_core::Result<()>
where
    D: GrowController + ?Sized,
    W: Write,
{
    for command in plan {
        let written = device.send(command, WriteMode::WithResponse).await?;
        writeln!(out, "{}", format_write(&String::from_utf8_lossy(&written), no_color))?;
        out.flush()?;
    }

    tokio::time::sleep(wait).await;
    Ok(())
}

pub async fn cmd_control(
    device_args: &DeviceArgs,
    args: ControlArgs,
    wait: Option<f64>,
    config: &Config,
    no_color: bool,
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let resolved = resolve_device_args(device_args, config);
    let wait = resolve_wait(wait, config);
    let plan = batch_plan(&args);

    let device = locate_and_connect(&resolved, &resolved.locator(), !quiet, cancel).await?;

    tracing::info!("Subscribing to notifications...");
    let session = Session::open(
        device,
        Box::new(move |data: &[u8]| {
            println!("{}", format_notify(&payload::decode(data), no_color));
        }),
    )
    .await
    .context("Failed to subscribe to status notifications")?;

    session
        .run(cancel, |device| async move {
            execute_plan(&*device, &plan, wait, no_color, &mut io::stdout()).await
        })
        .await?;

    tracing::info!("Done.");
    Ok(())
}
