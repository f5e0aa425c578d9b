//! Interactive console implementation.
//!
//! Operator input is read on a dedicated thread and handed to the session
//! over a channel, so a pending read never holds up notification output.

use std::io::{self, BufRead, Write};
use std::thread;

use anyhow::{Context, Result};
use ggs_core::{GrowController, Session};
use ggs_types::{CONSOLE_HELP, ConsoleInput, ParseError, WriteMode, payload};
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::DeviceArgs;
use crate::config::{Config, resolve_device_args};
use crate::format::{format_send, format_status};
use crate::util::locate_and_connect;

const PROMPT: &str = ">> ";

/// What the console loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

fn error_line(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[ERR] {}", message)
    } else {
        format!("{} {}", "[ERR]".red(), message)
    }
}

/// Handle one line of operator input.
///
/// Parse errors and write errors are reported on `out` and do not end the
/// loop. Blank lines are ignored.
pub async fn handle_line<D, W>(device: &D, line: &str, no_color: bool, out: &mut W) -> io::Result<Step>
where
    D: GrowController + ?Sized,
    W: Write,
{
    let input = match line.parse::<ConsoleInput>() {
        Ok(input) => input,
        Err(ParseError::Empty) => return Ok(Step::Continue),
        Err(e) => {
            writeln!(out, "{}", error_line(&e.to_string(), no_color))?;
            return Ok(Step::Continue);
        }
    };

    match input {
        ConsoleInput::Exit => return Ok(Step::Exit),
        ConsoleInput::Help => writeln!(out, "{}", CONSOLE_HELP)?,
        ConsoleInput::Send(command) => {
            match command.to_json() {
                Ok(json) => writeln!(out, "{}", format_send(&json, no_color))?,
                Err(e) => {
                    writeln!(out, "{}", error_line(&e.to_string(), no_color))?;
                    return Ok(Step::Continue);
                }
            }
            out.flush()?;
            if let Err(e) = device.send(&command, WriteMode::WithoutResponse).await {
                tracing::debug!("Console write failed: {:?}", e);
                writeln!(out, "{}", error_line(&e.to_string(), no_color))?;
            }
        }
    }
    Ok(Step::Continue)
}

/// Run the console loop until `exit`, end of input, or the channel closes.
pub async fn drive<D, W>(
    device: &D,
    lines: &mut mpsc::Receiver<String>,
    no_color: bool,
    out: &mut W,
) -> io::Result<()>
where
    D: GrowController + ?Sized,
    W: Write,
{
    writeln!(out, "{}", CONSOLE_HELP)?;
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.recv().await else {
            writeln!(out)?;
            break;
        };
        if handle_line(device, &line, no_color, out).await? == Step::Exit {
            break;
        }
    }
    Ok(())
}

/// Read stdin lines on a detached thread.
///
/// The thread stops at end of input or when the receiver is dropped; a read
/// still blocked at exit does not keep the process alive.
fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);
    thread::Builder::new()
        .name("ggs-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to start input reader")?;
    Ok(rx)
}

pub async fn cmd_console(
    device_args: &DeviceArgs,
    config: &Config,
    no_color: bool,
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let resolved = resolve_device_args(device_args, config);

    let device = locate_and_connect(&resolved, &resolved.locator(), !quiet, cancel).await?;
    if !quiet {
        eprintln!(
            "Connected to {} [{}]",
            device.name().unwrap_or("GGS"),
            device.address()
        );
    }

    let session = Session::open(
        device,
        Box::new(move |data: &[u8]| {
            println!("{}", format_status(&payload::decode_framed(data), no_color));
        }),
    )
    .await
    .context("Failed to subscribe to status notifications")?;

    let mut lines = spawn_stdin_reader()?;
    session
        .run(cancel, |device| async move {
            drive(&*device, &mut lines, no_color, &mut io::stdout()).await?;
            Ok(())
        })
        .await?;

    Ok(())
}
