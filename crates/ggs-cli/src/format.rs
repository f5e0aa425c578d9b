//! Output formatting for echo lines, notifications and scan results.
//!
//! Every line starts with a bracketed tag (`[WRITE]`, `[NOTIFY]`, ...). Tags
//! are colored unless `no_color` is set; the text after the tag never is.

use ggs_core::DiscoveredDevice;
use ggs_core::NameMatch;
use ggs_core::scan::matches_hint;
use ggs_types::Payload;
use owo_colors::OwoColorize;

use crate::style;

/// Color class of a line tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Outbound,
    Inbound,
    Raw,
    Error,
}

fn tag(label: &str, tone: Tone, no_color: bool) -> String {
    let tag = format!("[{}]", label);
    if no_color {
        return tag;
    }
    match tone {
        Tone::Outbound => tag.cyan().to_string(),
        Tone::Inbound => tag.green().to_string(),
        Tone::Raw => tag.yellow().to_string(),
        Tone::Error => tag.red().to_string(),
    }
}

/// `[WRITE] <json>`, echoed after each acknowledged write in `control`.
#[must_use]
pub fn format_write(json: &str, no_color: bool) -> String {
    format!("{} {}", tag("WRITE", Tone::Outbound, no_color), json)
}

/// `[SEND] <json>`, echoed after each console write.
#[must_use]
pub fn format_send(json: &str, no_color: bool) -> String {
    format!("{} {}", tag("SEND", Tone::Outbound, no_color), json)
}

/// `[NOTIFY] <rendered>`, for notifications received by `control`.
#[must_use]
pub fn format_notify(payload: &Payload, no_color: bool) -> String {
    let tone = match payload {
        Payload::Json(_) | Payload::Text(_) => Tone::Inbound,
        Payload::Hex(_) => Tone::Raw,
        Payload::Malformed { .. } => Tone::Error,
    };
    format!("{} {}", tag("NOTIFY", tone, no_color), payload.render())
}

/// Console rendering of a frame decoded with [`ggs_types::payload::decode_framed`].
///
/// JSON is printed as `[STATUS]` on a fresh line so it does not run into
/// the prompt.
#[must_use]
pub fn format_status(payload: &Payload, no_color: bool) -> String {
    match payload {
        Payload::Json(_) => format!(
            "\n{} {}",
            tag("STATUS", Tone::Inbound, no_color),
            payload.render()
        ),
        Payload::Text(text) => format!("{} {}", tag("TEXT", Tone::Inbound, no_color), text),
        Payload::Hex(hex) => format!("{} {}", tag("HEX", Tone::Raw, no_color), hex),
        Payload::Malformed { error, hex } => {
            format!("{} {} {}", tag("ERR", Tone::Error, no_color), error, hex)
        }
    }
}

/// Monitor rendering: `[JSON]`, `[TEXT]` or `[HEX ]`.
#[must_use]
pub fn format_listen(payload: &Payload, no_color: bool) -> String {
    let (label, tone) = match payload {
        Payload::Json(_) => ("JSON", Tone::Inbound),
        Payload::Text(_) => ("TEXT", Tone::Inbound),
        Payload::Hex(_) => ("HEX ", Tone::Raw),
        Payload::Malformed { .. } => ("ERR", Tone::Error),
    };
    format!("{} {}", tag(label, tone, no_color), payload.render())
}

/// Format scan results as text, one device per line.
///
/// Devices are expected strongest first. Devices whose name matches `hint`
/// are marked with `*`; devices advertising the custom service are tagged.
#[must_use]
pub fn format_scan_text(devices: &[DiscoveredDevice], hint: &str, no_color: bool) -> String {
    if devices.is_empty() {
        return "No devices found.\n".to_string();
    }

    let mut output = format!("Found {} device(s):\n\n", devices.len());
    for device in devices {
        let matched = matches_hint(device.name.as_deref(), hint, NameMatch::Substring);
        let marker = if matched { "*" } else { " " };
        let name = device.name.as_deref().unwrap_or("(unnamed)");
        let name = if matched && !no_color {
            format!("{:<24}", name).green().bold().to_string()
        } else {
            format!("{:<24}", name)
        };
        let service = if device.advertises_service {
            "  [GGS service]"
        } else {
            ""
        };
        output.push_str(&format!(
            "{} {} {:<38} {}{}\n",
            marker,
            name,
            device.identifier,
            style::format_signal_bar(device.rssi, no_color),
            service
        ));
    }

    if devices
        .iter()
        .any(|d| matches_hint(d.name.as_deref(), hint, NameMatch::Substring))
    {
        output.push_str(&format!("\n* matches name hint '{}'\n", hint));
    }
    output
}
