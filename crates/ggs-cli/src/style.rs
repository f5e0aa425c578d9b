//! Visual styling utilities for the CLI.
//!
//! Spinners for scanning and connecting, and the signal-strength bar used
//! in scan output.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

/// Get the standard spinner style.
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Create a spinner for scanning operations.
pub fn scanning_spinner(duration: Duration) -> ProgressBar {
    spinner(format!(
        "Scanning for devices... ({}s)",
        duration.as_secs_f32().round()
    ))
}

/// Create a spinner for connecting to a device.
pub fn connecting_spinner(device: &str) -> ProgressBar {
    spinner(format!("Connecting to {}...", device))
}

/// Format signal strength as a 10-segment bar followed by the RSSI.
#[must_use]
pub fn format_signal_bar(rssi: Option<i16>, no_color: bool) -> String {
    let Some(rssi) = rssi else {
        return "N/A".to_string();
    };

    // -30 dBm = full bar, -100 dBm = empty
    let filled = ((rssi + 100).clamp(0, 70) as f32 / 7.0).round() as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled));

    if no_color {
        format!("{} {:>4}", bar, rssi)
    } else if filled >= 7 {
        format!("{} {:>4}", bar.green(), rssi)
    } else if filled >= 4 {
        format!("{} {:>4}", bar.yellow(), rssi)
    } else {
        format!("{} {:>4}", bar.red(), rssi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_bar_bounds() {
        assert_eq!(format_signal_bar(Some(-30), true), "██████████  -30");
        assert_eq!(format_signal_bar(Some(-110), true), "░░░░░░░░░░ -110");
        assert_eq!(format_signal_bar(None, true), "N/A");
    }

    #[test]
    fn test_signal_bar_midrange() {
        // -65 dBm -> 35/7 = 5 segments
        assert!(format_signal_bar(Some(-65), true).starts_with("█████░░░░░"));
    }
}
