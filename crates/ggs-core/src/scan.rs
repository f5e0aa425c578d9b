//! Device discovery and location.
//!
//! Scanning collects every advertising peripheral. Locating then picks the
//! controller out of the scan result:
//!
//! 1. An explicit address is used as-is, without scanning.
//! 2. Otherwise the first device (in scan order) whose name matches the hint
//!    wins. Matching is a case-insensitive substring test, or an exact
//!    comparison of the trimmed name in [`NameMatch::Exact`] mode.
//! 3. If nothing matches, the device with the strongest RSSI is used and a
//!    warning is logged. Equal RSSI is broken by name, lexicographically
//!    smallest first.
//! 4. An empty scan is fatal.

use std::cmp::Ordering;
use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::util::{addresses_match, create_identifier, format_peripheral_id, is_hidden_address};
use ggs_types::DEFAULT_NAME_HINT;
use ggs_types::uuid::GGS_SERVICE;

/// Information about a discovered peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredDevice {
    /// Advertised local name, if any.
    pub name: Option<String>,
    /// The BLE address as a string (zeros on macOS, use `identifier` instead).
    pub address: String,
    /// A connection identifier (peripheral ID on macOS, address on other platforms).
    pub identifier: String,
    /// RSSI signal strength observed during the scan.
    pub rssi: Option<i16>,
    /// Whether the advertisement lists the GGS custom service.
    pub advertises_service: bool,
}

/// How the name hint is compared against advertised names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameMatch {
    /// Case-insensitive substring match.
    #[default]
    Substring,
    /// Trimmed name must equal the hint exactly.
    Exact,
}

/// Options for a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// How long each scan pass listens for advertisements.
    pub duration: Duration,
    /// Number of scan passes before giving up on a name match.
    pub attempts: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(8),
            attempts: 1,
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set scan duration in seconds.
    #[must_use]
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Duration::from_secs(secs);
        self
    }

    /// Set the number of scan passes (at least one).
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }
}

/// Configuration for locating the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Name hint; `None` skips name matching.
    pub name_hint: Option<String>,
    /// How the hint is compared.
    pub name_match: NameMatch,
    /// Scan timing.
    pub scan: ScanOptions,
    /// Use the strongest device when nothing matches the hint.
    pub fallback_to_strongest: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            name_hint: Some(DEFAULT_NAME_HINT.to_string()),
            name_match: NameMatch::Substring,
            scan: ScanOptions::default(),
            fallback_to_strongest: true,
        }
    }
}

impl LocatorConfig {
    /// Create a locator config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict locating: exact name, three 3-second passes, no fallback.
    pub fn strict(name: impl Into<String>) -> Self {
        Self {
            name_hint: Some(name.into()),
            name_match: NameMatch::Exact,
            scan: ScanOptions::default().duration_secs(3).attempts(3),
            fallback_to_strongest: false,
        }
    }

    /// Set the name hint.
    #[must_use]
    pub fn name_hint(mut self, hint: Option<String>) -> Self {
        self.name_hint = hint;
        self
    }

    /// Set the name match mode.
    #[must_use]
    pub fn name_match(mut self, mode: NameMatch) -> Self {
        self.name_match = mode;
        self
    }

    /// Set the scan options.
    #[must_use]
    pub fn scan(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    /// Set whether to fall back to the strongest device.
    #[must_use]
    pub fn fallback_to_strongest(mut self, fallback: bool) -> Self {
        self.fallback_to_strongest = fallback;
        self
    }
}

/// Outcome of [`select_device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// The device's name matched the hint.
    Matched(&'a DiscoveredDevice),
    /// Nothing matched; this is the strongest device seen.
    Strongest(&'a DiscoveredDevice),
}

impl<'a> Selection<'a> {
    /// The selected device.
    pub fn device(&self) -> &'a DiscoveredDevice {
        match self {
            Selection::Matched(d) | Selection::Strongest(d) => d,
        }
    }

    /// Whether the RSSI fallback was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Selection::Strongest(_))
    }
}

/// A resolved, connectable device reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Identifier to connect to.
    pub identifier: String,
    /// Advertised name, when known from a scan.
    pub name: Option<String>,
    /// RSSI at scan time, when known.
    pub rssi: Option<i16>,
    /// Whether the RSSI fallback picked this device.
    pub fallback: bool,
}

impl Located {
    fn from_selection(selection: Selection<'_>) -> Self {
        let device = selection.device();
        Self {
            identifier: device.identifier.clone(),
            name: device.name.clone(),
            rssi: device.rssi,
            fallback: selection.is_fallback(),
        }
    }
}

/// Check a device name against a hint.
pub fn matches_hint(name: Option<&str>, hint: &str, mode: NameMatch) -> bool {
    let Some(name) = name else {
        return false;
    };
    match mode {
        NameMatch::Substring => name.to_lowercase().contains(&hint.to_lowercase()),
        NameMatch::Exact => name.trim() == hint,
    }
}

/// Order devices by signal strength, then by name (smaller name ranks higher).
///
/// Devices without an RSSI rank below every device that has one.
fn strength_order(a: &DiscoveredDevice, b: &DiscoveredDevice) -> Ordering {
    let rssi = |d: &DiscoveredDevice| d.rssi.unwrap_or(i16::MIN);
    rssi(a)
        .cmp(&rssi(b))
        .then_with(|| b.name.as_deref().unwrap_or("").cmp(a.name.as_deref().unwrap_or("")))
}

/// The device with the strongest signal.
pub fn strongest(devices: &[DiscoveredDevice]) -> Option<&DiscoveredDevice> {
    devices.iter().max_by(|a, b| strength_order(a, b))
}

/// Sort devices strongest first.
pub fn sort_by_strength(devices: &mut [DiscoveredDevice]) {
    devices.sort_by(|a, b| strength_order(b, a));
}

/// Pick the controller out of a scan result.
///
/// # Errors
///
/// - [`DeviceNotFoundReason::NoDevicesInRange`] if `devices` is empty.
/// - [`DeviceNotFoundReason::NotFound`] if nothing matches the hint and the
///   fallback is disabled.
pub fn select_device<'a>(
    devices: &'a [DiscoveredDevice],
    config: &LocatorConfig,
) -> Result<Selection<'a>> {
    if devices.is_empty() {
        return Err(Error::DeviceNotFound(DeviceNotFoundReason::NoDevicesInRange));
    }

    let Some(hint) = config.name_hint.as_deref() else {
        return strongest(devices)
            .map(Selection::Strongest)
            .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoDevicesInRange));
    };

    if let Some(device) = devices
        .iter()
        .find(|d| matches_hint(d.name.as_deref(), hint, config.name_match))
    {
        return Ok(Selection::Matched(device));
    }

    if config.fallback_to_strongest
        && let Some(device) = strongest(devices)
    {
        return Ok(Selection::Strongest(device));
    }

    Err(Error::device_not_found(hint))
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for all advertising devices using the first adapter.
pub async fn scan_for_devices(options: &ScanOptions) -> Result<Vec<DiscoveredDevice>> {
    let adapter = get_adapter().await?;
    scan_with_adapter(&adapter, options).await
}

/// Run one scan pass on a specific adapter.
///
/// Returns every peripheral the adapter knows about after the pass, in the
/// order the platform reports them. An empty list is not an error here.
pub async fn scan_with_adapter(
    adapter: &Adapter,
    options: &ScanOptions,
) -> Result<Vec<DiscoveredDevice>> {
    info!(
        "Starting BLE scan for {:.1} seconds...",
        options.duration.as_secs_f32()
    );

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let peripherals = adapter.peripherals().await?;
    let mut discovered = Vec::with_capacity(peripherals.len());

    for peripheral in peripherals {
        match process_peripheral(&peripheral).await {
            Ok(Some(device)) => {
                debug!(
                    "Seen {:?} [{}] RSSI={:?}",
                    device.name, device.identifier, device.rssi
                );
                discovered.push(device);
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Error processing peripheral: {}", e);
            }
        }
    }

    info!("Scan complete. Found {} device(s)", discovered.len());
    Ok(discovered)
}

async fn process_peripheral(peripheral: &Peripheral) -> Result<Option<DiscoveredDevice>> {
    let Some(properties) = peripheral.properties().await? else {
        return Ok(None);
    };

    let address = properties.address.to_string();
    let identifier = create_identifier(&address, &peripheral.id());
    let advertises_service = properties.services.contains(&GGS_SERVICE)
        || properties.service_data.contains_key(&GGS_SERVICE);

    Ok(Some(DiscoveredDevice {
        name: properties.local_name,
        address,
        identifier,
        rssi: properties.rssi,
        advertises_service,
    }))
}

/// Resolve the device to connect to.
///
/// An explicit `address` is returned unchanged. Otherwise up to
/// `config.scan.attempts` passes are made; the first pass that yields a
/// name match wins. After the last pass the fallback policy of
/// [`select_device`] applies.
#[tracing::instrument(level = "info", skip_all, fields(hint = ?config.name_hint))]
pub async fn locate(
    adapter: &Adapter,
    address: Option<&str>,
    config: &LocatorConfig,
) -> Result<Located> {
    if let Some(address) = address {
        return Ok(Located {
            identifier: address.to_string(),
            name: None,
            rssi: None,
            fallback: false,
        });
    }

    info!(
        "Looking for device (hint: {})",
        config.name_hint.as_deref().unwrap_or("-")
    );

    let attempts = config.scan.attempts.max(1);
    let mut devices = Vec::new();

    for attempt in 1..=attempts {
        devices = scan_with_adapter(adapter, &config.scan).await?;

        if let Ok(Selection::Matched(device)) = select_device(&devices, config) {
            info!(
                "Match: {} [{}] RSSI={:?}",
                device.name.as_deref().unwrap_or("?"),
                device.identifier,
                device.rssi
            );
            return Ok(Located::from_selection(Selection::Matched(device)));
        }

        if attempt < attempts {
            warn!("No matching device, retrying ({}/{})...", attempt, attempts);
        }
    }

    let selection = select_device(&devices, config)?;
    if selection.is_fallback() {
        let device = selection.device();
        warn!(
            "No name match. Trying strongest device: {} [{}] RSSI={:?}",
            device.name.as_deref().unwrap_or("?"),
            device.identifier,
            device.rssi
        );
    }
    Ok(Located::from_selection(selection))
}

/// Find a peripheral by identifier, scanning if the adapter has not seen it yet.
///
/// The identifier may be a MAC address, a platform peripheral ID, or a name.
pub async fn find_peripheral(
    adapter: &Adapter,
    identifier: &str,
    options: &ScanOptions,
) -> Result<Peripheral> {
    if let Some(peripheral) = find_known_peripheral(adapter, identifier).await? {
        debug!("Found device in adapter cache (no scan needed)");
        return Ok(peripheral);
    }

    let attempts = options.attempts.max(1);
    for attempt in 1..=attempts {
        info!("Scan attempt {}/{} for {}...", attempt, attempts, identifier);
        adapter.start_scan(ScanFilter::default()).await?;
        sleep(options.duration).await;
        adapter.stop_scan().await?;

        if let Some(peripheral) = find_known_peripheral(adapter, identifier).await? {
            return Ok(peripheral);
        }
    }

    warn!("Device not found after {} attempts: {}", attempts, identifier);
    Err(Error::device_not_found(identifier))
}

/// Whether a peripheral with this ID and address is the one `identifier` names.
///
/// Only the peripheral ID and the (visible) address count; advertised names
/// never do.
fn identifies(peripheral_id: &str, address: Option<&str>, identifier: &str) -> bool {
    if peripheral_id.eq_ignore_ascii_case(identifier) {
        return true;
    }
    address.is_some_and(|a| !is_hidden_address(a) && addresses_match(a, identifier))
}

/// Search through known peripherals to find one matching the identifier.
async fn find_known_peripheral(adapter: &Adapter, identifier: &str) -> Result<Option<Peripheral>> {
    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        let peripheral_id = format_peripheral_id(&peripheral.id());
        let address = match peripheral.properties().await {
            Ok(Some(props)) => Some(props.address.to_string()),
            _ => None,
        };
        if identifies(&peripheral_id, address.as_deref(), identifier) {
            debug!("Matched {} [{}]", identifier, peripheral_id);
            return Ok(Some(peripheral));
        }
    }

    Ok(None)
}
