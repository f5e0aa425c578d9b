//! GGS controller connection and communication.
//!
//! A [`Device`] owns one BLE connection: it verifies the link right after
//! connecting, looks up the notify and write characteristics of its
//! [`GattProfile`], and exposes single-shot JSON writes plus one notification
//! subscription.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ConnectionFailureReason, Error, Result};
use crate::scan::{ScanOptions, find_peripheral, get_adapter};
use crate::traits::{GrowController, NotificationHandler};
use crate::util::{create_identifier, format_peripheral_id};
use ggs_types::{Command, GattProfile, WriteMode};

/// Represents a connected GGS controller.
///
/// # Cleanup
///
/// Call [`Device::disconnect`] before dropping the device. A device dropped
/// while still connected logs a warning and disconnects on a background task.
pub struct Device {
    /// Kept alive for the lifetime of the peripheral connection.
    #[allow(dead_code)]
    adapter: Adapter,
    peripheral: Peripheral,
    name: Option<String>,
    /// MAC address on Linux/Windows, peripheral UUID on macOS.
    address: String,
    profile: GattProfile,
    /// Whether the custom service was present after discovery.
    has_service: bool,
    characteristics_cache: RwLock<HashMap<Uuid, Characteristic>>,
    /// Notification forwarding tasks, aborted on disconnect.
    notification_handles: tokio::sync::Mutex<Vec<tokio::task::JoinHandle<()>>>,
    disconnected: AtomicBool,
    config: ConnectionConfig,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("profile", &self.profile)
            .field("has_service", &self.has_service)
            .finish_non_exhaustive()
    }
}

/// Default timeout for establishing a connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default timeout for BLE characteristic write operations.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for BLE connection timeouts.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use ggs_core::device::ConnectionConfig;
///
/// let config = ConnectionConfig::default()
///     .connection_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing a BLE connection.
    pub connection_timeout: Duration,
    /// Timeout for a single characteristic write.
    pub write_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
    /// Scan used when the adapter has not seen the requested address yet.
    pub scan: ScanOptions,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            scan: ScanOptions::default().duration_secs(4).attempts(2),
        }
    }
}

impl ConnectionConfig {
    /// Create a new connection config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the service discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the lookup scan used for unseen addresses.
    #[must_use]
    pub fn scan(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }
}

fn write_type(mode: WriteMode) -> WriteType {
    match mode {
        WriteMode::WithResponse => WriteType::WithResponse,
        WriteMode::WithoutResponse => WriteType::WithoutResponse,
    }
}

impl Device {
    /// Connect to a controller by address or name using the default profile.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ggs_core::device::Device;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let device = Device::connect("90:E5:B1:B7:86:E6").await?;
    ///     println!("Connected to {:?}", device);
    ///     device.disconnect().await?;
    ///     Ok(())
    /// }
    /// ```
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect(identifier: &str) -> Result<Self> {
        Self::connect_with_config(identifier, GattProfile::default(), ConnectionConfig::default())
            .await
    }

    /// Connect with an explicit profile and configuration.
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect_with_config(
        identifier: &str,
        profile: GattProfile,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let adapter = get_adapter().await?;
        Self::connect_with_adapter(adapter, identifier, profile, config).await
    }

    /// Connect using an adapter that has already scanned.
    pub async fn connect_with_adapter(
        adapter: Adapter,
        identifier: &str,
        profile: GattProfile,
        config: ConnectionConfig,
    ) -> Result<Self> {
        Self::connect_with_adapter_cancellable(
            adapter,
            identifier,
            profile,
            config,
            &CancellationToken::new(),
        )
        .await
    }

    /// Like [`Device::connect_with_adapter`], but gives up with
    /// [`Error::Cancelled`] once `cancel` fires.
    ///
    /// Whatever stage the attempt reached, the link is released before this
    /// returns an error.
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect_with_adapter_cancellable(
        adapter: Adapter,
        identifier: &str,
        profile: GattProfile,
        config: ConnectionConfig,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let peripheral = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            found = find_peripheral(&adapter, identifier, &config.scan) => found?,
        };
        Self::from_peripheral_cancellable(adapter, peripheral, profile, config, cancel).await
    }

    /// Create a Device from an already-discovered peripheral.
    pub async fn from_peripheral_with_config(
        adapter: Adapter,
        peripheral: Peripheral,
        profile: GattProfile,
        config: ConnectionConfig,
    ) -> Result<Self> {
        Self::from_peripheral_cancellable(
            adapter,
            peripheral,
            profile,
            config,
            &CancellationToken::new(),
        )
        .await
    }

    /// Connect to `peripheral`, disconnecting again on any failure or on cancellation.
    #[tracing::instrument(level = "info", skip_all, fields(connect_timeout = ?config.connection_timeout))]
    pub async fn from_peripheral_cancellable(
        adapter: Adapter,
        peripheral: Peripheral,
        profile: GattProfile,
        config: ConnectionConfig,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let established = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            link = establish(&peripheral, &profile, &config) => link,
        };

        let link = match established {
            Ok(link) => link,
            Err(e) => {
                debug!("Connection attempt abandoned ({}), releasing link", e);
                peripheral.disconnect().await.ok();
                return Err(e);
            }
        };

        Ok(Self {
            adapter,
            peripheral,
            name: link.name,
            address: link.address,
            profile,
            has_service: link.has_service,
            characteristics_cache: RwLock::new(link.characteristics),
            notification_handles: tokio::sync::Mutex::new(Vec::new()),
            disconnected: AtomicBool::new(false),
            config,
        })
    }

    /// Check if the device is connected (queries BLE stack state).
    pub async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    /// Disconnect from the device, aborting notification forwarding first.
    #[tracing::instrument(level = "info", skip(self), fields(device_name = ?self.name))]
    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from device...");
        self.disconnected.store(true, Ordering::SeqCst);

        {
            let mut handles = self.notification_handles.lock().await;
            for handle in handles.drain(..) {
                handle.abort();
            }
        }

        self.peripheral.disconnect().await?;
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the device address or identifier.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether service discovery found the custom service.
    pub fn has_service(&self) -> bool {
        self.has_service
    }

    async fn find_characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        let cache = self.characteristics_cache.read().await;
        cache.get(&uuid).cloned().ok_or_else(|| {
            Error::characteristic_not_found(uuid.to_string(), self.peripheral.services().len())
        })
    }

    /// Write raw bytes to a characteristic.
    ///
    /// Bounded by [`ConnectionConfig::write_timeout`]. Failures are not retried.
    pub async fn write_characteristic(
        &self,
        uuid: Uuid,
        data: &[u8],
        mode: WriteMode,
    ) -> Result<()> {
        let characteristic = self.find_characteristic(uuid).await?;
        timeout(
            self.config.write_timeout,
            self.peripheral.write(&characteristic, data, write_type(mode)),
        )
        .await
        .map_err(|_| Error::timeout(format!("write characteristic {}", uuid), self.config.write_timeout))?
        .map_err(|e| Error::write_failed(uuid.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Serialize a command and write it to the command characteristic.
    ///
    /// Returns the exact bytes written.
    #[tracing::instrument(level = "debug", skip(self), fields(method = %command.method))]
    pub async fn send_command(&self, command: &Command, mode: WriteMode) -> Result<Vec<u8>> {
        let payload = command.to_bytes()?;
        self.write_characteristic(self.profile.write, &payload, mode)
            .await?;
        Ok(payload)
    }

    /// Subscribe to notifications on the status characteristic.
    ///
    /// The callback runs on a single forwarding task, once per notification,
    /// in the order the BLE stack delivers them. The task is aborted when
    /// `disconnect()` is called.
    pub async fn subscribe_to_notifications<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let characteristic = self.find_characteristic(self.profile.notify).await?;

        self.peripheral.subscribe(&characteristic).await?;

        let mut stream = self.peripheral.notifications().await?;
        let char_uuid = characteristic.uuid;

        let handle = tokio::spawn(async move {
            use futures::StreamExt;
            while let Some(notification) = stream.next().await {
                if notification.uuid == char_uuid {
                    callback(&notification.value);
                }
            }
        });

        self.notification_handles.lock().await.push(handle);

        Ok(())
    }

    /// Unsubscribe from the status characteristic.
    pub async fn unsubscribe_from_notifications(&self) -> Result<()> {
        let characteristic = self.find_characteristic(self.profile.notify).await?;
        self.peripheral.unsubscribe(&characteristic).await?;
        Ok(())
    }
}

/// What a successful connection attempt learned about the peripheral.
struct Link {
    name: Option<String>,
    address: String,
    has_service: bool,
    characteristics: HashMap<Uuid, Characteristic>,
}

/// Connect, verify the link and discover services.
///
/// Leaves the peripheral connected on error; the caller disconnects.
async fn establish(
    peripheral: &Peripheral,
    profile: &GattProfile,
    config: &ConnectionConfig,
) -> Result<Link> {
    let device_id = format_peripheral_id(&peripheral.id());

    info!("Connecting to device...");
    timeout(config.connection_timeout, peripheral.connect())
        .await
        .map_err(|_| {
            Error::connection_failed(Some(device_id.clone()), ConnectionFailureReason::Timeout)
        })?
        .map_err(|e| {
            Error::connection_failed(
                Some(device_id.clone()),
                ConnectionFailureReason::BleError(e.to_string()),
            )
        })?;

    if !peripheral.is_connected().await.unwrap_or(false) {
        return Err(Error::connection_failed(
            Some(device_id),
            ConnectionFailureReason::NotActive,
        ));
    }
    info!("Connected!");

    debug!("Discovering services...");
    timeout(config.discovery_timeout, peripheral.discover_services())
        .await
        .map_err(|_| Error::timeout("discover services", config.discovery_timeout))??;

    let services = peripheral.services();
    debug!("Found {} services", services.len());

    let has_service = services.iter().any(|s| s.uuid == profile.service);
    if !has_service {
        warn!(
            "Custom service {} not found, continuing anyway",
            profile.service
        );
    }

    let mut characteristics = HashMap::new();
    for service in &services {
        debug!("  Service: {}", service.uuid);
        for char in &service.characteristics {
            debug!("    Characteristic: {} {:?}", char.uuid, char.properties);
            characteristics.insert(char.uuid, char.clone());
        }
    }

    let properties = peripheral.properties().await?;
    let name = properties.as_ref().and_then(|p| p.local_name.clone());
    let address = properties
        .as_ref()
        .map(|p| create_identifier(&p.address.to_string(), &peripheral.id()))
        .unwrap_or(device_id);

    Ok(Link {
        name,
        address,
        has_service,
        characteristics,
    })
}

impl Drop for Device {
    fn drop(&mut self) {
        if !self.disconnected.load(Ordering::SeqCst) {
            self.disconnected.store(true, Ordering::SeqCst);

            warn!(
                device_name = ?self.name,
                device_address = %self.address,
                "Device dropped without calling disconnect() - performing best-effort cleanup"
            );

            if let Ok(mut handles) = self.notification_handles.try_lock() {
                for handle in handles.drain(..) {
                    handle.abort();
                }
            }

            let peripheral = self.peripheral.clone();
            let address = self.address.clone();

            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = peripheral.disconnect().await {
                        debug!(
                            device_address = %address,
                            error = %e,
                            "Best-effort disconnect failed (device may already be disconnected)"
                        );
                    }
                });
            }
        }
    }
}

#[async_trait]
impl GrowController for Device {
    async fn is_connected(&self) -> bool {
        Device::is_connected(self).await
    }

    async fn disconnect(&self) -> Result<()> {
        Device::disconnect(self).await
    }

    fn name(&self) -> Option<&str> {
        Device::name(self)
    }

    fn address(&self) -> &str {
        Device::address(self)
    }

    async fn subscribe(&self, handler: NotificationHandler) -> Result<()> {
        self.subscribe_to_notifications(move |data| handler(data))
            .await
    }

    async fn unsubscribe(&self) -> Result<()> {
        self.unsubscribe_from_notifications().await
    }

    async fn send(&self, command: &Command, mode: WriteMode) -> Result<Vec<u8>> {
        self.send_command(command, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.connection_timeout, Duration::from_secs(20));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.discovery_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::new()
            .connection_timeout(Duration::from_secs(5))
            .write_timeout(Duration::from_secs(2))
            .scan(ScanOptions::default().attempts(1));
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(2));
        assert_eq!(config.scan.attempts, 1);
    }

    #[test]
    fn test_write_mode_maps_to_write_type() {
        assert!(matches!(
            write_type(WriteMode::WithResponse),
            WriteType::WithResponse
        ));
        assert!(matches!(
            write_type(WriteMode::WithoutResponse),
            WriteType::WithoutResponse
        ));
    }
}
