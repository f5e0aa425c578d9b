//! Mock controller for testing.
//!
//! [`MockDevice`] implements [`GrowController`] without any BLE hardware. It
//! records every payload written to it, lets tests push notifications into
//! the active subscription, and can answer status requests with a canned
//! notification the way the real controller does.
//!
//! # Features
//!
//! - **Write capture**: inspect the exact bytes and write modes sent
//! - **Notification injection**: drive the subscriber with arbitrary payloads
//! - **Failure injection**: fail writes permanently or for the next N calls
//! - **Latency simulation**: delay writes to exercise cancellation

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ggs_types::uuid::COMMAND_WRITE;
use ggs_types::{Command, Method, WriteMode};

use crate::error::{Error, Result};
use crate::traits::{GrowController, NotificationHandler};

/// A mock GGS controller.
///
/// # Example
///
/// ```
/// use ggs_core::{GrowController, MockDevice};
/// use ggs_types::{Command, WriteMode};
///
/// #[tokio::main]
/// async fn main() {
///     let device = MockDevice::new("SF-GGS-CB");
///     device.connect().await.unwrap();
///     device.send(&Command::set_fan(5), WriteMode::WithResponse).await.unwrap();
///     assert_eq!(device.written_json(), [r#"{"method":"setFan","data":{"on":1,"level":5}}"#]);
/// }
/// ```
pub struct MockDevice {
    name: String,
    address: String,
    connected: AtomicBool,
    handler: Mutex<Option<NotificationHandler>>,
    writes: Mutex<Vec<(Vec<u8>, WriteMode)>>,
    status_reply: Mutex<Option<Vec<u8>>>,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    /// Simulated write latency in milliseconds (0 = no delay).
    write_latency_ms: AtomicU64,
    /// Number of writes to fail before succeeding.
    remaining_failures: AtomicU32,
    unsubscribe_count: AtomicU32,
    disconnect_count: AtomicU32,
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockDevice {
    /// Create a new, disconnected mock device.
    pub fn new(name: &str) -> Self {
        MockDeviceBuilder::new()
            .name(name)
            .auto_connect(false)
            .build()
    }

    /// Connect to the mock device.
    pub async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Check if connected (sync method for internal use).
    pub fn is_connected_sync(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Whether a notification handler is installed.
    pub fn is_subscribed(&self) -> bool {
        self.handler.lock().map(|h| h.is_some()).unwrap_or(false)
    }

    /// Deliver a notification to the subscriber, if any.
    ///
    /// Returns `true` if a handler received it.
    pub fn notify(&self, data: &[u8]) -> bool {
        match self.handler.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(handler) => {
                    handler(data);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// All payloads written so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes
            .lock()
            .map(|w| w.iter().map(|(data, _)| data.clone()).collect())
            .unwrap_or_default()
    }

    /// Written payloads decoded as UTF-8.
    pub fn written_json(&self) -> Vec<String> {
        self.writes()
            .into_iter()
            .map(|data| String::from_utf8_lossy(&data).into_owned())
            .collect()
    }

    /// Write modes used, in order.
    pub fn write_modes(&self) -> Vec<WriteMode> {
        self.writes
            .lock()
            .map(|w| w.iter().map(|(_, mode)| *mode).collect())
            .unwrap_or_default()
    }

    /// Make every write fail (or stop failing).
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Fail the next `count` writes, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Set simulated write latency.
    pub fn set_write_latency(&self, latency: Duration) {
        self.write_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// How many times `unsubscribe` was called.
    pub fn unsubscribe_count(&self) -> u32 {
        self.unsubscribe_count.load(Ordering::Relaxed)
    }

    /// How many times `disconnect` was called.
    pub fn disconnect_count(&self) -> u32 {
        self.disconnect_count.load(Ordering::Relaxed)
    }

    fn check_connected(&self) -> Result<()> {
        if self.is_connected_sync() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    async fn check_should_fail(&self) -> Result<()> {
        if self.remaining_failures.load(Ordering::Relaxed) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::write_failed(
                COMMAND_WRITE.to_string(),
                "transient mock failure",
            ));
        }
        if self.should_fail.load(Ordering::Relaxed) {
            let message = self.fail_message.read().await.clone();
            return Err(Error::write_failed(COMMAND_WRITE.to_string(), message));
        }
        Ok(())
    }
}

#[async_trait]
impl GrowController for MockDevice {
    async fn is_connected(&self) -> bool {
        self.is_connected_sync()
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnect_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handler) = self.handler.lock() {
            handler.take();
        }
        self.connected.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn subscribe(&self, handler: NotificationHandler) -> Result<()> {
        self.check_connected()?;
        if let Ok(mut guard) = self.handler.lock() {
            *guard = Some(handler);
        }
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<()> {
        self.unsubscribe_count.fetch_add(1, Ordering::Relaxed);
        self.check_connected()?;
        if let Ok(mut guard) = self.handler.lock() {
            guard.take();
        }
        Ok(())
    }

    async fn send(&self, command: &Command, mode: WriteMode) -> Result<Vec<u8>> {
        self.check_connected()?;

        let latency = self.write_latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        self.check_should_fail().await?;

        let payload = command.to_bytes()?;
        if let Ok(mut writes) = self.writes.lock() {
            writes.push((payload.clone(), mode));
        }

        if command.method == Method::GetDevSta {
            let reply = self.status_reply.lock().ok().and_then(|r| r.clone());
            if let Some(reply) = reply {
                self.notify(&reply);
            }
        }

        Ok(payload)
    }
}

/// Builder for creating mock devices with custom settings.
#[derive(Debug, Clone)]
pub struct MockDeviceBuilder {
    name: String,
    address: String,
    auto_connect: bool,
    status_reply: Option<Vec<u8>>,
}

impl Default for MockDeviceBuilder {
    fn default() -> Self {
        Self {
            name: ggs_types::DEFAULT_NAME_HINT.to_string(),
            address: "90:E5:B1:00:00:01".to_string(),
            auto_connect: true,
            status_reply: None,
        }
    }
}

impl MockDeviceBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the device address.
    #[must_use]
    pub fn address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    /// Start connected (default) or disconnected.
    #[must_use]
    pub fn auto_connect(mut self, auto: bool) -> Self {
        self.auto_connect = auto;
        self
    }

    /// Notification pushed in answer to `getDevSta`.
    #[must_use]
    pub fn status_reply(mut self, reply: &[u8]) -> Self {
        self.status_reply = Some(reply.to_vec());
        self
    }

    /// Build the mock device.
    pub fn build(self) -> MockDevice {
        MockDevice {
            name: self.name,
            address: self.address,
            connected: AtomicBool::new(self.auto_connect),
            handler: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            status_reply: Mutex::new(self.status_reply),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            write_latency_ms: AtomicU64::new(0),
            remaining_failures: AtomicU32::new(0),
            unsubscribe_count: AtomicU32::new(0),
            disconnect_count: AtomicU32::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn collector() -> (Arc<Mutex<Vec<Vec<u8>>>>, NotificationHandler) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: NotificationHandler = Box::new(move |data: &[u8]| {
            sink.lock().unwrap().push(data.to_vec());
        });
        (seen, handler)
    }

    #[tokio::test]
    async fn test_mock_device_connect() {
        let device = MockDevice::new("Test");
        assert!(!device.is_connected_sync());

        device.connect().await.unwrap();
        assert!(device.is_connected_sync());

        GrowController::disconnect(&device).await.unwrap();
        assert!(!device.is_connected_sync());
        assert_eq!(device.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let device = MockDevice::new("Test");
        let result = device
            .send(&Command::get_status(), WriteMode::WithResponse)
            .await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert!(device.writes().is_empty());
    }

    #[tokio::test]
    async fn test_send_records_payload_and_mode() {
        let device = MockDeviceBuilder::new().build();
        let written = device
            .send(&Command::set_fan(5), WriteMode::WithoutResponse)
            .await
            .unwrap();

        assert_eq!(written, br#"{"method":"setFan","data":{"on":1,"level":5}}"#.to_vec());
        assert_eq!(device.writes(), vec![written]);
        assert_eq!(device.write_modes(), vec![WriteMode::WithoutResponse]);
    }

    #[tokio::test]
    async fn test_notifications_arrive_in_order() {
        let device = MockDeviceBuilder::new().build();
        let (seen, handler) = collector();
        device.subscribe(handler).await.unwrap();
        assert!(device.is_subscribed());

        assert!(device.notify(b"one"));
        assert!(device.notify(b"two"));
        assert!(device.notify(b"three"));

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let device = MockDeviceBuilder::new().build();
        let (seen, handler) = collector();
        device.subscribe(handler).await.unwrap();
        device.unsubscribe().await.unwrap();

        assert!(!device.notify(b"late"));
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(device.unsubscribe_count(), 1);
    }

    #[tokio::test]
    async fn test_status_reply() {
        let device = MockDeviceBuilder::new()
            .status_reply(br#"{"light":{"on":1}}"#)
            .build();
        let (seen, handler) = collector();
        device.subscribe(handler).await.unwrap();

        device
            .send(&Command::set_fan(1), WriteMode::WithResponse)
            .await
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());

        device
            .send(&Command::get_status(), WriteMode::WithResponse)
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_device_fail() {
        let device = MockDeviceBuilder::new().build();
        device.set_should_fail(true, Some("link lost")).await;

        let err = device
            .send(&Command::light_off(), WriteMode::WithResponse)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("link lost"));
        assert!(device.writes().is_empty());

        device.set_should_fail(false, None).await;
        assert!(device
            .send(&Command::light_off(), WriteMode::WithResponse)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_mock_device_transient_failures() {
        let device = MockDeviceBuilder::new().build();
        device.set_transient_failures(2);

        for _ in 0..2 {
            assert!(device
                .send(&Command::get_status(), WriteMode::WithResponse)
                .await
                .is_err());
        }
        assert!(device
            .send(&Command::get_status(), WriteMode::WithResponse)
            .await
            .is_ok());
        assert_eq!(device.writes().len(), 1);
    }

    #[test]
    fn test_builder_defaults() {
        let device = MockDeviceBuilder::new().build();
        assert!(device.is_connected_sync());
        assert_eq!(GrowController::name(&device), Some("SF-GGS-CB"));
        assert_eq!(GrowController::address(&device), "90:E5:B1:00:00:01");
    }

    #[test]
    fn test_builder_all_options() {
        let device = MockDeviceBuilder::new()
            .name("Tent 2")
            .address("AA:BB:CC:DD:EE:FF")
            .auto_connect(false)
            .build();
        assert!(!device.is_connected_sync());
        assert_eq!(GrowController::name(&device), Some("Tent 2"));
        assert_eq!(GrowController::address(&device), "AA:BB:CC:DD:EE:FF");
    }
}
