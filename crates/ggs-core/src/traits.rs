//! Trait abstractions for controller operations.
//!
//! This module provides the [`GrowController`] trait that abstracts over
//! real Bluetooth devices and mock devices for testing.

use async_trait::async_trait;

use ggs_types::{Command, WriteMode};

use crate::error::Result;

/// Callback invoked with each raw notification payload.
pub type NotificationHandler = Box<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Trait abstracting controller operations.
///
/// # Example
///
/// ```ignore
/// use ggs_core::{GrowController, Result};
/// use ggs_types::{Command, WriteMode};
///
/// async fn request_status<D: GrowController>(device: &D) -> Result<()> {
///     device.send(&Command::get_status(), WriteMode::WithResponse).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait GrowController: Send + Sync {
    // --- Connection Management ---

    /// Check if the device is connected.
    async fn is_connected(&self) -> bool;

    /// Disconnect from the device.
    async fn disconnect(&self) -> Result<()>;

    // --- Device Identity ---

    /// Get the device name, if available.
    fn name(&self) -> Option<&str>;

    /// Get the device address or identifier.
    fn address(&self) -> &str;

    // --- Notifications ---

    /// Subscribe to status notifications.
    ///
    /// The handler is called sequentially, in delivery order.
    async fn subscribe(&self, handler: NotificationHandler) -> Result<()>;

    /// Stop status notifications.
    async fn unsubscribe(&self) -> Result<()>;

    // --- Commands ---

    /// Serialize `command` to compact JSON and write it once.
    ///
    /// Returns the bytes that were written.
    async fn send(&self, command: &Command, mode: WriteMode) -> Result<Vec<u8>>;
}
