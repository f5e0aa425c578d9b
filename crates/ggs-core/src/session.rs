//! Subscribed session over a connected controller.
//!
//! A [`Session`] owns a connected [`GrowController`] with an active status
//! subscription. [`Session::run`] drives a body future against a
//! [`CancellationToken`] and always unsubscribes and disconnects afterwards,
//! whether the body finished, failed, or was interrupted.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::{GrowController, NotificationHandler};

/// A connected, subscribed controller.
///
/// # Example
///
/// ```ignore
/// use ggs_core::{Device, Session};
/// use ggs_types::{Command, WriteMode};
/// use tokio_util::sync::CancellationToken;
///
/// async fn status_once() -> ggs_core::Result<()> {
///     let device = Device::connect("90:E5:B1:B7:86:E6").await?;
///     let session = Session::open(device, Box::new(|data: &[u8]| println!("{data:?}"))).await?;
///     session
///         .run(&CancellationToken::new(), |device| async move {
///             device.send(&Command::get_status(), WriteMode::WithResponse).await?;
///             Ok(())
///         })
///         .await
/// }
/// ```
pub struct Session<D: GrowController> {
    device: Arc<D>,
}

impl<D: GrowController> Session<D> {
    /// Subscribe `handler` to status notifications on `device`.
    ///
    /// If the subscription cannot be established the device is disconnected
    /// before the error is returned.
    pub async fn open(device: D, handler: NotificationHandler) -> Result<Self> {
        if let Err(e) = device.subscribe(handler).await {
            warn!("Failed to subscribe to notifications: {}", e);
            if let Err(de) = device.disconnect().await {
                debug!("Disconnect after failed subscribe: {}", de);
            }
            return Err(e);
        }
        debug!("Subscribed to notifications on {}", device.address());
        Ok(Self {
            device: Arc::new(device),
        })
    }

    /// The underlying controller.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Run `body`, then close the session.
    ///
    /// Returns [`Error::Cancelled`] if `cancel` fires before the body
    /// completes. Cleanup runs in every case.
    pub async fn run<F, Fut, T>(self, cancel: &CancellationToken, body: F) -> Result<T>
    where
        F: FnOnce(Arc<D>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Interrupted, closing session");
                Err(Error::Cancelled)
            }
            result = body(Arc::clone(&self.device)) => result,
        };

        self.close().await;
        outcome
    }

    /// Unsubscribe and disconnect.
    ///
    /// Both steps are attempted even if one fails; failures are logged.
    pub async fn close(self) {
        if let Err(e) = self.device.unsubscribe().await {
            debug!("Unsubscribe during close failed: {}", e);
        }
        if let Err(e) = self.device.disconnect().await {
            warn!("Disconnect during close failed: {}", e);
        }
        debug!("Session closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use ggs_types::{Command, WriteMode};

    use super::*;
    use crate::mock::{MockDevice, MockDeviceBuilder};

    fn silent() -> NotificationHandler {
        Box::new(|_: &[u8]| {})
    }

    #[tokio::test]
    async fn test_open_subscribes() {
        let session = Session::open(MockDeviceBuilder::new().build(), silent())
            .await
            .unwrap();
        assert!(session.device().is_subscribed());
        session.close().await;
    }

    #[tokio::test]
    async fn test_open_fails_when_disconnected() {
        let device = MockDevice::new("SF-GGS-CB");
        let result = Session::open(device, silent()).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_run_cleans_up_after_success() {
        let session = Session::open(MockDeviceBuilder::new().build(), silent())
            .await
            .unwrap();
        let device = Arc::clone(session.device());

        let written = session
            .run(&CancellationToken::new(), |d| async move {
                d.send(&Command::get_status(), WriteMode::WithResponse).await
            })
            .await
            .unwrap();

        assert_eq!(written, br#"{"method":"getDevSta"}"#.to_vec());
        assert_eq!(device.unsubscribe_count(), 1);
        assert_eq!(device.disconnect_count(), 1);
        assert!(!device.is_connected_sync());
    }

    #[tokio::test]
    async fn test_run_cleans_up_after_failure() {
        let mock = MockDeviceBuilder::new().build();
        mock.set_should_fail(true, Some("gatt error")).await;
        let session = Session::open(mock, silent()).await.unwrap();
        let device = Arc::clone(session.device());

        let result = session
            .run(&CancellationToken::new(), |d| async move {
                d.send(&Command::light_off(), WriteMode::WithResponse).await
            })
            .await;

        assert!(matches!(result, Err(Error::WriteFailed { .. })));
        assert_eq!(device.unsubscribe_count(), 1);
        assert_eq!(device.disconnect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cancelled_mid_body() {
        let session = Session::open(MockDeviceBuilder::new().build(), silent())
            .await
            .unwrap();
        let device = Arc::clone(session.device());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result: Result<()> = session
            .run(&cancel, |_| async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(device.disconnect_count(), 1);
        assert!(!device.is_connected_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cancelled_during_write() {
        let mock = MockDeviceBuilder::new().build();
        mock.set_write_latency(Duration::from_secs(5));
        let session = Session::open(mock, silent()).await.unwrap();
        let device = Arc::clone(session.device());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = session
            .run(&cancel, |d| async move {
                d.send(&Command::set_light(true, Some(50)), WriteMode::WithResponse)
                    .await
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(device.unsubscribe_count(), 1);
        assert_eq!(device.disconnect_count(), 1);
        assert!(device.writes().is_empty());
    }

    #[tokio::test]
    async fn test_notifications_reach_handler_during_run() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mock = MockDeviceBuilder::new()
            .status_reply(br#"{"fan":{"on":1}}"#)
            .build();
        let session = Session::open(
            mock,
            Box::new(move |data: &[u8]| sink.lock().unwrap().push(data.to_vec())),
        )
        .await
        .unwrap();

        session
            .run(&CancellationToken::new(), |d| async move {
                d.send(&Command::get_status(), WriteMode::WithResponse).await?;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), [br#"{"fan":{"on":1}}"#.to_vec()]);
    }
}
