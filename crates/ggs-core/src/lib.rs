//! Core BLE library for Spider Farmer GGS grow-light controllers.
//!
//! This crate handles discovery, connection and the command/status exchange
//! with a GGS controller over Bluetooth Low Energy. Command payloads and
//! notification decoding live in [`ggs_types`].
//!
//! # Features
//!
//! - **Device discovery**: scan, match by name hint, fall back to the strongest signal
//! - **Commands**: compact JSON writes with or without response
//! - **Status notifications**: ordered delivery to a callback
//! - **Sessions**: guaranteed unsubscribe and disconnect, even on interrupt
//! - **Testing**: [`MockDevice`] implements [`GrowController`] without hardware
//!
//! # Quick Start
//!
//! ```no_run
//! use ggs_core::{Device, LocatorConfig, Session, scan};
//! use ggs_types::{Command, WriteMode, payload};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = scan::get_adapter().await?;
//!     let located = scan::locate(&adapter, None, &LocatorConfig::default()).await?;
//!
//!     let device = Device::connect_with_adapter(
//!         adapter,
//!         &located.identifier,
//!         Default::default(),
//!         Default::default(),
//!     )
//!     .await?;
//!
//!     let session = Session::open(
//!         device,
//!         Box::new(|data: &[u8]| println!("{}", payload::decode(data))),
//!     )
//!     .await?;
//!
//!     session
//!         .run(&CancellationToken::new(), |device| async move {
//!             device.send_command(&Command::get_status(), WriteMode::WithResponse).await?;
//!             tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//!             Ok(())
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod mock;
pub mod scan;
pub mod session;
pub mod traits;
pub mod util;

pub use ggs_types::uuid;

// Core exports
pub use device::{ConnectionConfig, Device};
pub use error::{ConnectionFailureReason, DeviceNotFoundReason, Error, Result};
pub use mock::{MockDevice, MockDeviceBuilder};
pub use scan::{DiscoveredDevice, Located, LocatorConfig, NameMatch, ScanOptions, Selection};
pub use session::Session;
pub use traits::{GrowController, NotificationHandler};
pub use util::{addresses_match, create_identifier, format_peripheral_id};
