//! Platform-agnostic types for Spider Farmer GGS grow-light controllers.
//!
//! This crate holds everything that does not need a Bluetooth stack:
//!
//! - UUID constants for the controller's GATT service and characteristics
//! - The JSON command model written to the controller
//! - Decoding of status notifications
//! - The console command grammar
//!
//! # Example
//!
//! ```
//! use ggs_types::{Command, payload};
//!
//! let cmd = Command::set_fan(5);
//! assert_eq!(cmd.to_json().unwrap(), r#"{"method":"setFan","data":{"on":1,"level":5}}"#);
//!
//! let status = payload::decode(br#"{"on":1}"#);
//! assert!(status.is_json());
//! ```

pub mod command;
pub mod error;
pub mod input;
pub mod payload;
pub mod uuid;

pub use command::{Command, CommandData, Method, WriteMode};
pub use error::{ParseError, ParseResult};
pub use input::{CONSOLE_HELP, ConsoleInput};
pub use payload::Payload;
pub use crate::uuid::GattProfile;

/// Advertised name of the controller, used as the default scan hint.
pub const DEFAULT_NAME_HINT: &str = "SF-GGS-CB";
