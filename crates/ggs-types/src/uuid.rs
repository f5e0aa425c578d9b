//! Bluetooth UUIDs for GGS controllers.
//!
//! The controller exposes a single vendor service (`0x00FF`) with one
//! notify characteristic (`0xFF01`) and one write characteristic (`0xFF02`).

use uuid::{Uuid, uuid};

// --- GGS Service UUIDs ---

/// Vendor-specific custom service. Only checked advisorily after connecting.
pub const GGS_SERVICE: Uuid = uuid!("000000ff-0000-1000-8000-00805f9b34fb");

// --- GGS Characteristic UUIDs ---

/// Status notifications (device -> client).
pub const STATUS_NOTIFY: Uuid = uuid!("0000ff01-0000-1000-8000-00805f9b34fb");

/// JSON command input (client -> device).
pub const COMMAND_WRITE: Uuid = uuid!("0000ff02-0000-1000-8000-00805f9b34fb");

/// Set of GATT identifiers used to talk to a controller.
///
/// Defaults to the UUIDs above. Passed explicitly to the device layer so that
/// firmware variants with different characteristics can be targeted without
/// touching the constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattProfile {
    /// Service expected to contain the two characteristics.
    pub service: Uuid,
    /// Characteristic that pushes status notifications.
    pub notify: Uuid,
    /// Characteristic that accepts JSON commands.
    pub write: Uuid,
}

impl Default for GattProfile {
    fn default() -> Self {
        Self {
            service: GGS_SERVICE,
            notify: STATUS_NOTIFY,
            write: COMMAND_WRITE,
        }
    }
}
