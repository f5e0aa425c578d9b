//! Utility functions for ggs-core.

use btleplug::platform::PeripheralId;

/// Address reported by CoreBluetooth, which hides real MAC addresses.
const HIDDEN_ADDRESS: &str = "00:00:00:00:00:00";

/// Format a peripheral ID as a string.
///
/// On macOS, peripheral IDs are UUIDs. On other platforms they wrap the
/// MAC address.
pub fn format_peripheral_id(id: &PeripheralId) -> String {
    format!("{:?}", id)
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

/// Create an identifier string from an address and peripheral ID.
///
/// On macOS where addresses are 00:00:00:00:00:00, uses the peripheral ID.
/// On other platforms, uses the Bluetooth address.
pub fn create_identifier(address: &str, peripheral_id: &PeripheralId) -> String {
    if is_hidden_address(address) {
        format_peripheral_id(peripheral_id)
    } else {
        address.to_string()
    }
}

/// Whether an address is the all-zero placeholder.
pub fn is_hidden_address(address: &str) -> bool {
    address == HIDDEN_ADDRESS
}

/// Compare two addresses ignoring case and `:` separators.
pub fn addresses_match(a: &str, b: &str) -> bool {
    let normalize = |s: &str| s.replace([':', '-'], "").to_lowercase();
    normalize(a) == normalize(b)
}
