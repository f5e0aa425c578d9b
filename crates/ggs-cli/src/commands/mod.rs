//! Command implementations for the CLI.

mod config;
mod console;
mod control;
mod listen;
mod scan;

pub use config::cmd_config;
pub use console::cmd_console;
pub use control::{ControlArgs, cmd_control};
pub use listen::cmd_listen;
pub use scan::cmd_scan;
