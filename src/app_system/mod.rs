//! System wiring, configuration, startup, and shutdown logic.

pub mod config;
pub mod console_system;
pub mod telemetry;

pub use config::*;
pub use console_system::*;
pub use telemetry::*;
