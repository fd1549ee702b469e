//! Automation server orchestration.
//!
//! Starts the automation server on a negotiated port, detects readiness from
//! its log output, waits for devices to boot, and wraps the external
//! remote-control client in a bounded retry loop.

mod config;
mod error;
mod orchestrator;
mod ports;
mod readiness;
mod session;

pub use config::AutomationConfig;
pub use error::AutomationError;
pub use orchestrator::{AppScript, AutomationOrchestrator};
pub use ports::{PortPolicy, find_available_port, is_port_available, negotiate_port, port_in_use};
pub use readiness::{READINESS_MARKER, is_ready_line};
pub use session::{connect_with_retry, is_connection_error};
