//! botdiags library
//!
//! Hardware diagnostics test harness: drives a device-under-test over a
//! pluggable transport, runs a fixed smoke-test sequence with range
//! validation, and records every step to a durable, replayable report.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `error`: Transport-level error handling
//! - `checkers`: Numeric range validation for sensor readings
//! - `device`: Simulated DUT for hardware-free runs
//! - `transport`: Unified transport facade and protocol backends
//! - `report`: Append-only run report with live log and JSON/CSV export
//! - `runner`: Fixed smoke-test sequence
//! - `shell`: Command-execution surface for an interactive shell

pub mod checkers;
pub mod config;
pub mod device;
pub mod error;
pub mod report;
pub mod runner;
pub mod shell;
pub mod transport;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use device::SimulatedDevice;
pub use error::{TransportError, TransportResult};
pub use report::{ReportRecord, TestReport};
pub use runner::{run_smoke_tests, SmokeOutcome};
pub use shell::DiagShell;
pub use transport::{Response, Status, Transport, TransportConfig, TransportMode};
