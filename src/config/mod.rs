//! Configuration module for botdiags.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of
//! priority):
//!
//! 1. `BOTDIAGS_CONFIG` environment variable (explicit path)
//! 2. `./botdiags.toml` (current directory)
//! 3. `~/.config/botdiags/botdiags.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\botdiags\botdiags.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `BOTDIAGS_MODE`, `BOTDIAGS_PORT`, `BOTDIAGS_BAUD`, `BOTDIAGS_TIMEOUT_MS`
//! - `BOTDIAGS_UUT`, `BOTDIAGS_OUT`
//! - `BOTDIAGS_LOG`
//!
//! The DUT password is never read from config files; the CLI takes it from
//! `DIAG_PASS`.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, LoggingSection, RunnerSection};
