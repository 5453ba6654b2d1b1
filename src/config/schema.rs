//! Configuration schema definitions.
//!
//! Structure of the configuration file, with serde defaults on every
//! section so a partial (or absent) file still yields a usable config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::transport::TransportConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transport/connection defaults for the `[transport]` section.
    pub transport: TransportConfig,
    /// Smoke-runner defaults.
    pub runner: RunnerSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Smoke-runner configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Default UUT identifier when none is given on the command line.
    pub uut_id: String,
    /// Root directory for per-run artifact trees.
    pub out_root: PathBuf,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            uut_id: "UUT-001".to_string(),
            out_root: PathBuf::from("./results"),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level filter: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportMode;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.transport.mode, TransportMode::Simulated);
        assert_eq!(config.transport.baud, 115_200);
        assert_eq!(config.runner.uut_id, "UUT-001");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            [transport]
            mode = "prompt_serial"
            port = "/dev/ttyUSB0"

            [runner]
            uut_id = "UUT-042"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.transport.mode, TransportMode::PromptSerial);
        assert_eq!(config.transport.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.transport.timeout_ms, 3_000);
        assert_eq!(config.runner.uut_id, "UUT-042");
        assert_eq!(config.runner.out_root, PathBuf::from("./results"));
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.transport.prompt, crate::transport::DEFAULT_PROMPT);
    }
}
