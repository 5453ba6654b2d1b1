//! Configuration loader with file resolution and environment override support.

use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;

/// Config file name
const CONFIG_FILE_NAME: &str = "botdiags.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "BOTDIAGS_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order, then apply
    /// environment overrides.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();
        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };
        apply_env_overrides(&mut config)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Env overrides still apply on top of defaults.
        let _ = apply_env_overrides(&mut config);
        Self {
            config_path: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    if let Some(config_dir) = get_config_dir() {
        let app_config = config_dir.join("botdiags").join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
    }
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Ok(mode) = std::env::var("BOTDIAGS_MODE") {
        config.transport.mode = mode
            .parse()
            .map_err(|e: String| ConfigError::env_parse("BOTDIAGS_MODE", e))?;
    }
    if let Ok(port) = std::env::var("BOTDIAGS_PORT") {
        config.transport.port = Some(port);
    }
    if let Ok(baud) = std::env::var("BOTDIAGS_BAUD") {
        config.transport.baud = baud
            .parse()
            .map_err(|e| ConfigError::env_parse("BOTDIAGS_BAUD", format!("{e}")))?;
    }
    if let Ok(timeout) = std::env::var("BOTDIAGS_TIMEOUT_MS") {
        config.transport.timeout_ms = timeout
            .parse()
            .map_err(|e| ConfigError::env_parse("BOTDIAGS_TIMEOUT_MS", format!("{e}")))?;
    }
    if let Ok(uut) = std::env::var("BOTDIAGS_UUT") {
        config.runner.uut_id = uut;
    }
    if let Ok(out) = std::env::var("BOTDIAGS_OUT") {
        config.runner.out_root = PathBuf::from(out);
    }
    if let Ok(level) = std::env::var("BOTDIAGS_LOG") {
        config.logging.level = level;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults_has_no_path() {
        let loader = ConfigLoader::with_defaults();
        assert!(loader.config_path.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[transport]\nmode = \"line_serial\"\nport = \"COM7\"\nbaud = 9600\n",
        )
        .unwrap();

        let loader = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loader.config().transport.port.as_deref(), Some("COM7"));
        assert_eq!(loader.config().transport.baud, 9600);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let result = ConfigLoader::load_from("/nonexistent/botdiags.toml");
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_from_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[transport\nmode=").unwrap();
        assert!(matches!(
            ConfigLoader::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
