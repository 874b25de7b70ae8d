//! Configuration file handling for agent-recorder.
//!
//! Loads configuration from `~/.config/agent-recorder/config.toml` or a
//! custom path. Every value is optional; CLI arguments override the config
//! file, the config file overrides built-in defaults.

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration file structure for agent-recorder.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecordingConfig {
    pub title: Option<String>,
    pub cols: Option<u16>,
    pub rows: Option<u16>,
    pub idle_limit: Option<f64>,
    /// Directory where wrap-mode recordings and proxy logs land
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ShellConfig {
    pub command: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProxyConfig {
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration from the default path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        if path.exists() {
            Self::load_from_explicit(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from_explicit(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError { path, source: e })?;
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("agent-recorder")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [recording]
            title = "Nightly Run"
            cols = 120
            rows = 40
            idle_limit = 1.5

            [shell]
            command = "/bin/zsh"

            [proxy]
            port = 9090
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.recording.title.as_deref(), Some("Nightly Run"));
        assert_eq!(config.recording.cols, Some(120));
        assert_eq!(config.recording.idle_limit, Some(1.5));
        assert_eq!(config.shell.command.as_deref(), Some("/bin/zsh"));
        assert_eq!(config.proxy.port, Some(9090));
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.recording.title.is_none());
        assert!(config.shell.command.is_none());
        assert!(config.proxy.port.is_none());
    }

    #[test]
    fn test_partial_section() {
        let config: Config = toml::from_str("[recording]\ncols = 100\n").unwrap();
        assert_eq!(config.recording.cols, Some(100));
        assert!(config.recording.rows.is_none());
    }

    #[test]
    fn test_load_from_explicit_missing_file_errors() {
        let result = Config::load_from_explicit(PathBuf::from("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_load_from_explicit_invalid_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not [valid toml").unwrap();
        let result = Config::load_from_explicit(file.path().to_path_buf());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
