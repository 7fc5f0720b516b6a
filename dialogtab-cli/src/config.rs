use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

fn default_pull_on_start() -> bool {
    true
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Server URL (e.g., "http://localhost:3000")
    pub server_url: Option<String>,
    /// Pull from the server once before each command (default: true)
    #[serde(default = "default_pull_on_start")]
    pub pull_on_start: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            pull_on_start: true,
        }
    }
}

impl SyncConfig {
    /// Returns true if a server URL is set
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some()
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory for local table storage
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Sync configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Same as `load`, reading environment variables through `env`.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        // Apply environment variable overrides
        if let Some(dir) = env("DIALOGTAB_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(url) = env("DIALOGTAB_SERVER_URL") {
            sync.server_url = Some(url);
        }

        Ok(Self {
            data_dir,
            config_file,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/dialogtab/
    /// - macOS: ~/Library/Application Support/dialogtab/
    /// - Windows: %APPDATA%/dialogtab/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dialogtab")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/dialogtab/
    /// - macOS: ~/Library/Application Support/dialogtab/
    /// - Windows: %APPDATA%/dialogtab/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dialogtab")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
