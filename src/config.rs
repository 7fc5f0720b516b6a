use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Port used when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Optional YAML config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    port: Option<u16>,
    data_file: Option<PathBuf>,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// JSON file holding the table collection
    pub data_file: PathBuf,
    /// Config file that was read, if any
    pub config_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration with priority: env vars > config file > defaults
    ///
    /// Environment variables:
    /// - `DIALOGTAB_PORT`: port to listen on (default: 3000)
    /// - `DIALOGTAB_DATA_FILE`: data file (default: <data dir>/dialogtab-server/tables.json)
    /// - `DIALOGTAB_CONFIG`: config file (default: <config dir>/dialogtab-server/config.yaml)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as `load`, reading variables through `env`.
    pub fn load_with<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut port = DEFAULT_PORT;
        let mut data_file = Self::default_data_file();
        let mut config_file = None;

        let path = env("DIALOGTAB_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let file = Self::read_file(&path)?;
            if let Some(p) = file.port {
                port = p;
            }
            if let Some(f) = file.data_file {
                // Relative paths are relative to the config file
                data_file = if f.is_relative() {
                    path.parent().map(|p| p.join(&f)).unwrap_or(f)
                } else {
                    f
                };
            }
            config_file = Some(path);
        }

        if let Some(value) = env("DIALOGTAB_PORT") {
            match value.parse() {
                Ok(p) => port = p,
                Err(_) => tracing::warn!("Ignoring invalid DIALOGTAB_PORT: {}", value),
            }
        }
        if let Some(value) = env("DIALOGTAB_DATA_FILE") {
            data_file = PathBuf::from(value);
        }

        Ok(Self {
            port,
            data_file,
            config_file,
        })
    }

    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    pub fn default_data_file() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dialogtab-server")
            .join("tables.json")
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dialogtab-server")
            .join("config.yaml")
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

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn env_from(vars: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("nonexistent.yaml");

        let config = ServerConfig::load_with(env_from(&[(
            "DIALOGTAB_CONFIG",
            missing.display().to_string(),
        )]))
        .unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.data_file.ends_with("tables.json"));
        assert_eq!(config.config_file, None);
    }

    #[test]
    fn test_load_from_file_resolves_relative_data_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "port: 4000").unwrap();
        writeln!(file, "data_file: data/tables.json").unwrap();

        let config = ServerConfig::load_with(env_from(&[(
            "DIALOGTAB_CONFIG",
            config_path.display().to_string(),
        )]))
        .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.data_file, temp_dir.path().join("data/tables.json"));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "port: 4000").unwrap();

        let config = ServerConfig::load_with(env_from(&[
            ("DIALOGTAB_CONFIG", config_path.display().to_string()),
            ("DIALOGTAB_PORT", "5000".to_string()),
            ("DIALOGTAB_DATA_FILE", "/srv/tables.json".to_string()),
        ]))
        .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.data_file, PathBuf::from("/srv/tables.json"));
    }

    #[test]
    fn test_invalid_port_env_is_ignored() {
        let temp_dir = tempdir().unwrap();
        let config = ServerConfig::load_with(env_from(&[
            (
                "DIALOGTAB_CONFIG",
                temp_dir.path().join("none.yaml").display().to_string(),
            ),
            ("DIALOGTAB_PORT", "not-a-port".to_string()),
        ]))
        .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = ServerConfig::load_with(env_from(&[(
            "DIALOGTAB_CONFIG",
            config_path.display().to_string(),
        )]));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
