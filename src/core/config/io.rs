use crate::core::config::data::{
    non_empty, path_display, BridgeConfig, ConfigOverrides, FileConfig, API_KEY_ENV,
    SERVER_URL_ENV,
};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A timeout of zero seconds was requested.
    ZeroTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::ZeroTimeout => write!(f, "Request timeout must be at least one second"),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::ZeroTimeout => None,
        }
    }
}

impl FileConfig {
    /// Loads the file at `config_path`, or an empty configuration when it does not exist.
    pub fn load_from_path(config_path: &Path) -> Result<FileConfig, ConfigError> {
        if !config_path.exists() {
            return Ok(FileConfig::default());
        }

        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Default location, e.g. `~/.config/sheetbridge/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tabtabtab", "sheetbridge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

impl BridgeConfig {
    /// Loads configuration from the optional file, the process environment and
    /// command-line overrides, in increasing order of precedence.
    pub fn load(
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<BridgeConfig, ConfigError> {
        let file = match config_path
            .map(Path::to_path_buf)
            .or_else(FileConfig::default_path)
        {
            Some(path) => FileConfig::load_from_path(&path)?,
            None => FileConfig::default(),
        };

        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<BridgeConfig, ConfigError> {
        let defaults = BridgeConfig::default();

        let api_key = non_empty(env(API_KEY_ENV)).or_else(|| non_empty(file.api_key));

        let base_url = non_empty(overrides.server_url.clone())
            .or_else(|| non_empty(env(SERVER_URL_ENV)))
            .or_else(|| non_empty(file.server_url))
            .unwrap_or(defaults.base_url);

        let request_timeout = match overrides.timeout_secs.or(file.request_timeout_secs) {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => defaults.request_timeout,
        };

        Ok(BridgeConfig {
            api_key,
            base_url,
            request_timeout,
        })
    }
}
