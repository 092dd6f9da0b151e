use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const API_KEY_ENV: &str = "TABTABTAB_API_KEY";
pub const SERVER_URL_ENV: &str = "TABTABTAB_SERVER_URL";

/// On-disk configuration. Every key is optional; environment variables and
/// command-line flags take precedence over what is stored here.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub server_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Process-wide settings, resolved once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl BridgeConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
