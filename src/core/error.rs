//! Per-invocation failures that are reported back to the caller as text.

use std::error::Error as StdError;
use std::fmt;

use crate::core::config::data::API_KEY_ENV;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A required tool argument was absent or empty.
    MissingArgument(&'static str),
    /// The backend API key is not configured.
    MissingApiKey,
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::MissingArgument(field) => write!(f, "Error: '{field}' is required"),
            BridgeError::MissingApiKey => write!(
                f,
                "Error: {API_KEY_ENV} environment variable not set. Please configure it in your MCP settings."
            ),
        }
    }
}

impl StdError for BridgeError {}
