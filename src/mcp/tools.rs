//! The `edit_google_sheet` tool: descriptor, argument validation and dispatch.

use std::fmt;
use std::sync::Arc;

use rust_mcp_schema::{ListToolsResult, Tool, ToolInputSchema};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::core::edit_stream::{EditBackend, ToolInvocation};
use crate::core::error::BridgeError;
use crate::core::response_format::format_result;

pub const EDIT_SHEET_TOOL: &str = "edit_google_sheet";

const EDIT_SHEET_DESCRIPTION: &str = "Edit a Google Sheet using an AI agent. The agent can read, \
write, search, and manipulate Google Sheets data. Supports conversation history for follow-up \
edits. Returns streaming progress updates and final results.";

pub const ARG_PROMPT: &str = "prompt";
pub const ARG_ACCESS_TOKEN: &str = "google_access_token";
pub const ARG_SPREADSHEET_ID: &str = "spreadsheet_id";
pub const ARG_CONVERSATION_ID: &str = "conversation_id";

const PROMPT_DESCRIPTION: &str = "The instruction for editing the sheet (e.g., 'Add a new row with \
Name: John, Email: john@example.com')";
const ACCESS_TOKEN_DESCRIPTION: &str = "Google OAuth 2.0 access token with Google Sheets API access";
const SPREADSHEET_ID_DESCRIPTION: &str = "The Google Sheets spreadsheet ID (from the URL: \
docs.google.com/spreadsheets/d/{spreadsheet_id}/edit)";
const CONVERSATION_ID_DESCRIPTION: &str = "Optional: Conversation ID to continue an existing \
conversation with context from previous edits";

fn edit_sheet_input_schema() -> ToolInputSchema {
    let schema = json!({
        "type": "object",
        "properties": {
            ARG_PROMPT: {
                "type": "string",
                "description": PROMPT_DESCRIPTION
            },
            ARG_ACCESS_TOKEN: {
                "type": "string",
                "description": ACCESS_TOKEN_DESCRIPTION
            },
            ARG_SPREADSHEET_ID: {
                "type": "string",
                "description": SPREADSHEET_ID_DESCRIPTION
            },
            ARG_CONVERSATION_ID: {
                "type": "string",
                "description": CONVERSATION_ID_DESCRIPTION
            }
        },
        "required": [ARG_PROMPT, ARG_ACCESS_TOKEN, ARG_SPREADSHEET_ID]
    });

    serde_json::from_value(schema).unwrap_or_else(|err| {
        warn!(error = %err, "Falling back to an empty input schema");
        ToolInputSchema::new(Vec::new(), None, None)
    })
}

/// The static descriptor advertised by `tools/list`.
pub fn edit_sheet_tool() -> Tool {
    Tool {
        annotations: None,
        description: Some(EDIT_SHEET_DESCRIPTION.to_string()),
        execution: None,
        icons: Vec::new(),
        input_schema: edit_sheet_input_schema(),
        meta: None,
        name: EDIT_SHEET_TOOL.to_string(),
        output_schema: None,
        title: Some("Edit Google Sheet".to_string()),
    }
}

/// Raised to the protocol layer instead of being returned as tool text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCallError {
    UnknownTool(String),
}

impl fmt::Display for ToolCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolCallError::UnknownTool(name) => write!(f, "Unknown tool: {name}"),
        }
    }
}

impl std::error::Error for ToolCallError {}

/// Returns the argument as a non-empty string, treating anything else as absent.
fn string_argument<'a>(arguments: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    arguments?
        .get(key)?
        .as_str()
        .filter(|value| !value.is_empty())
}

fn required_argument(
    arguments: Option<&Map<String, Value>>,
    key: &'static str,
) -> Result<String, BridgeError> {
    string_argument(arguments, key)
        .map(str::to_string)
        .ok_or(BridgeError::MissingArgument(key))
}

/// Validates tool arguments in a fixed order, stopping at the first missing one.
pub fn invocation_from_arguments(
    arguments: Option<&Map<String, Value>>,
) -> Result<ToolInvocation, BridgeError> {
    let prompt = required_argument(arguments, ARG_PROMPT)?;
    let credential = required_argument(arguments, ARG_ACCESS_TOKEN)?;
    let resource_id = required_argument(arguments, ARG_SPREADSHEET_ID)?;
    let conversation_id = string_argument(arguments, ARG_CONVERSATION_ID).map(str::to_string);

    Ok(ToolInvocation {
        prompt,
        credential,
        resource_id,
        conversation_id,
    })
}

/// Binds the tool surface to an edit backend.
#[derive(Clone)]
pub struct ToolBridge {
    backend: Arc<dyn EditBackend>,
}

impl ToolBridge {
    pub fn new(backend: Arc<dyn EditBackend>) -> Self {
        Self { backend }
    }

    pub fn tools(&self) -> ListToolsResult {
        ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: vec![edit_sheet_tool()],
        }
    }

    /// Runs a tool call and returns the text shown to the caller.
    ///
    /// Validation and configuration problems come back as `Ok` text; only an
    /// unknown tool name is an `Err`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
    ) -> Result<String, ToolCallError> {
        if name != EDIT_SHEET_TOOL {
            warn!(tool = name, "Rejected call to unknown tool");
            return Err(ToolCallError::UnknownTool(name.to_string()));
        }

        let invocation = match invocation_from_arguments(arguments) {
            Ok(invocation) => invocation,
            Err(err) => {
                debug!(error = %err, "Tool arguments failed validation");
                return Ok(err.to_string());
            }
        };

        match self.backend.edit(&invocation).await {
            Ok(result) => Ok(format_result(&result)),
            Err(err) => {
                warn!(error = %err, "Edit request not sent");
                Ok(err.to_string())
            }
        }
    }
}
