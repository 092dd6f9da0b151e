//! JSON-RPC 2.0 framing for the stdio server.
//!
//! Requests are decoded leniently into a small envelope so that a malformed
//! message can still be answered with the id it carried. Result payloads use
//! the `rust_mcp_schema` types.

use rust_mcp_schema::{
    CallToolResult, Implementation, InitializeResult, RpcError, ServerCapabilities,
    ServerCapabilitiesTools, TextContent, LATEST_PROTOCOL_VERSION,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_PING: &str = "ping";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

pub const SERVER_NAME: &str = "sheetbridge";
const SERVER_TITLE: &str = "Google Sheets editing bridge";
const SERVER_INSTRUCTIONS: &str = "Call edit_google_sheet with a natural-language prompt, a Google \
OAuth access token and the spreadsheet id. Pass the returned conversation_id to continue a \
previous edit.";

/// An incoming message. Absent `id` marks a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success<T: Serialize>(id: Value, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Self {
                jsonrpc: JSONRPC_VERSION,
                result: Some(result),
                error: None,
                id,
            },
            Err(err) => Self::failure(id, RpcError::internal_error().with_message(&err.to_string())),
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn parse_error(detail: &str) -> Self {
        Self::failure(Value::Null, RpcError::parse_error().with_message(detail))
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::failure(
            id,
            RpcError::method_not_found().with_message(&format!("Method not found: {method}")),
        )
    }

    pub fn invalid_params(id: Value, detail: &str) -> Self {
        Self::failure(id, RpcError::invalid_params().with_message(detail))
    }
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: Option<String>,
}

/// Builds the `initialize` result, echoing the client's protocol version when it sent one.
pub fn initialize_result(params: Option<&Value>) -> InitializeResult {
    let requested = params
        .and_then(|params| serde_json::from_value::<InitializeParams>(params.clone()).ok())
        .and_then(|params| params.protocol_version)
        .filter(|version| !version.trim().is_empty());

    InitializeResult {
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools::default()),
            ..ServerCapabilities::default()
        },
        instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        meta: None,
        protocol_version: requested.unwrap_or_else(|| LATEST_PROTOCOL_VERSION.to_string()),
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some(SERVER_TITLE.to_string()),
            description: Some(
                "Forwards sheet edit requests to the TabTabTab backend and summarises the result"
                    .to_string(),
            ),
            icons: Vec::new(),
            website_url: None,
        },
    }
}

/// Wraps tool output text as a single text content block.
pub fn text_result(text: String) -> Result<CallToolResult, String> {
    let content = serde_json::to_value(TextContent::new(text, None, None))
        .map_err(|err| err.to_string())?;
    serde_json::from_value(serde_json::json!({ "content": [content] }))
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_have_no_id() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .expect("notification should parse");
        assert!(request.id.is_none());
        assert!(request.params.is_none());
    }

    #[test]
    fn failure_serializes_error_without_result() {
        let response = JsonRpcResponse::method_not_found(serde_json::json!(7), "resources/list");
        let value = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(
            value["error"]["message"],
            "Method not found: resources/list"
        );
    }

    #[test]
    fn parse_error_uses_null_id() {
        let value = serde_json::to_value(JsonRpcResponse::parse_error("bad json"))
            .expect("response should serialize");
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], -32700);
    }

    #[test]
    fn initialize_echoes_requested_protocol_version() {
        let params = serde_json::json!({
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {"name": "cursor", "version": "1.0"}
        });
        let result = initialize_result(Some(&params));
        assert_eq!(result.protocol_version, "2025-06-18");
        assert!(result.capabilities.tools.is_some());
        assert_eq!(result.server_info.name, SERVER_NAME);

        let fallback = initialize_result(None);
        assert_eq!(fallback.protocol_version, LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn text_result_holds_one_text_block() {
        let result = text_result("✅ Success!".to_string()).expect("result should build");
        let value = serde_json::to_value(&result).expect("result should serialize");
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "✅ Success!");
    }
}
