//! Line-delimited JSON-RPC server over a pair of async streams.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::mcp::protocol::{
    initialize_result, text_result, CallToolParams, JsonRpcRequest, JsonRpcResponse,
    METHOD_INITIALIZE, METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use crate::mcp::tools::ToolBridge;

pub struct McpServer {
    bridge: Arc<ToolBridge>,
}

impl McpServer {
    pub fn new(bridge: ToolBridge) -> Self {
        Self {
            bridge: Arc::new(bridge),
        }
    }

    /// Serves requests from `reader` until it reaches EOF.
    ///
    /// Tool calls run on their own tasks; every response is written from this
    /// loop so output lines never interleave. Calls still running at EOF are
    /// awaited and answered before returning.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut tx = Some(tx);

        loop {
            tokio::select! {
                line = lines.next_line(), if tx.is_some() => {
                    match line? {
                        Some(line) => {
                            let Some(sender) = tx.as_ref() else { continue };
                            if let Some(response) = self.handle_line(&line, sender) {
                                write_response(&mut writer, &response).await?;
                            }
                        }
                        None => {
                            debug!("Input closed, waiting for in-flight tool calls");
                            tx = None;
                        }
                    }
                }
                Some(response) = rx.recv() => {
                    write_response(&mut writer, &response).await?;
                }
                else => break,
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    fn handle_line(
        &self,
        line: &str,
        responses: &mpsc::UnboundedSender<JsonRpcResponse>,
    ) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "Discarding unparseable message");
                return Some(JsonRpcResponse::parse_error(&format!("Parse error: {err}")));
            }
        };

        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };
        debug!(method = %request.method, id = %id, "Request received");

        match request.method.as_str() {
            METHOD_INITIALIZE => Some(JsonRpcResponse::success(
                id,
                &initialize_result(request.params.as_ref()),
            )),
            METHOD_PING => Some(JsonRpcResponse::success(id, &json!({}))),
            METHOD_TOOLS_LIST => Some(JsonRpcResponse::success(id, &self.bridge.tools())),
            METHOD_TOOLS_CALL => {
                let params = request.params.unwrap_or(Value::Null);
                match serde_json::from_value::<CallToolParams>(params) {
                    Ok(params) => {
                        self.spawn_tool_call(id, params, responses.clone());
                        None
                    }
                    Err(err) => Some(JsonRpcResponse::invalid_params(
                        id,
                        &format!("Invalid tools/call params: {err}"),
                    )),
                }
            }
            other => Some(JsonRpcResponse::method_not_found(id, other)),
        }
    }

    fn spawn_tool_call(
        &self,
        id: Value,
        params: CallToolParams,
        responses: mpsc::UnboundedSender<JsonRpcResponse>,
    ) {
        let bridge = Arc::clone(&self.bridge);
        tokio::spawn(async move {
            let response = match bridge
                .call_tool(&params.name, params.arguments.as_ref())
                .await
            {
                Ok(text) => match text_result(text) {
                    Ok(result) => JsonRpcResponse::success(id, &result),
                    Err(err) => JsonRpcResponse::failure(
                        id,
                        rust_mcp_schema::RpcError::internal_error().with_message(&err),
                    ),
                },
                Err(err) => JsonRpcResponse::invalid_params(id, &err.to_string()),
            };
            if responses.send(response).is_err() {
                warn!(tool = %params.name, "Dropping tool result, server loop has exited");
            }
        });
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_vec(response).map_err(std::io::Error::other)?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await
}
