//! MCP surface: JSON-RPC framing, the tool definition and the stdio server.

pub mod protocol;
pub mod server;
pub mod tools;
