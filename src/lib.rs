//! sheetbridge is a Model Context Protocol server that lets an assistant edit
//! Google Sheets through the TabTabTab backend.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns configuration, the outbound streaming request, event
//!   decoding, aggregation and the final text summary.
//! - [`mcp`] provides the JSON-RPC framing, the `edit_google_sheet` tool
//!   definition and the stdio server loop.
//! - [`utils`] holds line buffering, URL joining and logging setup.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`], which loads
//! configuration and serves [`mcp::server::McpServer`] over stdin/stdout.

pub mod cli;
pub mod core;
pub mod mcp;
pub mod utils;
