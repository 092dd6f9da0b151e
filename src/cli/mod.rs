//! Command-line interface parsing and handling
//!
//! The binary serves MCP over stdio by default. Flags adjust where the
//! backend lives and where diagnostics go; stdout is reserved for protocol
//! traffic.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::core::config::data::{path_display, API_KEY_ENV};
use crate::core::config::{BridgeConfig, ConfigOverrides};
use crate::core::edit_stream::{build_http_client, EditStreamForwarder};
use crate::mcp::server::McpServer;
use crate::mcp::tools::{edit_sheet_tool, ToolBridge};
use crate::utils::logging::init_logging;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ")"
);

#[derive(Parser)]
#[command(name = "sheetbridge", version, long_version = LONG_VERSION)]
#[command(about = "MCP server that edits Google Sheets through the TabTabTab backend")]
#[command(
    long_about = "sheetbridge speaks the Model Context Protocol over stdin/stdout and exposes a \
single tool, edit_google_sheet. Each call is forwarded to the TabTabTab backend, whose streamed \
progress is summarised into one text result.\n\n\
Environment Variables:\n\
  TABTABTAB_API_KEY     Backend API key (required for edits)\n\
  TABTABTAB_SERVER_URL  Backend base URL (optional, defaults to http://localhost:8000)\n\
  SHEETBRIDGE_LOG       Log filter, e.g. debug or sheetbridge=trace (falls back to RUST_LOG)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read settings from this TOML file instead of the default location
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding the environment and config file
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Overall limit for a single edit request
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Append logs to this file instead of stderr
    #[arg(short = 'l', long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve MCP over stdio (default)
    Serve,
    /// Print the edit_google_sheet tool descriptor as JSON and exit
    ToolSchema,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::ToolSchema) => {
            println!("{}", serde_json::to_string_pretty(&edit_sheet_tool())?);
            Ok(())
        }
        Some(Commands::Serve) | None => serve(&args).await,
    }
}

async fn serve(args: &Args) -> Result<(), Box<dyn Error>> {
    init_logging(args.log_file.as_deref())?;

    let overrides = ConfigOverrides {
        server_url: args.server_url.clone(),
        timeout_secs: args.timeout_secs,
    };
    let config = BridgeConfig::load(args.config.as_deref(), &overrides)?;

    if !config.has_api_key() {
        warn!("{API_KEY_ENV} is not set; edit requests will be rejected");
        eprintln!("⚠️  Warning: {API_KEY_ENV} environment variable not set");
    }
    let log_target = args
        .log_file
        .as_ref()
        .map(path_display)
        .unwrap_or_else(|| "stderr".to_string());
    info!(
        server_url = %config.base_url,
        timeout_secs = config.request_timeout.as_secs(),
        log_target = %log_target,
        "Starting sheetbridge MCP server"
    );

    let client = build_http_client()?;
    let forwarder = EditStreamForwarder::new(client, Arc::new(config));
    let server = McpServer::new(ToolBridge::new(Arc::new(forwarder)));

    server
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "sheetbridge",
            "--server-url",
            "https://sheets.example.com",
            "--timeout-secs",
            "60",
            "-l",
            "/tmp/sheetbridge.log",
        ])
        .expect("flags should parse");

        assert!(args.command.is_none());
        assert_eq!(args.server_url.as_deref(), Some("https://sheets.example.com"));
        assert_eq!(args.timeout_secs, Some(60));
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/sheetbridge.log")));
        assert!(args.config.is_none());
    }

    #[test]
    fn parses_tool_schema_subcommand() {
        let args = Args::try_parse_from(["sheetbridge", "tool-schema"]).expect("should parse");
        assert!(matches!(args.command, Some(Commands::ToolSchema)));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Args::try_parse_from(["sheetbridge", "--timeout-secs", "soon"]).is_err());
    }
}
