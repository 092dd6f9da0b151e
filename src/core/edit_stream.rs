//! Outbound streaming call to the sheet-editing backend.
//!
//! One [`EditStreamForwarder::run`] call opens a single POST, feeds every
//! decoded event into a fresh [`StreamAggregator`] as it arrives, and reports
//! how the transport ended. The whole exchange is bounded by the configured
//! request timeout.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::aggregator::{AggregationResult, StreamAggregator, TransportOutcome};
use crate::core::config::BridgeConfig;
use crate::core::error::BridgeError;
use crate::core::stream_event::parse_event_lines;
use crate::utils::line_buffer::SseLineBuffer;
use crate::utils::url::construct_api_url;

pub const EDIT_ENDPOINT: &str = "mcp/edit_google_sheet";
pub const API_KEY_HEADER: &str = "X-API-Key";
const JSON_CONTENT_TYPE: &str = "application/json";
const NO_BODY: &str = "<no body>";

const HTTP_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;
const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 8;

/// A validated request to edit one spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub prompt: String,
    pub credential: String,
    pub resource_id: String,
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
struct EditRequest<'a> {
    prompt: &'a str,
    google_access_token: &'a str,
    spreadsheet_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
}

impl<'a> From<&'a ToolInvocation> for EditRequest<'a> {
    fn from(invocation: &'a ToolInvocation) -> Self {
        Self {
            prompt: &invocation.prompt,
            google_access_token: &invocation.credential,
            spreadsheet_id: &invocation.resource_id,
            conversation_id: invocation.conversation_id.as_deref(),
        }
    }
}

#[async_trait]
/// Anything able to carry out an edit and summarise what happened.
pub trait EditBackend: Send + Sync {
    async fn edit(&self, invocation: &ToolInvocation) -> Result<AggregationResult, BridgeError>;
}

/// Builds the shared client. It sets no connect or read timeout of its own:
/// the configured request timeout bounds connect and streaming together.
pub fn build_http_client() -> Result<reqwest::Client, String> {
    http_client_builder().build().map_err(|err| err.to_string())
}

pub(crate) fn http_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECONDS))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE_PER_HOST)
}

#[derive(Clone)]
pub struct EditStreamForwarder {
    client: reqwest::Client,
    config: Arc<BridgeConfig>,
}

impl EditStreamForwarder {
    pub fn new(client: reqwest::Client, config: Arc<BridgeConfig>) -> Self {
        Self { client, config }
    }

    pub fn endpoint(&self) -> String {
        construct_api_url(&self.config.base_url, EDIT_ENDPOINT)
    }

    /// Runs one invocation end to end.
    ///
    /// Fails before any network activity when no API key is configured.
    pub async fn run(&self, invocation: &ToolInvocation) -> Result<AggregationResult, BridgeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(BridgeError::MissingApiKey)?;

        let started = Instant::now();
        let mut aggregator = StreamAggregator::new();
        let outcome = self.forward(api_key, invocation, &mut aggregator).await;

        info!(
            spreadsheet_id = %invocation.resource_id,
            outcome = ?outcome,
            events = aggregator.events_applied(),
            elapsed_ms = started.elapsed().as_millis(),
            "Edit request finished"
        );
        Ok(aggregator.finish(outcome))
    }

    /// Streams the backend response into `aggregator` and returns how the
    /// transport ended. Events applied before a timeout or failure are kept.
    pub async fn forward(
        &self,
        api_key: &str,
        invocation: &ToolInvocation,
        aggregator: &mut StreamAggregator,
    ) -> TransportOutcome {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.stream_events(api_key, invocation, aggregator))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "Edit request timed out, closing stream"
                );
                TransportOutcome::Timeout
            }
        }
    }

    async fn stream_events(
        &self,
        api_key: &str,
        invocation: &ToolInvocation,
        aggregator: &mut StreamAggregator,
    ) -> TransportOutcome {
        let url = self.endpoint();
        debug!(url = %url, conversation = invocation.conversation_id.is_some(), "Sending edit request");

        let request = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .json(&EditRequest::from(invocation));

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return transport_failure(err),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| NO_BODY.to_string());
            debug!(status = status.as_u16(), bytes = body.len(), "Backend rejected edit request");
            return TransportOutcome::HttpStatus {
                code: status.as_u16(),
                body,
            };
        }

        let mut stream = response.bytes_stream();
        let mut buffer = SseLineBuffer::default();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => return transport_failure(err),
            };
            aggregator.extend(parse_event_lines(buffer.push(&chunk)));
        }
        aggregator.extend(parse_event_lines(buffer.finish()));

        TransportOutcome::Completed
    }
}

#[async_trait]
impl EditBackend for EditStreamForwarder {
    async fn edit(&self, invocation: &ToolInvocation) -> Result<AggregationResult, BridgeError> {
        self.run(invocation).await
    }
}

/// Any failure reported by reqwest itself is a transport error, including its
/// own timeouts; only the overall request limit yields `Timeout`.
fn transport_failure(err: reqwest::Error) -> TransportOutcome {
    let message = error_chain(&err);
    warn!(error = %message, timeout = err.is_timeout(), "Edit request failed");
    TransportOutcome::TransportError(message)
}

/// Joins an error with its `source()` chain, skipping causes already
/// contained in the text so far.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
