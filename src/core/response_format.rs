//! Renders an [`AggregationResult`] into the text returned to the MCP caller.

use crate::core::aggregator::{AggregationResult, TransportOutcome};
use crate::core::stream_event::ResponseEvent;

/// Number of trailing progress updates shown in the summary.
pub const PROGRESS_WINDOW: usize = 10;

pub const TOOL_CALL_MARKER: &str = "🔧";
pub const PROGRESS_MARKER: &str = "🔄";

pub const TIMEOUT_MESSAGE: &str =
    "Error: Request timed out after 5 minutes. The task may still be processing.";
pub const NO_RESPONSE_MESSAGE: &str = "⚠️ No response received from server";
const SUCCESS_LINE: &str = "✅ Success!";
const CONVERSATION_HINT: &str =
    "(Use this conversation_id in follow-up requests to continue the conversation)";
const PARTIAL_WARNING: &str = "⚠️ Response is partial (reached turn limit)";

/// Produces the final summary text.
///
/// HTTP status failures, timeouts and transport errors replace the whole
/// summary with a single line, even when events were already collected.
pub fn format_result(result: &AggregationResult) -> String {
    match &result.outcome {
        TransportOutcome::HttpStatus { code, body } => format!("Error: HTTP {code} - {body}"),
        TransportOutcome::Timeout => TIMEOUT_MESSAGE.to_string(),
        TransportOutcome::TransportError(message) => format!("Error: {message}"),
        TransportOutcome::Completed => summary_lines(result).join("\n"),
    }
}

fn summary_lines(result: &AggregationResult) -> Vec<String> {
    let mut lines = Vec::new();

    if !result.tool_calls.is_empty() {
        lines.push("Tool Calls:".to_string());
        lines.extend(
            result
                .tool_calls
                .iter()
                .map(|message| format!("{TOOL_CALL_MARKER} {message}")),
        );
        lines.push(String::new());
    }

    if !result.progress.is_empty() {
        let total = result.progress.len();
        let hidden = total.saturating_sub(PROGRESS_WINDOW);
        lines.push("Progress:".to_string());
        lines.extend(
            result.progress[hidden..]
                .iter()
                .map(|message| format!("{PROGRESS_MARKER} {message}")),
        );
        if hidden > 0 {
            lines.push(format!("... ({hidden} earlier progress updates)"));
        }
        lines.push(String::new());
    }

    if let Some(response) = &result.final_response {
        push_response_lines(&mut lines, response);
    } else if let Some(error) = result.final_error.as_deref().filter(|error| !error.is_empty()) {
        lines.push(format!("❌ Error: {error}"));
    } else {
        lines.push(NO_RESPONSE_MESSAGE.to_string());
    }

    lines
}

fn push_response_lines(lines: &mut Vec<String>, response: &ResponseEvent) {
    lines.push(SUCCESS_LINE.to_string());
    lines.push(format!("Message: {}", response.message));

    if let Some(conversation_id) = response
        .conversation_id
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        lines.push(format!("Conversation ID: {conversation_id}"));
        lines.push(CONVERSATION_HINT.to_string());
    }

    if let Some(turns) = response.turn_count.filter(|turns| *turns > 0) {
        lines.push(format!("Completed in {turns} turns"));
    }

    if response.partial.unwrap_or(false) {
        lines.push(PARTIAL_WARNING.to_string());
    }
}
