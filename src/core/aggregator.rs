use crate::core::stream_event::{ResponseEvent, StreamEvent};

/// How the outbound request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    Completed,
    Timeout,
    TransportError(String),
    HttpStatus { code: u16, body: String },
}

/// Everything collected while consuming one backend stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    pub tool_calls: Vec<String>,
    pub progress: Vec<String>,
    pub final_response: Option<ResponseEvent>,
    pub final_error: Option<String>,
    pub outcome: TransportOutcome,
}

impl AggregationResult {
    /// A result carrying only an outcome, for failures known before any event arrived.
    pub fn from_outcome(outcome: TransportOutcome) -> Self {
        StreamAggregator::new().finish(outcome)
    }
}

/// Folds events into an [`AggregationResult`] for a single invocation.
///
/// Progress and tool-call messages accumulate in arrival order. Response and
/// error events overwrite whatever came before them. Nothing applied is ever
/// retracted, even when the transport later fails.
#[derive(Debug, Default)]
pub struct StreamAggregator {
    tool_calls: Vec<String>,
    progress: Vec<String>,
    final_response: Option<ResponseEvent>,
    final_error: Option<String>,
    events_applied: usize,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: StreamEvent) {
        self.events_applied += 1;
        match event {
            StreamEvent::Progress { message } => self.progress.push(message),
            StreamEvent::ToolCall { message } => self.tool_calls.push(message),
            StreamEvent::Response(response) => self.final_response = Some(response),
            StreamEvent::Error { message } => self.final_error = Some(message),
        }
    }

    pub fn events_applied(&self) -> usize {
        self.events_applied
    }

    pub fn finish(self, outcome: TransportOutcome) -> AggregationResult {
        AggregationResult {
            tool_calls: self.tool_calls,
            progress: self.progress,
            final_response: self.final_response,
            final_error: self.final_error,
            outcome,
        }
    }
}

impl Extend<StreamEvent> for StreamAggregator {
    fn extend<T: IntoIterator<Item = StreamEvent>>(&mut self, events: T) {
        for event in events {
            self.apply(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(message: &str) -> StreamEvent {
        StreamEvent::Progress {
            message: message.to_string(),
        }
    }

    fn response(message: &str) -> StreamEvent {
        StreamEvent::Response(ResponseEvent {
            message: message.to_string(),
            ..ResponseEvent::default()
        })
    }

    #[test]
    fn keeps_progress_and_tool_calls_in_arrival_order() {
        let mut aggregator = StreamAggregator::new();
        aggregator.apply(progress("first"));
        aggregator.apply(StreamEvent::ToolCall {
            message: "write_cell(B2)".to_string(),
        });
        aggregator.apply(progress("second"));
        aggregator.apply(StreamEvent::ToolCall {
            message: "format_range(A1:B2)".to_string(),
        });

        let result = aggregator.finish(TransportOutcome::Completed);
        assert_eq!(result.progress, vec!["first", "second"]);
        assert_eq!(result.tool_calls, vec!["write_cell(B2)", "format_range(A1:B2)"]);
        assert_eq!(result.outcome, TransportOutcome::Completed);
    }

    #[test]
    fn last_response_and_last_error_win() {
        let mut aggregator = StreamAggregator::new();
        aggregator.extend([
            response("A"),
            StreamEvent::Error {
                message: "first failure".to_string(),
            },
            response("B"),
            StreamEvent::Error {
                message: "second failure".to_string(),
            },
        ]);

        let result = aggregator.finish(TransportOutcome::Completed);
        assert_eq!(
            result.final_response.map(|response| response.message),
            Some("B".to_string())
        );
        assert_eq!(result.final_error.as_deref(), Some("second failure"));
    }

    #[test]
    fn applied_events_survive_a_failed_transport() {
        let mut aggregator = StreamAggregator::new();
        aggregator.extend([progress("halfway"), response("partial answer")]);
        assert_eq!(aggregator.events_applied(), 2);

        let result = aggregator.finish(TransportOutcome::TransportError("reset".to_string()));
        assert_eq!(result.progress, vec!["halfway"]);
        assert!(result.final_response.is_some());
        assert_eq!(
            result.outcome,
            TransportOutcome::TransportError("reset".to_string())
        );
    }

    #[test]
    fn from_outcome_starts_empty() {
        let result = AggregationResult::from_outcome(TransportOutcome::Timeout);
        assert!(result.progress.is_empty());
        assert!(result.tool_calls.is_empty());
        assert!(result.final_response.is_none());
        assert!(result.final_error.is_none());
        assert_eq!(result.outcome, TransportOutcome::Timeout);
    }
}
