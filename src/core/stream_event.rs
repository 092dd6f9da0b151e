//! Typed events emitted by the sheet-editing backend.
//!
//! The backend streams one JSON object per `data: ` line. Each object carries a
//! `type` discriminator; anything that does not decode into a [`StreamEvent`]
//! is dropped without interrupting the stream.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Prefix that marks a line carrying an event payload.
pub const DATA_LINE_PREFIX: &str = "data: ";

const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Progress {
        #[serde(default, deserialize_with = "lenient_text")]
        message: String,
    },
    ToolCall {
        #[serde(default, deserialize_with = "lenient_text")]
        message: String,
    },
    Response(ResponseEvent),
    /// A `null` message decodes as empty and is not reported.
    Error {
        #[serde(default = "unknown_error_message", deserialize_with = "lenient_text")]
        message: String,
    },
}

/// Terminal success payload. Only the last one received is kept.
///
/// Fields are decoded leniently: a field of an unexpected type never causes
/// the whole response to be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseEvent {
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub turn_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub partial: Option<bool>,
}

fn unknown_error_message() -> String {
    UNKNOWN_ERROR_MESSAGE.to_string()
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Strings pass through, `null` becomes empty, other values use their JSON text.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_text(Value::deserialize(deserializer)?))
}

/// Accepts non-negative integers and integral floats such as `2.0`.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let count = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| *value >= 0.0 && value.fract() == 0.0 && *value <= u64::MAX as f64)
                .map(|value| value as u64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    Ok(count)
}

/// JSON truthiness: `false`, `0`, `""`, `null` and empty containers are false.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let flag = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    };
    Ok(Some(flag))
}

/// Returns the JSON payload of a `data: ` line, or `None` for any other line.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_LINE_PREFIX)
}

/// Decodes a single streamed line into an event.
///
/// Lines without the `data: ` prefix, payloads that are not valid JSON and
/// objects with an unrecognised `type` all yield `None`.
pub fn parse_event_line(line: &str) -> Option<StreamEvent> {
    let payload = data_payload(line)?;
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            debug!(error = %err, bytes = payload.len(), "Dropping undecodable event line");
            None
        }
    }
}

/// Lazily maps a sequence of lines to the events they carry.
pub fn parse_event_lines<I, S>(lines: I) -> impl Iterator<Item = StreamEvent>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| parse_event_line(line.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_event_kind() {
        assert_eq!(
            parse_event_line(r#"data: {"type":"progress","message":"Reading sheet"}"#),
            Some(StreamEvent::Progress {
                message: "Reading sheet".to_string()
            })
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"tool_call","message":"read_range(A1:C4)"}"#),
            Some(StreamEvent::ToolCall {
                message: "read_range(A1:C4)".to_string()
            })
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"error","message":"quota exceeded"}"#),
            Some(StreamEvent::Error {
                message: "quota exceeded".to_string()
            })
        );

        let response = parse_event_line(
            r#"data: {"type":"response","message":"Done","conversation_id":"conv-1","turn_count":3,"partial":true}"#,
        );
        assert_eq!(
            response,
            Some(StreamEvent::Response(ResponseEvent {
                message: "Done".to_string(),
                conversation_id: Some("conv-1".to_string()),
                turn_count: Some(3),
                partial: Some(true),
            }))
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        assert_eq!(
            parse_event_line(r#"data: {"type":"error"}"#),
            Some(StreamEvent::Error {
                message: "Unknown error".to_string()
            })
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"progress"}"#),
            Some(StreamEvent::Progress {
                message: String::new()
            })
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"response"}"#),
            Some(StreamEvent::Response(ResponseEvent::default()))
        );
    }

    #[test]
    fn null_and_oddly_typed_fields_keep_the_event() {
        assert_eq!(
            parse_event_line(r#"data: {"type":"response","message":null,"turn_count":2}"#),
            Some(StreamEvent::Response(ResponseEvent {
                message: String::new(),
                turn_count: Some(2),
                ..ResponseEvent::default()
            }))
        );
        assert_eq!(
            parse_event_line(
                r#"data: {"type":"response","message":"Done","conversation_id":null,"turn_count":2.0,"partial":null}"#
            ),
            Some(StreamEvent::Response(ResponseEvent {
                message: "Done".to_string(),
                turn_count: Some(2),
                ..ResponseEvent::default()
            }))
        );
        assert_eq!(
            parse_event_line(
                r#"data: {"type":"response","message":42,"conversation_id":7,"turn_count":"3","partial":1}"#
            ),
            Some(StreamEvent::Response(ResponseEvent {
                message: "42".to_string(),
                conversation_id: Some("7".to_string()),
                turn_count: Some(3),
                partial: Some(true),
            }))
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"response","turn_count":-1,"partial":false}"#),
            Some(StreamEvent::Response(ResponseEvent {
                partial: Some(false),
                ..ResponseEvent::default()
            }))
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"progress","message":null}"#),
            Some(StreamEvent::Progress {
                message: String::new()
            })
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"tool_call","message":null}"#),
            Some(StreamEvent::ToolCall {
                message: String::new()
            })
        );
        assert_eq!(
            parse_event_line(r#"data: {"type":"error","message":null}"#),
            Some(StreamEvent::Error {
                message: String::new()
            })
        );
    }

    #[test]
    fn ignores_lines_that_are_not_events() {
        assert_eq!(parse_event_line("event: ping"), None);
        assert_eq!(parse_event_line(": keep-alive"), None);
        assert_eq!(parse_event_line(r#"data:{"type":"progress"}"#), None);
        assert_eq!(parse_event_line("data: {not json"), None);
        assert_eq!(parse_event_line(r#"data: {"type":"heartbeat"}"#), None);
        assert_eq!(parse_event_line(r#"data: {"message":"no type"}"#), None);
    }

    #[test]
    fn malformed_line_does_not_stop_later_events() {
        let lines = [
            r#"data: {"type":"progress","message":"one"}"#,
            "data: {\"type\":",
            r#"data: {"type":"progress","message":"two"}"#,
        ];

        let events: Vec<StreamEvent> = parse_event_lines(lines).collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::Progress {
                    message: "one".to_string()
                },
                StreamEvent::Progress {
                    message: "two".to_string()
                },
            ]
        );
    }
}
