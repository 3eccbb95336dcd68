//! SSE payload-channel parsing
//!
//! OpenAI-style streams put one JSON fragment per `data:` line and close the
//! stream with a `data: [DONE]` sentinel. This parser only reads the payload
//! channel; event names, comments and blank separator lines are skipped.

use serde_json::{Map, Value};

/// Sentinel payload that terminates an OpenAI-style event stream.
const STREAM_TERMINATOR: &str = "[DONE]";

/// Return true when a response content type indicates an SSE stream.
pub fn is_event_stream(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/event-stream")
}

/// Parse JSON text, returning `None` on decode errors.
pub fn read_json(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Parse the full text of an SSE response body into its JSON event payloads.
///
/// Processing stops at the `[DONE]` terminator; everything after it is
/// ignored. Payloads that fail to parse, or parse to something other than a
/// JSON object, are dropped without aborting the scan. A body that never
/// emits the terminator is scanned to its end.
pub fn parse_sse_events(body: &str) -> Vec<Map<String, Value>> {
    let mut events = Vec::new();
    for raw_line in body.lines() {
        let line = raw_line.trim();
        let payload = match line.strip_prefix("data:") {
            Some(rest) => rest.trim(),
            None => continue,
        };
        if payload.is_empty() {
            continue;
        }
        if payload == STREAM_TERMINATOR {
            break;
        }
        if let Some(Value::Object(event)) = read_json(payload) {
            events.push(event);
        }
    }
    events
}
