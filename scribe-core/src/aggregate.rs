//! Streamed-response aggregation
//!
//! Rebuilds the single chat-completion object a non-streaming call would have
//! returned from the ordered event sequence of a streamed one. Identity
//! fields come verbatim from the first event, message content is concatenated
//! delta by delta, tool-call arguments are reassembled as raw text fragments,
//! and the latest usage snapshot wins. The whole pass is a pure function of
//! the event sequence and can be re-run safely.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// JSON `object` tag attached to every aggregated response.
const COMPLETION_OBJECT: &str = "chat.completion";

/// Partial `function` body of a tool call.
///
/// `arguments` fragments are raw pieces of one JSON string; only the fully
/// concatenated text is valid JSON, so fragments are never parsed here.
#[derive(Debug, Default)]
struct FunctionState {
    name: Option<Value>,
    arguments: Option<String>,
}

/// Accumulates one tool call across delta fragments.
#[derive(Debug, Default)]
struct ToolCallState {
    id: Option<Value>,
    kind: Option<Value>,
    function: Option<FunctionState>,
}

impl ToolCallState {
    /// Merge one delta fragment into the accumulated state.
    ///
    /// `id` and `type` overwrite whenever the fragment carries them;
    /// `function.name` overwrites and `function.arguments` concatenates.
    fn merge(&mut self, fragment: &Map<String, Value>) {
        if let Some(id) = fragment.get("id") {
            self.id = Some(id.clone());
        }
        if let Some(kind) = fragment.get("type") {
            self.kind = Some(kind.clone());
        }
        if let Some(Value::Object(function)) = fragment.get("function") {
            let state = self.function.get_or_insert_with(FunctionState::default);
            if let Some(name) = function.get("name") {
                state.name = Some(name.clone());
            }
            if let Some(Value::String(arguments)) = function.get("arguments") {
                state
                    .arguments
                    .get_or_insert_with(String::new)
                    .push_str(arguments);
            }
        }
    }

    fn finish(self) -> Value {
        let mut call = Map::new();
        if let Some(id) = self.id {
            call.insert("id".to_string(), id);
        }
        if let Some(kind) = self.kind {
            call.insert("type".to_string(), kind);
        }
        if let Some(function) = self.function {
            let mut body = Map::new();
            if let Some(name) = function.name {
                body.insert("name".to_string(), name);
            }
            if let Some(arguments) = function.arguments {
                body.insert("arguments".to_string(), Value::String(arguments));
            }
            call.insert("function".to_string(), Value::Object(body));
        }
        Value::Object(call)
    }
}

/// Accumulates one choice across events.
///
/// Tool calls are kept sparse, keyed by position, and materialized into a
/// dense list only at finalization.
#[derive(Debug, Default)]
struct ChoiceState {
    role: Option<String>,
    content: String,
    tool_calls: BTreeMap<u64, ToolCallState>,
    finish_reason: Option<String>,
}

impl ChoiceState {
    /// Fold one `choices` entry of one event into the accumulated state.
    fn apply(&mut self, entry: &Map<String, Value>) {
        if let Some(Value::String(reason)) = entry.get("finish_reason") {
            self.finish_reason = Some(reason.clone());
        }

        // A finish_reason-only entry with no delta object is legal.
        let delta = match entry.get("delta") {
            Some(Value::Object(delta)) => delta,
            _ => return,
        };

        if let Some(Value::String(role)) = delta.get("role") {
            self.role = Some(role.clone());
        }
        if let Some(Value::String(content)) = delta.get("content") {
            self.content.push_str(content);
        }
        if let Some(Value::Array(fragments)) = delta.get("tool_calls") {
            for fragment in fragments {
                let fragment = match fragment.as_object() {
                    Some(fragment) => fragment,
                    None => continue,
                };
                let position = match fragment.get("index").and_then(Value::as_u64) {
                    Some(position) => position,
                    None => continue,
                };
                self.tool_calls.entry(position).or_default().merge(fragment);
            }
        }
    }

    fn finish(mut self, index: u64) -> Value {
        let mut message = Map::new();
        let role = self.role.take().unwrap_or_else(|| "assistant".to_string());
        message.insert("role".to_string(), Value::String(role));

        // A tool-call-only choice has null content, matching the shape of a
        // non-streaming response.
        let content = if self.content.is_empty() {
            Value::Null
        } else {
            Value::String(std::mem::take(&mut self.content))
        };
        message.insert("content".to_string(), content);

        if let Some(highest) = self.tool_calls.keys().next_back().copied() {
            let mut sparse = std::mem::take(&mut self.tool_calls);
            let dense: Vec<Value> = (0..=highest)
                .map(|position| sparse.remove(&position).unwrap_or_default().finish())
                .collect();
            message.insert("tool_calls".to_string(), Value::Array(dense));
        }

        let mut choice = Map::new();
        choice.insert("index".to_string(), Value::from(index));
        choice.insert("message".to_string(), Value::Object(message));
        choice.insert(
            "finish_reason".to_string(),
            self.finish_reason.map_or(Value::Null, Value::String),
        );
        Value::Object(choice)
    }
}

/// Aggregate the decoded SSE events of one exchange into a single
/// chat-completion object.
///
/// Returns `None` for an empty event sequence, the explicit no-content
/// result. Otherwise `id`, `created` and `model` are seeded verbatim from the
/// first event (JSON null when absent), choices are emitted in ascending
/// index order regardless of how their fragments were interleaved across
/// events, and `usage` is attached only if some event carried a JSON-object
/// usage snapshot (the last one seen wins).
///
/// Entries with a missing or non-integer `index` are skipped; nothing in a
/// malformed event aborts the aggregation of the rest.
pub fn aggregate_streamed_response(events: &[Map<String, Value>]) -> Option<Value> {
    let first = events.first()?;

    let mut response = Map::new();
    response.insert(
        "id".to_string(),
        first.get("id").cloned().unwrap_or(Value::Null),
    );
    response.insert(
        "object".to_string(),
        Value::String(COMPLETION_OBJECT.to_string()),
    );
    response.insert(
        "created".to_string(),
        first.get("created").cloned().unwrap_or(Value::Null),
    );
    response.insert(
        "model".to_string(),
        first.get("model").cloned().unwrap_or(Value::Null),
    );

    let mut choices: BTreeMap<u64, ChoiceState> = BTreeMap::new();
    let mut usage: Option<Value> = None;

    for event in events {
        if let Some(snapshot) = event.get("usage") {
            if snapshot.is_object() {
                usage = Some(snapshot.clone());
            }
        }

        if let Some(Value::Array(entries)) = event.get("choices") {
            for entry in entries {
                let entry = match entry.as_object() {
                    Some(entry) => entry,
                    None => continue,
                };
                let index = match entry.get("index").and_then(Value::as_u64) {
                    Some(index) => index,
                    None => continue,
                };
                choices.entry(index).or_default().apply(entry);
            }
        }
    }

    let finalized: Vec<Value> = choices
        .into_iter()
        .map(|(index, state)| state.finish(index))
        .collect();
    response.insert("choices".to_string(), Value::Array(finalized));

    if let Some(usage) = usage {
        response.insert("usage".to_string(), usage);
    }

    Some(Value::Object(response))
}
