//! Structural extraction shared by all tool normalizers
//!
//! Most hook payloads agree on a core vocabulary (`session_id`, `tool_name`,
//! `prompt`, ...). This module fills those fields; tool modules then layer their
//! own quirks on top.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::raw::{value_as_u64, value_to_text, RawEvent};
use crate::types::{CompactionInfo, Event, UnifiedEventType};

/// Rough characters-per-token ratio used when a payload carries no counts.
pub const CHARS_PER_TOKEN: u64 = 4;

/// Tool names whose calls modify a file
const EDIT_TOOLS: &[&str] = &[
    "Edit",
    "Write",
    "MultiEdit",
    "NotebookEdit",
    "write_file",
    "replace",
    "edit",
    "create",
    "str_replace_editor",
];

/// Whether a generic tool call edits a file
pub fn is_edit_tool(name: &str) -> bool {
    EDIT_TOOLS.contains(&name)
}

/// Approximate token count for a piece of text.
pub fn estimate_tokens(text: &str) -> u64 {
    chars_to_tokens(text.chars().count() as u64)
}

fn chars_to_tokens(chars: u64) -> u64 {
    (chars + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN
}

/// Fill the fields every tool spells the same way.
pub fn extract_common(event: &mut Event, raw: &RawEvent) {
    event.conversation_id = raw.first_str(&["conversation_id", "conversationId"]);
    event.session_id = raw.first_str(&["session_id", "sessionId"]);
    event.generation_id = raw.first_str(&["generation_id", "generationId"]);
    event.model = raw.first_str(&["model", "model_name"]);

    if let Some(ts) = raw.first_value(&["timestamp"]).and_then(parse_timestamp) {
        event.timestamp = ts;
    }

    event.duration_ms = raw.first_u64(&["duration_ms", "duration"]);
    event.cwd = raw.first_str(&["cwd", "workspace_roots.0"]);
    event.prompt = raw.first_str(&["prompt"]);
    event.error = extract_error(raw);

    event.tool_name = raw.first_str(&["tool_name"]);
    event.tool_input = raw.first_value(&["tool_input"]).map(parse_embedded_json);
    event.tool_output = raw
        .first_value(&["tool_response", "tool_output"])
        .and_then(value_to_text);

    event.command = raw.first_str(&["command", "tool_input.command"]);
    event.command_output = raw.first_str(&["output"]);
    event.file_path = raw.first_str(&[
        "file_path",
        "tool_input.file_path",
        "tool_input.notebook_path",
        "tool_input.path",
        "tool_input.absolute_path",
    ]);

    extract_explicit_tokens(event, raw);

    if event.event_type == UnifiedEventType::SessionEnd {
        event.session_end_reason = raw.first_str(&["reason"]);
    }

    if event.event_type == UnifiedEventType::PreCompact {
        event.compaction = Some(extract_compaction(raw));
    }
}

/// Token counts reported by the tool itself, at the top level or under `usage`.
fn extract_explicit_tokens(event: &mut Event, raw: &RawEvent) {
    if let Some(n) = raw.first_u64(&["input_tokens", "usage.input_tokens"]) {
        event.tokens.input_tokens = n;
    }
    if let Some(n) = raw.first_u64(&["output_tokens", "usage.output_tokens"]) {
        event.tokens.output_tokens = n;
    }
    if let Some(n) = raw.first_u64(&["thinking_tokens", "usage.thinking_tokens"]) {
        event.tokens.thinking_tokens = n;
    }
}

/// Fill zero token counts from text volume.
///
/// Runs after tool-specific extraction so explicit counts always win. Edit
/// content is only counted on after-edit signals so a before/after pair is
/// not billed twice.
pub fn estimate_missing_tokens(event: &mut Event, raw: &RawEvent) {
    if event.tokens.input_tokens == 0 {
        if let Some(prompt) = &event.prompt {
            event.tokens.input_tokens = estimate_tokens(prompt);
        }
    }

    if event.tokens.output_tokens == 0 {
        if let Some(response) = &event.response {
            event.tokens.output_tokens = estimate_tokens(response);
        } else if is_after_edit(event) {
            event.tokens.output_tokens = chars_to_tokens(new_content_chars(raw));
        }
    }

    if event.tokens.thinking_tokens == 0 {
        if let Some(thought) = &event.thought {
            event.tokens.thinking_tokens = estimate_tokens(thought);
        }
    }
}

fn is_after_edit(event: &Event) -> bool {
    match event.event_type {
        UnifiedEventType::AfterFileEdit => true,
        UnifiedEventType::AfterTool => event.tool_name.as_deref().is_some_and(is_edit_tool),
        _ => false,
    }
}

/// Characters of new content written by an edit, wherever the tool puts it.
fn new_content_chars(raw: &RawEvent) -> u64 {
    let mut total = 0u64;

    for path in [
        "tool_input.content",
        "tool_input.new_string",
        "tool_input.new_source",
        "content",
    ] {
        if let Some(Value::String(s)) = raw.lookup(path) {
            total += s.chars().count() as u64;
        }
    }

    for path in ["edits", "tool_input.edits", "tool_info.edits"] {
        if let Some(Value::Array(edits)) = raw.lookup(path) {
            total += edits
                .iter()
                .filter_map(|edit| edit.get("new_string").and_then(Value::as_str))
                .map(|s| s.chars().count() as u64)
                .sum::<u64>();
        }
    }

    total
}

/// `error` as `{ "message": ... }`, a bare string, or `error_message`.
fn extract_error(raw: &RawEvent) -> Option<String> {
    match raw.lookup("error") {
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| Some(Value::Object(obj.clone()).to_string())),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => raw.first_str(&["error_message"]),
    }
}

fn extract_compaction(raw: &RawEvent) -> CompactionInfo {
    CompactionInfo {
        trigger: raw.first_str(&["trigger"]),
        context_usage_percent: raw
            .first_f64(&["context_usage_percent"])
            .map(|p| p.clamp(0.0, 100.0)),
        context_tokens: raw.first_u64(&["context_tokens"]),
        context_window_size: raw.first_u64(&["context_window_size"]),
        message_count: raw.first_u64(&["message_count"]),
        messages_to_compact: raw.first_u64(&["messages_to_compact"]),
        is_first_compaction: raw.first_bool(&["is_first_compaction"]),
    }
}

/// Some tools send tool arguments as a JSON-encoded string.
pub fn parse_embedded_json(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|v| v.is_object() || v.is_array())
            .unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

/// RFC 3339 strings, or epoch seconds/milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
            .or_else(|| s.trim().parse::<u64>().ok().and_then(epoch_to_datetime)),
        other => value_as_u64(other).and_then(epoch_to_datetime),
    }
}

fn epoch_to_datetime(n: u64) -> Option<DateTime<Utc>> {
    // Below 10^11 the value is epoch seconds; as millis it would predate 1973
    let millis = if n < 100_000_000_000 { n * 1000 } else { n };
    Utc.timestamp_millis_opt(i64::try_from(millis).ok()?).single()
}
