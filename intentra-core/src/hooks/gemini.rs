//! Gemini CLI hooks
//!
//! Gemini exposes model-level hooks (`BeforeModel` / `AfterModel`) whose
//! payloads carry the request and the provider's `usageMetadata`. The agent
//! turn closes with `AfterAgent`, which is the session's terminal event.

use serde_json::Value;

use super::mcp::from_prefixed_name;
use super::raw::RawEvent;
use super::ToolNormalizer;
use crate::types::{Event, Tool, UnifiedEventType};

use UnifiedEventType as U;

const EVENT_NAMES: &[(&str, UnifiedEventType)] = &[
    ("SessionStart", U::SessionStart),
    ("SessionEnd", U::SessionEnd),
    ("BeforeAgent", U::BeforePrompt),
    ("AfterAgent", U::Stop),
    ("BeforeModel", U::BeforeModel),
    ("AfterModel", U::AfterModel),
    ("BeforeToolSelection", U::BeforeToolSelection),
    ("BeforeTool", U::BeforeTool),
    ("AfterTool", U::AfterTool),
    ("PreCompress", U::PreCompact),
    ("Notification", U::Notification),
];

pub struct GeminiNormalizer;

impl ToolNormalizer for GeminiNormalizer {
    fn tool(&self) -> Tool {
        Tool::Gemini
    }

    fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)] {
        EVENT_NAMES
    }

    fn extract(&self, event: &mut Event, raw: &RawEvent) {
        if event.model.is_none() {
            event.model = raw.first_str(&["llm_request.model"]);
        }

        match event.event_type {
            U::BeforeTool | U::AfterTool => {
                event.mcp = from_prefixed_name(event.tool_name.as_deref());
            }
            U::AfterModel => {
                extract_usage(event, raw);
                event.response = raw
                    .first_str(&["prompt_response"])
                    .or_else(|| candidate_text(raw));
            }
            // AfterAgent repeats the prompt of the turn it closes
            U::Stop => {
                event.prompt = None;
                event.response = raw.first_str(&["prompt_response"]);
            }
            _ => {}
        }
    }
}

fn extract_usage(event: &mut Event, raw: &RawEvent) {
    if let Some(n) = raw.first_u64(&["llm_response.usageMetadata.promptTokenCount"]) {
        event.tokens.input_tokens = n;
    }
    if let Some(n) = raw.first_u64(&["llm_response.usageMetadata.candidatesTokenCount"]) {
        event.tokens.output_tokens = n;
    }
    if let Some(n) = raw.first_u64(&["llm_response.usageMetadata.thoughtsTokenCount"]) {
        event.tokens.thinking_tokens = n;
    }
}

/// Concatenated text parts of the first response candidate.
fn candidate_text(raw: &RawEvent) -> Option<String> {
    let parts = raw
        .lookup("llm_response.candidates.0.content.parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NormalizerRegistry;

    fn normalize(hook: &str, json: &str) -> Event {
        let raw = RawEvent::decode(json).unwrap();
        NormalizerRegistry::new().normalize("gemini", hook, &raw)
    }

    #[test]
    fn test_event_names() {
        let n = GeminiNormalizer;
        assert_eq!(n.normalize_event_type("BeforeAgent"), U::BeforePrompt);
        assert_eq!(n.normalize_event_type("AfterAgent"), U::Stop);
        assert_eq!(n.normalize_event_type("PreCompress"), U::PreCompact);
        assert_eq!(n.normalize_event_type("Stop"), U::Unknown);
    }

    #[test]
    fn test_after_model_usage_metadata() {
        let event = normalize(
            "AfterModel",
            r#"{"session_id":"g1","llm_request":{"model":"gemini-2.5-pro"},"llm_response":{"usageMetadata":{"promptTokenCount":1200,"candidatesTokenCount":340,"thoughtsTokenCount":56},"candidates":[{"content":{"parts":[{"text":"Done."}]}}]}}"#,
        );
        assert_eq!(event.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(event.tokens.input_tokens, 1200);
        assert_eq!(event.tokens.output_tokens, 340);
        assert_eq!(event.tokens.thinking_tokens, 56);
        assert_eq!(event.response.as_deref(), Some("Done."));
    }

    #[test]
    fn test_after_agent_does_not_recount_prompt() {
        let event = normalize(
            "AfterAgent",
            r#"{"session_id":"g1","prompt":"a long prompt that was already counted","prompt_response":"abcd"}"#,
        );
        assert_eq!(event.event_type, U::Stop);
        assert!(event.prompt.is_none());
        assert_eq!(event.tokens.input_tokens, 0);
        assert_eq!(event.tokens.output_tokens, 1);
    }

    #[test]
    fn test_mcp_tool() {
        let event = normalize(
            "AfterTool",
            r#"{"session_id":"g1","tool_name":"mcp__context7__get-library-docs","tool_input":{}}"#,
        );
        let mcp = event.mcp.unwrap();
        assert_eq!(mcp.server_name, "context7");
        assert_eq!(mcp.tool_name, "get-library-docs");
    }
}
