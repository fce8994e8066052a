//! Claude Code hooks
//!
//! Claude Code payloads already use the common snake_case vocabulary
//! (`session_id`, `tool_name`, `tool_input`, `tool_response`), so extraction is
//! mostly MCP attribution from `mcp__<server>__<tool>` tool names.

use super::mcp::from_prefixed_name;
use super::raw::RawEvent;
use super::ToolNormalizer;
use crate::types::{Event, Tool, UnifiedEventType};

use UnifiedEventType as U;

const EVENT_NAMES: &[(&str, UnifiedEventType)] = &[
    ("SessionStart", U::SessionStart),
    ("SessionEnd", U::SessionEnd),
    ("UserPromptSubmit", U::BeforePrompt),
    ("PreToolUse", U::BeforeTool),
    ("PostToolUse", U::AfterTool),
    ("PostToolUseFailure", U::ToolUseFailure),
    ("PermissionRequest", U::PermissionRequest),
    ("Notification", U::Notification),
    ("Stop", U::Stop),
    ("SubagentStart", U::SubagentStart),
    ("SubagentStop", U::SubagentStop),
    ("PreCompact", U::PreCompact),
];

pub struct ClaudeNormalizer;

impl ToolNormalizer for ClaudeNormalizer {
    fn tool(&self) -> Tool {
        Tool::Claude
    }

    fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)] {
        EVENT_NAMES
    }

    fn extract(&self, event: &mut Event, raw: &RawEvent) {
        if matches!(
            event.event_type,
            U::BeforeTool | U::AfterTool | U::ToolUseFailure | U::PermissionRequest
        ) {
            event.mcp = from_prefixed_name(event.tool_name.as_deref());
        }

        if event.event_type == U::Notification
            && event.error.is_none()
            && raw.first_str(&["notification_type"]).as_deref() == Some("error")
        {
            event.error = raw.first_str(&["message"]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NormalizerRegistry;

    fn normalize(hook: &str, json: &str) -> Event {
        let raw = RawEvent::decode(json).unwrap();
        NormalizerRegistry::new().normalize("claude", hook, &raw)
    }

    #[test]
    fn test_event_names() {
        let n = ClaudeNormalizer;
        assert_eq!(n.normalize_event_type("UserPromptSubmit"), U::BeforePrompt);
        assert_eq!(n.normalize_event_type("PostToolUseFailure"), U::ToolUseFailure);
        assert_eq!(n.normalize_event_type("Stop"), U::Stop);
        assert_eq!(n.normalize_event_type("stop"), U::Unknown);
    }

    #[test]
    fn test_mcp_tool_name_is_split() {
        let event = normalize(
            "PostToolUse",
            r#"{"session_id":"s1","tool_name":"mcp__github__create_issue","tool_input":{"title":"bug"},"tool_response":{"number":7}}"#,
        );
        let mcp = event.mcp.unwrap();
        assert_eq!(mcp.server_name, "github");
        assert_eq!(mcp.tool_name, "create_issue");
        assert!(mcp.endpoint_hash.is_none());
        assert_eq!(event.tool_output.as_deref(), Some(r#"{"number":7}"#));
    }

    #[test]
    fn test_builtin_tools_have_no_mcp() {
        let event = normalize(
            "PreToolUse",
            r#"{"session_id":"s1","tool_name":"Bash","tool_input":{"command":"ls -la"}}"#,
        );
        assert!(event.mcp.is_none());
        assert_eq!(event.command.as_deref(), Some("ls -la"));
    }

    #[test]
    fn test_prompt_and_edit_estimation() {
        let event = normalize(
            "UserPromptSubmit",
            r#"{"session_id":"s1","prompt":"fix the failing test please"}"#,
        );
        assert_eq!(event.session_id.as_deref(), Some("s1"));
        assert_eq!(event.tokens.input_tokens, 7);

        let event = normalize(
            "PostToolUse",
            r#"{"session_id":"s1","tool_name":"Edit","tool_input":{"file_path":"/r/src/lib.rs","old_string":"a","new_string":"abcdefgh"}}"#,
        );
        assert_eq!(event.file_path.as_deref(), Some("/r/src/lib.rs"));
        assert_eq!(event.tokens.output_tokens, 2);
    }

    #[test]
    fn test_session_end_reason() {
        let event = normalize(
            "SessionEnd",
            r#"{"session_id":"s1","reason":"prompt_input_exit"}"#,
        );
        assert_eq!(event.event_type, U::SessionEnd);
        assert_eq!(event.session_end_reason.as_deref(), Some("prompt_input_exit"));
    }
}
