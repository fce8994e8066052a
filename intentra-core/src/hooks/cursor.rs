//! Cursor hooks
//!
//! Cursor reports MCP calls through dedicated hooks carrying either a `url`
//! (remote servers) or a `command` (stdio servers), and agent output through
//! `afterAgentResponse` / `afterAgentThought` with a `text` field.

use super::mcp::infer_server;
use super::raw::RawEvent;
use super::ToolNormalizer;
use crate::types::{Event, McpInfo, Tool, UnifiedEventType};

use UnifiedEventType as U;

const EVENT_NAMES: &[(&str, UnifiedEventType)] = &[
    ("sessionStart", U::SessionStart),
    ("sessionEnd", U::SessionEnd),
    ("beforeSubmitPrompt", U::BeforePrompt),
    ("afterAgentResponse", U::AfterResponse),
    ("afterAgentThought", U::AfterThought),
    ("preToolUse", U::BeforeTool),
    ("postToolUse", U::AfterTool),
    ("postToolUseFailure", U::ToolUseFailure),
    ("beforeReadFile", U::BeforeFileRead),
    ("beforeTabFileRead", U::BeforeFileRead),
    ("afterFileEdit", U::AfterFileEdit),
    ("afterTabFileEdit", U::AfterFileEdit),
    ("beforeShellExecution", U::BeforeShell),
    ("afterShellExecution", U::AfterShell),
    ("beforeMCPExecution", U::BeforeMcp),
    ("afterMCPExecution", U::AfterMcp),
    ("subagentStart", U::SubagentStart),
    ("subagentStop", U::SubagentStop),
    ("preCompact", U::PreCompact),
    ("stop", U::Stop),
];

pub struct CursorNormalizer;

impl ToolNormalizer for CursorNormalizer {
    fn tool(&self) -> Tool {
        Tool::Cursor
    }

    fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)] {
        EVENT_NAMES
    }

    fn extract(&self, event: &mut Event, raw: &RawEvent) {
        match event.event_type {
            U::AfterResponse => event.response = raw.first_str(&["text", "response"]),
            U::AfterThought => event.thought = raw.first_str(&["text", "thought"]),
            U::BeforeMcp | U::AfterMcp => extract_mcp(event, raw),
            U::AfterShell => {
                if event.duration_ms.is_none() {
                    event.duration_ms = raw.first_u64(&["execution_time_ms"]);
                }
            }
            _ => {}
        }
    }
}

/// The server launch command is identity, not a shell command: it moves into
/// [`McpInfo`] as a basename and never reaches `event.command`.
fn extract_mcp(event: &mut Event, raw: &RawEvent) {
    let tool_name = event.tool_name.clone().unwrap_or_default();
    let mut info = McpInfo::new(infer_server(&tool_name), tool_name);

    // `tool_input.command` is an argument to the MCP tool, not the server
    if let Some(url) = raw.first_str(&["url"]) {
        info = info.with_url(&url);
    } else if let Some(command) = raw.first_str(&["command"]) {
        info = info.with_command(&command);
    }
    event.command = None;

    if event.event_type == U::AfterMcp {
        if let Some(output) = raw.first_str(&["result_json"]) {
            event.tool_output = Some(output);
        }
    }

    event.mcp = Some(info);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NormalizerRegistry;

    fn normalize(hook: &str, json: &str) -> Event {
        let raw = RawEvent::decode(json).unwrap();
        NormalizerRegistry::new().normalize("cursor", hook, &raw)
    }

    #[test]
    fn test_event_names() {
        let n = CursorNormalizer;
        assert_eq!(n.normalize_event_type("beforeSubmitPrompt"), U::BeforePrompt);
        assert_eq!(n.normalize_event_type("afterTabFileEdit"), U::AfterFileEdit);
        assert_eq!(n.normalize_event_type("afterMCPExecution"), U::AfterMcp);
        assert_eq!(n.normalize_event_type("stop"), U::Stop);
        assert_eq!(n.normalize_event_type("Stop"), U::Unknown);
    }

    #[test]
    fn test_mcp_url_is_sanitized_and_hashed() {
        let event = normalize(
            "beforeMCPExecution",
            r#"{"conversation_id":"c1","tool_name":"browser_navigate","tool_input":"{\"url\":\"https://example.com\"}","url":"https://mcp.example.com/sse?key=secret"}"#,
        );
        let mcp = event.mcp.unwrap();
        assert_eq!(mcp.server_name, "playwright");
        assert_eq!(mcp.tool_name, "browser_navigate");
        assert_eq!(mcp.server_url.as_deref(), Some("https://mcp.example.com/sse"));
        assert_eq!(mcp.endpoint_hash.unwrap().len(), 16);
        assert_eq!(event.tool_input.unwrap()["url"], "https://example.com");
    }

    #[test]
    fn test_mcp_command_never_leaks_path() {
        let event = normalize(
            "afterMCPExecution",
            r#"{"tool_name":"resolve-library-id","command":"/home/dev/.npm/bin/npx -y @upstash/context7-mcp","result_json":"{\"ok\":true}","duration":120}"#,
        );
        assert!(event.command.is_none());
        let mcp = event.mcp.unwrap();
        assert_eq!(mcp.server_name, "context7");
        assert_eq!(mcp.server_command.as_deref(), Some("npx"));
        assert_eq!(event.tool_output.as_deref(), Some(r#"{"ok":true}"#));
        assert_eq!(event.duration_ms, Some(120));
    }

    #[test]
    fn test_mcp_tool_argument_is_not_server_command() {
        let first = normalize(
            "beforeMCPExecution",
            r#"{"tool_name":"run_query","tool_input":{"command":"/home/alice/bin/psql -c select"}}"#,
        );
        let second = normalize(
            "beforeMCPExecution",
            r#"{"tool_name":"run_query","tool_input":{"command":"/opt/psql -c vacuum"}}"#,
        );

        assert!(first.command.is_none());
        let mcp = first.mcp.unwrap();
        assert!(mcp.server_command.is_none());
        assert!(mcp.endpoint_hash.is_none());
        assert_eq!(mcp, second.mcp.unwrap());
        assert_eq!(first.tool_input.unwrap()["command"], "/home/alice/bin/psql -c select");
    }

    #[test]
    fn test_agent_response_and_thought() {
        let event = normalize("afterAgentResponse", r#"{"text":"abcdefgh"}"#);
        assert_eq!(event.response.as_deref(), Some("abcdefgh"));
        assert_eq!(event.tokens.output_tokens, 2);

        let event = normalize("afterAgentThought", r#"{"text":"abcd"}"#);
        assert_eq!(event.thought.as_deref(), Some("abcd"));
        assert_eq!(event.tokens.thinking_tokens, 1);
    }

    #[test]
    fn test_workspace_root_becomes_cwd() {
        let event = normalize(
            "beforeShellExecution",
            r#"{"command":"cargo test","workspace_roots":["/home/dev/repo"]}"#,
        );
        assert_eq!(event.cwd.as_deref(), Some("/home/dev/repo"));
        assert_eq!(event.command.as_deref(), Some("cargo test"));
    }

    #[test]
    fn test_pre_compact_metadata() {
        let event = normalize(
            "preCompact",
            r#"{"trigger":"auto","context_usage_percent":91.2,"context_tokens":182000,"context_window_size":200000,"message_count":48,"messages_to_compact":30,"is_first_compaction":false}"#,
        );
        let compaction = event.compaction.unwrap();
        assert_eq!(compaction.trigger.as_deref(), Some("auto"));
        assert_eq!(compaction.message_count, Some(48));
        assert_eq!(compaction.messages_to_compact, Some(30));
        assert_eq!(compaction.is_first_compaction, Some(false));
    }
}
