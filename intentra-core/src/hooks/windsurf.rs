//! Windsurf (Cascade) hooks
//!
//! Windsurf nests everything action-specific under `tool_info` and identifies
//! the conversation by `trajectory_id`. It has no stop hook, so
//! `post_cascade_response` is treated as the end of a session.

use super::mcp::DEFAULT_MCP_SERVER;
use super::raw::{value_to_text, RawEvent};
use super::ToolNormalizer;
use crate::types::{Event, McpInfo, Tool, UnifiedEventType};

use UnifiedEventType as U;

const EVENT_NAMES: &[(&str, UnifiedEventType)] = &[
    ("pre_user_prompt", U::BeforePrompt),
    ("post_cascade_response", U::AfterResponse),
    ("pre_read_code", U::BeforeFileRead),
    ("post_read_code", U::AfterFileRead),
    ("pre_write_code", U::BeforeFileEdit),
    ("post_write_code", U::AfterFileEdit),
    ("pre_run_command", U::BeforeShell),
    ("post_run_command", U::AfterShell),
    ("pre_mcp_tool_use", U::BeforeMcp),
    ("post_mcp_tool_use", U::AfterMcp),
    ("post_setup_worktree", U::WorktreeSetup),
];

pub struct WindsurfNormalizer;

impl ToolNormalizer for WindsurfNormalizer {
    fn tool(&self) -> Tool {
        Tool::Windsurf
    }

    fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)] {
        EVENT_NAMES
    }

    fn extract(&self, event: &mut Event, raw: &RawEvent) {
        if event.conversation_id.is_none() {
            event.conversation_id = raw.first_str(&["trajectory_id"]);
        }
        if event.generation_id.is_none() {
            event.generation_id = raw.first_str(&["execution_id"]);
        }
        if event.model.is_none() {
            event.model = raw.first_str(&["model_name"]);
        }

        if event.prompt.is_none() {
            event.prompt = raw.first_str(&["tool_info.user_prompt"]);
        }
        if event.event_type == U::AfterResponse {
            event.response = raw.first_str(&["tool_info.response", "response"]);
        }
        if event.file_path.is_none() {
            event.file_path = raw.first_str(&["tool_info.file_path"]);
        }
        if event.command.is_none() {
            event.command = raw.first_str(&["tool_info.command_line"]);
        }
        if event.cwd.is_none() {
            event.cwd = raw.first_str(&["tool_info.cwd", "tool_info.worktree_path"]);
        }

        if matches!(event.event_type, U::BeforeMcp | U::AfterMcp) {
            extract_mcp(event, raw);
        }
    }
}

fn extract_mcp(event: &mut Event, raw: &RawEvent) {
    let server = raw
        .first_str(&["tool_info.mcp_server_name"])
        .unwrap_or_else(|| DEFAULT_MCP_SERVER.to_string());
    let tool = raw
        .first_str(&["tool_info.mcp_tool_name"])
        .unwrap_or_default();

    if let Some(args) = raw.first_value(&["tool_info.mcp_tool_arguments"]) {
        event.tool_input = Some(super::fields::parse_embedded_json(args));
    }
    if let Some(result) = raw
        .first_value(&["tool_info.mcp_result"])
        .and_then(value_to_text)
    {
        event.tool_output = Some(result);
    }
    if event.tool_name.is_none() && !tool.is_empty() {
        event.tool_name = Some(tool.clone());
    }
    event.mcp = Some(McpInfo::new(server, tool));
}
