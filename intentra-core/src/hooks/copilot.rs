//! GitHub Copilot CLI hooks
//!
//! Copilot uses camelCase fields (`toolName`, `toolArgs`, `toolResult`) and
//! sends tool arguments as a JSON-encoded string. Its payloads carry no MCP
//! server identity, so every tool outside the built-in set is attributed to
//! [`COPILOT_PSEUDO_SERVER`].

use super::fields::parse_embedded_json;
use super::mcp::COPILOT_PSEUDO_SERVER;
use super::raw::RawEvent;
use super::ToolNormalizer;
use crate::types::{Event, McpInfo, Tool, UnifiedEventType};

use UnifiedEventType as U;

const EVENT_NAMES: &[(&str, UnifiedEventType)] = &[
    ("sessionStart", U::SessionStart),
    ("sessionEnd", U::SessionEnd),
    ("userPromptSubmitted", U::BeforePrompt),
    ("preToolUse", U::BeforeTool),
    ("postToolUse", U::AfterTool),
    ("errorOccurred", U::Error),
];

/// Tools shipped with the Copilot CLI itself
const BUILTIN_TOOLS: &[&str] = &[
    "bash",
    "view",
    "edit",
    "create",
    "str_replace_editor",
    "write_bash",
    "read_bash",
    "stop_bash",
    "glob",
    "grep",
    "web_fetch",
    "report_intent",
    "think",
    "task",
    "update_todo",
];

pub fn is_builtin_tool(name: &str) -> bool {
    BUILTIN_TOOLS.contains(&name)
}

pub struct CopilotNormalizer;

impl ToolNormalizer for CopilotNormalizer {
    fn tool(&self) -> Tool {
        Tool::Copilot
    }

    fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)] {
        EVENT_NAMES
    }

    fn extract(&self, event: &mut Event, raw: &RawEvent) {
        if event.prompt.is_none() && event.event_type == U::SessionStart {
            event.prompt = raw.first_str(&["initialPrompt"]);
        }

        let Some(tool_name) = raw.first_str(&["toolName"]) else {
            return;
        };

        if let Some(args) = raw.first_value(&["toolArgs"]) {
            let args = parse_embedded_json(args);
            if event.command.is_none() && tool_name == "bash" {
                event.command = args.get("command").and_then(|c| c.as_str()).map(str::to_string);
            }
            if event.file_path.is_none() {
                event.file_path = ["path", "file_path"]
                    .iter()
                    .find_map(|key| args.get(*key).and_then(|p| p.as_str()))
                    .map(str::to_string);
            }
            event.tool_input = Some(args);
        }

        if event.event_type == U::AfterTool {
            event.tool_output = raw.first_str(&["toolResult.textResultForLlm"]);
            let result_type = raw.first_str(&["toolResult.resultType"]);
            let failed = matches!(result_type.as_deref(), Some("failure" | "denied"));
            if event.error.is_none() && failed {
                event.error = event
                    .tool_output
                    .clone()
                    .or_else(|| result_type.clone());
            }
        }

        if !is_builtin_tool(&tool_name) {
            event.mcp = Some(McpInfo::new(COPILOT_PSEUDO_SERVER, tool_name.clone()));
        }
        event.tool_name = Some(tool_name);
    }
}
