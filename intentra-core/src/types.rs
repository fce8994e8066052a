//! Core domain types for intentra
//!
//! These types represent the normalized data model shared by every supported
//! AI coding tool.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Tool** | An AI coding assistant that fires hooks (Cursor, Claude Code, Gemini CLI, Copilot CLI, Windsurf) |
//! | **Hook** | A lifecycle callback; each invocation of intentra handles exactly one |
//! | **Event** | A hook payload normalized onto [`UnifiedEventType`] |
//! | **Session key** | The correlation identifier grouping events into one in-flight scan |
//! | **Scan** | The aggregate built from one terminated session and delivered once |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Tool
// ============================================

/// Supported AI coding tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Cursor,
    Claude,
    Gemini,
    Copilot,
    Windsurf,
    /// Any other tool string; events keep the caller's tool name
    Generic,
}

impl Tool {
    /// Every tool with a dedicated normalizer, plus the generic fallback
    pub const ALL: [Tool; 6] = [
        Tool::Cursor,
        Tool::Claude,
        Tool::Gemini,
        Tool::Copilot,
        Tool::Windsurf,
        Tool::Generic,
    ];

    /// Resolve a tool argument. Unrecognized names fall back to [`Tool::Generic`].
    pub fn parse(name: &str) -> Tool {
        match name.trim().to_ascii_lowercase().as_str() {
            "cursor" => Tool::Cursor,
            "claude" | "claude_code" | "claude-code" => Tool::Claude,
            "gemini" | "gemini-cli" => Tool::Gemini,
            "copilot" | "copilot-cli" | "github-copilot" => Tool::Copilot,
            "windsurf" | "cascade" => Tool::Windsurf,
            _ => Tool::Generic,
        }
    }

    /// Returns the identifier used in session keys and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Cursor => "cursor",
            Tool::Claude => "claude",
            Tool::Gemini => "gemini",
            Tool::Copilot => "copilot",
            Tool::Windsurf => "windsurf",
            Tool::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Unified event types
// ============================================

/// Tool-agnostic classification every native hook name maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifiedEventType {
    SessionStart,
    SessionEnd,
    BeforePrompt,
    AfterResponse,
    AfterThought,
    BeforeTool,
    AfterTool,
    BeforeFileRead,
    AfterFileRead,
    BeforeFileEdit,
    AfterFileEdit,
    BeforeShell,
    AfterShell,
    BeforeMcp,
    AfterMcp,
    BeforeModel,
    AfterModel,
    BeforeToolSelection,
    PermissionRequest,
    Notification,
    Stop,
    SubagentStart,
    SubagentStop,
    PreCompact,
    Error,
    ToolUseFailure,
    WorktreeSetup,
    /// Native name not in the tool's table. Buffered, never terminal.
    Unknown,
}

impl UnifiedEventType {
    pub const ALL: [UnifiedEventType; 28] = [
        UnifiedEventType::SessionStart,
        UnifiedEventType::SessionEnd,
        UnifiedEventType::BeforePrompt,
        UnifiedEventType::AfterResponse,
        UnifiedEventType::AfterThought,
        UnifiedEventType::BeforeTool,
        UnifiedEventType::AfterTool,
        UnifiedEventType::BeforeFileRead,
        UnifiedEventType::AfterFileRead,
        UnifiedEventType::BeforeFileEdit,
        UnifiedEventType::AfterFileEdit,
        UnifiedEventType::BeforeShell,
        UnifiedEventType::AfterShell,
        UnifiedEventType::BeforeMcp,
        UnifiedEventType::AfterMcp,
        UnifiedEventType::BeforeModel,
        UnifiedEventType::AfterModel,
        UnifiedEventType::BeforeToolSelection,
        UnifiedEventType::PermissionRequest,
        UnifiedEventType::Notification,
        UnifiedEventType::Stop,
        UnifiedEventType::SubagentStart,
        UnifiedEventType::SubagentStop,
        UnifiedEventType::PreCompact,
        UnifiedEventType::Error,
        UnifiedEventType::ToolUseFailure,
        UnifiedEventType::WorktreeSetup,
        UnifiedEventType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnifiedEventType::SessionStart => "session_start",
            UnifiedEventType::SessionEnd => "session_end",
            UnifiedEventType::BeforePrompt => "before_prompt",
            UnifiedEventType::AfterResponse => "after_response",
            UnifiedEventType::AfterThought => "after_thought",
            UnifiedEventType::BeforeTool => "before_tool",
            UnifiedEventType::AfterTool => "after_tool",
            UnifiedEventType::BeforeFileRead => "before_file_read",
            UnifiedEventType::AfterFileRead => "after_file_read",
            UnifiedEventType::BeforeFileEdit => "before_file_edit",
            UnifiedEventType::AfterFileEdit => "after_file_edit",
            UnifiedEventType::BeforeShell => "before_shell",
            UnifiedEventType::AfterShell => "after_shell",
            UnifiedEventType::BeforeMcp => "before_mcp",
            UnifiedEventType::AfterMcp => "after_mcp",
            UnifiedEventType::BeforeModel => "before_model",
            UnifiedEventType::AfterModel => "after_model",
            UnifiedEventType::BeforeToolSelection => "before_tool_selection",
            UnifiedEventType::PermissionRequest => "permission_request",
            UnifiedEventType::Notification => "notification",
            UnifiedEventType::Stop => "stop",
            UnifiedEventType::SubagentStart => "subagent_start",
            UnifiedEventType::SubagentStop => "subagent_stop",
            UnifiedEventType::PreCompact => "pre_compact",
            UnifiedEventType::Error => "error",
            UnifiedEventType::ToolUseFailure => "tool_use_failure",
            UnifiedEventType::WorktreeSetup => "worktree_setup",
            UnifiedEventType::Unknown => "unknown",
        }
    }

    /// Look up a unified tag by its snake_case name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == tag)
    }

    /// Completion of an "after-X" action, counted as one LLM call.
    pub fn is_llm_completion(&self) -> bool {
        matches!(
            self,
            UnifiedEventType::AfterResponse
                | UnifiedEventType::AfterThought
                | UnifiedEventType::AfterModel
                | UnifiedEventType::AfterTool
                | UnifiedEventType::AfterFileRead
                | UnifiedEventType::AfterFileEdit
                | UnifiedEventType::AfterShell
                | UnifiedEventType::AfterMcp
        )
    }

    /// Completion of an actual tool/file/shell/MCP execution.
    pub fn is_tool_execution(&self) -> bool {
        matches!(
            self,
            UnifiedEventType::AfterTool
                | UnifiedEventType::AfterFileRead
                | UnifiedEventType::AfterFileEdit
                | UnifiedEventType::AfterShell
                | UnifiedEventType::AfterMcp
        )
    }
}

impl std::fmt::Display for UnifiedEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Normalized event
// ============================================

/// Token counts for one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub thinking_tokens: u64,
}

/// MCP server/tool identity attached to an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpInfo {
    pub server_name: String,
    pub tool_name: String,
    /// URL with query string, fragment and credentials removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    /// Basename of the server launch command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_command: Option<String>,
    /// Truncated hash of the sanitized endpoint (URL or command)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_hash: Option<String>,
}

/// Context-window metadata carried by compaction events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    /// Context-window occupancy, clamped to 0..=100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_usage_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages_to_compact: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_first_compaction: Option<bool>,
}

/// A hook payload normalized onto the unified model.
///
/// Immutable once appended to its session buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Tool name as passed to the hook (preserved for generic tools)
    pub tool: String,
    /// Native hook name, e.g. `beforeSubmitPrompt`
    pub hook_type: String,
    pub event_type: UnifiedEventType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(with = "rfc3339_nanos")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub tokens: TokenCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<McpInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction: Option<CompactionInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_end_reason: Option<String>,
}

impl Event {
    /// Create an event with only the identifying fields populated.
    pub fn new(tool: &str, hook_type: &str, event_type: UnifiedEventType) -> Self {
        Self {
            tool: tool.to_string(),
            hook_type: hook_type.to_string(),
            event_type,
            conversation_id: None,
            session_id: None,
            generation_id: None,
            model: None,
            timestamp: Utc::now(),
            tokens: TokenCounts::default(),
            duration_ms: None,
            tool_name: None,
            tool_input: None,
            tool_output: None,
            command: None,
            command_output: None,
            file_path: None,
            cwd: None,
            prompt: None,
            response: None,
            thought: None,
            mcp: None,
            compaction: None,
            error: None,
            session_end_reason: None,
        }
    }

    /// Identifier shared by every event of one conversation:
    /// conversation id, else session id.
    pub fn base_id(&self) -> Option<&str> {
        self.conversation_id
            .as_deref()
            .or(self.session_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

// ============================================
// Scan
// ============================================

/// Per-(server, tool, endpoint) MCP usage inside one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolUsage {
    pub server_name: String,
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_hash: Option<String>,
    pub call_count: u32,
    pub total_duration_ms: u64,
    pub error_count: u32,
    pub estimated_cost: f64,
}

/// Modification statistics for one file inside one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileModification {
    pub path: String,
    pub edit_count: u32,
    /// Approximation derived from output-token volume
    pub lines_added: u64,
    /// False once any after-edit signal follows a before-edit signal for this path
    pub is_new_file: bool,
}

/// Aggregated telemetry for one terminated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    #[serde(rename = "scan_id")]
    pub id: String,
    pub tool: String,
    pub device_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(with = "rfc3339_nanos")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "rfc3339_nanos")]
    pub ended_at: DateTime<Utc>,
    pub duration_ms: i64,

    pub llm_call_count: u32,
    pub tool_call_count: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub thinking_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,

    pub events: Vec<Event>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_tool_usage: Vec<McpToolUsage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_end_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_duration_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_modified: Vec<FileModification>,
}

/// RFC 3339 timestamps with nanosecond precision, always UTC (`Z`).
pub mod rfc3339_nanos {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
