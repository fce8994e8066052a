//! Hook normalization
//!
//! Every supported tool fires hooks with its own event names and payload
//! shapes. A [`ToolNormalizer`] per tool maps native names onto
//! [`UnifiedEventType`] and pulls the unified fields out of the payload.
//!
//! ## Supported Tools
//!
//! | Tool | Module | Terminal hook |
//! |------|--------|---------------|
//! | Cursor | [`cursor`] | `stop` |
//! | Claude Code | [`claude`] | `Stop` |
//! | Gemini CLI | [`gemini`] | `AfterAgent` |
//! | GitHub Copilot CLI | [`copilot`] | `sessionEnd` |
//! | Windsurf | [`windsurf`] | `post_cascade_response` (proxy) |
//! | anything else | [`generic`] | `stop` |
//!
//! The [`NormalizerRegistry`] is built explicitly and handed to the pipeline;
//! there is no global registration step.

pub mod claude;
pub mod copilot;
pub mod cursor;
pub mod fields;
pub mod gemini;
pub mod generic;
pub mod mcp;
pub mod raw;
pub mod windsurf;

pub use fields::is_edit_tool;
pub use raw::RawEvent;

use std::collections::HashMap;

use crate::types::{Event, Tool, UnifiedEventType};

/// Trait implemented by every tool normalizer.
///
/// ## Example
///
/// ```rust,ignore
/// struct MyNormalizer;
///
/// impl ToolNormalizer for MyNormalizer {
///     fn tool(&self) -> Tool { Tool::Generic }
///     fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)] { &[] }
///     fn extract(&self, _event: &mut Event, _raw: &RawEvent) {}
/// }
/// ```
pub trait ToolNormalizer: Send + Sync {
    /// Which tool this normalizer handles
    fn tool(&self) -> Tool;

    /// Native hook name → unified type table
    fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)];

    /// Pure table lookup; names missing from the table are `Unknown`.
    fn normalize_event_type(&self, native_name: &str) -> UnifiedEventType {
        self.event_names()
            .iter()
            .find(|(name, _)| *name == native_name)
            .map(|(_, event_type)| *event_type)
            .unwrap_or(UnifiedEventType::Unknown)
    }

    /// Tool-specific extraction, run after [`fields::extract_common`].
    fn extract(&self, event: &mut Event, raw: &RawEvent);
}

/// Create all available normalizers, including the generic fallback.
pub fn create_all_normalizers() -> Vec<Box<dyn ToolNormalizer>> {
    vec![
        Box::new(cursor::CursorNormalizer),
        Box::new(claude::ClaudeNormalizer),
        Box::new(gemini::GeminiNormalizer),
        Box::new(copilot::CopilotNormalizer),
        Box::new(windsurf::WindsurfNormalizer),
        Box::new(generic::GenericNormalizer),
    ]
}

/// Immutable lookup from tool to normalizer.
pub struct NormalizerRegistry {
    normalizers: HashMap<Tool, Box<dyn ToolNormalizer>>,
    fallback: generic::GenericNormalizer,
}

impl NormalizerRegistry {
    /// Registry with every tool registered.
    pub fn new() -> Self {
        let normalizers = create_all_normalizers()
            .into_iter()
            .map(|n| (n.tool(), n))
            .collect();
        Self {
            normalizers,
            fallback: generic::GenericNormalizer,
        }
    }

    /// Normalizer for a tool; unregistered tools use the generic fallback.
    pub fn get(&self, tool: Tool) -> &dyn ToolNormalizer {
        self.normalizers
            .get(&tool)
            .map(|n| n.as_ref())
            .unwrap_or(&self.fallback)
    }

    /// Map a native hook name for the given tool argument.
    pub fn normalize_event_type(&self, tool_name: &str, native_name: &str) -> UnifiedEventType {
        self.get(Tool::parse(tool_name))
            .normalize_event_type(native_name)
    }

    /// Build the normalized event for one hook payload.
    pub fn normalize(&self, tool_name: &str, native_name: &str, raw: &RawEvent) -> Event {
        let tool = Tool::parse(tool_name);
        let normalizer = self.get(tool);
        let event_type = normalizer.normalize_event_type(native_name);

        let mut event = Event::new(&event_tool_name(tool, tool_name), native_name, event_type);
        fields::extract_common(&mut event, raw);
        normalizer.extract(&mut event, raw);
        fields::estimate_missing_tokens(&mut event, raw);

        if event_type == UnifiedEventType::Unknown {
            tracing::debug!(
                tool = %event.tool,
                hook = native_name,
                "Unrecognized hook name, buffering as unknown"
            );
        }

        event
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic tools keep the caller's tool name so sessions stay distinct.
fn event_tool_name(tool: Tool, tool_name: &str) -> String {
    let name = tool_name.trim().to_ascii_lowercase();
    if tool == Tool::Generic && !name.is_empty() {
        name
    } else {
        tool.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tool_registered() {
        let registry = NormalizerRegistry::new();
        for tool in Tool::ALL {
            assert_eq!(registry.get(tool).tool(), tool);
        }
    }

    #[test]
    fn test_unknown_names_map_to_unknown_for_every_tool() {
        let registry = NormalizerRegistry::new();
        for tool in Tool::ALL {
            for name in ["", "definitelyNotAHook", "STOP ", "beforeEverything"] {
                assert_eq!(
                    registry.normalize_event_type(tool.as_str(), name),
                    UnifiedEventType::Unknown,
                    "{tool} / {name:?}"
                );
            }
        }
    }

    #[test]
    fn test_tables_never_map_to_unknown() {
        for normalizer in create_all_normalizers() {
            for (name, event_type) in normalizer.event_names() {
                assert_ne!(
                    *event_type,
                    UnifiedEventType::Unknown,
                    "{} maps {name} to unknown",
                    normalizer.tool()
                );
            }
        }
    }

    #[test]
    fn test_generic_tool_keeps_caller_name() {
        let registry = NormalizerRegistry::new();
        let raw = RawEvent::decode(r#"{"session_id":"s1"}"#).unwrap();
        let event = registry.normalize("Aider", "stop", &raw);
        assert_eq!(event.tool, "aider");
        assert_eq!(event.event_type, UnifiedEventType::Stop);

        let event = registry.normalize("claude", "Stop", &raw);
        assert_eq!(event.tool, "claude");
    }

    #[test]
    fn test_unknown_event_is_still_normalized() {
        let registry = NormalizerRegistry::new();
        let raw = RawEvent::decode(r#"{"conversation_id":"c1","model":"gpt-5"}"#).unwrap();
        let event = registry.normalize("cursor", "afterSomethingNew", &raw);
        assert_eq!(event.event_type, UnifiedEventType::Unknown);
        assert_eq!(event.hook_type, "afterSomethingNew");
        assert_eq!(event.conversation_id.as_deref(), Some("c1"));
        assert_eq!(event.model.as_deref(), Some("gpt-5"));
    }
}
