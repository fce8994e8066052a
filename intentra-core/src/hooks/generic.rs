//! Fallback for tools without a dedicated normalizer.
//!
//! Hook names are expected to already be unified tags (`before_prompt`,
//! `after_tool`, `stop`, ...), which lets new integrations report events
//! without a code change.

use super::mcp::from_prefixed_name;
use super::raw::RawEvent;
use super::ToolNormalizer;
use crate::types::{Event, Tool, UnifiedEventType};

pub struct GenericNormalizer;

impl ToolNormalizer for GenericNormalizer {
    fn tool(&self) -> Tool {
        Tool::Generic
    }

    fn event_names(&self) -> &'static [(&'static str, UnifiedEventType)] {
        &[]
    }

    fn normalize_event_type(&self, native_name: &str) -> UnifiedEventType {
        UnifiedEventType::from_tag(native_name).unwrap_or(UnifiedEventType::Unknown)
    }

    fn extract(&self, event: &mut Event, raw: &RawEvent) {
        event.response = raw.first_str(&["response", "text"]);
        event.thought = raw.first_str(&["thought"]);
        if event.mcp.is_none() {
            event.mcp = from_prefixed_name(event.tool_name.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_unified_tags() {
        let n = GenericNormalizer;
        for event_type in UnifiedEventType::ALL {
            assert_eq!(n.normalize_event_type(event_type.as_str()), event_type);
        }
        assert_eq!(n.normalize_event_type("Stop"), UnifiedEventType::Unknown);
        assert_eq!(n.normalize_event_type("afterShellExecution"), UnifiedEventType::Unknown);
    }

    #[test]
    fn test_extracts_response_and_mcp() {
        let raw = RawEvent::decode(
            r#"{"session_id":"s","response":"abcdefgh","tool_name":"mcp__notion__search"}"#,
        )
        .unwrap();
        let mut event = Event::new("aider", "after_response", UnifiedEventType::AfterResponse);
        crate::hooks::fields::extract_common(&mut event, &raw);
        n_extract(&mut event, &raw);
        assert_eq!(event.response.as_deref(), Some("abcdefgh"));
        assert_eq!(event.mcp.unwrap().server_name, "notion");
    }

    fn n_extract(event: &mut Event, raw: &RawEvent) {
        GenericNormalizer.extract(event, raw);
    }
}
