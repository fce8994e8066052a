//! Session correlation keys

use std::fmt;

use crate::hash::truncated_hash;
use crate::types::Event;

/// Identifies one in-flight session: `<tool>:<base id>`.
///
/// The base id is the conversation id, else the session id, else
/// `<device id>-default` for tools that send neither.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    tool: String,
    base_id: String,
}

impl SessionKey {
    pub fn new(tool: impl Into<String>, base_id: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            base_id: base_id.into(),
        }
    }

    /// Key for a normalized event.
    pub fn for_event(event: &Event, device_id: &str) -> Self {
        let base_id = match event.base_id() {
            Some(id) => id.to_string(),
            None => format!("{device_id}-default"),
        };
        Self::new(event.tool.clone(), base_id)
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Same base id under another tool.
    pub fn with_tool(&self, tool: &str) -> Self {
        Self::new(tool, self.base_id.clone())
    }

    /// 16 hex chars naming this key's files on disk.
    pub fn file_suffix(&self) -> String {
        truncated_hash(&self.to_string(), 8)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tool, self.base_id)
    }
}
