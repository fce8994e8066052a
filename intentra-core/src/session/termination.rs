//! Per-tool session termination rules

use crate::types::{Tool, UnifiedEventType};

/// What to do with an event once it has been normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Append to the session buffer.
    Buffer,
    /// Append, then finalize the session into a scan.
    Terminal,
    /// Patch session-end data onto the last delivered scan.
    SessionEndMetadata,
}

/// Which unified type ends a tool's session, and which carries late
/// session-end metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    pub terminal: UnifiedEventType,
    pub session_end_metadata: Option<UnifiedEventType>,
}

impl TerminationPolicy {
    pub fn classify(&self, event_type: UnifiedEventType) -> Disposition {
        if event_type == UnifiedEventType::Unknown {
            Disposition::Buffer
        } else if event_type == self.terminal {
            Disposition::Terminal
        } else if Some(event_type) == self.session_end_metadata {
            Disposition::SessionEndMetadata
        } else {
            Disposition::Buffer
        }
    }
}

/// Termination policy for a tool.
///
/// Copilot only reliably fires `sessionEnd`, so that is its terminal event.
/// Windsurf has no stop hook; `post_cascade_response` stands in, so a session
/// that keeps going after its last observed response never produces a scan.
pub fn policy_for(tool: Tool) -> TerminationPolicy {
    use UnifiedEventType as U;

    match tool {
        Tool::Copilot => TerminationPolicy {
            terminal: U::SessionEnd,
            session_end_metadata: None,
        },
        Tool::Windsurf => TerminationPolicy {
            terminal: U::AfterResponse,
            session_end_metadata: None,
        },
        Tool::Cursor | Tool::Claude | Tool::Gemini | Tool::Generic => TerminationPolicy {
            terminal: U::Stop,
            session_end_metadata: Some(U::SessionEnd),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_terminal_type_per_tool() {
        for tool in Tool::ALL {
            let policy = policy_for(tool);
            let terminal: Vec<_> = UnifiedEventType::ALL
                .into_iter()
                .filter(|t| policy.classify(*t) == Disposition::Terminal)
                .collect();
            assert_eq!(terminal.len(), 1, "{tool}: {terminal:?}");
        }
    }

    #[test]
    fn test_unknown_is_never_terminal() {
        for tool in Tool::ALL {
            assert_eq!(
                policy_for(tool).classify(UnifiedEventType::Unknown),
                Disposition::Buffer
            );
        }
    }

    #[test]
    fn test_session_end_handling() {
        assert_eq!(
            policy_for(Tool::Cursor).classify(UnifiedEventType::SessionEnd),
            Disposition::SessionEndMetadata
        );
        assert_eq!(
            policy_for(Tool::Copilot).classify(UnifiedEventType::SessionEnd),
            Disposition::Terminal
        );
        assert_eq!(
            policy_for(Tool::Windsurf).classify(UnifiedEventType::SessionEnd),
            Disposition::Buffer
        );
        assert_eq!(
            policy_for(Tool::Windsurf).classify(UnifiedEventType::AfterResponse),
            Disposition::Terminal
        );
        assert_eq!(
            policy_for(Tool::Cursor).classify(UnifiedEventType::AfterResponse),
            Disposition::Buffer
        );
    }
}
