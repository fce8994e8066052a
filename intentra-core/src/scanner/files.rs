//! File modification statistics

use std::collections::BTreeMap;

use crate::hooks::is_edit_tool;
use crate::types::{Event, FileModification, UnifiedEventType};

/// Output tokens per approximated added line
const TOKENS_PER_LINE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditPhase {
    Before,
    After,
}

fn edit_phase(event: &Event) -> Option<EditPhase> {
    match event.event_type {
        UnifiedEventType::BeforeFileEdit => Some(EditPhase::Before),
        UnifiedEventType::AfterFileEdit => Some(EditPhase::After),
        UnifiedEventType::BeforeTool | UnifiedEventType::AfterTool
            if event.tool_name.as_deref().is_some_and(is_edit_tool) =>
        {
            if event.event_type == UnifiedEventType::BeforeTool {
                Some(EditPhase::Before)
            } else {
                Some(EditPhase::After)
            }
        }
        _ => None,
    }
}

/// Canonical form of a reported path: trimmed, `/` separators, no leading
/// `./`, no repeated slashes.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.trim().replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }
    normalized
}

#[derive(Default)]
struct PathState {
    seen_before: bool,
    edit_count: u32,
    lines_added: u64,
    is_new_file: bool,
}

/// Aggregate after-edit signals by normalized path.
///
/// A file counts as new only if no before-edit signal for it preceded any of
/// its after-edit signals.
pub fn aggregate(events: &[Event]) -> Vec<FileModification> {
    let mut paths: BTreeMap<String, PathState> = BTreeMap::new();

    for event in events {
        let Some(phase) = edit_phase(event) else {
            continue;
        };
        let Some(path) = event.file_path.as_deref().map(normalize_path) else {
            continue;
        };
        if path.is_empty() {
            continue;
        }

        let state = paths.entry(path).or_insert_with(|| PathState {
            is_new_file: true,
            ..Default::default()
        });
        match phase {
            EditPhase::Before => state.seen_before = true,
            EditPhase::After => {
                state.edit_count += 1;
                let lines = (event.tokens.output_tokens / TOKENS_PER_LINE).max(1);
                state.lines_added = state.lines_added.saturating_add(lines);
                if state.seen_before {
                    state.is_new_file = false;
                }
            }
        }
    }

    paths
        .into_iter()
        .filter(|(_, state)| state.edit_count > 0)
        .map(|(path, state)| FileModification {
            path,
            edit_count: state.edit_count,
            lines_added: state.lines_added,
            is_new_file: state.is_new_file,
        })
        .collect()
}
