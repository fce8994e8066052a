//! Per-server MCP usage attribution

use std::collections::BTreeMap;

use crate::types::{Event, McpToolUsage, UnifiedEventType};

fn is_mcp_call(event: &Event) -> bool {
    event.mcp.is_some()
        && matches!(
            event.event_type,
            UnifiedEventType::AfterMcp
                | UnifiedEventType::AfterTool
                | UnifiedEventType::ToolUseFailure
        )
}

/// Aggregate completed MCP calls by (server, tool, endpoint hash).
///
/// Each key's cost is its share of `total_cost` by duration, relative to
/// the summed duration of every event in the session. Without duration data
/// the share is zero, so the per-key costs never exceed the total.
pub fn aggregate(events: &[Event], total_cost: f64) -> Vec<McpToolUsage> {
    let total_duration = events
        .iter()
        .filter_map(|e| e.duration_ms)
        .fold(0u64, u64::saturating_add);

    let mut usage: BTreeMap<(String, String, Option<String>), McpToolUsage> = BTreeMap::new();
    for event in events.iter().filter(|e| is_mcp_call(e)) {
        let Some(mcp) = &event.mcp else {
            continue;
        };
        let key = (
            mcp.server_name.clone(),
            mcp.tool_name.clone(),
            mcp.endpoint_hash.clone(),
        );
        let entry = usage.entry(key).or_insert_with(|| McpToolUsage {
            server_name: mcp.server_name.clone(),
            tool_name: mcp.tool_name.clone(),
            endpoint_hash: mcp.endpoint_hash.clone(),
            call_count: 0,
            total_duration_ms: 0,
            error_count: 0,
            estimated_cost: 0.0,
        });

        entry.call_count += 1;
        entry.total_duration_ms = entry
            .total_duration_ms
            .saturating_add(event.duration_ms.unwrap_or(0));
        if event.error.is_some() || event.event_type == UnifiedEventType::ToolUseFailure {
            entry.error_count += 1;
        }
    }

    usage
        .into_values()
        .map(|mut entry| {
            entry.estimated_cost = if total_duration > 0 {
                total_cost * entry.total_duration_ms as f64 / total_duration as f64
            } else {
                0.0
            };
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::McpInfo;

    fn mcp_event(
        event_type: UnifiedEventType,
        server: &str,
        tool: &str,
        duration: Option<u64>,
    ) -> Event {
        let mut event = Event::new("claude", "PostToolUse", event_type);
        event.mcp = Some(McpInfo::new(server, tool));
        event.duration_ms = duration;
        event
    }

    #[test]
    fn test_groups_by_server_tool_and_endpoint() {
        let mut remote = mcp_event(UnifiedEventType::AfterMcp, "github", "get_issue", Some(100));
        remote.mcp = remote.mcp.map(|m| m.with_url("https://a.example.com/mcp"));

        let events = vec![
            mcp_event(UnifiedEventType::AfterTool, "github", "get_issue", Some(100)),
            mcp_event(UnifiedEventType::AfterTool, "github", "get_issue", Some(300)),
            remote,
            mcp_event(UnifiedEventType::ToolUseFailure, "linear", "search", Some(50)),
            // Before-phase events are not calls
            mcp_event(UnifiedEventType::BeforeTool, "github", "get_issue", None),
        ];

        let usage = aggregate(&events, 1.0);
        assert_eq!(usage.len(), 3);

        let plain = usage
            .iter()
            .find(|u| u.server_name == "github" && u.endpoint_hash.is_none())
            .unwrap();
        assert_eq!(plain.call_count, 2);
        assert_eq!(plain.total_duration_ms, 400);

        let linear = usage.iter().find(|u| u.server_name == "linear").unwrap();
        assert_eq!(linear.error_count, 1);
    }

    #[test]
    fn test_cost_share_never_exceeds_total() {
        let mut events = vec![
            mcp_event(UnifiedEventType::AfterMcp, "fetch", "fetch", Some(250)),
            mcp_event(UnifiedEventType::AfterMcp, "memory", "read_graph", Some(250)),
        ];
        let mut shell = Event::new("cursor", "afterShellExecution", UnifiedEventType::AfterShell);
        shell.duration_ms = Some(500);
        events.push(shell);

        let usage = aggregate(&events, 2.0);
        let sum: f64 = usage.iter().map(|u| u.estimated_cost).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(sum <= 2.0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let events = vec![
            mcp_event(UnifiedEventType::AfterMcp, "fetch", "fetch", Some(u64::MAX)),
            mcp_event(UnifiedEventType::AfterMcp, "fetch", "fetch", Some(10)),
        ];
        let usage = aggregate(&events, 1.0);
        assert_eq!(usage[0].call_count, 2);
        assert_eq!(usage[0].total_duration_ms, u64::MAX);
        assert!(usage[0].estimated_cost <= 1.0);
    }

    #[test]
    fn test_no_duration_means_zero_cost() {
        let events = vec![mcp_event(UnifiedEventType::AfterMcp, "fetch", "fetch", None)];
        let usage = aggregate(&events, 5.0);
        assert_eq!(usage[0].call_count, 1);
        assert_eq!(usage[0].estimated_cost, 0.0);
    }
}
