//! Folding a drained session into a [`Scan`]

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use super::repo::RepoInfo;
use super::{files, mcp_usage, pricing};
use crate::hash::truncated_hash;
use crate::types::{Event, Scan, Tool, UnifiedEventType};

/// Pre-compaction events kept in a scan's event list. Later ones still count
/// toward the totals.
pub const MAX_RETAINED_COMPACTIONS: usize = 10;

/// Deterministic scan id: first 16 bytes of SHA-256 over the base id and the
/// start time, hex encoded.
pub fn scan_id(base_id: &str, started_at: &DateTime<Utc>) -> String {
    let started = started_at.to_rfc3339_opts(SecondsFormat::Nanos, true);
    truncated_hash(&format!("{base_id}{started}"), 16)
}

/// Builds scans for one device.
#[derive(Debug, Clone)]
pub struct ScanBuilder {
    device_id: String,
    collect_repo: bool,
}

impl ScanBuilder {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            collect_repo: true,
        }
    }

    /// Skip the `git` queries for repository metadata.
    pub fn without_repo(mut self) -> Self {
        self.collect_repo = false;
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Aggregate a session's events, in buffer order. `None` when empty.
    pub fn build(&self, tool: &str, events: Vec<Event>) -> Option<Scan> {
        let first = events.first()?;
        let last = events.last()?;
        let started_at = first.timestamp;
        let ended_at = last.timestamp;

        let conversation_id = first_present(&events, |e| e.conversation_id.as_deref());
        let session_id = first_present(&events, |e| e.session_id.as_deref());
        let generation_id = first_present(&events, |e| e.generation_id.as_deref());
        let model = first_present(&events, |e| e.model.as_deref());

        let base_id = conversation_id
            .clone()
            .or_else(|| session_id.clone())
            .unwrap_or_else(|| format!("{}-default", self.device_id));

        let mut input_tokens = 0u64;
        let mut output_tokens = 0u64;
        let mut thinking_tokens = 0u64;
        let mut llm_call_count = 0u32;
        let mut tool_call_count = 0u32;
        for event in &events {
            input_tokens = input_tokens.saturating_add(event.tokens.input_tokens);
            output_tokens = output_tokens.saturating_add(event.tokens.output_tokens);
            thinking_tokens = thinking_tokens.saturating_add(event.tokens.thinking_tokens);
            if event.event_type.is_llm_completion() {
                llm_call_count += 1;
            }
            if event.event_type.is_tool_execution() {
                tool_call_count += 1;
            }
        }
        let total_tokens = input_tokens
            .saturating_add(output_tokens)
            .saturating_add(thinking_tokens);
        let estimated_cost =
            pricing::estimate_cost(total_tokens, model.as_deref(), Tool::parse(tool));

        let mcp_tool_usage = mcp_usage::aggregate(&events, estimated_cost);
        let files_modified = files::aggregate(&events);

        let session_end = events
            .iter()
            .rev()
            .find(|e| e.event_type == UnifiedEventType::SessionEnd);
        let session_end_reason = session_end.and_then(|e| e.session_end_reason.clone());
        let session_duration_ms = session_end.and_then(|e| e.duration_ms);

        let repo = match first_present(&events, |e| e.cwd.as_deref()) {
            Some(cwd) if self.collect_repo => RepoInfo::collect(Path::new(&cwd)),
            _ => RepoInfo::default(),
        };

        Some(Scan {
            id: scan_id(&base_id, &started_at),
            tool: tool.to_string(),
            device_id: self.device_id.clone(),
            conversation_id,
            session_id,
            generation_id,
            model,
            started_at,
            ended_at,
            duration_ms: (ended_at - started_at).num_milliseconds(),
            llm_call_count,
            tool_call_count,
            input_tokens,
            output_tokens,
            thinking_tokens,
            total_tokens,
            estimated_cost,
            events: cap_compactions(events),
            mcp_tool_usage,
            session_end_reason,
            session_duration_ms,
            repo_name: repo.name,
            repo_url_hash: repo.url_hash,
            branch_name: repo.branch,
            files_modified,
        })
    }
}

fn first_present<F>(events: &[Event], field: F) -> Option<String>
where
    F: Fn(&Event) -> Option<&str>,
{
    events
        .iter()
        .filter_map(field)
        .find(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Drop pre-compaction events beyond [`MAX_RETAINED_COMPACTIONS`].
fn cap_compactions(events: Vec<Event>) -> Vec<Event> {
    let mut kept = 0usize;
    let total = events.len();
    let capped: Vec<Event> = events
        .into_iter()
        .filter(|e| {
            if e.event_type != UnifiedEventType::PreCompact {
                return true;
            }
            kept += 1;
            kept <= MAX_RETAINED_COMPACTIONS
        })
        .collect();

    if capped.len() < total {
        tracing::debug!(dropped = total - capped.len(), "Capped pre-compaction events");
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_689_600 + secs, 0).unwrap()
    }

    fn event(event_type: UnifiedEventType, secs: i64) -> Event {
        let mut event = Event::new("cursor", event_type.as_str(), event_type);
        event.conversation_id = Some("c1".to_string());
        event.timestamp = at(secs);
        event
    }

    fn builder() -> ScanBuilder {
        ScanBuilder::new("device-1").without_repo()
    }

    #[test]
    fn test_empty_session_builds_nothing() {
        assert!(builder().build("cursor", Vec::new()).is_none());
    }

    #[test]
    fn test_totals_and_counts() {
        let mut prompt = event(UnifiedEventType::BeforePrompt, 0);
        prompt.tokens.input_tokens = 100;
        prompt.model = Some("".to_string());
        let mut thought = event(UnifiedEventType::AfterThought, 2);
        thought.tokens.thinking_tokens = 50;
        thought.model = Some("claude-sonnet-4-5".to_string());
        let mut shell = event(UnifiedEventType::AfterShell, 3);
        shell.tokens.output_tokens = 10;
        let mut response = event(UnifiedEventType::AfterResponse, 5);
        response.tokens.output_tokens = 840;
        let stop = event(UnifiedEventType::Stop, 6);

        let scan = builder()
            .build("cursor", vec![prompt, thought, shell, response, stop])
            .unwrap();

        assert_eq!(scan.input_tokens, 100);
        assert_eq!(scan.output_tokens, 850);
        assert_eq!(scan.thinking_tokens, 50);
        assert_eq!(scan.total_tokens, 1000);
        assert_eq!(scan.llm_call_count, 3);
        assert_eq!(scan.tool_call_count, 1);
        assert_eq!(scan.model.as_deref(), Some("claude-sonnet-4-5"));
        assert!((scan.estimated_cost - 0.009).abs() < 1e-12);
        assert_eq!(scan.duration_ms, 6000);
        assert_eq!(scan.started_at, at(0));
        assert_eq!(scan.ended_at, at(6));
        assert_eq!(scan.device_id, "device-1");
        assert_eq!(scan.events.len(), 5);
    }

    #[test]
    fn test_scan_id_is_deterministic() {
        let a = scan_id("c1", &at(0));
        assert_eq!(a.len(), 32);
        assert_eq!(a, scan_id("c1", &at(0)));
        assert_ne!(a, scan_id("c1", &(at(0) + Duration::nanoseconds(1))));
        assert_ne!(a, scan_id("c2", &at(0)));

        let events = vec![
            event(UnifiedEventType::BeforePrompt, 0),
            event(UnifiedEventType::Stop, 1),
        ];
        let scan = builder().build("cursor", events).unwrap();
        assert_eq!(scan.id, a);
    }

    #[test]
    fn test_compaction_storm_is_capped_after_totals() {
        let mut events = vec![event(UnifiedEventType::BeforePrompt, 0)];
        for i in 0..15 {
            let mut compact = event(UnifiedEventType::PreCompact, i + 1);
            compact.tokens.input_tokens = 10;
            events.push(compact);
        }
        events.push(event(UnifiedEventType::Stop, 20));

        let scan = builder().build("claude", events).unwrap();
        let retained = scan
            .events
            .iter()
            .filter(|e| e.event_type == UnifiedEventType::PreCompact)
            .count();
        assert_eq!(retained, MAX_RETAINED_COMPACTIONS);
        assert_eq!(scan.events.len(), 12);
        assert_eq!(scan.input_tokens, 150);
        assert_eq!(scan.events.last().unwrap().event_type, UnifiedEventType::Stop);
    }

    #[test]
    fn test_huge_token_counts_saturate() {
        let mut prompt = event(UnifiedEventType::BeforePrompt, 0);
        prompt.tokens.input_tokens = u64::MAX;
        let mut stop = event(UnifiedEventType::Stop, 1);
        stop.tokens.input_tokens = 5;
        stop.tokens.output_tokens = 7;

        let scan = builder().build("claude", vec![prompt, stop]).unwrap();
        assert_eq!(scan.input_tokens, u64::MAX);
        assert_eq!(scan.output_tokens, 7);
        assert_eq!(scan.total_tokens, u64::MAX);
        assert!(scan.estimated_cost.is_finite());
    }

    #[test]
    fn test_session_end_fields() {
        let mut end = event(UnifiedEventType::SessionEnd, 9);
        end.session_end_reason = Some("user_close".to_string());
        end.duration_ms = Some(90_000);

        let scan = builder()
            .build("copilot", vec![event(UnifiedEventType::BeforePrompt, 0), end])
            .unwrap();
        assert_eq!(scan.session_end_reason.as_deref(), Some("user_close"));
        assert_eq!(scan.session_duration_ms, Some(90_000));
    }

    #[test]
    fn test_base_id_falls_back_to_device() {
        let mut prompt = event(UnifiedEventType::BeforePrompt, 0);
        prompt.conversation_id = None;
        let mut end = event(UnifiedEventType::SessionEnd, 1);
        end.conversation_id = None;

        let scan = builder().build("copilot", vec![prompt, end]).unwrap();
        assert_eq!(scan.id, scan_id("device-1-default", &at(0)));
        assert!(scan.conversation_id.is_none());
    }
}
