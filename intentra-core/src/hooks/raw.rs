//! Raw hook payload decoding
//!
//! A hook invocation receives exactly one line of JSON on stdin. The shape is
//! tool-specific, so it is kept as an untyped field map and queried by the
//! normalizers through the lookup helpers below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped field map for one hook payload.
///
/// Lives for a single invocation; persisted verbatim next to the normalized
/// event in the session buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Map<String, Value>);

impl RawEvent {
    /// Decode one stdin line.
    ///
    /// Returns `None` for empty input, malformed JSON and non-object values:
    /// a hook must never surface a parse error to the host tool.
    pub fn decode(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => Some(RawEvent(map)),
            Ok(_) => {
                tracing::debug!("Dropping non-object hook payload");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "Dropping malformed hook payload");
                None
            }
        }
    }

    /// Look up a value by dotted path, e.g. `tool_info.file_path`.
    ///
    /// Numeric segments index into arrays (`workspace_roots.0`).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// First non-empty string among alternate field spellings.
    pub fn first_str(&self, paths: &[&str]) -> Option<String> {
        paths.iter().find_map(|path| match self.lookup(path)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
    }

    /// First non-negative integer; accepts numbers and numeric strings.
    pub fn first_u64(&self, paths: &[&str]) -> Option<u64> {
        paths.iter().find_map(|path| value_as_u64(self.lookup(path)?))
    }

    pub fn first_f64(&self, paths: &[&str]) -> Option<f64> {
        paths.iter().find_map(|path| match self.lookup(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
    }

    pub fn first_bool(&self, paths: &[&str]) -> Option<bool> {
        paths.iter().find_map(|path| match self.lookup(path)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse::<bool>().ok(),
            _ => None,
        })
    }

    /// First present value that is not null.
    pub fn first_value(&self, paths: &[&str]) -> Option<&Value> {
        paths
            .iter()
            .find_map(|path| self.lookup(path).filter(|v| !v.is_null()))
    }
}

pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Render a JSON value as text: strings verbatim, everything else as JSON.
pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(RawEvent::decode("").is_none());
        assert!(RawEvent::decode("   \n").is_none());
        assert!(RawEvent::decode("not json").is_none());
        assert!(RawEvent::decode("[1, 2, 3]").is_none());
        assert!(RawEvent::decode("\"stop\"").is_none());
        assert!(RawEvent::decode("{\"conversation_id\":\"c1\"}").is_some());
    }

    #[test]
    fn test_first_str_skips_empty_spellings() {
        let raw = RawEvent::decode(r#"{"conversation_id":"","conversationId":"c2"}"#).unwrap();
        assert_eq!(
            raw.first_str(&["conversation_id", "conversationId"]),
            Some("c2".to_string())
        );
    }

    #[test]
    fn test_lookup_nested_paths() {
        let raw = RawEvent::decode(
            r#"{"tool_info":{"file_path":"/src/a.rs"},"workspace_roots":["/repo"]}"#,
        )
        .unwrap();
        assert_eq!(
            raw.first_str(&["tool_info.file_path"]),
            Some("/src/a.rs".to_string())
        );
        assert_eq!(
            raw.first_str(&["workspace_roots.0"]),
            Some("/repo".to_string())
        );
        assert!(raw.lookup("tool_info.missing.deeper").is_none());
    }

    #[test]
    fn test_numeric_coercions() {
        let raw = RawEvent::decode(r#"{"a":"42","b":12.9,"c":-3,"d":"true"}"#).unwrap();
        assert_eq!(raw.first_u64(&["a"]), Some(42));
        assert_eq!(raw.first_u64(&["b"]), Some(12));
        assert_eq!(raw.first_u64(&["c"]), None);
        assert_eq!(raw.first_bool(&["d"]), Some(true));
        assert_eq!(raw.first_f64(&["missing", "b"]), Some(12.9));
    }
}
