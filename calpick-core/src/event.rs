//! Concrete event occurrences as supplied by the feed import layer.
//!
//! Occurrences are read-only snapshots. Fields mirror what external
//! producers actually send: every field is optional and timestamps are kept
//! as raw strings until a component needs to compare them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event_time::EventTimeState;

/// Type key used when an occurrence has neither a title nor a summary.
pub const UNTITLED_TYPE: &str = "(No title)";

/// Prefix for identities synthesized from occurrence content.
const SYNTHETIC_ID_PREFIX: &str = "syn-";

/// A single calendar occurrence (provider-neutral).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOccurrence {
    /// Source-provided unique id (UID, provider event id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Secondary display name, used when `title` is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl EventOccurrence {
    pub fn new(id: Option<&str>, title: &str, start: Option<&str>) -> Self {
        EventOccurrence {
            id: id.map(String::from),
            title: Some(title.to_string()),
            start: start.map(String::from),
            ..Default::default()
        }
    }

    /// The recurring event type this occurrence belongs to.
    ///
    /// Title, then summary, then the literal [`UNTITLED_TYPE`] placeholder.
    pub fn type_key(&self) -> &str {
        non_empty(self.title.as_deref())
            .or_else(|| non_empty(self.summary.as_deref()))
            .unwrap_or(UNTITLED_TYPE)
    }

    pub fn start_state(&self) -> EventTimeState {
        EventTimeState::from_raw(self.start.as_deref())
    }

    /// Stable identity used for deduplication.
    ///
    /// Prefers the source id. Without one, an id is synthesized from
    /// (type key, start, end), or (type key, start, description length)
    /// when no end is known. Distinct occurrences that share title, timing
    /// and description length therefore collide and are deduplicated as one;
    /// that false positive is accepted.
    pub fn identity(&self) -> String {
        if let Some(id) = non_empty(self.id.as_deref()) {
            return id.to_string();
        }

        let start = self.start.as_deref().unwrap_or_default();
        let material = match non_empty(self.end.as_deref()) {
            Some(end) => format!("{}\u{1f}{}\u{1f}{}", self.type_key(), start, end),
            None => {
                let description_len = self
                    .description
                    .as_deref()
                    .map(|d| d.chars().count())
                    .unwrap_or(0);
                format!("{}\u{1f}{}\u{1f}#{}", self.type_key(), start, description_len)
            }
        };

        format!("{}{:016x}", SYNTHETIC_ID_PREFIX, fnv1a64(material.as_bytes()))
    }

    pub fn has_synthetic_identity(&self) -> bool {
        non_empty(self.id.as_deref()).is_none()
    }
}

impl fmt::Display for EventOccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_key())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// FNV-1a, 64 bit. Stable across Rust releases, unlike `DefaultHasher`.
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrence(title: Option<&str>, summary: Option<&str>) -> EventOccurrence {
        EventOccurrence {
            title: title.map(String::from),
            summary: summary.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn type_key_falls_back_to_summary_then_placeholder() {
        assert_eq!(occurrence(Some("Standup"), Some("x")).type_key(), "Standup");
        assert_eq!(occurrence(None, Some("Retro")).type_key(), "Retro");
        assert_eq!(occurrence(Some("  "), Some("Retro")).type_key(), "Retro");
        assert_eq!(occurrence(None, None).type_key(), UNTITLED_TYPE);
    }

    #[test]
    fn identity_prefers_source_id() {
        let event = EventOccurrence::new(Some("uid-1@feed"), "Standup", Some("2025-03-20"));
        assert_eq!(event.identity(), "uid-1@feed");
        assert!(!event.has_synthetic_identity());
    }

    #[test]
    fn synthesized_identity_is_deterministic() {
        let mut a = EventOccurrence::new(None, "Standup", Some("2025-03-20T09:00:00Z"));
        a.end = Some("2025-03-20T09:15:00Z".into());
        let b = a.clone();

        assert!(a.has_synthetic_identity());
        assert!(a.identity().starts_with(SYNTHETIC_ID_PREFIX));
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn synthesized_identity_differs_by_timing() {
        let a = EventOccurrence::new(None, "Standup", Some("2025-03-20T09:00:00Z"));
        let b = EventOccurrence::new(None, "Standup", Some("2025-03-21T09:00:00Z"));
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn same_description_length_collides_without_end() {
        // Accepted limitation: content is not hashed, only its length.
        let mut a = EventOccurrence::new(None, "Standup", Some("2025-03-20T09:00:00Z"));
        let mut b = a.clone();
        a.description = Some("room A".into());
        b.description = Some("room B".into());
        assert_eq!(a.identity(), b.identity());

        b.description = Some("room B2".into());
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn deserializes_sparse_producer_payload() {
        let event: EventOccurrence =
            serde_json::from_str(r#"{"summary": "Retro", "start": "2025-03-20"}"#).unwrap();
        assert_eq!(event.type_key(), "Retro");
        assert!(event.id.is_none());
        assert!(event.start_state().instant().is_some());
    }
}
