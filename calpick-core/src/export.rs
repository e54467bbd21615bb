//! Payload handed to the feed generator.
//!
//! calpick does not produce calendar documents; it only describes which
//! types and groups the filtered feed should contain.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::GroupCatalog;
use crate::error::{CalPickError, CalPickResult};
use crate::selection::SelectionState;

/// What the exported feed is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// The effective title set, frozen at export time
    Types,
    /// Subscribed group ids; the feed follows future group changes
    Groups,
    #[default]
    Both,
}

/// Request for a filtered feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub calendar_id: String,
    #[serde(default)]
    pub event_types: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl FeedRequest {
    pub fn build(
        calendar_id: &str,
        state: &SelectionState,
        groups: &GroupCatalog,
        mode: ExportMode,
    ) -> Self {
        let event_types = match mode {
            ExportMode::Types | ExportMode::Both => state
                .effective_titles(groups)
                .into_iter()
                .map(String::from)
                .collect(),
            ExportMode::Groups => Vec::new(),
        };

        let groups = match mode {
            ExportMode::Groups | ExportMode::Both => state
                .subscribed_groups()
                .iter()
                .filter(|id| groups.contains(id))
                .cloned()
                .collect(),
            ExportMode::Types => Vec::new(),
        };

        FeedRequest {
            calendar_id: calendar_id.to_string(),
            event_types,
            groups,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.event_types.is_empty() && self.groups.is_empty()
    }

    pub fn to_json(&self) -> CalPickResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Subscription URL: `<base>/<calendar>?types=..&groups=..`.
    ///
    /// Each title and group id becomes its own repeated query parameter.
    pub fn subscription_url(&self, base: &str) -> CalPickResult<Url> {
        let mut url = Url::parse(base).map_err(|_| CalPickError::InvalidUrl(base.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| CalPickError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .push(&self.calendar_id);

        {
            let mut query = url.query_pairs_mut();
            for title in &self.event_types {
                query.append_pair("types", title);
            }
            for group in &self.groups {
                query.append_pair("groups", group);
            }
        }

        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Group, GroupMember};

    fn groups() -> GroupCatalog {
        [
            Group::new("team", "Team", vec![GroupMember::new("Standup", 2)]),
            Group::new("social", "Social", vec![GroupMember::new("Lunch & Learn", 1)]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn build_respects_mode() {
        let groups = groups();
        let state = SelectionState::from_parts(["Retro"], ["team", "vanished"]);

        let both = FeedRequest::build("work", &state, &groups, ExportMode::Both);
        assert_eq!(both.event_types, vec!["Retro", "Standup"]);
        assert_eq!(both.groups, vec!["team"]);

        let types = FeedRequest::build("work", &state, &groups, ExportMode::Types);
        assert!(types.groups.is_empty());

        let only_groups = FeedRequest::build("work", &state, &groups, ExportMode::Groups);
        assert!(only_groups.event_types.is_empty());
        assert_eq!(only_groups.groups, vec!["team"]);
    }

    #[test]
    fn json_uses_camel_case() {
        let request = FeedRequest {
            calendar_id: "work".into(),
            event_types: vec!["Standup".into()],
            groups: vec![],
        };
        let json = request.to_json().unwrap();
        assert!(json.contains("\"calendarId\": \"work\""));
        assert!(json.contains("\"eventTypes\""));
    }

    #[test]
    fn subscription_url_encodes_titles() {
        let groups = groups();
        let state = SelectionState::from_parts(["Lunch & Learn"], ["team"]);
        let request = FeedRequest::build("work", &state, &groups, ExportMode::Both);

        let url = request
            .subscription_url("https://feeds.example.com/filtered/")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://feeds.example.com/filtered/work?types=Lunch+%26+Learn&types=Standup&groups=team"
        );
    }

    #[test]
    fn empty_request_has_no_query() {
        let request = FeedRequest::build(
            "work",
            &SelectionState::new(),
            &groups(),
            ExportMode::Both,
        );
        assert!(request.is_empty());
        let url = request.subscription_url("https://feeds.example.com").unwrap();
        assert_eq!(url.as_str(), "https://feeds.example.com/work");
    }

    #[test]
    fn invalid_base_url() {
        let request = FeedRequest::build("work", &SelectionState::new(), &groups(), ExportMode::Both);
        assert!(matches!(
            request.subscription_url("not a url"),
            Err(CalPickError::InvalidUrl(_))
        ));
        assert!(matches!(
            request.subscription_url("mailto:feeds@example.com"),
            Err(CalPickError::InvalidUrl(_))
        ));
    }
}
