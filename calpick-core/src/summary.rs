//! Counts and labels describing a selection.
//!
//! Every count deduplicates by title: a type shared by several groups is one
//! type, never one per group.

use std::fmt;

use serde::Serialize;

use crate::catalog::GroupCatalog;
use crate::selection::{GroupSelection, SelectionState};

/// Label used when nothing at all is selected.
pub const NOTHING_SELECTED_LABEL: &str = "no events or groups selected";

/// Aggregate counts for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBreakdown {
    pub selected_count: usize,
    pub total_count: usize,
    pub subscribed_group_count: usize,
    pub total_group_count: usize,
    pub explicit_count: usize,
}

impl SelectionBreakdown {
    /// Short label shown wherever the selection is summarized.
    ///
    /// Wording is relied upon by several surfaces; keep it verbatim.
    pub fn label(&self) -> String {
        if self.subscribed_group_count == 0 && self.selected_count == 0 {
            return NOTHING_SELECTED_LABEL.to_string();
        }

        format!("{} & {}", self.events_part(), self.groups_part())
    }

    fn events_part(&self) -> String {
        format!("{}/{} Events", self.selected_count, self.total_count)
    }

    fn groups_part(&self) -> String {
        if self.subscribed_group_count == 0 {
            "No groups".to_string()
        } else if self.total_group_count > 0
            && self.subscribed_group_count == self.total_group_count
        {
            "All groups".to_string()
        } else {
            format!(
                "{}/{} Groups",
                self.subscribed_group_count, self.total_group_count
            )
        }
    }
}

impl fmt::Display for SelectionBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-group view of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub eligible_count: usize,
    /// Eligible members picked explicitly
    pub explicit_count: usize,
    pub subscribed: bool,
    pub status: GroupSelection,
}

/// Pure computation over a selection and the group catalog.
pub struct SelectionSummarizer<'a> {
    state: &'a SelectionState,
    groups: &'a GroupCatalog,
}

impl<'a> SelectionSummarizer<'a> {
    pub fn new(state: &'a SelectionState, groups: &'a GroupCatalog) -> Self {
        SelectionSummarizer { state, groups }
    }

    /// Distinct eligible titles across all groups.
    pub fn total_unique_types(&self) -> usize {
        self.groups.eligible_titles().len()
    }

    /// Distinct eligible titles in the effective selection.
    pub fn effectively_selected_count(&self) -> usize {
        self.groups
            .eligible_titles()
            .into_iter()
            .filter(|title| self.state.is_effectively_selected(title, self.groups))
            .count()
    }

    /// Subscriptions that resolve to a group of the current catalog.
    fn subscribed_group_count(&self) -> usize {
        self.state
            .subscribed_groups()
            .iter()
            .filter(|id| self.groups.contains(id))
            .count()
    }

    pub fn breakdown(&self) -> SelectionBreakdown {
        SelectionBreakdown {
            selected_count: self.effectively_selected_count(),
            total_count: self.total_unique_types(),
            subscribed_group_count: self.subscribed_group_count(),
            total_group_count: self.groups.len(),
            explicit_count: self.state.explicit_types().len(),
        }
    }

    /// One entry per group, ordered by name then id.
    pub fn group_summaries(&self) -> Vec<GroupSummary> {
        let mut summaries: Vec<GroupSummary> = self
            .groups
            .groups()
            .map(|group| {
                let eligible = group.eligible_titles();
                let explicit_count = eligible
                    .iter()
                    .filter(|title| self.state.is_explicit(title))
                    .count();

                GroupSummary {
                    id: group.id.clone(),
                    name: group.name.clone(),
                    eligible_count: eligible.len(),
                    explicit_count,
                    subscribed: self.state.is_subscribed(&group.id),
                    status: self.state.group_selection(group),
                }
            })
            .collect();

        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        summaries
    }
}
