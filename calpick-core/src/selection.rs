//! Selection state: explicit per-type picks and whole-group subscriptions.
//!
//! The two sets are orthogonal. A title can be reachable through an explicit
//! pick, a subscription, both, or neither, and no operation derives one set
//! from the other. [`SelectionState::is_effectively_selected`] is the only
//! place that combines them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Group, GroupCatalog};

/// Per-session selection of recurring event types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    #[serde(default)]
    explicit_types: BTreeSet<String>,
    #[serde(default)]
    subscribed_groups: BTreeSet<String>,

    /// Bumped on every effective mutation; lets callers memoize derived views.
    #[serde(skip)]
    version: u64,
}

// Equality ignores the version counter: two states selecting the same things
// are the same selection.
impl PartialEq for SelectionState {
    fn eq(&self, other: &Self) -> bool {
        self.explicit_types == other.explicit_types
            && self.subscribed_groups == other.subscribed_groups
    }
}

impl Eq for SelectionState {}

/// How much of a group is covered by explicit picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupSelection {
    None,
    Partial,
    Full,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts<T, G>(explicit_types: T, subscribed_groups: G) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        SelectionState {
            explicit_types: explicit_types.into_iter().map(Into::into).collect(),
            subscribed_groups: subscribed_groups.into_iter().map(Into::into).collect(),
            version: 0,
        }
    }

    pub fn explicit_types(&self) -> &BTreeSet<String> {
        &self.explicit_types
    }

    pub fn subscribed_groups(&self) -> &BTreeSet<String> {
        &self.subscribed_groups
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_empty(&self) -> bool {
        self.explicit_types.is_empty() && self.subscribed_groups.is_empty()
    }

    pub fn is_explicit(&self, title: &str) -> bool {
        self.explicit_types.contains(title)
    }

    pub fn is_subscribed(&self, group_id: &str) -> bool {
        self.subscribed_groups.contains(group_id)
    }

    fn touch(&mut self, changed: bool) {
        if changed {
            self.version += 1;
        }
    }

    /// Flip a title in the explicit set. Subscriptions are untouched.
    pub fn toggle_type(&mut self, title: &str) {
        if !self.explicit_types.remove(title) {
            self.explicit_types.insert(title.to_string());
        }
        log::debug!(
            "event=toggle_type module=selection title={title:?} selected={}",
            self.is_explicit(title)
        );
        self.touch(true);
    }

    /// Add titles to the explicit set; already-present titles are left alone.
    pub fn select_types<I, S>(&mut self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0usize;
        for title in titles {
            if self.explicit_types.insert(title.as_ref().to_string()) {
                added += 1;
            }
        }
        log::debug!("event=select_types module=selection added={added}");
        self.touch(added > 0);
    }

    /// Remove titles from the explicit set; absent titles are ignored.
    pub fn deselect_types<I, S>(&mut self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0usize;
        for title in titles {
            if self.explicit_types.remove(title.as_ref()) {
                removed += 1;
            }
        }
        log::debug!("event=deselect_types module=selection removed={removed}");
        self.touch(removed > 0);
    }

    /// Flip a group subscription. Explicit picks are untouched.
    pub fn toggle_group_subscription(&mut self, group_id: &str) {
        if !self.subscribed_groups.remove(group_id) {
            self.subscribed_groups.insert(group_id.to_string());
        }
        log::debug!(
            "event=toggle_group module=selection group={group_id:?} subscribed={}",
            self.is_subscribed(group_id)
        );
        self.touch(true);
    }

    /// Subscribe to a group and pick every eligible member explicitly.
    ///
    /// `group` is `None` when the catalog has not caught up with the UI yet;
    /// the call is then a no-op.
    pub fn subscribe_and_select(&mut self, group_id: &str, group: Option<&Group>) {
        let Some(group) = group else {
            log::debug!("event=subscribe_and_select module=selection group={group_id:?} status=unknown_group");
            return;
        };

        self.subscribed_groups.insert(group_id.to_string());
        let titles: Vec<String> = group.eligible_members().map(|m| m.title.clone()).collect();
        log::debug!(
            "event=subscribe_and_select module=selection group={group_id:?} members={}",
            titles.len()
        );
        self.select_types(titles);
        self.touch(true);
    }

    /// Unsubscribe from a group and drop every member from the explicit set.
    ///
    /// Unknown groups are a no-op, as for [`Self::subscribe_and_select`].
    pub fn unsubscribe_and_deselect(&mut self, group_id: &str, group: Option<&Group>) {
        let Some(group) = group else {
            log::debug!("event=unsubscribe_and_deselect module=selection group={group_id:?} status=unknown_group");
            return;
        };

        self.subscribed_groups.remove(group_id);
        log::debug!(
            "event=unsubscribe_and_deselect module=selection group={group_id:?} members={}",
            group.members.len()
        );
        self.deselect_types(group.members.iter().map(|m| m.title.as_str()));
        self.touch(true);
    }

    /// Select every eligible title of every group.
    pub fn select_all(&mut self, groups: &GroupCatalog) {
        self.select_types(groups.eligible_titles());
    }

    pub fn clear(&mut self) {
        let changed = !self.is_empty();
        self.explicit_types.clear();
        self.subscribed_groups.clear();
        log::debug!("event=clear module=selection");
        self.touch(changed);
    }

    /// Drop subscriptions to groups and titles the catalog no longer has.
    ///
    /// Never called implicitly: a stored selection may legitimately run ahead
    /// of a catalog that is still loading.
    pub fn retain_known(&mut self, groups: &GroupCatalog) {
        let known_titles = groups.eligible_titles();
        let before = (self.explicit_types.len(), self.subscribed_groups.len());

        self.explicit_types
            .retain(|title| known_titles.contains(title.as_str()));
        self.subscribed_groups.retain(|id| groups.contains(id));

        let after = (self.explicit_types.len(), self.subscribed_groups.len());
        if before != after {
            log::info!(
                "event=retain_known module=selection dropped_types={} dropped_groups={}",
                before.0 - after.0,
                before.1 - after.1
            );
        }
        self.touch(before != after);
    }

    /// Whether `title` is part of the effective selection.
    ///
    /// True iff the title was picked explicitly or is an eligible member of
    /// any subscribed group present in `groups`. Every derived view goes
    /// through this predicate.
    pub fn is_effectively_selected(&self, title: &str, groups: &GroupCatalog) -> bool {
        if self.explicit_types.contains(title) {
            return true;
        }

        self.subscribed_groups
            .iter()
            .filter_map(|id| groups.get(id))
            .any(|group| group.has_eligible_member(title))
    }

    /// Eligible members of `group` that are in the explicit set, and the
    /// eligible total.
    fn explicit_coverage(&self, group: &Group) -> (usize, usize) {
        let eligible = group.eligible_titles();
        let picked = eligible
            .iter()
            .filter(|title| self.explicit_types.contains(**title))
            .count();
        (picked, eligible.len())
    }

    pub fn is_group_fully_selected(&self, group: &Group) -> bool {
        let (picked, total) = self.explicit_coverage(group);
        total > 0 && picked == total
    }

    pub fn is_group_partially_selected(&self, group: &Group) -> bool {
        let (picked, total) = self.explicit_coverage(group);
        picked > 0 && picked < total
    }

    /// Explicit-pick coverage of a group. Subscription is reported separately.
    pub fn group_selection(&self, group: &Group) -> GroupSelection {
        if self.is_group_fully_selected(group) {
            GroupSelection::Full
        } else if self.is_group_partially_selected(group) {
            GroupSelection::Partial
        } else {
            GroupSelection::None
        }
    }

    /// Distinct titles of the effective selection, in title order.
    ///
    /// Covers explicit picks (even ones unknown to the catalog) and eligible
    /// members of subscribed groups.
    pub fn effective_titles<'a>(&'a self, groups: &'a GroupCatalog) -> BTreeSet<&'a str> {
        let mut titles: BTreeSet<&str> = self.explicit_types.iter().map(String::as_str).collect();
        for group in self.subscribed_groups.iter().filter_map(|id| groups.get(id)) {
            titles.extend(group.eligible_members().map(|m| m.title.as_str()));
        }
        titles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GroupMember;

    fn group(id: &str, titles: &[&str]) -> Group {
        Group::new(
            id,
            id,
            titles.iter().map(|t| GroupMember::new(t, 1)).collect(),
        )
    }

    fn catalog() -> GroupCatalog {
        [group("A", &["X", "Y"]), group("B", &["Y", "Z"])]
            .into_iter()
            .collect()
    }

    fn effective(state: &SelectionState, groups: &GroupCatalog) -> Vec<String> {
        state
            .effective_titles(groups)
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn toggle_type_flips_explicit_membership() {
        let mut state = SelectionState::new();
        state.toggle_type("X");
        assert!(state.is_explicit("X"));
        state.toggle_type("X");
        assert!(!state.is_explicit("X"));
        assert!(state.subscribed_groups().is_empty());
    }

    #[test]
    fn bulk_operations_are_idempotent() {
        let mut state = SelectionState::new();
        state.select_types(["X", "Y"]);
        state.select_types(["X"]);
        assert_eq!(state.explicit_types().len(), 2);

        state.deselect_types(["Y", "missing"]);
        state.deselect_types(["Y"]);
        assert_eq!(
            state.explicit_types().iter().collect::<Vec<_>>(),
            vec!["X"]
        );
    }

    #[test]
    fn subscription_toggle_leaves_explicit_set_alone() {
        let groups = catalog();
        let mut state = SelectionState::new();
        state.toggle_type("Q");

        state.toggle_group_subscription("B");
        assert!(state.is_subscribed("B"));
        assert!(state.is_explicit("Q"));
        assert!(!state.is_explicit("Y"));

        state.toggle_group_subscription("B");
        assert!(!state.is_subscribed("B"));
        assert!(state.is_explicit("Q"));
        assert!(!state.is_effectively_selected("Z", &groups));
    }

    #[test]
    fn deselecting_a_title_keeps_subscription() {
        let groups = catalog();
        let mut state = SelectionState::new();
        state.subscribe_and_select("A", groups.get("A"));

        state.deselect_types(["X"]);
        assert!(state.is_subscribed("A"));
        // Still reachable through the subscription
        assert!(state.is_effectively_selected("X", &groups));
    }

    #[test]
    fn scenario_explicit_then_subscription() {
        let groups = catalog();
        let mut state = SelectionState::new();

        state.toggle_type("X");
        assert_eq!(effective(&state, &groups), vec!["X"]);

        state.toggle_group_subscription("B");
        assert_eq!(effective(&state, &groups), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn subscribe_and_select_picks_eligible_members() {
        let groups: GroupCatalog = [Group::new(
            "A",
            "A",
            vec![GroupMember::new("X", 2), GroupMember::new("Empty", 0)],
        )]
        .into_iter()
        .collect();

        let mut state = SelectionState::new();
        state.subscribe_and_select("A", groups.get("A"));

        assert!(state.is_subscribed("A"));
        assert!(state.is_explicit("X"));
        assert!(!state.is_explicit("Empty"));
        assert!(state.is_effectively_selected("X", &groups));
        assert!(!state.is_effectively_selected("Empty", &groups));
    }

    #[test]
    fn unsubscribe_and_deselect_respects_other_coverage() {
        let groups = catalog();
        let mut state = SelectionState::new();
        state.subscribe_and_select("A", groups.get("A"));
        state.toggle_group_subscription("B");

        state.unsubscribe_and_deselect("A", groups.get("A"));

        assert!(!state.is_subscribed("A"));
        assert!(!state.is_effectively_selected("X", &groups));
        // Y is still covered by subscription B
        assert!(state.is_effectively_selected("Y", &groups));
        assert!(!state.is_explicit("Y"));
    }

    #[test]
    fn unknown_group_cascades_are_no_ops() {
        let groups = catalog();
        let mut state = SelectionState::new();
        state.toggle_type("X");
        let before = state.clone();

        state.subscribe_and_select("missing", groups.get("missing"));
        state.unsubscribe_and_deselect("missing", groups.get("missing"));

        assert_eq!(state, before);
        assert_eq!(state.version(), before.version());
    }

    #[test]
    fn subscription_to_unknown_group_selects_nothing() {
        let groups = catalog();
        let mut state = SelectionState::new();
        state.toggle_group_subscription("not-loaded-yet");
        assert!(!state.is_effectively_selected("X", &groups));
        assert!(state.effective_titles(&groups).is_empty());
    }

    #[test]
    fn full_and_partial_group_coverage() {
        let groups = catalog();
        let a = groups.get("A").unwrap();
        let mut state = SelectionState::new();

        assert_eq!(state.group_selection(a), GroupSelection::None);

        state.toggle_type("X");
        assert!(state.is_group_partially_selected(a));
        assert!(!state.is_group_fully_selected(a));

        state.toggle_type("Y");
        assert!(state.is_group_fully_selected(a));
        assert!(!state.is_group_partially_selected(a));
        assert_eq!(state.group_selection(a), GroupSelection::Full);
    }

    #[test]
    fn subscribed_group_without_explicit_picks_is_not_full() {
        let groups = catalog();
        let a = groups.get("A").unwrap();
        let mut state = SelectionState::new();
        state.toggle_group_subscription("A");

        assert!(state.is_subscribed("A"));
        assert_eq!(state.group_selection(a), GroupSelection::None);
    }

    #[test]
    fn group_without_eligible_members_is_never_full() {
        let empty = Group::new("E", "E", vec![GroupMember::new("X", 0)]);
        let mut state = SelectionState::new();
        state.toggle_type("X");
        assert!(!state.is_group_fully_selected(&empty));
        assert!(!state.is_group_partially_selected(&empty));
    }

    #[test]
    fn clear_empties_both_sets() {
        let groups = catalog();
        let mut state = SelectionState::new();
        state.subscribe_and_select("A", groups.get("A"));
        state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn version_counts_effective_mutations() {
        let mut state = SelectionState::new();
        state.select_types(["X"]);
        let v = state.version();
        state.select_types(["X"]);
        assert_eq!(state.version(), v);
        state.toggle_type("Y");
        assert!(state.version() > v);
    }

    #[test]
    fn retain_known_drops_stale_entries() {
        let groups = catalog();
        let mut state = SelectionState::from_parts(["X", "Gone"], ["A", "old-group"]);
        state.retain_known(&groups);
        assert_eq!(state, SelectionState::from_parts(["X"], ["A"]));
    }

    #[test]
    fn select_all_picks_union_once() {
        let groups = catalog();
        let mut state = SelectionState::new();
        state.select_all(&groups);
        assert_eq!(state.explicit_types().len(), 3);
    }

    #[test]
    fn serializes_to_persisted_shape() {
        let state = SelectionState::from_parts(["Y", "X"], ["B"]);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"explicitTypes":["X","Y"],"subscribedGroups":["B"]}"#);

        let restored: SelectionState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn orthogonality_over_every_toggle_sequence() {
        for explicit in [&[][..], &["X"][..], &["X", "Z"][..]] {
            let mut state = SelectionState::from_parts(explicit.iter().copied(), Vec::<String>::new());
            let before = state.explicit_types().clone();
            for id in ["A", "B", "A", "missing"] {
                state.toggle_group_subscription(id);
                assert_eq!(state.explicit_types(), &before);
            }
        }
    }
}
