//! Read-only catalogs consumed by the selection engine.
//!
//! Both catalogs are snapshots produced by the data-fetch layer. The engine
//! never mutates them; a new snapshot simply replaces the old one.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CalPickError, CalPickResult};
use crate::event::EventOccurrence;

/// A recurring event type referenced from a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub title: String,
    #[serde(default)]
    pub occurrence_count: u32,
}

impl GroupMember {
    pub fn new(title: &str, occurrence_count: u32) -> Self {
        GroupMember {
            title: title.to_string(),
            occurrence_count,
        }
    }

    /// Only types that have events are selectable.
    pub fn is_eligible(&self) -> bool {
        self.occurrence_count > 0
    }
}

/// A curated or automatic bundle of recurring event types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Filled from the catalog key when loaded from a snapshot
    #[serde(default, skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn new(id: &str, name: &str, members: Vec<GroupMember>) -> Self {
        Group {
            id: id.to_string(),
            name: name.to_string(),
            members,
        }
    }

    /// Members with at least one occurrence, in declaration order.
    pub fn eligible_members(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().filter(|m| m.is_eligible())
    }

    /// Distinct eligible titles. A title listed twice in one group counts once.
    pub fn eligible_titles(&self) -> BTreeSet<&str> {
        self.eligible_members().map(|m| m.title.as_str()).collect()
    }

    pub fn has_eligible_member(&self, title: &str) -> bool {
        self.eligible_members().any(|m| m.title == title)
    }
}

/// Mapping of group id to group.
///
/// Ordered by id so every derived view iterates deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Group>", into = "BTreeMap<String, Group>")]
pub struct GroupCatalog {
    groups: BTreeMap<String, Group>,
}

impl From<BTreeMap<String, Group>> for GroupCatalog {
    fn from(groups: BTreeMap<String, Group>) -> Self {
        let groups = groups
            .into_iter()
            .map(|(id, mut group)| {
                group.id = id.clone();
                (id, group)
            })
            .collect();
        GroupCatalog { groups }
    }
}

impl From<GroupCatalog> for BTreeMap<String, Group> {
    fn from(catalog: GroupCatalog) -> Self {
        catalog.groups
    }
}

impl FromIterator<Group> for GroupCatalog {
    fn from_iter<I: IntoIterator<Item = Group>>(iter: I) -> Self {
        GroupCatalog {
            groups: iter.into_iter().map(|g| (g.id.clone(), g)).collect(),
        }
    }
}

impl GroupCatalog {
    pub fn get(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Union of eligible titles across every group.
    ///
    /// Titles shared by several groups appear once.
    pub fn eligible_titles(&self) -> BTreeSet<&str> {
        self.groups
            .values()
            .flat_map(|g| g.eligible_members().map(|m| m.title.as_str()))
            .collect()
    }

    /// Ids of the groups listing `title` as an eligible member.
    pub fn groups_containing<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a Group> {
        self.groups
            .values()
            .filter(move |g| g.has_eligible_member(title))
    }
}

/// A recurring event type derived from the occurrence list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringEventType {
    pub title: String,
    #[serde(default)]
    pub occurrence_count: u32,
    #[serde(default)]
    pub occurrences: Vec<EventOccurrence>,
}

impl RecurringEventType {
    /// Occurrence count tolerant of producers that fill only one field.
    pub fn effective_count(&self) -> u32 {
        if self.occurrences.is_empty() {
            self.occurrence_count
        } else {
            u32::try_from(self.occurrences.len()).unwrap_or(u32::MAX)
        }
    }
}

/// Flat sequence of concrete occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCatalog {
    events: Vec<EventOccurrence>,
}

impl From<Vec<EventOccurrence>> for EventCatalog {
    fn from(events: Vec<EventOccurrence>) -> Self {
        EventCatalog { events }
    }
}

impl EventCatalog {
    pub fn events(&self) -> &[EventOccurrence] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct type keys in first-seen order.
    pub fn type_keys(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.events
            .iter()
            .map(EventOccurrence::type_key)
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// Occurrences bucketed into recurring event types, in first-seen order.
    pub fn recurring_types(&self) -> Vec<RecurringEventType> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut types: Vec<RecurringEventType> = Vec::new();

        for event in &self.events {
            let key = event.type_key();
            let slot = *index.entry(key).or_insert_with(|| {
                types.push(RecurringEventType {
                    title: key.to_string(),
                    occurrence_count: 0,
                    occurrences: Vec::new(),
                });
                types.len() - 1
            });
            let entry = &mut types[slot];
            entry.occurrences.push(event.clone());
            entry.occurrence_count += 1;
        }

        types
    }

    /// Occurrences whose start was supplied but matches no accepted layout.
    pub fn unparseable_starts(&self) -> impl Iterator<Item = &EventOccurrence> {
        self.events
            .iter()
            .filter(|event| event.start_state().is_unparseable())
    }
}

/// Catalog snapshot as exchanged with the data-fetch layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub groups: GroupCatalog,
    #[serde(default)]
    pub events: EventCatalog,
}

impl CatalogSnapshot {
    pub fn from_json(content: &str) -> CalPickResult<Self> {
        let snapshot: CatalogSnapshot =
            serde_json::from_str(content).map_err(|e| CalPickError::Catalog(e.to_string()))?;
        snapshot.warn_on_unparseable_starts();
        snapshot.log_count_mismatch();
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> CalPickResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalPickError::Catalog(format!("Could not read {}: {e}", path.display()))
        })?;
        let snapshot = Self::from_json(&content)?;

        log::info!(
            "event=catalog_load module=catalog status=ok path={} groups={} events={}",
            path.display(),
            snapshot.groups.len(),
            snapshot.events.len()
        );

        Ok(snapshot)
    }

    /// Reported once per load; such occurrences are treated as undated.
    fn warn_on_unparseable_starts(&self) {
        for event in self.events.unparseable_starts() {
            log::warn!(
                "event=timestamp_unparseable module=catalog id={} title={:?} start={:?}",
                event.identity(),
                event.type_key(),
                event.start.as_deref().unwrap_or_default()
            );
        }
    }

    /// Raw counts include past and duplicate occurrences; mismatches are expected.
    fn log_count_mismatch(&self) {
        if self.events.is_empty() {
            return;
        }

        let counts: HashMap<String, u32> = self
            .events
            .recurring_types()
            .into_iter()
            .map(|t| (t.title.clone(), t.effective_count()))
            .collect();

        for group in self.groups.groups() {
            for member in &group.members {
                let actual = counts.get(&member.title).copied().unwrap_or(0);
                if actual != member.occurrence_count {
                    log::debug!(
                        "event=member_count_mismatch module=catalog group={} title={:?} declared={} actual={}",
                        group.id,
                        member.title,
                        member.occurrence_count,
                        actual
                    );
                }
            }
        }
    }
}
