//! Derivation of the concrete event list behind preview and export.
//!
//! The pipeline is: effective titles → title filter → future filter →
//! identity dedup → stable sort → optional grouping. Every step is a pure
//! function of the selection, the catalogs and the injected `now`.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::catalog::{EventCatalog, GroupCatalog};
use crate::event::EventOccurrence;
use crate::event_time::EventTimeState;
use crate::selection::SelectionState;

/// Bucket label for occurrences without a usable start in month grouping.
pub const UNDATED_BUCKET_LABEL: &str = "No date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation<'a> {
    /// Selected, upcoming, unique occurrences in ascending start order
    pub events: Vec<&'a EventOccurrence>,
    pub dropped_past: usize,
    pub dropped_duplicates: usize,
}

/// A labelled slice of the reconciled list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBucket<'a> {
    pub label: String,
    pub events: Vec<&'a EventOccurrence>,
}

impl EventBucket<'_> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// An occurrence with its parsed start, so sorting never reparses.
#[derive(Clone, Copy)]
struct Timed<'a> {
    start: Option<DateTime<Utc>>,
    all_day: Option<NaiveDate>,
    event: &'a EventOccurrence,
}

impl<'a> Timed<'a> {
    fn new(start: &EventTimeState, event: &'a EventOccurrence) -> Self {
        let all_day = match start {
            EventTimeState::Date(date) => Some(*date),
            _ => None,
        };
        Timed {
            start: start.instant(),
            all_day,
            event,
        }
    }

    /// Calendar date in `tz`; all-day occurrences are never shifted.
    fn local_date(&self, tz: &Tz) -> Option<NaiveDate> {
        self.all_day
            .or_else(|| self.start.map(|start| start.with_timezone(tz).date_naive()))
    }
}

/// Dated occurrences first in the requested direction; undated ones keep
/// their relative order after them. A total order, so stable sorting holds.
fn compare_starts(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.cmp(&b),
            SortDirection::Descending => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_timed(events: &mut [Timed<'_>], direction: SortDirection) {
    // slice::sort_by is stable
    events.sort_by(|a, b| compare_starts(a.start, b.start, direction));
}

/// Keep the first occurrence of every identity. Returns the number dropped.
fn dedup_by_identity(events: &mut Vec<Timed<'_>>) -> usize {
    let before = events.len();
    let mut seen = HashSet::new();
    events.retain(|t| seen.insert(t.event.identity()));
    before - events.len()
}

/// Pure reconciliation over a selection and catalog snapshots.
pub struct EventReconciler<'a> {
    state: &'a SelectionState,
    groups: &'a GroupCatalog,
    catalog: &'a EventCatalog,
    now: DateTime<Utc>,
    timezone: Tz,
}

impl<'a> EventReconciler<'a> {
    pub fn new(
        state: &'a SelectionState,
        groups: &'a GroupCatalog,
        catalog: &'a EventCatalog,
        now: DateTime<Utc>,
    ) -> Self {
        EventReconciler {
            state,
            groups,
            catalog,
            now,
            timezone: Tz::UTC,
        }
    }

    /// Time zone used to decide which month an occurrence falls into.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Catalog type keys for which the effective-selection predicate holds.
    pub fn effective_titles(&self) -> BTreeSet<&'a str> {
        self.catalog
            .type_keys()
            .into_iter()
            .filter(|key| self.state.is_effectively_selected(key, self.groups))
            .collect()
    }

    fn filtered(&self) -> (Vec<Timed<'a>>, usize, usize) {
        let titles = self.effective_titles();

        let selected = self
            .catalog
            .events()
            .iter()
            .filter(|event| titles.contains(event.type_key()));

        let mut dropped_past = 0;
        let mut upcoming: Vec<Timed<'a>> = Vec::new();
        for event in selected {
            let start = event.start_state();
            if start.is_at_or_after(self.now) {
                upcoming.push(Timed::new(&start, event));
            } else {
                dropped_past += 1;
            }
        }

        let dropped_duplicates = dedup_by_identity(&mut upcoming);
        sort_timed(&mut upcoming, SortDirection::Ascending);

        (upcoming, dropped_past, dropped_duplicates)
    }

    /// Run the full pipeline and report what was filtered out.
    pub fn reconcile(&self) -> Reconciliation<'a> {
        let (events, dropped_past, dropped_duplicates) = self.filtered();

        log::debug!(
            "event=reconcile module=reconcile kept={} dropped_past={} dropped_duplicates={}",
            events.len(),
            dropped_past,
            dropped_duplicates
        );

        Reconciliation {
            events: events.into_iter().map(|t| t.event).collect(),
            dropped_past,
            dropped_duplicates,
        }
    }

    /// Flat preview list in ascending start order.
    pub fn preview(&self) -> Vec<&'a EventOccurrence> {
        self.reconcile().events
    }

    /// Buckets per recurring type, largest first.
    ///
    /// Equal-sized buckets keep the order in which their first occurrence
    /// appears in the preview.
    pub fn group_by_type(&self) -> Vec<EventBucket<'a>> {
        let (events, _, _) = self.filtered();

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut buckets: Vec<(&str, Vec<Timed<'a>>)> = Vec::new();
        for timed in events {
            let key = timed.event.type_key();
            let slot = *index.entry(key).or_insert_with(|| {
                buckets.push((key, Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(timed);
        }

        let mut buckets: Vec<EventBucket<'a>> = buckets
            .into_iter()
            .map(|(key, mut events)| {
                dedup_by_identity(&mut events);
                EventBucket {
                    label: key.to_string(),
                    events: events.into_iter().map(|t| t.event).collect(),
                }
            })
            .collect();

        buckets.sort_by(|a, b| b.len().cmp(&a.len()));
        buckets
    }

    /// Buckets per calendar month ("March 2025"), in chronological order.
    ///
    /// Each bucket is ordered by `direction`. Occurrences without a usable
    /// start are collected in a trailing [`UNDATED_BUCKET_LABEL`] bucket.
    pub fn group_by_month(&self, direction: SortDirection) -> Vec<EventBucket<'a>> {
        let (events, _, _) = self.filtered();

        let mut index: HashMap<(i32, u32), usize> = HashMap::new();
        let mut dated: Vec<((i32, u32), String, Vec<Timed<'a>>)> = Vec::new();
        let mut undated: Vec<Timed<'a>> = Vec::new();

        for timed in events {
            let Some(date) = timed.local_date(&self.timezone) else {
                undated.push(timed);
                continue;
            };

            let month = (date.year(), date.month());
            match index.get(&month) {
                Some(&slot) => dated[slot].2.push(timed),
                None => {
                    index.insert(month, dated.len());
                    dated.push((month, date.format("%B %Y").to_string(), vec![timed]));
                }
            }
        }

        dated.sort_by_key(|(month, _, _)| *month);

        let mut buckets: Vec<EventBucket<'a>> = dated
            .into_iter()
            .map(|(_, label, events)| Self::finish_bucket(label, events, direction))
            .collect();

        if !undated.is_empty() {
            buckets.push(Self::finish_bucket(
                UNDATED_BUCKET_LABEL.to_string(),
                undated,
                direction,
            ));
        }

        buckets
    }

    fn finish_bucket(
        label: String,
        mut events: Vec<Timed<'a>>,
        direction: SortDirection,
    ) -> EventBucket<'a> {
        dedup_by_identity(&mut events);
        sort_timed(&mut events, direction);
        EventBucket {
            label,
            events: events.into_iter().map(|t| t.event).collect(),
        }
    }
}
