//! Core of calpick: hierarchical selection and event reconciliation.
//!
//! This crate provides:
//! - `catalog`: read-only group and event snapshots supplied by the feed layer
//! - `selection`: the mutable selection state (explicit types + group subscriptions)
//! - `summary` and `reconcile`: pure views derived from a selection
//! - `store` and `export`: the edges towards persistence and feed generation

pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod event_time;
pub mod export;
pub mod reconcile;
pub mod selection;
pub mod store;
pub mod summary;

pub use catalog::{
    CatalogSnapshot, EventCatalog, Group, GroupCatalog, GroupMember, RecurringEventType,
};
pub use error::{CalPickError, CalPickResult};
pub use event::EventOccurrence;
pub use reconcile::{EventBucket, EventReconciler, Reconciliation, SortDirection};
pub use selection::{GroupSelection, SelectionState};
pub use summary::{GroupSummary, SelectionBreakdown, SelectionSummarizer};
