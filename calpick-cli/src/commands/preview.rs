use anyhow::Result;
use calpick_core::reconcile::{EventReconciler, SortDirection};
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::GroupBy;
use crate::render::{pluralize, render_bucket, render_occurrence};
use crate::session::Session;

pub fn run(session: &Session, by: Option<GroupBy>, desc: bool) -> Result<()> {
    let tz = session.config.timezone()?;
    let reconciler = EventReconciler::new(
        &session.state,
        &session.catalog.groups,
        &session.catalog.events,
        Utc::now(),
    )
    .with_timezone(tz);

    let reconciliation = reconciler.reconcile();
    if reconciliation.events.is_empty() {
        println!("{}", "No upcoming events in the current selection".dimmed());
        return Ok(());
    }

    match by {
        None => {
            for event in &reconciliation.events {
                println!("{}", render_occurrence(event, tz));
            }
        }
        Some(GroupBy::Type) => {
            for bucket in reconciler.group_by_type() {
                println!("{}", render_bucket(&bucket, tz).join("\n"));
            }
        }
        Some(GroupBy::Month) => {
            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            for bucket in reconciler.group_by_month(direction) {
                println!("{}", render_bucket(&bucket, tz).join("\n"));
            }
        }
    }

    let count = reconciliation.events.len();
    println!();
    println!(
        "{}",
        format!(
            "{} upcoming {} ({} past, {} duplicate skipped)",
            count,
            pluralize("event", count),
            reconciliation.dropped_past,
            reconciliation.dropped_duplicates
        )
        .dimmed()
    );

    Ok(())
}
