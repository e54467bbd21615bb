use std::collections::BTreeMap;

use anyhow::Result;
use calpick_core::summary::SelectionSummarizer;
use owo_colors::OwoColorize;

use crate::render::{Render, render_type_mark};
use crate::session::Session;

/// Occurrence count per type: events first, then group members not seen in events.
fn type_counts(session: &Session) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = session
        .catalog
        .events
        .recurring_types()
        .into_iter()
        .map(|t| {
            let count = t.effective_count();
            (t.title, count)
        })
        .collect();

    for group in session.catalog.groups.groups() {
        for member in group.eligible_members() {
            counts
                .entry(member.title.clone())
                .or_insert(member.occurrence_count);
        }
    }

    counts
}

pub fn types(session: &Session) -> Result<()> {
    let counts = type_counts(session);
    if counts.is_empty() {
        println!("{}", "No event types in this catalog".dimmed());
        return Ok(());
    }

    let groups = &session.catalog.groups;
    for (title, count) in &counts {
        let explicit = session.state.is_explicit(title);
        let effective = session.state.is_effectively_selected(title, groups);
        let member_of: Vec<&str> = groups
            .groups_containing(title)
            .map(|g| g.name.as_str())
            .collect();

        let groups_note = if member_of.is_empty() {
            String::new()
        } else {
            format!(" [{}]", member_of.join(", "))
        };

        println!(
            "{} {} {}{}",
            render_type_mark(explicit, effective),
            title,
            format!("({count})").dimmed(),
            groups_note.dimmed()
        );
    }

    Ok(())
}

pub fn groups(session: &Session) -> Result<()> {
    let summaries = SelectionSummarizer::new(&session.state, &session.catalog.groups).group_summaries();
    if summaries.is_empty() {
        println!("{}", "No groups in this catalog".dimmed());
        return Ok(());
    }

    for summary in &summaries {
        println!("{}", summary.render());
    }

    Ok(())
}
