use anyhow::Result;
use owo_colors::OwoColorize;

use crate::session::Session;

fn require_group(session: &Session, group_id: &str) -> Result<()> {
    if session.catalog.groups.contains(group_id) {
        return Ok(());
    }

    let available: Vec<_> = session
        .catalog
        .groups
        .groups()
        .map(|g| g.id.as_str())
        .collect();
    anyhow::bail!(
        "Group '{}' not found. Available: {}",
        group_id,
        available.join(", ")
    )
}

pub fn subscribe(session: &mut Session, group_id: &str, select: bool) -> Result<()> {
    require_group(session, group_id)?;
    let group = session.catalog.groups.get(group_id).cloned();

    if select {
        session.mutate(|state| state.subscribe_and_select(group_id, group.as_ref()))?;
    } else if !session.state.is_subscribed(group_id) {
        session.mutate(|state| state.toggle_group_subscription(group_id))?;
    }

    println!("{} {}", "Subscribed to".green(), group_id);
    Ok(())
}

pub fn unsubscribe(session: &mut Session, group_id: &str, deselect: bool) -> Result<()> {
    require_group(session, group_id)?;
    let group = session.catalog.groups.get(group_id).cloned();

    if deselect {
        session.mutate(|state| state.unsubscribe_and_deselect(group_id, group.as_ref()))?;
    } else if session.state.is_subscribed(group_id) {
        session.mutate(|state| state.toggle_group_subscription(group_id))?;
    }

    println!("{} {}", "Unsubscribed from".yellow(), group_id);
    Ok(())
}
