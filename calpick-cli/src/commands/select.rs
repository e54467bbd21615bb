use anyhow::Result;
use owo_colors::OwoColorize;

use crate::render::pluralize;
use crate::session::Session;

pub fn toggle(session: &mut Session, title: &str) -> Result<()> {
    session.mutate(|state| state.toggle_type(title))?;

    if session.state.is_explicit(title) {
        println!("{} {}", "Selected".green(), title);
    } else {
        println!("{} {}", "Deselected".yellow(), title);
    }
    warn_if_unknown(session, title);

    Ok(())
}

pub fn select(session: &mut Session, titles: &[String], all: bool) -> Result<()> {
    let before = session.state.explicit_types().len();

    if all {
        let groups = session.catalog.groups.clone();
        session.mutate(|state| state.select_all(&groups))?;
    } else {
        if titles.is_empty() {
            anyhow::bail!("Nothing to select. Pass one or more titles, or --all");
        }
        session.mutate(|state| state.select_types(titles))?;
        for title in titles {
            warn_if_unknown(session, title);
        }
    }

    let added = session.state.explicit_types().len() - before;
    println!("Selected {} new {}", added, pluralize("type", added));
    Ok(())
}

pub fn deselect(session: &mut Session, titles: &[String]) -> Result<()> {
    let before = session.state.explicit_types().len();
    session.mutate(|state| state.deselect_types(titles))?;

    let removed = before - session.state.explicit_types().len();
    println!("Deselected {} {}", removed, pluralize("type", removed));
    Ok(())
}

pub fn prune(session: &mut Session) -> Result<()> {
    let groups = session.catalog.groups.clone();
    session.mutate(|state| state.retain_known(&groups))?;
    println!("Selection now refers only to types and groups of this catalog");
    Ok(())
}

pub fn clear(session: &mut Session) -> Result<()> {
    session.mutate(|state| state.clear())?;
    println!("Selection cleared");
    Ok(())
}

/// Selecting a title the catalog doesn't know is allowed (the catalog may be
/// stale), but worth pointing out.
fn warn_if_unknown(session: &Session, title: &str) {
    let known_in_groups = session.catalog.groups.eligible_titles().contains(title);
    let known_in_events = session
        .catalog
        .events
        .events()
        .iter()
        .any(|e| e.type_key() == title);

    if !known_in_groups && !known_in_events {
        println!(
            "   {}",
            format!("'{title}' does not appear in this catalog").dimmed()
        );
    }
}
