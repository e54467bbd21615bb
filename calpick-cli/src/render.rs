//! Terminal rendering for calpick-core types.
//!
//! Extension traits that add colored output using owo_colors.

use calpick_core::event::EventOccurrence;
use calpick_core::event_time::EventTimeState;
use calpick_core::reconcile::EventBucket;
use calpick_core::selection::GroupSelection;
use calpick_core::summary::{GroupSummary, SelectionBreakdown};
use chrono_tz::Tz;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for SelectionBreakdown {
    fn render(&self) -> String {
        if self.selected_count == 0 && self.subscribed_group_count == 0 {
            self.label().dimmed().to_string()
        } else {
            self.label().bold().to_string()
        }
    }
}

impl Render for GroupSelection {
    fn render(&self) -> String {
        match self {
            GroupSelection::Full => "[x]".green().to_string(),
            GroupSelection::Partial => "[~]".yellow().to_string(),
            GroupSelection::None => "[ ]".dimmed().to_string(),
        }
    }
}

impl Render for GroupSummary {
    fn render(&self) -> String {
        let subscribed = if self.subscribed {
            " subscribed".cyan().to_string()
        } else {
            String::new()
        };

        format!(
            "{} {} {}{}",
            self.status.render(),
            self.name,
            format!("({}/{} types, id: {})", self.explicit_count, self.eligible_count, self.id)
                .dimmed(),
            subscribed
        )
    }
}

/// Selection mark for an event type row
pub fn render_type_mark(explicit: bool, effective: bool) -> String {
    match (explicit, effective) {
        (true, _) => "[x]".green().to_string(),
        (false, true) => "[g]".cyan().to_string(),
        (false, false) => "[ ]".dimmed().to_string(),
    }
}

/// Render an occurrence with its start in the display time zone.
///
/// All-day starts show their own date, unshifted.
pub fn render_occurrence(event: &EventOccurrence, tz: Tz) -> String {
    format!("{} {}", render_start(&event.start_state(), tz).dimmed(), event.type_key())
}

fn render_start(start: &EventTimeState, tz: Tz) -> String {
    match start {
        EventTimeState::At(at) => at.with_timezone(&tz).format("%a %Y-%m-%d %H:%M").to_string(),
        EventTimeState::Date(date) => format!("{} all day", date.format("%a %Y-%m-%d")),
        EventTimeState::Unparseable(raw) => format!("? {raw}"),
        EventTimeState::Absent => "no time".to_string(),
    }
}

pub fn render_bucket(bucket: &EventBucket<'_>, tz: Tz) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}",
        bucket.label.bold(),
        format!("({})", bucket.len()).dimmed()
    )];
    lines.extend(
        bucket
            .events
            .iter()
            .map(|event| format!("   {}", render_occurrence(event, tz))),
    );
    lines
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
