use anyhow::Result;
use calpick_core::summary::SelectionSummarizer;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::session::Session;

pub fn run(session: &Session) -> Result<()> {
    let summarizer = SelectionSummarizer::new(&session.state, &session.catalog.groups);
    let breakdown = summarizer.breakdown();

    println!("📅 {} {}", session.key.calendar_id, format!("({})", session.key.user_id).dimmed());
    println!("   {}", breakdown.render());
    println!(
        "   {}",
        format!(
            "{} explicitly selected, {} of {} groups subscribed",
            breakdown.explicit_count, breakdown.subscribed_group_count, breakdown.total_group_count
        )
        .dimmed()
    );

    let summaries = summarizer.group_summaries();
    if !summaries.is_empty() {
        println!();
        for summary in &summaries {
            println!("   {}", summary.render());
        }
    }

    Ok(())
}
