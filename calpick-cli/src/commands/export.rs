use anyhow::{Context, Result};
use calpick_core::export::{ExportMode, FeedRequest};

use crate::session::Session;

pub fn run(session: &Session, mode: ExportMode, as_url: bool) -> Result<()> {
    let request = FeedRequest::build(
        &session.key.calendar_id,
        &session.state,
        &session.catalog.groups,
        mode,
    );

    if request.is_empty() {
        log::warn!("event=export_empty module=cli calendar={}", session.key.calendar_id);
    }

    if as_url {
        let base = session.config.feed_base_url.as_deref().context(
            "No feed_base_url configured.\n\
             Add it to ~/.config/calpick/config.toml or set CALPICK_FEED_BASE_URL",
        )?;
        println!("{}", request.subscription_url(base)?);
    } else {
        println!("{}", request.to_json()?);
    }

    Ok(())
}
