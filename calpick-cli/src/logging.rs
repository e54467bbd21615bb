use anyhow::Result;
use log::LevelFilter;

/// Level from `-v` count, falling back to the configured level, then `warn`.
fn level_for(verbose: u8, configured: Option<&str>) -> LevelFilter {
    match verbose {
        0 => configured
            .and_then(|l| l.parse().ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log to stderr so stdout stays clean for JSON output.
pub fn init(verbose: u8, configured: Option<&str>) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level_for(verbose, configured))
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
