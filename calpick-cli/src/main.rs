mod commands;
mod logging;
mod render;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use calpick_core::config::CalpickConfig;
use calpick_core::export::ExportMode;
use clap::{Parser, Subcommand, ValueEnum};

use crate::session::Session;

#[derive(Parser)]
#[command(name = "calpick")]
#[command(about = "Pick event types and groups from imported calendars and export filtered feeds")]
struct Cli {
    /// Catalog snapshot (JSON with "groups" and "events")
    #[arg(long, global = true, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Calendar id the selection belongs to (defaults to the catalog file name)
    #[arg(long, global = true)]
    calendar: Option<String>,

    /// User id the selection belongs to (defaults to default_user from config)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Type,
    Month,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportModeArg {
    Types,
    Groups,
    Both,
}

impl From<ExportModeArg> for ExportMode {
    fn from(mode: ExportModeArg) -> Self {
        match mode {
            ExportModeArg::Types => ExportMode::Types,
            ExportModeArg::Groups => ExportMode::Groups,
            ExportModeArg::Both => ExportMode::Both,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List recurring event types and whether they are selected
    Types,
    /// List groups with their selection and subscription state
    Groups,
    /// Toggle explicit selection of one event type
    Toggle { title: String },
    /// Explicitly select event types
    Select {
        titles: Vec<String>,

        /// Select every type that belongs to any group
        #[arg(long, conflicts_with = "titles")]
        all: bool,
    },
    /// Remove event types from the explicit selection
    Deselect { titles: Vec<String> },
    /// Toggle a group subscription
    Subscribe {
        group: String,

        /// Subscribe and explicitly select every member
        #[arg(long)]
        select: bool,
    },
    /// Unsubscribe from a group
    Unsubscribe {
        group: String,

        /// Also remove every member from the explicit selection
        #[arg(long)]
        deselect: bool,
    },
    /// Drop selected types and subscriptions the catalog no longer knows
    Prune,
    /// Clear the whole selection
    Clear,
    /// Show selection counts
    Summary,
    /// Show upcoming events of the current selection
    Preview {
        /// Group events by type or by month
        #[arg(long, value_enum)]
        by: Option<GroupBy>,

        /// Newest first within month buckets
        #[arg(long)]
        desc: bool,
    },
    /// Print the filtered-feed request for the current selection
    Export {
        #[arg(long, value_enum, default_value = "both")]
        mode: ExportModeArg,

        /// Print a subscription URL instead of JSON (needs feed_base_url in config)
        #[arg(long)]
        url: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CalpickConfig::load()?;

    logging::init(cli.verbose, config.log_level.as_deref())?;

    let mut session = Session::open(config, &cli.catalog, cli.calendar, cli.user)?;

    match cli.command {
        Commands::Types => commands::browse::types(&session),
        Commands::Groups => commands::browse::groups(&session),
        Commands::Toggle { title } => commands::select::toggle(&mut session, &title),
        Commands::Select { titles, all } => commands::select::select(&mut session, &titles, all),
        Commands::Deselect { titles } => commands::select::deselect(&mut session, &titles),
        Commands::Subscribe { group, select } => {
            commands::subscribe::subscribe(&mut session, &group, select)
        }
        Commands::Unsubscribe { group, deselect } => {
            commands::subscribe::unsubscribe(&mut session, &group, deselect)
        }
        Commands::Prune => commands::select::prune(&mut session),
        Commands::Clear => commands::select::clear(&mut session),
        Commands::Summary => commands::summary::run(&session),
        Commands::Preview { by, desc } => commands::preview::run(&session, by, desc),
        Commands::Export { mode, url } => commands::export::run(&session, mode.into(), url),
    }?;

    session.close()
}
