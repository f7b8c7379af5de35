//! `nudge` command-line surface.
//!
//! - `nudge watch` runs one engine per enabled domain against the platform
//!   and presents reminders in the terminal.
//! - `nudge fetch <domain>` lists the active reminders once.
//! - `nudge shown list|clear` inspects or resets the persisted shown-state.

mod fetch_cmd;
mod shown_cmd;
mod sse_bridge;
mod terminal;
mod watch_cmd;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use nudge_core::config::ConfigLoader;
use nudge_core::config::NudgeConfig;
use nudge_protocol::ReminderDomain;

pub use fetch_cmd::FetchArgs;
pub use shown_cmd::ShownCommand;
pub use sse_bridge::SseBridge;
pub use terminal::TerminalPresenter;

#[derive(Debug, Parser)]
#[command(name = "nudge", version, about = "Reminder modals for the recruiting platform")]
pub struct Cli {
    /// Configuration file (defaults to ./nudge.toml when present).
    #[arg(long = "config", short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the reminder engines and show modals as reminders arrive.
    Watch,
    /// Fetch the active reminders of one domain and print them.
    Fetch(FetchArgs),
    /// Inspect or reset which reminders were already shown.
    Shown {
        #[command(subcommand)]
        command: ShownCommand,
    },
}

pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<NudgeConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader.load().context("failed to load configuration")
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    match cli.command {
        Command::Watch => watch_cmd::run(config).await,
        Command::Fetch(args) => fetch_cmd::run(&config, args).await,
        Command::Shown { command } => shown_cmd::run(&config, command),
    }
}

pub(crate) fn parse_domain(value: &str) -> Result<ReminderDomain, String> {
    value
        .parse()
        .map_err(|_| format!("unknown domain {value:?} (expected rnr, hrd or dataflow)"))
}
