use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Subcommand;
use nudge_core::config::NudgeConfig;
use nudge_protocol::ReminderDomain;
use nudge_store::FileBackend;
use nudge_store::KeyValueBackend;
use nudge_store::ShownStateStore;

#[derive(Debug, Subcommand)]
pub enum ShownCommand {
    /// List remembered reminder ids and the count they were shown at.
    List {
        /// Limit the listing to one domain.
        #[arg(value_parser = crate::parse_domain)]
        domain: Option<ReminderDomain>,
    },
    /// Forget every shown reminder of a domain so they can show again.
    Clear {
        #[arg(value_parser = crate::parse_domain)]
        domain: ReminderDomain,
    },
}

pub(crate) fn run(config: &NudgeConfig, command: ShownCommand) -> anyhow::Result<()> {
    let dir = config
        .storage
        .resolved_dir()
        .context("cannot locate the shown-state directory")?;
    let backend: Arc<dyn KeyValueBackend> = Arc::new(FileBackend::new(dir));
    let mut stdout = std::io::stdout().lock();

    match command {
        ShownCommand::List { domain } => {
            let domains = match domain {
                Some(domain) => vec![domain],
                None => ReminderDomain::ALL.to_vec(),
            };
            for domain in domains {
                let store = open(config, domain, Arc::clone(&backend));
                list(&mut stdout, domain, &store)?;
            }
        }
        ShownCommand::Clear { domain } => {
            let mut store = open(config, domain, backend);
            let cleared = store.len();
            store.clear_all();
            writeln!(stdout, "cleared {cleared} entries for {domain}")?;
        }
    }
    Ok(())
}

fn open(
    config: &NudgeConfig,
    domain: ReminderDomain,
    backend: Arc<dyn KeyValueBackend>,
) -> ShownStateStore {
    ShownStateStore::load(backend, config.profile(domain).storage_key)
}

fn list(
    out: &mut impl Write,
    domain: ReminderDomain,
    store: &ShownStateStore,
) -> std::io::Result<()> {
    for entry in store.entries() {
        writeln!(out, "{domain}\t{}\t{}", entry.id, entry.count)?;
    }
    Ok(())
}
