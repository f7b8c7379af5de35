use std::sync::Arc;

use anyhow::Context;
use nudge_backend_client::BackendClient;
use nudge_core::DomainProfile;
use nudge_core::EngineContext;
use nudge_core::EngineHandle;
use nudge_core::EventBus;
use nudge_core::HttpReminderFetcher;
use nudge_core::LocalEventBus;
use nudge_core::ModalSlot;
use nudge_core::ReminderBadge;
use nudge_core::ReminderEngine;
use nudge_core::SessionHandle;
use nudge_core::config::NudgeConfig;
use nudge_store::FileBackend;
use owo_colors::OwoColorize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::SseBridge;
use crate::TerminalPresenter;

/// Keys read from stdin while watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Dismiss,
    View,
    Refresh,
    Badge,
    Quit,
    Unknown,
}

impl Key {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" | "d" => Self::Dismiss,
            "v" => Self::View,
            "r" => Self::Refresh,
            "b" => Self::Badge,
            "q" => Self::Quit,
            _ => Self::Unknown,
        }
    }
}

struct Watch {
    profiles: Vec<DomainProfile>,
    engines: Vec<EngineHandle>,
    modal: ModalSlot,
    badge: ReminderBadge,
}

impl Watch {
    /// Returns `false` when the user asked to quit.
    fn handle(&self, key: Key) -> bool {
        match key {
            Key::Dismiss => {
                self.modal.close();
            }
            Key::View => {
                self.modal.view();
            }
            Key::Refresh => {
                for engine in &self.engines {
                    engine.refresh();
                }
            }
            Key::Badge => self.print_badge(),
            Key::Quit => return false,
            Key::Unknown => println!("{}", "keys: enter, v, r, b, q".dimmed()),
        }
        true
    }

    fn print_badge(&self) {
        let active: Vec<_> = self
            .engines
            .iter()
            .map(EngineHandle::active_reminders)
            .collect();
        let view = self.badge.render(
            self.profiles
                .iter()
                .zip(active.iter())
                .map(|(profile, reminders)| (profile, reminders.as_slice())),
        );
        println!("{} active reminder(s)", view.total.bold());
        for item in view.items {
            println!(
                "  [{}] {} {}",
                item.domain.as_str(),
                item.title,
                item.path.cyan()
            );
        }
    }
}

pub(crate) async fn run(config: NudgeConfig) -> anyhow::Result<()> {
    let session = SessionHandle::new(config.session.to_session());
    if session.current().is_none() {
        tracing::warn!("no session configured; engines stay idle");
    }

    let client = BackendClient::new(config.server.base_url.clone())
        .context("failed to build HTTP client")?;
    let storage_dir = config
        .storage
        .resolved_dir()
        .context("cannot locate the shown-state directory")?;
    let bus: Arc<dyn EventBus> = Arc::new(LocalEventBus::new());
    let modal = ModalSlot::new(Arc::new(TerminalPresenter));

    let ctx = EngineContext {
        fetcher: Arc::new(HttpReminderFetcher::new(client.clone())),
        storage: Arc::new(FileBackend::new(storage_dir)),
        bus: Arc::clone(&bus),
        modal: modal.clone(),
        session: session.clone(),
        settings: config.settings(),
    };

    let profiles = config.enabled_profiles();
    let engines: Vec<EngineHandle> = profiles
        .iter()
        .map(|profile| ReminderEngine::new(profile.clone(), &ctx).start())
        .collect();
    let running = engines.iter().filter(|e| e.is_running()).count();
    tracing::info!(running, enabled = engines.len(), "reminder engines started");

    let cancel = CancellationToken::new();
    let bridge = (running > 0).then(|| {
        let role_markers = profiles.iter().map(|profile| profile.role_marker).collect();
        SseBridge::new(
            client,
            config.server.events_path.clone(),
            session,
            role_markers,
            bus,
        )
        .spawn(cancel.child_token())
    });

    let watch = Watch {
        profiles,
        engines,
        modal,
        badge: config.badge(),
    };
    read_keys(&watch).await;

    cancel.cancel();
    if let Some(bridge) = bridge
        && let Err(err) = bridge.await
    {
        tracing::warn!(error = %err, "event bridge task failed");
    }
    for engine in watch.engines {
        engine.stop().await;
    }
    Ok(())
}

/// Reads keys until quit, Ctrl-C, or stdin EOF followed by Ctrl-C.
async fn read_keys(watch: &Watch) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => return,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                if !watch.handle(Key::parse(&line)) {
                    return;
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "stdin unreadable");
                break;
            }
        }
    }

    tracing::info!("stdin closed; press Ctrl-C to stop");
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for Ctrl-C");
    }
}
