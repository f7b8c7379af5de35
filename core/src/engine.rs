//! One actor task per reminder domain.
//!
//! The actor owns the domain's [`Reconciler`] and serializes every decision
//! through a single `select!` loop. Fetches run on a `JoinSet` so a slow
//! server never delays push handling; each carries a sequence number and
//! only results newer than the last applied one are used.

use std::sync::Arc;
use std::time::Duration;

use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;
use nudge_store::KeyValueBackend;
use nudge_store::ShownStateStore;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::DomainProfile;
use crate::SessionHandle;
use crate::bus::BusEvent;
use crate::bus::EventBus;
use crate::bus::EventHandler;
use crate::bus::FOREGROUND_EVENT;
use crate::bus::Subscription;
use crate::normalizer::normalize;
use crate::presentation::ModalSlot;
use crate::reconciler::ModalGate;
use crate::reconciler::RealtimeOutcome;
use crate::reconciler::Reconciler;
use crate::source::ReminderFetcher;
use crate::source::ReminderSource;
use crate::source::SourceOutcome;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_PENDING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    /// How long a pushed id without detail waits for the next fetch.
    pub pending_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            pending_timeout: DEFAULT_PENDING_TIMEOUT,
        }
    }
}

/// Collaborators shared by every engine in the process.
#[derive(Clone)]
pub struct EngineContext {
    pub fetcher: Arc<dyn ReminderFetcher>,
    pub storage: Arc<dyn KeyValueBackend>,
    pub bus: Arc<dyn EventBus>,
    pub modal: ModalSlot,
    pub session: SessionHandle,
    pub settings: EngineSettings,
}

#[derive(Debug)]
enum EngineCommand {
    Refresh,
    Event(BusEvent),
}

pub struct ReminderEngine {
    profile: Arc<DomainProfile>,
    source: ReminderSource,
    reconciler: Reconciler,
    bus: Arc<dyn EventBus>,
    modal: ModalSlot,
    session: SessionHandle,
    settings: EngineSettings,
}

impl ReminderEngine {
    /// Loads the domain's shown-state; nothing runs until [`Self::start`].
    pub fn new(profile: DomainProfile, ctx: &EngineContext) -> Self {
        let profile = Arc::new(profile);
        let store = ShownStateStore::load(Arc::clone(&ctx.storage), profile.storage_key);
        let reconciler = Reconciler::new(profile.domain, store, ctx.settings.pending_timeout);
        let source = ReminderSource::new(
            Arc::clone(&profile),
            Arc::clone(&ctx.fetcher),
            ctx.session.clone(),
        );
        Self {
            profile,
            source,
            reconciler,
            bus: Arc::clone(&ctx.bus),
            modal: ctx.modal.clone(),
            session: ctx.session.clone(),
            settings: ctx.settings,
        }
    }

    pub fn domain(&self) -> ReminderDomain {
        self.profile.domain
    }

    /// Spawns the actor. Without an entitled session the returned handle
    /// is idle: no subscriptions, timers or requests.
    pub fn start(self) -> EngineHandle {
        let domain = self.profile.domain;
        let cancel = CancellationToken::new();
        let (active_tx, active_rx) = watch::channel(Vec::new());

        if !self.source.is_permitted() {
            tracing::info!(%domain, "no entitled session; reminder engine idle");
            return EngineHandle {
                domain,
                cancel,
                task: None,
                commands: None,
                active: active_rx,
            };
        }

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let subscriptions: Vec<Subscription> = self
            .profile
            .event_names
            .iter()
            .copied()
            .chain([FOREGROUND_EVENT])
            .map(|name| {
                let tx = commands_tx.clone();
                let handler: EventHandler = Arc::new(move |event: &BusEvent| {
                    let _ = tx.send(EngineCommand::Event(event.clone()));
                });
                self.bus.subscribe(name, handler)
            })
            .collect();

        tracing::info!(%domain, "starting reminder engine");
        let task = tokio::spawn(self.run(cancel.clone(), commands_rx, active_tx, subscriptions));
        EngineHandle {
            domain,
            cancel,
            task: Some(task),
            commands: Some(commands_tx),
            active: active_rx,
        }
    }

    async fn run(
        mut self,
        cancel: CancellationToken,
        mut commands: mpsc::UnboundedReceiver<EngineCommand>,
        active_tx: watch::Sender<Vec<Reminder>>,
        // Held so the bus keeps delivering until the loop exits.
        _subscriptions: Vec<Subscription>,
    ) {
        let domain = self.profile.domain;
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut closed = self.modal.subscribe_closed();
        let mut fetches: JoinSet<(u64, SourceOutcome)> = JoinSet::new();
        let mut next_seq: u64 = 0;
        let mut applied_seq: u64 = 0;
        let mut active: Vec<Reminder> = Vec::new();

        loop {
            let deadline = self.reconciler.pending_deadline();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(command) = commands.recv() => match command {
                    EngineCommand::Refresh => self.spawn_fetch(&mut fetches, &mut next_seq),
                    EngineCommand::Event(event) if event.name == FOREGROUND_EVENT => {
                        tracing::debug!(%domain, "foreground regained; refreshing");
                        self.spawn_fetch(&mut fetches, &mut next_seq);
                    }
                    EngineCommand::Event(event) => {
                        if self.handle_push(&event) {
                            self.spawn_fetch(&mut fetches, &mut next_seq);
                        }
                    }
                },
                Some(joined) = fetches.join_next(), if !fetches.is_empty() => match joined {
                    Ok((seq, SourceOutcome::Fresh(reminders))) if seq > applied_seq => {
                        applied_seq = seq;
                        active = Reconciler::active_set(reminders);
                        active_tx.send_replace(active.clone());
                        let mut gate = SlotGate { slot: &self.modal, profile: &self.profile };
                        self.reconciler.on_fetch(&active, &mut gate, Instant::now());
                    }
                    Ok((seq, SourceOutcome::Fresh(_))) => {
                        tracing::debug!(%domain, seq, applied_seq, "discarding out-of-order fetch result");
                    }
                    Ok((_, SourceOutcome::Failed | SourceOutcome::Denied)) => {}
                    Err(err) => {
                        tracing::warn!(%domain, error = %err, "reminder fetch task failed");
                    }
                },
                notice = closed.recv() => {
                    let closed_event = match notice {
                        Ok(closed_event) => Some(closed_event),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(%domain, skipped, "missed modal close notifications");
                            None
                        }
                        Err(RecvError::Closed) => break,
                    };
                    let mut gate = SlotGate { slot: &self.modal, profile: &self.profile };
                    self.reconciler.on_modal_closed(closed_event.as_ref(), &active, &mut gate);
                }
                _ = pending_expiry(deadline), if deadline.is_some() => {
                    self.reconciler.expire_pending(Instant::now());
                }
                _ = ticker.tick() => self.spawn_fetch(&mut fetches, &mut next_seq),
            }
        }

        tracing::info!(%domain, "reminder engine stopped");
    }

    /// Handles one real-time event. Returns whether a refresh should follow.
    fn handle_push(&mut self, event: &BusEvent) -> bool {
        let domain = self.profile.domain;
        if !self.source.is_permitted() {
            tracing::debug!(%domain, event = %event.name, "ignoring push without an entitled session");
            return false;
        }
        let normalized = normalize(&self.profile, event);
        let viewer = self.session.user_id();
        let mut gate = SlotGate {
            slot: &self.modal,
            profile: &self.profile,
        };
        let outcome = self.reconciler.on_realtime(
            normalized,
            viewer.as_deref(),
            &mut gate,
            Instant::now(),
        );
        tracing::debug!(%domain, event = %event.name, ?outcome, "handled push");
        matches!(outcome, RealtimeOutcome::Pending(_))
    }

    fn spawn_fetch(&self, fetches: &mut JoinSet<(u64, SourceOutcome)>, next_seq: &mut u64) {
        *next_seq += 1;
        let seq = *next_seq;
        let source = self.source.clone();
        fetches.spawn(async move { (seq, source.fetch().await) });
    }
}

async fn pending_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Opens modals through the shared slot with this domain's content.
struct SlotGate<'a> {
    slot: &'a ModalSlot,
    profile: &'a DomainProfile,
}

impl ModalGate for SlotGate<'_> {
    fn is_open(&self) -> bool {
        self.slot.is_open()
    }

    fn try_open(&mut self, reminder: &Reminder) -> bool {
        self.slot
            .try_open(self.profile.modal_content(reminder.clone()))
    }
}

/// Control handle for a running (or idle) engine. Dropping it stops the
/// engine.
pub struct EngineHandle {
    domain: ReminderDomain,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    commands: Option<mpsc::UnboundedSender<EngineCommand>>,
    active: watch::Receiver<Vec<Reminder>>,
}

impl EngineHandle {
    pub fn domain(&self) -> ReminderDomain {
        self.domain
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Asks the engine for an out-of-cycle fetch.
    pub fn refresh(&self) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(EngineCommand::Refresh);
        }
    }

    /// The last applied active set, in presentation order.
    pub fn active_reminders(&self) -> Vec<Reminder> {
        self.active.borrow().clone()
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            tracing::warn!(domain = %self.domain, error = %err, "reminder engine task failed");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("domain", &self.domain)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
