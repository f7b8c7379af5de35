//! Decision core of one domain engine.
//!
//! The reconciler is synchronous and owns no timers: the engine actor feeds
//! it fetch results, normalized pushes and modal-close notifications, and
//! passes in the current time. Every decision is a function of the active
//! set, the shown-state, the pending registration and slot occupancy.

use std::collections::HashSet;
use std::time::Duration;

use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;
use nudge_protocol::ReminderId;
use nudge_protocol::sort_by_recency;
use nudge_store::ShownStateStore;
use tokio::time::Instant;

use crate::normalizer::IgnoreReason;
use crate::normalizer::Normalized;
use crate::presentation::ModalClosed;

/// The reconciler's view of the shared modal slot.
pub trait ModalGate {
    fn is_open(&self) -> bool;

    /// Opens the modal for `reminder` if the slot is free.
    fn try_open(&mut self, reminder: &Reminder) -> bool;
}

/// A pushed reminder id waiting for the authoritative fetch to supply its
/// detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReminder {
    pub id: ReminderId,
    pub deadline: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeOutcome {
    Opened(ReminderId),
    Pending(ReminderId),
    AlreadyShown,
    /// Another modal was open; the push is not queued.
    RaceDropped,
    NotTargeted,
    Ignored(IgnoreReason),
}

#[derive(Debug)]
pub struct Reconciler {
    domain: ReminderDomain,
    store: ShownStateStore,
    pending: Option<PendingReminder>,
    pending_timeout: Duration,
    initial_pass_done: bool,
    current: Option<ReminderId>,
}

impl Reconciler {
    pub fn new(domain: ReminderDomain, store: ShownStateStore, pending_timeout: Duration) -> Self {
        Self {
            domain,
            store,
            pending: None,
            pending_timeout,
            initial_pass_done: false,
            current: None,
        }
    }

    /// Active reminders in presentation order.
    pub fn active_set(mut reminders: Vec<Reminder>) -> Vec<Reminder> {
        reminders.retain(Reminder::is_active);
        sort_by_recency(&mut reminders);
        reminders
    }

    pub fn store(&self) -> &ShownStateStore {
        &self.store
    }

    pub fn pending(&self) -> Option<&PendingReminder> {
        self.pending.as_ref()
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn current(&self) -> Option<&ReminderId> {
        self.current.as_ref()
    }

    pub fn initial_pass_done(&self) -> bool {
        self.initial_pass_done
    }

    /// Applies a fresh authoritative snapshot. `active` must already be in
    /// [`Reconciler::active_set`] form. Returns the id opened, if any.
    pub fn on_fetch(
        &mut self,
        active: &[Reminder],
        gate: &mut dyn ModalGate,
        now: Instant,
    ) -> Option<ReminderId> {
        let ids: HashSet<ReminderId> = active.iter().map(|r| r.id.clone()).collect();
        let pruned = self.store.prune(&ids);
        if pruned > 0 {
            tracing::debug!(domain = %self.domain, pruned, "pruned resolved reminders");
        }

        self.expire_pending(now);
        let first_pass = !self.initial_pass_done;
        self.initial_pass_done = true;

        if gate.is_open() {
            if let Some(pending) = self.pending.take() {
                tracing::debug!(
                    domain = %self.domain,
                    reminder_id = %pending.id,
                    "modal busy; dropping pending reminder"
                );
            }
            return None;
        }

        if let Some(pending) = self.pending.take() {
            match active.iter().find(|r| r.id == pending.id) {
                Some(reminder) if !self.store.has_been_shown(&reminder.id, reminder.reminder_count) => {
                    return self.open(reminder, gate);
                }
                Some(_) => {}
                // Not visible to the server yet; keep waiting until the deadline.
                None => self.pending = Some(pending),
            }
        }

        if first_pass {
            tracing::debug!(
                domain = %self.domain,
                active = active.len(),
                "initial pass; not presenting"
            );
            return None;
        }
        self.pick_next(active, gate)
    }

    pub fn on_realtime(
        &mut self,
        normalized: Normalized,
        viewer: Option<&str>,
        gate: &mut dyn ModalGate,
        now: Instant,
    ) -> RealtimeOutcome {
        if let Some(assignee) = normalized.assigned_to()
            && viewer != Some(assignee)
        {
            tracing::debug!(domain = %self.domain, assignee, "push targets another user");
            return RealtimeOutcome::NotTargeted;
        }

        match normalized {
            Normalized::Ignore(reason) => RealtimeOutcome::Ignored(reason),
            Normalized::Pending { id, .. } => {
                tracing::debug!(domain = %self.domain, reminder_id = %id, "awaiting detail for pushed reminder");
                self.pending = Some(PendingReminder {
                    id: id.clone(),
                    deadline: now + self.pending_timeout,
                });
                RealtimeOutcome::Pending(id)
            }
            Normalized::Reminder { reminder, .. } => {
                if gate.is_open() {
                    tracing::debug!(
                        domain = %self.domain,
                        reminder_id = %reminder.id,
                        "modal busy; dropping pushed reminder"
                    );
                    return RealtimeOutcome::RaceDropped;
                }
                if self
                    .store
                    .has_been_shown(&reminder.id, reminder.reminder_count)
                {
                    return RealtimeOutcome::AlreadyShown;
                }
                match self.open(&reminder, gate) {
                    Some(id) => {
                        if self.pending.as_ref().is_some_and(|p| p.id == id) {
                            self.pending = None;
                        }
                        RealtimeOutcome::Opened(id)
                    }
                    None => RealtimeOutcome::RaceDropped,
                }
            }
        }
    }

    /// Reacts to the shared modal closing. `closed` is `None` when the
    /// notification itself was lost.
    pub fn on_modal_closed(
        &mut self,
        closed: Option<&ModalClosed>,
        active: &[Reminder],
        gate: &mut dyn ModalGate,
    ) -> Option<ReminderId> {
        match closed {
            Some(closed) => {
                if closed.domain == self.domain && self.current.as_ref() == Some(&closed.id) {
                    self.current = None;
                }
            }
            None => {
                if !gate.is_open() {
                    self.current = None;
                }
            }
        }

        if !self.initial_pass_done || gate.is_open() {
            return None;
        }
        self.pick_next(active, gate)
    }

    /// Drops the pending registration once its deadline has passed.
    pub fn expire_pending(&mut self, now: Instant) -> Option<ReminderId> {
        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            let expired = self.pending.take().map(|p| p.id);
            if let Some(id) = &expired {
                tracing::debug!(domain = %self.domain, reminder_id = %id, "pending reminder expired");
            }
            return expired;
        }
        None
    }

    fn pick_next(&mut self, active: &[Reminder], gate: &mut dyn ModalGate) -> Option<ReminderId> {
        let next = active
            .iter()
            .find(|r| !self.store.has_been_shown(&r.id, r.reminder_count))?;
        self.open(next, gate)
    }

    fn open(&mut self, reminder: &Reminder, gate: &mut dyn ModalGate) -> Option<ReminderId> {
        if !gate.try_open(reminder) {
            tracing::debug!(
                domain = %self.domain,
                reminder_id = %reminder.id,
                "lost the race for the modal slot"
            );
            return None;
        }
        self.store.mark_shown(&reminder.id, reminder.reminder_count);
        self.current = Some(reminder.id.clone());
        Some(reminder.id.clone())
    }
}
