//! What the user sees: the single blocking modal and the passive badge.

mod badge;
mod modal;

use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;
use nudge_protocol::ReminderId;
use serde::Serialize;

pub use badge::BadgeItem;
pub use badge::BadgeView;
pub use badge::DEFAULT_BADGE_LIMIT;
pub use badge::ReminderBadge;
pub use modal::ModalPresenter;
pub use modal::ModalSlot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
    pub title: String,
    pub body: String,
}

/// Where the "view" affordance takes the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub path: String,
}

impl NavigationTarget {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalContent {
    pub reminder: Reminder,
    pub summary: ReminderSummary,
    pub target: NavigationTarget,
}

impl ModalContent {
    pub fn domain(&self) -> ReminderDomain {
        self.reminder.domain
    }

    pub fn id(&self) -> &ReminderId {
        &self.reminder.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Dismissed,
    Viewed,
}

/// Broadcast to every engine whenever the shared modal closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalClosed {
    pub domain: ReminderDomain,
    pub id: ReminderId,
    pub reason: CloseReason,
}
