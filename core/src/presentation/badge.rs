use chrono::DateTime;
use chrono::Utc;
use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;
use nudge_protocol::ReminderId;
use serde::Serialize;

use crate::DomainProfile;

pub const DEFAULT_BADGE_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeItem {
    pub domain: ReminderDomain,
    pub id: ReminderId,
    pub title: String,
    pub body: String,
    pub reminder_count: u32,
    pub sent_at: Option<DateTime<Utc>>,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BadgeView {
    /// Active reminders across every rendered domain, before truncation.
    pub total: usize,
    pub items: Vec<BadgeItem>,
}

/// Passive list of the most recent active reminders. Rendering never
/// consults or mutates shown-state and never touches the modal slot.
#[derive(Debug, Clone)]
pub struct ReminderBadge {
    limit: usize,
}

impl Default for ReminderBadge {
    fn default() -> Self {
        Self::new(DEFAULT_BADGE_LIMIT)
    }
}

impl ReminderBadge {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Merges the active reminders of every domain, newest first, and keeps
    /// the first `limit`.
    pub fn render<'a>(
        &self,
        sets: impl IntoIterator<Item = (&'a DomainProfile, &'a [Reminder])>,
    ) -> BadgeView {
        let mut merged: Vec<(&'a DomainProfile, &'a Reminder)> = sets
            .into_iter()
            .flat_map(|(profile, reminders)| {
                reminders
                    .iter()
                    .filter(|r| r.is_active())
                    .map(move |r| (profile, r))
            })
            .collect();
        // Same ordering as `sort_by_recency`, stable across domains.
        merged.sort_by(|(_, a), (_, b)| b.sent_at.cmp(&a.sent_at));

        let total = merged.len();
        let items = merged
            .into_iter()
            .take(self.limit)
            .map(|(profile, reminder)| {
                let content = profile.modal_content(reminder.clone());
                BadgeItem {
                    domain: reminder.domain,
                    id: reminder.id.clone(),
                    title: content.summary.title,
                    body: content.summary.body,
                    reminder_count: reminder.reminder_count,
                    sent_at: reminder.sent_at,
                    path: content.target.path,
                }
            })
            .collect();

        BadgeView { total, items }
    }
}
