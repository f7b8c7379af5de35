use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;

use super::DomainProfile;
use super::entity_ref;
use super::processing_body;
use crate::presentation::NavigationTarget;
use crate::presentation::ReminderSummary;

pub(super) fn profile() -> DomainProfile {
    DomainProfile {
        domain: ReminderDomain::Hrd,
        path: "/reminders/hrd".to_string(),
        due_only: Some(true),
        storage_key: "hrd_shown_reminders",
        event_names: &["hrd:reminder", "hrdReminder.sent"],
        sent_tag: "hrdReminder.sent",
        role_marker: "processing",
        describe,
        navigate,
    }
}

fn describe(reminder: &Reminder) -> ReminderSummary {
    ReminderSummary {
        title: "Hard-copy documents overdue".to_string(),
        body: processing_body(reminder, "Document pickup"),
    }
}

fn navigate(reminder: &Reminder) -> NavigationTarget {
    NavigationTarget::new(format!("/processing/{}?tab=hrd", entity_ref(reminder)))
}
