use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;

use super::DomainProfile;
use super::entity_ref;
use super::processing_body;
use crate::presentation::NavigationTarget;
use crate::presentation::ReminderSummary;

pub(super) fn profile() -> DomainProfile {
    DomainProfile {
        domain: ReminderDomain::DataFlow,
        path: "/reminders/dataflow".to_string(),
        due_only: None,
        storage_key: "dataflow_shown_reminders",
        event_names: &["dataflow:reminder", "dataFlowReminder.sent"],
        sent_tag: "dataFlowReminder.sent",
        role_marker: "processing",
        describe,
        navigate,
    }
}

fn describe(reminder: &Reminder) -> ReminderSummary {
    ReminderSummary {
        title: "Verification step overdue".to_string(),
        body: processing_body(reminder, "DataFlow verification"),
    }
}

fn navigate(reminder: &Reminder) -> NavigationTarget {
    NavigationTarget::new(format!("/processing/{}?tab=dataflow", entity_ref(reminder)))
}
