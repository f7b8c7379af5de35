//! Per-domain parameterization of the one reminder engine.

mod dataflow;
mod hrd;
mod rnr;

use nudge_backend_client::ReminderQuery;
use nudge_protocol::Reminder;
use nudge_protocol::ReminderDetail;
use nudge_protocol::ReminderDomain;

use crate::presentation::ModalContent;
use crate::presentation::NavigationTarget;
use crate::presentation::ReminderSummary;

/// Everything that differs between the RNR, HRD and DataFlow engines.
#[derive(Debug, Clone)]
pub struct DomainProfile {
    pub domain: ReminderDomain,
    /// Path of the authoritative list endpoint, relative to the base url.
    pub path: String,
    pub due_only: Option<bool>,
    pub storage_key: &'static str,
    pub event_names: &'static [&'static str],
    /// Event name (or payload `type`) that marks a push as a fresh send.
    pub sent_tag: &'static str,
    /// Case-insensitive role substring required to run the engine.
    pub role_marker: &'static str,
    pub describe: fn(&Reminder) -> ReminderSummary,
    pub navigate: fn(&Reminder) -> NavigationTarget,
}

impl DomainProfile {
    pub fn for_domain(domain: ReminderDomain) -> Self {
        match domain {
            ReminderDomain::Rnr => rnr::profile(),
            ReminderDomain::Hrd => hrd::profile(),
            ReminderDomain::DataFlow => dataflow::profile(),
        }
    }

    pub fn all() -> Vec<Self> {
        ReminderDomain::ALL.into_iter().map(Self::for_domain).collect()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_due_only(mut self, due_only: Option<bool>) -> Self {
        self.due_only = due_only;
        self
    }

    pub fn query(&self) -> ReminderQuery {
        ReminderQuery {
            domain: self.domain,
            path: self.path.clone(),
            due_only: self.due_only,
        }
    }

    pub fn listens_to(&self, event_name: &str) -> bool {
        self.event_names.contains(&event_name)
    }

    pub fn modal_content(&self, reminder: Reminder) -> ModalContent {
        let summary = (self.describe)(&reminder);
        let target = (self.navigate)(&reminder);
        ModalContent {
            reminder,
            summary,
            target,
        }
    }
}

fn attempts(count: u32) -> String {
    match count {
        1 => "1 reminder sent".to_string(),
        n => format!("{n} reminders sent"),
    }
}

/// Body shared by the processing-step domains (HRD, DataFlow).
fn processing_body(reminder: &Reminder, fallback_step: &str) -> String {
    let step = match &reminder.detail {
        Some(ReminderDetail::Processing(step)) => Some(step),
        _ => None,
    };
    let mut body = step
        .and_then(|s| s.step.clone())
        .unwrap_or_else(|| fallback_step.to_string());
    if let Some(name) = step
        .and_then(|s| s.candidate.as_ref())
        .and_then(|c| c.display_name())
    {
        body.push_str(&format!(" for {name}"));
    }
    if let Some(project) = step
        .and_then(|s| s.project.as_ref())
        .and_then(|p| p.title.as_deref())
    {
        body.push_str(&format!(" ({project})"));
    }
    body.push_str(" is overdue");
    if let Some(due) = step.and_then(|s| s.due_date.as_deref()) {
        body.push_str(&format!(", due {due}"));
    }
    body.push_str(&format!(". {}.", attempts(reminder.reminder_count)));
    body
}

fn entity_ref(reminder: &Reminder) -> &str {
    reminder.entity_ref.as_deref().unwrap_or(reminder.id.as_str())
}
