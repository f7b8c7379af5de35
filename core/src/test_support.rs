//! Fakes shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use nudge_protocol::CandidateSnapshot;
use nudge_protocol::ProcessingSnapshot;
use nudge_protocol::Reminder;
use nudge_protocol::ReminderDetail;
use nudge_protocol::ReminderDomain;
use nudge_protocol::ReminderId;
use nudge_protocol::Session;

use crate::DomainProfile;
use crate::presentation::CloseReason;
use crate::presentation::ModalContent;
use crate::presentation::ModalPresenter;
use crate::source::ReminderFetcher;

/// An active reminder with detail and no `sent_at`.
pub(crate) fn reminder(domain: ReminderDomain, id: &str, count: u32) -> Reminder {
    let entity = format!("e-{id}");
    let detail = match domain {
        ReminderDomain::Rnr => ReminderDetail::Candidate(CandidateSnapshot {
            id: Some(entity.clone()),
            first_name: Some("Asha".to_string()),
            ..Default::default()
        }),
        ReminderDomain::Hrd | ReminderDomain::DataFlow => {
            ReminderDetail::Processing(ProcessingSnapshot {
                id: Some(entity.clone()),
                step: Some("Step".to_string()),
                ..Default::default()
            })
        }
    };
    Reminder {
        id: ReminderId::new(id),
        domain,
        entity_ref: Some(entity),
        daily_count: 1,
        reminder_count: count,
        sent_at: None,
        detail: Some(detail),
    }
}

pub(crate) fn content(domain: ReminderDomain, id: &str) -> ModalContent {
    DomainProfile::for_domain(domain).modal_content(reminder(domain, id, 1))
}

#[derive(Default)]
pub(crate) struct RecordingPresenter {
    events: Mutex<Vec<String>>,
    presented: Mutex<Vec<ModalContent>>,
}

impl RecordingPresenter {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn presented(&self) -> Vec<ModalContent> {
        self.presented.lock().unwrap().clone()
    }
}

impl ModalPresenter for RecordingPresenter {
    fn present(&self, content: &ModalContent) {
        self.events
            .lock()
            .unwrap()
            .push(format!("present {}:{}", content.domain(), content.id()));
        self.presented.lock().unwrap().push(content.clone());
    }

    fn dismiss(&self, content: &ModalContent, reason: CloseReason) {
        self.events
            .lock()
            .unwrap()
            .push(format!("dismiss {}:{} {reason:?}", content.domain(), content.id()));
    }
}

/// Replays queued results; once the queue is empty the last successful
/// list is repeated.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<Reminder>, String>>>,
    last_ok: Mutex<Vec<Reminder>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn push_ok(&self, reminders: Vec<Reminder>) {
        self.script.lock().unwrap().push_back(Ok(reminders));
    }

    pub(crate) fn push_err(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReminderFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _profile: &DomainProfile,
        _session: &Session,
    ) -> anyhow::Result<Vec<Reminder>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(reminders)) => {
                *self.last_ok.lock().unwrap() = reminders.clone();
                Ok(reminders)
            }
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(self.last_ok.lock().unwrap().clone()),
        }
    }
}
