//! Multi-engine behavior over the public API: one modal slot shared by
//! several domains, shown-state surviving restarts, bus-driven refreshes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use nudge_core::BusEvent;
use nudge_core::DomainProfile;
use nudge_core::EngineContext;
use nudge_core::EngineSettings;
use nudge_core::EventBus;
use nudge_core::LocalEventBus;
use nudge_core::ModalPresenter;
use nudge_core::ModalSlot;
use nudge_core::ReminderEngine;
use nudge_core::ReminderFetcher;
use nudge_core::SessionHandle;
use nudge_core::presentation::CloseReason;
use nudge_core::presentation::ModalContent;
use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;
use nudge_protocol::ReminderId;
use nudge_protocol::Session;
use nudge_store::FileBackend;
use nudge_store::KeyValueBackend;
use pretty_assertions::assert_eq;

/// Serves whatever list is currently configured for each domain.
#[derive(Default)]
struct DomainFetcher {
    lists: Mutex<HashMap<ReminderDomain, Vec<Reminder>>>,
}

impl DomainFetcher {
    fn set(&self, domain: ReminderDomain, reminders: Vec<Reminder>) {
        self.lists.lock().unwrap().insert(domain, reminders);
    }
}

#[async_trait]
impl ReminderFetcher for DomainFetcher {
    async fn fetch(
        &self,
        profile: &DomainProfile,
        _session: &Session,
    ) -> anyhow::Result<Vec<Reminder>> {
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&profile.domain)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct CountingPresenter {
    presented: Mutex<Vec<(ReminderDomain, String)>>,
}

impl CountingPresenter {
    fn presented(&self) -> Vec<(ReminderDomain, String)> {
        self.presented.lock().unwrap().clone()
    }
}

impl ModalPresenter for CountingPresenter {
    fn present(&self, content: &ModalContent) {
        self.presented
            .lock()
            .unwrap()
            .push((content.domain(), content.id().to_string()));
    }

    fn dismiss(&self, _content: &ModalContent, _reason: CloseReason) {}
}

fn reminder(domain: ReminderDomain, id: &str, count: u32) -> Reminder {
    Reminder {
        id: ReminderId::new(id),
        domain,
        entity_ref: Some(format!("e-{id}")),
        daily_count: 1,
        reminder_count: count,
        sent_at: None,
        detail: None,
    }
}

fn context(
    fetcher: Arc<DomainFetcher>,
    storage: Arc<dyn KeyValueBackend>,
    bus: &LocalEventBus,
    presenter: Arc<CountingPresenter>,
) -> EngineContext {
    let session = Session::new(
        "tok",
        "u-1",
        vec!["Recruiter".to_string(), "Processing Lead".to_string()],
    );
    EngineContext {
        fetcher,
        storage,
        bus: Arc::new(bus.clone()),
        modal: ModalSlot::new(presenter),
        session: SessionHandle::signed_in(session),
        settings: EngineSettings::default(),
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn domains_share_one_modal_and_queue_behind_it() {
    let fetcher = Arc::new(DomainFetcher::default());
    let presenter = Arc::new(CountingPresenter::default());
    let bus = LocalEventBus::new();
    let storage = Arc::new(nudge_store::MemoryBackend::new());
    let ctx = context(fetcher.clone(), storage, &bus, presenter.clone());

    let engines: Vec<_> = DomainProfile::all()
        .into_iter()
        .map(|profile| ReminderEngine::new(profile, &ctx).start())
        .collect();
    settle().await;

    fetcher.set(ReminderDomain::Rnr, vec![reminder(ReminderDomain::Rnr, "r1", 1)]);
    fetcher.set(ReminderDomain::Hrd, vec![reminder(ReminderDomain::Hrd, "h1", 1)]);
    bus.publish(BusEvent::foreground());
    settle().await;

    assert_eq!(presenter.presented().len(), 1);
    assert!(ctx.modal.is_open());

    // Closing lets the other domain present its reminder.
    ctx.modal.close();
    settle().await;
    let mut presented = presenter.presented();
    presented.sort();
    assert_eq!(
        presented,
        vec![
            (ReminderDomain::Rnr, "r1".to_string()),
            (ReminderDomain::Hrd, "h1".to_string()),
        ]
    );

    ctx.modal.close();
    settle().await;
    assert_eq!(presenter.presented().len(), 2);
    assert!(!ctx.modal.is_open());

    for engine in engines {
        engine.stop().await;
    }
}

#[tokio::test(start_paused = true)]
async fn shown_state_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(DomainFetcher::default());
    let presenter = Arc::new(CountingPresenter::default());
    let bus = LocalEventBus::new();

    let start = |ctx: &EngineContext| {
        ReminderEngine::new(DomainProfile::for_domain(ReminderDomain::Rnr), ctx).start()
    };

    let storage: Arc<dyn KeyValueBackend> = Arc::new(FileBackend::new(dir.path()));
    let ctx = context(fetcher.clone(), storage, &bus, presenter.clone());
    let engine = start(&ctx);
    settle().await;
    fetcher.set(ReminderDomain::Rnr, vec![reminder(ReminderDomain::Rnr, "r1", 2)]);
    engine.refresh();
    settle().await;
    assert_eq!(presenter.presented(), vec![(ReminderDomain::Rnr, "r1".to_string())]);
    ctx.modal.close();
    engine.stop().await;
    assert_eq!(bus.subscriber_count("rnr:reminder"), 0);

    // A fresh process: new backend over the same directory.
    let storage: Arc<dyn KeyValueBackend> = Arc::new(FileBackend::new(dir.path()));
    let ctx = context(fetcher.clone(), storage, &bus, presenter.clone());
    let engine = start(&ctx);
    settle().await;
    engine.refresh();
    settle().await;
    assert_eq!(presenter.presented().len(), 1);

    fetcher.set(ReminderDomain::Rnr, vec![reminder(ReminderDomain::Rnr, "r1", 3)]);
    engine.refresh();
    settle().await;
    assert_eq!(
        presenter.presented(),
        vec![
            (ReminderDomain::Rnr, "r1".to_string()),
            (ReminderDomain::Rnr, "r1".to_string()),
        ]
    );
    engine.stop().await;
}
