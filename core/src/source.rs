//! Authoritative, periodically refreshed reminder snapshots.

use std::sync::Arc;

use async_trait::async_trait;
use nudge_backend_client::BackendClient;
use nudge_protocol::Reminder;
use nudge_protocol::Session;

use crate::DomainProfile;
use crate::SessionHandle;

/// Transport behind [`ReminderSource`]. The engine never sees its errors.
#[async_trait]
pub trait ReminderFetcher: Send + Sync {
    async fn fetch(&self, profile: &DomainProfile, session: &Session)
    -> anyhow::Result<Vec<Reminder>>;
}

/// Fetches over HTTP with the session's bearer token.
#[derive(Debug, Clone)]
pub struct HttpReminderFetcher {
    client: BackendClient,
}

impl HttpReminderFetcher {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReminderFetcher for HttpReminderFetcher {
    async fn fetch(
        &self,
        profile: &DomainProfile,
        session: &Session,
    ) -> anyhow::Result<Vec<Reminder>> {
        let reminders = self
            .client
            .list_reminders(&profile.query(), &session.token)
            .await?;
        Ok(reminders)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Fresh(Vec<Reminder>),
    /// Transport failure; the caller keeps its last-good snapshot.
    Failed,
    /// No valid session or missing role; nothing was sent.
    Denied,
}

/// One domain's view of the authoritative reminder list.
#[derive(Clone)]
pub struct ReminderSource {
    profile: Arc<DomainProfile>,
    fetcher: Arc<dyn ReminderFetcher>,
    session: SessionHandle,
}

impl ReminderSource {
    pub fn new(
        profile: Arc<DomainProfile>,
        fetcher: Arc<dyn ReminderFetcher>,
        session: SessionHandle,
    ) -> Self {
        Self {
            profile,
            fetcher,
            session,
        }
    }

    pub fn is_permitted(&self) -> bool {
        self.session.grants(self.profile.role_marker)
    }

    pub async fn fetch(&self) -> SourceOutcome {
        let domain = self.profile.domain;
        let Some(session) = self.session.granted(self.profile.role_marker) else {
            tracing::debug!(%domain, "skipping fetch without an entitled session");
            return SourceOutcome::Denied;
        };
        match self.fetcher.fetch(&self.profile, &session).await {
            Ok(reminders) => {
                tracing::debug!(%domain, count = reminders.len(), "fetched reminders");
                SourceOutcome::Fresh(reminders)
            }
            Err(err) => {
                tracing::warn!(%domain, error = %err, "reminder fetch failed; keeping last snapshot");
                SourceOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for ReminderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderSource")
            .field("domain", &self.profile.domain)
            .finish_non_exhaustive()
    }
}
