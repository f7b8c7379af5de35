use std::time::Duration;

use nudge_protocol::Reminder;
use nudge_protocol::ReminderDomain;
use nudge_protocol::wire::ReminderListResponse;
use reqwest::header::ACCEPT;

use crate::FetchError;

const USER_AGENT: &str = concat!("nudge/", env!("CARGO_PKG_VERSION"));

/// Requests never outlive one poll cycle.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Applies to list requests only; the event stream stays open indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of one authoritative reminder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderQuery {
    pub domain: ReminderDomain,
    /// Path below the base URL, e.g. `/reminders/hrd`.
    pub path: String,
    pub due_only: Option<bool>,
}

impl ReminderQuery {
    pub fn for_domain(domain: ReminderDomain) -> Self {
        Self {
            domain,
            path: format!("/reminders/{}", domain.as_str()),
            due_only: None,
        }
    }

    pub fn with_due_only(mut self, due_only: bool) -> Self {
        self.due_only = Some(due_only);
        self
    }
}

/// Thin client over the platform's reminder endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::with_http_client(base_url, http))
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// `GET {base}/reminders/{domain}[?dueOnly=..]`.
    ///
    /// Accepts both the `{ data }` and the paginated `{ items, total, page,
    /// limit }` response shapes.
    pub async fn list_reminders(
        &self,
        query: &ReminderQuery,
        token: &str,
    ) -> Result<Vec<Reminder>, FetchError> {
        let mut request = self
            .http
            .get(self.url(&query.path))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");
        if let Some(due_only) = query.due_only {
            request = request.query(&[("dueOnly", due_only)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: ReminderListResponse = serde_json::from_slice(&bytes)?;
        if let Some(page) = parsed.page_info() {
            tracing::trace!(
                domain = %query.domain,
                total = ?page.total,
                page = ?page.page,
                limit = ?page.limit,
                "paginated reminder listing"
            );
        }
        Ok(parsed.into_reminders(query.domain))
    }
}
