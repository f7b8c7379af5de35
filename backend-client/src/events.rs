//! Server-sent event stream carrying real-time reminder pushes.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::Stream;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::BackendClient;
use crate::FetchError;

/// SSE event name used when the server sends unnamed events.
const DEFAULT_EVENT: &str = "message";

/// One named push event with its JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeMessage {
    pub event: String,
    pub data: Value,
}

impl RealtimeMessage {
    /// Unnamed events may carry their name inside the payload as
    /// `{ "event": "...", ... }` or `{ "type": "...", ... }`.
    pub fn from_sse(event: &str, data: Value) -> Self {
        let event = if event.is_empty() || event == DEFAULT_EVENT {
            ["event", "type"]
                .iter()
                .find_map(|key| data.get(*key).and_then(Value::as_str))
                .unwrap_or(DEFAULT_EVENT)
                .to_string()
        } else {
            event.to_string()
        };
        Self { event, data }
    }
}

pub type RealtimeStream = Pin<Box<dyn Stream<Item = Result<RealtimeMessage, FetchError>> + Send>>;

impl BackendClient {
    /// Opens the SSE stream at `path`. Events whose data is not JSON are
    /// skipped; transport errors are yielded and usually end the stream.
    pub async fn subscribe_events(
        &self,
        path: &str,
        token: &str,
    ) -> Result<RealtimeStream, FetchError> {
        let response = self
            .http()
            .get(self.url(path))
            .bearer_auth(token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => {
                        if event.data.trim().is_empty() {
                            return None;
                        }
                        match serde_json::from_str::<Value>(&event.data) {
                            Ok(data) => Some(Ok(RealtimeMessage::from_sse(&event.event, data))),
                            Err(err) => {
                                tracing::debug!(
                                    event = %event.event,
                                    error = %err,
                                    "skipping non-JSON event"
                                );
                                None
                            }
                        }
                    }
                    Err(err) => Some(Err(FetchError::Stream(err.to_string()))),
                }
            });
        Ok(Box::pin(stream))
    }
}
