//! Forwards the platform's server-sent events onto the in-process bus.

use std::sync::Arc;
use std::time::Duration;

use backon::ExponentialBuilder;
use backon::Retryable;
use futures::StreamExt;
use nudge_backend_client::BackendClient;
use nudge_backend_client::FetchError;
use nudge_backend_client::RealtimeStream;
use nudge_core::BusEvent;
use nudge_core::EventBus;
use nudge_core::SessionHandle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
const CONNECT_ATTEMPTS: usize = 5;

/// Keeps one SSE connection open while the session is valid and grants at
/// least one of `role_markers`; otherwise no request is made. Each message is
/// published as a `BusEvent` named after the SSE event. After a reconnect a
/// foreground event is published so engines refetch whatever was pushed
/// while the stream was down.
pub struct SseBridge {
    client: BackendClient,
    events_path: String,
    session: SessionHandle,
    role_markers: Vec<&'static str>,
    bus: Arc<dyn EventBus>,
    reconnect_delay: Duration,
}

impl SseBridge {
    pub fn new(
        client: BackendClient,
        events_path: impl Into<String>,
        session: SessionHandle,
        role_markers: Vec<&'static str>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            client,
            events_path: events_path.into(),
            session,
            role_markers,
            bus,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut connected_before = false;
        loop {
            if let Some(stream) = self.connect(&cancel).await {
                if connected_before {
                    self.bus.publish(BusEvent::foreground());
                }
                connected_before = true;
                self.forward(stream, &cancel).await;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        tracing::debug!("event bridge stopped");
    }

    async fn connect(&self, cancel: &CancellationToken) -> Option<RealtimeStream> {
        let Some(session) = self
            .role_markers
            .iter()
            .find_map(|marker| self.session.granted(marker))
        else {
            tracing::debug!("no entitled session; event stream stays closed");
            return None;
        };

        let attempt = || async {
            self.client
                .subscribe_events(&self.events_path, &session.token)
                .await
        };
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(self.reconnect_delay.max(Duration::from_millis(250)))
            .with_max_times(CONNECT_ATTEMPTS);

        let result = tokio::select! {
            _ = cancel.cancelled() => return None,
            result = attempt
                .retry(backoff)
                .when(|err: &FetchError| !err.is_unauthorized())
                .notify(|err: &FetchError, delay: Duration| {
                    tracing::debug!(error = %err, ?delay, "retrying event stream connect");
                }) => result,
        };

        match result {
            Ok(stream) => {
                tracing::info!(path = %self.events_path, "event stream connected");
                Some(stream)
            }
            Err(err) => {
                tracing::warn!(error = %err, "event stream unavailable");
                None
            }
        }
    }

    async fn forward(&self, mut stream: RealtimeStream, cancel: &CancellationToken) {
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return,
                next = stream.next() => next,
            };
            match next {
                Some(Ok(message)) => {
                    tracing::debug!(event = %message.event, "push received");
                    self.bus.publish(BusEvent::new(message.event, message.data));
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "event stream failed");
                    return;
                }
                None => {
                    tracing::info!("event stream closed by server");
                    return;
                }
            }
        }
    }
}
