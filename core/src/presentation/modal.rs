use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use tokio::sync::broadcast;

use super::CloseReason;
use super::ModalClosed;
use super::ModalContent;
use super::NavigationTarget;

const CLOSED_CHANNEL_CAPACITY: usize = 16;

/// Renders the modal. Implementations must not call back into the slot.
pub trait ModalPresenter: Send + Sync {
    fn present(&self, content: &ModalContent);

    fn dismiss(&self, content: &ModalContent, reason: CloseReason);
}

struct SlotInner {
    open: Mutex<Option<ModalContent>>,
    presenter: Arc<dyn ModalPresenter>,
    closed_tx: broadcast::Sender<ModalClosed>,
}

/// Process-wide holder of the one open reminder modal. Every engine shares
/// a clone; `try_open` is the single-flight check.
#[derive(Clone)]
pub struct ModalSlot {
    inner: Arc<SlotInner>,
}

impl ModalSlot {
    pub fn new(presenter: Arc<dyn ModalPresenter>) -> Self {
        let (closed_tx, _) = broadcast::channel(CLOSED_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SlotInner {
                open: Mutex::new(None),
                presenter,
                closed_tx,
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn current(&self) -> Option<ModalContent> {
        self.lock().clone()
    }

    /// Occupies the slot with `content` unless another modal is already
    /// open. Returns whether this call opened it.
    pub fn try_open(&self, content: ModalContent) -> bool {
        {
            let mut open = self.lock();
            if open.is_some() {
                return false;
            }
            *open = Some(content.clone());
        }
        tracing::info!(
            domain = %content.domain(),
            reminder_id = %content.id(),
            count = content.reminder.reminder_count,
            "presenting reminder"
        );
        self.inner.presenter.present(&content);
        true
    }

    /// Closes the modal without acting on it.
    pub fn close(&self) -> Option<ModalContent> {
        self.close_with(CloseReason::Dismissed)
    }

    /// The "view" affordance: closes the modal and hands back where to go.
    pub fn view(&self) -> Option<NavigationTarget> {
        self.close_with(CloseReason::Viewed)
            .map(|content| content.target)
    }

    pub fn subscribe_closed(&self) -> broadcast::Receiver<ModalClosed> {
        self.inner.closed_tx.subscribe()
    }

    fn close_with(&self, reason: CloseReason) -> Option<ModalContent> {
        let content = self.lock().take()?;
        self.inner.presenter.dismiss(&content, reason);
        let closed = ModalClosed {
            domain: content.domain(),
            id: content.id().clone(),
            reason,
        };
        // No receivers just means no engine is running.
        let _ = self.inner.closed_tx.send(closed);
        Some(content)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ModalContent>> {
        self.inner.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ModalSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalSlot")
            .field("open", &self.current().map(|c| c.reminder.id))
            .finish()
    }
}
