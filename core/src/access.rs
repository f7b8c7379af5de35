use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use nudge_protocol::Session;

/// Shared view of the signed-in session. Engines read it on every fetch so
/// a sign-out stops network activity on the next cycle.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(Some(session))
    }

    pub fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The current session if it is valid and carries `role_marker`.
    pub fn granted(&self, role_marker: &str) -> Option<Session> {
        self.current().filter(|session| session.grants(role_marker))
    }

    pub fn grants(&self, role_marker: &str) -> bool {
        self.granted(role_marker).is_some()
    }

    pub fn user_id(&self) -> Option<String> {
        self.current().map(|session| session.user_id)
    }
}
