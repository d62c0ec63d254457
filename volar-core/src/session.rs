use tokio::sync::watch;
use volar_shared::Masked;

use crate::CoreResult;

/// Opaque bearer credential issued at login.
pub type AuthToken = Masked<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: AuthToken,
    /// Stored beside the token for display purposes; never sent to the API.
    pub user_id: Option<i64>,
}

impl Credentials {
    pub fn new(token: impl Into<AuthToken>) -> Self {
        Self {
            token: token.into(),
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Holder of the session credential that gates reservation operations.
///
/// Readers call [`SessionStore::token`] on every gated action. Components that
/// need to react to login/logout subscribe instead of polling.
pub trait SessionStore: Send + Sync {
    fn credentials(&self) -> Option<Credentials>;

    fn token(&self) -> Option<AuthToken> {
        self.credentials().map(|c| c.token)
    }

    fn is_authenticated(&self) -> bool {
        self.credentials().is_some()
    }

    fn sign_in(&self, credentials: Credentials) -> CoreResult<()>;

    fn sign_out(&self) -> CoreResult<()>;

    /// Change notifications; the receiver starts at the current value.
    fn subscribe(&self) -> watch::Receiver<Option<Credentials>>;
}

/// Process-local session, lost on exit.
#[derive(Debug)]
pub struct MemorySessionStore {
    current: watch::Sender<Option<Credentials>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            current: watch::Sender::new(None),
        }
    }

    pub fn signed_in(credentials: Credentials) -> Self {
        Self {
            current: watch::Sender::new(Some(credentials)),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn credentials(&self) -> Option<Credentials> {
        self.current.borrow().clone()
    }

    fn sign_in(&self, credentials: Credentials) -> CoreResult<()> {
        tracing::info!(user_id = ?credentials.user_id, "Session opened");
        self.current.send_replace(Some(credentials));
        Ok(())
    }

    fn sign_out(&self) -> CoreResult<()> {
        tracing::info!("Session closed");
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credentials>> {
        self.current.subscribe()
    }
}
