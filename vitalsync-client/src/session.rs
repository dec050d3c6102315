//! Session lifecycle: credential exchange, token ownership, and the
//! generation counter that scopes all downstream polling.
//!
//! Every login bumps the generation, even when the returned token string is
//! identical to the previous one. Consumers key their work on the
//! generation, never the token value, so consecutive logins always
//! invalidate prior in-flight work.

use std::sync::Arc;
use tokio::sync::{RwLock, watch};

use crate::api_client::VitalsApi;
use crate::error::{SyncError, SyncResult};

/// Monotonic counter identifying one session instance.
pub type Generation = u64;

/// The observable session pair: current token (if any) and generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub generation: Generation,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

struct SessionInner {
    state: watch::Sender<Session>,
    last_auth_error: RwLock<Option<String>>,
}

/// Owns the current credential/token and publishes its transitions.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &self.current())
            .finish()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session {
            token: None,
            generation: 0,
        });
        Self {
            inner: Arc::new(SessionInner {
                state,
                last_auth_error: RwLock::new(None),
            }),
        }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// The error from the most recent failed login, cleared on success.
    pub async fn auth_error(&self) -> Option<String> {
        self.inner.last_auth_error.read().await.clone()
    }

    /// Exchange credentials for a token.
    ///
    /// Success installs the token on `api`, bumps the generation, and clears
    /// any prior auth error. Failure leaves the token absent and the
    /// generation unchanged.
    pub async fn login(
        &self,
        api: &dyn VitalsApi,
        username: &str,
        password: &str,
    ) -> SyncResult<()> {
        match api.login(username, password).await {
            Ok(token) => {
                api.set_token(Some(token.clone())).await;
                *self.inner.last_auth_error.write().await = None;
                self.inner.state.send_modify(|session| {
                    session.token = Some(token);
                    session.generation += 1;
                });
                let session = self.current();
                log::info!(
                    "[Session] Login succeeded, now at generation {}",
                    session.generation
                );
                Ok(())
            }
            Err(err) => {
                log::warn!("[Session] Login failed: {err}");
                *self.inner.last_auth_error.write().await = Some(err.to_string());
                Err(match err {
                    SyncError::Auth(msg) => SyncError::Auth(msg),
                    other => SyncError::Auth(other.to_string()),
                })
            }
        }
    }

    /// Clear the token and invalidate all in-flight work.
    pub async fn logout(&self, api: &dyn VitalsApi) {
        api.set_token(None).await;
        self.inner.state.send_modify(|session| {
            session.token = None;
            session.generation += 1;
        });
        log::info!(
            "[Session] Logged out, now at generation {}",
            self.current().generation
        );
    }
}
