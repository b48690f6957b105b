//! Authentication gate derived from a single identity probe.
//!
//! `Loading` until the first probe resolves, then `Authenticated` or
//! `Unauthenticated`. A failed probe is an ordinary outcome, not an error,
//! and is never retried on its own; call [`SessionGate::reset`] to allow a
//! fresh probe (after login or logout).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use velo_core::User;

use crate::transport::VeloTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Authenticated(User),
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

/// What a protected view gets to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    Loading,
    Unauthenticated,
    Granted(T),
}

impl<T> Gated<T> {
    pub fn granted(self) -> Option<T> {
        match self {
            Gated::Granted(value) => Some(value),
            _ => None,
        }
    }
}

pub struct SessionGate {
    transport: Arc<dyn VeloTransport>,
    state: Mutex<SessionState>,
    // Serializes probes so concurrent callers share one request.
    probe_lock: tokio::sync::Mutex<()>,
}

impl SessionGate {
    pub fn new(transport: Arc<dyn VeloTransport>) -> Self {
        Self {
            transport,
            state: Mutex::new(SessionState::Loading),
            probe_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the session, issuing the identity request only if it has not
    /// been resolved yet.
    pub async fn probe(&self) -> Option<User> {
        let _guard = self.probe_lock.lock().await;
        if let Some(resolved) = self.resolved() {
            return resolved;
        }

        let next = match self.transport.me().await {
            Ok(user) => {
                tracing::debug!(email = %user.email, "session probe: authenticated");
                SessionState::Authenticated(user)
            }
            Err(err) => {
                tracing::debug!(error = %err, "session probe: not authenticated");
                SessionState::Unauthenticated
            }
        };

        let user = match &next {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        };
        *self.lock() = next;
        user
    }

    fn resolved(&self) -> Option<Option<User>> {
        match &*self.lock() {
            SessionState::Loading => None,
            SessionState::Authenticated(user) => Some(Some(user.clone())),
            SessionState::Unauthenticated => Some(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match self.state() {
            SessionState::Loading => SessionSnapshot {
                user: None,
                is_authenticated: false,
                is_loading: true,
            },
            SessionState::Authenticated(user) => SessionSnapshot {
                user: Some(user),
                is_authenticated: true,
                is_loading: false,
            },
            SessionState::Unauthenticated => SessionSnapshot {
                user: None,
                is_authenticated: false,
                is_loading: false,
            },
        }
    }

    /// Run `view` only for an authenticated session.
    pub fn gate<T>(&self, view: impl FnOnce(&User) -> T) -> Gated<T> {
        match &self.state() {
            SessionState::Loading => Gated::Loading,
            SessionState::Unauthenticated => Gated::Unauthenticated,
            SessionState::Authenticated(user) => Gated::Granted(view(user)),
        }
    }

    pub fn reset(&self) {
        *self.lock() = SessionState::Loading;
    }
}
