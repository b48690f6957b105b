use std::sync::Arc;

use velo_core::credentials::{LoginForm, SignupForm};

use crate::cache::QueryCache;
use crate::session::SessionGate;
use crate::transport::{LoginOutcome, SignupOutcome, VeloTransport};
use crate::ClientError;

/// Login, signup and logout. Credentials are validated before any request
/// and every change of identity drops cached reads and re-arms the gate.
pub struct AuthService {
    transport: Arc<dyn VeloTransport>,
    cache: Arc<QueryCache>,
    session: Arc<SessionGate>,
}

impl AuthService {
    pub fn new(
        transport: Arc<dyn VeloTransport>,
        cache: Arc<QueryCache>,
        session: Arc<SessionGate>,
    ) -> Self {
        Self {
            transport,
            cache,
            session,
        }
    }

    pub async fn login(&self, form: LoginForm) -> Result<LoginOutcome, ClientError> {
        let form = form.validate()?;
        tracing::debug!(email = %form.email, "logging in");
        let outcome = self.transport.login(&form).await.map_err(|err| {
            tracing::warn!(email = %form.email, error = %err, "login failed");
            err
        })?;
        self.cache.clear();
        self.session.reset();
        Ok(outcome)
    }

    pub async fn signup(&self, form: SignupForm) -> Result<SignupOutcome, ClientError> {
        let form = form.validate()?;
        tracing::debug!(email = %form.email, "signing up");
        self.transport.signup(&form).await.map_err(|err| {
            tracing::warn!(email = %form.email, error = %err, "signup failed");
            err
        })
    }

    /// Forget the local session. The server keeps no logout endpoint, so this
    /// only affects this client.
    pub fn logout(&self) {
        self.transport.clear_session();
        self.cache.clear();
        self.session.reset();
    }
}
