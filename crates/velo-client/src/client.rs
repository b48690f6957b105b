use std::sync::Arc;

use crate::auth_service::AuthService;
use crate::cache::QueryCache;
use crate::goal_service::GoalService;
use crate::http_client::HttpVeloClient;
use crate::session::SessionGate;
use crate::task_service::TaskService;
use crate::transport::VeloTransport;
use crate::ClientError;

/// Application context: one transport, one cache, and the services sharing them.
///
/// The cache lives exactly as long as this value; [`Velo::shutdown`] empties it.
pub struct Velo {
    cache: Arc<QueryCache>,
    session: Arc<SessionGate>,
    auth: AuthService,
    goals: GoalService,
    tasks: TaskService,
}

impl Velo {
    /// Connect to a Velo server over HTTP, optionally resuming a stored session.
    pub fn connect(base_url: &str, session_cookie: Option<String>) -> Result<Self, ClientError> {
        let transport = HttpVeloClient::new(base_url.to_string(), session_cookie)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn VeloTransport>) -> Self {
        let cache = Arc::new(QueryCache::new());
        let session = Arc::new(SessionGate::new(transport.clone()));
        Self {
            auth: AuthService::new(transport.clone(), cache.clone(), session.clone()),
            goals: GoalService::new(transport.clone(), cache.clone()),
            tasks: TaskService::new(transport, cache.clone()),
            cache,
            session,
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn goals(&self) -> &GoalService {
        &self.goals
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn shutdown(&self) {
        self.cache.clear();
        tracing::debug!("velo client shut down");
    }
}
