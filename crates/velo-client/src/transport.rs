use async_trait::async_trait;

use velo_core::credentials::{LoginForm, SignupForm};
use velo_core::form::{Completion, GoalPayload, GoalUpdate, NewTask, TaskUpdate};
use velo_core::{Goal, GoalId, Task, TaskId, User};

use crate::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: User,
    /// Value of the session cookie the server set, if it was visible to the client.
    pub session_cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SignupOutcome {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
}

/// One call per endpoint of the Velo API. Implementations issue exactly one
/// request per call and never retry.
#[async_trait]
pub trait VeloTransport: Send + Sync {
    async fn me(&self) -> Result<User, ClientError>;

    async fn login(&self, form: &LoginForm) -> Result<LoginOutcome, ClientError>;

    async fn signup(&self, form: &SignupForm) -> Result<SignupOutcome, ClientError>;

    async fn list_goals(&self) -> Result<Vec<Goal>, ClientError>;

    async fn create_goal(&self, payload: &GoalPayload) -> Result<Goal, ClientError>;

    async fn update_goal(&self, id: &GoalId, update: &GoalUpdate) -> Result<Goal, ClientError>;

    async fn delete_goal(&self, id: &GoalId) -> Result<(), ClientError>;

    async fn list_tasks(&self, goal_id: Option<&GoalId>) -> Result<Vec<Task>, ClientError>;

    async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError>;

    async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, ClientError>;

    async fn set_completion(&self, id: &TaskId, completion: Completion)
        -> Result<(), ClientError>;

    async fn delete_task(&self, id: &TaskId) -> Result<(), ClientError>;

    /// Drop any session credential held by the transport.
    fn clear_session(&self) {}
}
