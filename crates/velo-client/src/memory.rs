//! In-process `VeloTransport` that answers the way the Velo server does.
//!
//! Every call is recorded with the JSON body that would have gone over the
//! wire, so tests can assert on request shapes without a network.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use velo_core::credentials::{LoginForm, SignupForm};
use velo_core::form::{Completion, GoalPayload, GoalUpdate, NewTask, TaskUpdate};
use velo_core::{Goal, GoalId, GoalStatus, GoalType, Priority, Task, TaskId, Urgency, User};

use crate::transport::{LoginOutcome, SignupOutcome, VeloTransport};
use crate::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Me,
    Login,
    Signup,
    ListGoals,
    CreateGoal,
    UpdateGoal,
    DeleteGoal,
    ListTasks,
    CreateTask,
    UpdateTask,
    CompleteTask,
    DeleteTask,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub endpoint: Endpoint,
    /// Path parameter or `goal_id` query value, if any.
    pub target: Option<String>,
    /// JSON body as it would be serialized onto the wire.
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct Account {
    id: String,
    name: String,
    last_name: String,
    email: String,
    password: String,
}

impl Account {
    fn user(&self) -> User {
        User {
            id: Some(self.id.clone()),
            email: self.email.clone(),
            name: self.name.clone(),
            last_name: Some(self.last_name.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: Vec<Account>,
    session: Option<String>,
    goals: Vec<Goal>,
    tasks: Vec<Task>,
    next_id: u64,
    calls: Vec<Call>,
    failures: HashMap<Endpoint, (u16, String)>,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn signed_in(&self) -> Result<&Account, ClientError> {
        let email = self.session.as_deref().ok_or_else(|| reject(401, "Missing auth token"))?;
        self.accounts
            .iter()
            .find(|a| a.email == email)
            .ok_or_else(|| reject(401, "Invalid auth token"))
    }

    fn goal_counts(&self, goal_id: &GoalId) -> (u32, u32) {
        let scoped = self
            .tasks
            .iter()
            .filter(|t| t.goal_id.as_ref() == Some(goal_id));
        let (total, completed) = scoped.fold((0, 0), |(total, done), t| {
            (total + 1, done + u32::from(t.is_completed))
        });
        (total, completed)
    }

    fn with_counts(&self, goal: &Goal) -> Goal {
        let (total, completed) = self.goal_counts(&goal.id);
        Goal {
            total_tasks: total,
            completed_tasks: completed,
            ..goal.clone()
        }
    }
}

fn reject(status: u16, message: &str) -> ClientError {
    ClientError::Api {
        status,
        message: message.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an account without going through `signup`.
    pub fn with_account(self, name: &str, email: &str, password: &str) -> Self {
        {
            let mut state = self.lock();
            let id = state.next_id("user");
            state.accounts.push(Account {
                id,
                name: name.to_string(),
                last_name: String::new(),
                email: email.to_string(),
                password: password.to_string(),
            });
        }
        self
    }

    /// Register an account and start a session for it.
    pub fn signed_in(self, name: &str, email: &str) -> Self {
        let this = self.with_account(name, email, "correct horse battery");
        this.lock().session = Some(email.to_string());
        this
    }

    pub fn sign_out(&self) {
        self.lock().session = None;
    }

    pub fn seed_goal(&self, title: &str, goal_type: GoalType) -> Result<GoalId, ClientError> {
        let mut state = self.lock();
        let id = GoalId::new(state.next_id("goal"))?;
        state.goals.push(Goal {
            id: id.clone(),
            user_id: None,
            title: title.to_string(),
            description: String::new(),
            goal_type,
            status: GoalStatus::NotStarted,
            deadline: None,
            frequency: None,
            last_active_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            total_tasks: 0,
            completed_tasks: 0,
        });
        Ok(id)
    }

    pub fn seed_task(
        &self,
        goal_id: Option<&GoalId>,
        title: &str,
        priority: Priority,
        is_completed: bool,
    ) -> Result<TaskId, ClientError> {
        let mut state = self.lock();
        let id = TaskId::new(state.next_id("task"))?;
        state.tasks.push(Task {
            id: id.clone(),
            goal_id: goal_id.cloned(),
            title: title.to_string(),
            description: String::new(),
            deadline: None,
            user_priority: priority,
            ai_urgency: Urgency::default(),
            is_completed,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        });
        Ok(id)
    }

    /// Make every call to `endpoint` fail with `status` until [`recover`](Self::recover).
    pub fn fail(&self, endpoint: Endpoint, status: u16, message: &str) {
        self.lock()
            .failures
            .insert(endpoint, (status, message.to_string()));
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.lock().tasks.iter().find(|t| &t.id == id).cloned()
    }

    pub fn goal(&self, id: &GoalId) -> Option<Goal> {
        let state = self.lock();
        state
            .goals
            .iter()
            .find(|g| &g.id == id)
            .map(|g| state.with_counts(g))
    }

    /// Record the call and return the state, or the injected failure.
    fn enter(
        &self,
        endpoint: Endpoint,
        target: Option<String>,
        body: Option<Value>,
    ) -> Result<MutexGuard<'_, MemoryState>, ClientError> {
        let mut state = self.lock();
        state.calls.push(Call {
            endpoint,
            target,
            body,
        });
        if let Some((status, message)) = state.failures.get(&endpoint) {
            return Err(reject(*status, message));
        }
        Ok(state)
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Option<Value>, ClientError> {
    Ok(Some(serde_json::to_value(value)?))
}

#[async_trait]
impl VeloTransport for MemoryTransport {
    async fn me(&self) -> Result<User, ClientError> {
        let state = self.enter(Endpoint::Me, None, None)?;
        let account = state.signed_in()?;
        Ok(account.user())
    }

    async fn login(&self, form: &LoginForm) -> Result<LoginOutcome, ClientError> {
        let mut state = self.enter(Endpoint::Login, None, to_body(form)?)?;
        let account = state
            .accounts
            .iter()
            .find(|a| a.email == form.email && a.password == form.password)
            .cloned()
            .ok_or_else(|| reject(401, "Invalid email or password"))?;
        state.session = Some(account.email.clone());
        let token = state.next_id("session");
        Ok(LoginOutcome {
            user: User {
                id: None,
                email: account.email,
                name: account.name,
                last_name: None,
            },
            session_cookie: Some(token),
        })
    }

    async fn signup(&self, form: &SignupForm) -> Result<SignupOutcome, ClientError> {
        let mut state = self.enter(Endpoint::Signup, None, to_body(form)?)?;
        if state.accounts.iter().any(|a| a.email == form.email) {
            return Err(reject(409, "Email already in use"));
        }
        let id = state.next_id("user");
        state.accounts.push(Account {
            id: id.clone(),
            name: form.name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
        });
        Ok(SignupOutcome {
            id: Some(id),
            email: form.email.clone(),
        })
    }

    async fn list_goals(&self) -> Result<Vec<Goal>, ClientError> {
        let state = self.enter(Endpoint::ListGoals, None, None)?;
        state.signed_in()?;
        let goals = state.goals.iter().map(|g| state.with_counts(g)).collect();
        Ok(goals)
    }

    async fn create_goal(&self, payload: &GoalPayload) -> Result<Goal, ClientError> {
        let mut state = self.enter(Endpoint::CreateGoal, None, to_body(payload)?)?;
        state.signed_in()?;
        if payload.title.is_empty() {
            return Err(reject(400, "Title is required"));
        }
        let deadline = match payload.deadline.as_deref() {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| reject(400, "Invalid request body"))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };
        if payload.goal_type == GoalType::Deadline && deadline.is_none() {
            return Err(reject(400, "Deadline is required for deadline goals"));
        }
        if payload.goal_type == GoalType::Habit && payload.frequency.is_none() {
            return Err(reject(400, "Frequency is required for habit goals"));
        }

        let id = GoalId::new(state.next_id("goal"))?;
        let now = Utc::now();
        let goal = Goal {
            id,
            user_id: None,
            title: payload.title.clone(),
            description: payload.description.clone(),
            goal_type: payload.goal_type,
            status: GoalStatus::NotStarted,
            deadline,
            frequency: payload.frequency,
            last_active_at: None,
            created_at: Some(now),
            updated_at: Some(now),
            total_tasks: 0,
            completed_tasks: 0,
        };
        state.goals.push(goal.clone());
        Ok(goal)
    }

    async fn update_goal(&self, id: &GoalId, update: &GoalUpdate) -> Result<Goal, ClientError> {
        let mut state =
            self.enter(Endpoint::UpdateGoal, Some(id.to_string()), to_body(update)?)?;
        state.signed_in()?;
        let goal = state
            .goals
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| reject(404, "Goal not found"))?;
        if let Some(title) = &update.title {
            goal.title = title.clone();
        }
        if let Some(description) = &update.description {
            goal.description = description.clone();
        }
        goal.updated_at = Some(Utc::now());
        let goal = goal.clone();
        Ok(state.with_counts(&goal))
    }

    async fn delete_goal(&self, id: &GoalId) -> Result<(), ClientError> {
        let mut state = self.enter(Endpoint::DeleteGoal, Some(id.to_string()), None)?;
        state.signed_in()?;
        // Deleting a goal archives it as abandoned.
        let goal = state
            .goals
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| reject(404, "Goal not found"))?;
        goal.status = GoalStatus::Abandoned;
        Ok(())
    }

    async fn list_tasks(&self, goal_id: Option<&GoalId>) -> Result<Vec<Task>, ClientError> {
        let state = self.enter(
            Endpoint::ListTasks,
            goal_id.map(ToString::to_string),
            None,
        )?;
        state.signed_in()?;
        let tasks = state
            .tasks
            .iter()
            .filter(|t| goal_id.is_none() || t.goal_id.as_ref() == goal_id)
            .cloned()
            .collect();
        Ok(tasks)
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        let mut state = self.enter(Endpoint::CreateTask, None, to_body(task)?)?;
        state.signed_in()?;
        if task.title.is_empty() {
            return Err(reject(400, "Title is required"));
        }
        let goal_id = task
            .goal_id
            .clone()
            .ok_or_else(|| reject(400, "Goal ID is required"))?;
        if !state.goals.iter().any(|g| g.id == goal_id) {
            return Err(reject(400, "Goal not found or doesn't belong to you"));
        }

        let id = TaskId::new(state.next_id("task"))?;
        let now = Utc::now();
        let created = Task {
            id,
            goal_id: Some(goal_id),
            title: task.title.clone(),
            description: String::new(),
            deadline: None,
            user_priority: task.user_priority,
            ai_urgency: Urgency::default(),
            is_completed: false,
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.tasks.push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, ClientError> {
        let mut state =
            self.enter(Endpoint::UpdateTask, Some(id.to_string()), to_body(update)?)?;
        state.signed_in()?;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| reject(404, "Task not found"))?;
        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(priority) = update.user_priority {
            task.user_priority = priority;
        }
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn set_completion(
        &self,
        id: &TaskId,
        completion: Completion,
    ) -> Result<(), ClientError> {
        let mut state = self.enter(
            Endpoint::CompleteTask,
            Some(id.to_string()),
            to_body(&completion)?,
        )?;
        state.signed_in()?;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| reject(404, "Task not found"))?;
        task.is_completed = completion.is_completed;
        task.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ClientError> {
        let mut state = self.enter(Endpoint::DeleteTask, Some(id.to_string()), None)?;
        state.signed_in()?;
        state.tasks.retain(|t| &t.id != id);
        Ok(())
    }

    fn clear_session(&self) {
        self.sign_out();
    }
}
