use std::sync::Arc;

use velo_core::form::{Completion, NewTask, TaskUpdate};
use velo_core::order::{count_tasks, sort_tasks};
use velo_core::{GoalId, Priority, Task, TaskId};

use crate::cache::{CacheKey, QueryCache};
use crate::transport::VeloTransport;
use crate::ClientError;

/// Task reads and writes.
///
/// Reads are served from the cache when present and always come back in
/// display order. Every successful write invalidates all task lists and the
/// goal list; a failed write touches nothing.
pub struct TaskService {
    transport: Arc<dyn VeloTransport>,
    cache: Arc<QueryCache>,
}

impl TaskService {
    pub fn new(transport: Arc<dyn VeloTransport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    /// All tasks, or only those of `goal_id`. A failed fetch is an error,
    /// never an empty list.
    pub async fn list(&self, goal_id: Option<&GoalId>) -> Result<Vec<Task>, ClientError> {
        if let Some(cached) = self.cache.tasks(goal_id) {
            return Ok(sort_tasks(&cached));
        }

        let key = CacheKey::tasks(goal_id);
        let ticket = self.cache.begin(key.clone());
        tracing::debug!(%key, "fetching tasks");
        let tasks = self.transport.list_tasks(goal_id).await.map_err(|err| {
            tracing::warn!(%key, error = %err, "failed to fetch tasks");
            err
        })?;

        let counts = count_tasks(&tasks);
        tracing::debug!(
            %key,
            incomplete = counts.incomplete,
            completed = counts.completed,
            "fetched tasks"
        );
        self.cache.store_tasks(ticket, tasks.clone());
        Ok(sort_tasks(&tasks))
    }

    /// Drop the cached list for `goal_id` and fetch it again.
    pub async fn refresh(&self, goal_id: Option<&GoalId>) -> Result<Vec<Task>, ClientError> {
        self.cache.invalidate(&CacheKey::tasks(goal_id));
        self.list(goal_id).await
    }

    /// Look a task up in the unscoped list.
    pub async fn find(&self, task_id: &TaskId) -> Result<Option<Task>, ClientError> {
        let tasks = self.list(None).await?;
        Ok(tasks.into_iter().find(|t| &t.id == task_id))
    }

    pub async fn create(&self, title: &str, goal_id: Option<&GoalId>) -> Result<Task, ClientError> {
        self.create_with_priority(title, goal_id, Priority::default())
            .await
    }

    pub async fn create_with_priority(
        &self,
        title: &str,
        goal_id: Option<&GoalId>,
        priority: Priority,
    ) -> Result<Task, ClientError> {
        let new_task = NewTask::new(title, goal_id.cloned())?.with_priority(priority);
        tracing::debug!(
            title = %new_task.title,
            goal = ?new_task.goal_id,
            priority = new_task.user_priority.level(),
            "creating task"
        );

        let created = self.transport.create_task(&new_task).await.map_err(|err| {
            tracing::warn!(error = %err, "failed to create task");
            err
        })?;
        self.cache.invalidate_after_task_write();
        Ok(created)
    }

    /// Flip completion. `current_is_completed` must be the last known state
    /// of the task; the server receives its negation.
    pub async fn complete(
        &self,
        task_id: &TaskId,
        current_is_completed: bool,
    ) -> Result<(), ClientError> {
        let completion = Completion::toggle(current_is_completed);
        tracing::debug!(
            task = %task_id,
            from = current_is_completed,
            to = completion.is_completed,
            "toggling task completion"
        );

        self.transport
            .set_completion(task_id, completion)
            .await
            .map_err(|err| {
                tracing::warn!(task = %task_id, error = %err, "failed to update task");
                err
            })?;
        self.cache.invalidate_after_task_write();
        Ok(())
    }

    pub async fn update(&self, task_id: &TaskId, update: TaskUpdate) -> Result<Task, ClientError> {
        let update = update.validate()?;
        let updated = self
            .transport
            .update_task(task_id, &update)
            .await
            .map_err(|err| {
                tracing::warn!(task = %task_id, error = %err, "failed to update task");
                err
            })?;
        self.cache.invalidate_after_task_write();
        Ok(updated)
    }

    pub async fn delete(&self, task_id: &TaskId) -> Result<(), ClientError> {
        tracing::debug!(task = %task_id, "deleting task");
        self.transport.delete_task(task_id).await.map_err(|err| {
            tracing::warn!(task = %task_id, error = %err, "failed to delete task");
            err
        })?;
        self.cache.invalidate_after_task_write();
        Ok(())
    }
}
