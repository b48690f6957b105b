use std::sync::Arc;

use velo_core::form::{GoalForm, GoalUpdate};
use velo_core::{Goal, GoalId};

use crate::cache::{CacheKey, QueryCache};
use crate::transport::VeloTransport;
use crate::ClientError;

pub struct GoalService {
    transport: Arc<dyn VeloTransport>,
    cache: Arc<QueryCache>,
}

impl GoalService {
    pub fn new(transport: Arc<dyn VeloTransport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    /// Goals of the signed-in user. A failed fetch is logged and yields an
    /// empty list; use [`try_list`](Self::try_list) to see the error.
    pub async fn list(&self) -> Vec<Goal> {
        match self.try_list().await {
            Ok(goals) => goals,
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch goals");
                Vec::new()
            }
        }
    }

    pub async fn try_list(&self) -> Result<Vec<Goal>, ClientError> {
        if let Some(cached) = self.cache.goals() {
            return Ok(cached);
        }

        let ticket = self.cache.begin(CacheKey::Goals);
        let goals = self.transport.list_goals().await?;
        tracing::debug!(count = goals.len(), "fetched goals");
        self.cache.store_goals(ticket, goals.clone());
        Ok(goals)
    }

    pub async fn find(&self, goal_id: &GoalId) -> Result<Option<Goal>, ClientError> {
        let goals = self.try_list().await?;
        Ok(goals.into_iter().find(|g| &g.id == goal_id))
    }

    /// Validate and submit `form`. On success the goal list is invalidated
    /// and the form is reset; on failure the form keeps its input.
    pub async fn create(&self, form: &mut GoalForm) -> Result<Goal, ClientError> {
        let payload = form.validate()?.to_payload();
        tracing::debug!(
            title = %payload.title,
            goal_type = %payload.goal_type,
            deadline = ?payload.deadline,
            frequency = ?payload.frequency,
            "creating goal"
        );

        let created = self.transport.create_goal(&payload).await.map_err(|err| {
            tracing::warn!(error = %err, "failed to create goal");
            err
        })?;
        self.cache.invalidate(&CacheKey::Goals);
        form.reset();
        Ok(created)
    }

    pub async fn update(&self, goal_id: &GoalId, update: GoalUpdate) -> Result<Goal, ClientError> {
        let update = update.validate()?;
        let updated = self
            .transport
            .update_goal(goal_id, &update)
            .await
            .map_err(|err| {
                tracing::warn!(goal = %goal_id, error = %err, "failed to update goal");
                err
            })?;
        self.cache.invalidate(&CacheKey::Goals);
        Ok(updated)
    }

    pub async fn delete(&self, goal_id: &GoalId) -> Result<(), ClientError> {
        tracing::debug!(goal = %goal_id, "deleting goal");
        self.transport.delete_goal(goal_id).await.map_err(|err| {
            tracing::warn!(goal = %goal_id, error = %err, "failed to delete goal");
            err
        })?;
        self.cache.invalidate(&CacheKey::Goals);
        Ok(())
    }
}
