//! Client-side cache of server reads.
//!
//! Entries are only ever replaced through invalidate-then-refetch. Each key
//! carries an epoch that every invalidation bumps; a fetch takes a
//! [`FetchTicket`] before it goes out and may only write its result back if
//! the epoch is still the one it started with.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use velo_core::{Goal, GoalId, Task};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Goals,
    /// All tasks (`None`) or the tasks of one goal.
    Tasks(Option<GoalId>),
}

impl CacheKey {
    pub fn tasks(goal_id: Option<&GoalId>) -> Self {
        CacheKey::Tasks(goal_id.cloned())
    }

    pub fn is_tasks(&self) -> bool {
        matches!(self, CacheKey::Tasks(_))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Goals => f.write_str("goals"),
            CacheKey::Tasks(None) => f.write_str("tasks"),
            CacheKey::Tasks(Some(goal_id)) => write!(f, "tasks:{goal_id}"),
        }
    }
}

#[derive(Debug, Clone)]
enum Cached {
    Goals(Vec<Goal>),
    Tasks(Vec<Task>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a ticket is needed to store the fetched value"]
pub struct FetchTicket {
    key: CacheKey,
    epoch: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Cached>,
    epochs: HashMap<CacheKey, u64>,
}

impl CacheState {
    fn bump(&mut self, key: &CacheKey) {
        *self.epochs.entry(key.clone()).or_insert(0) += 1;
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    state: Mutex<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn goals(&self) -> Option<Vec<Goal>> {
        match self.lock().entries.get(&CacheKey::Goals) {
            Some(Cached::Goals(goals)) => Some(goals.clone()),
            _ => None,
        }
    }

    pub fn tasks(&self, goal_id: Option<&GoalId>) -> Option<Vec<Task>> {
        match self.lock().entries.get(&CacheKey::tasks(goal_id)) {
            Some(Cached::Tasks(tasks)) => Some(tasks.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Record the epoch a fetch for `key` starts from.
    pub fn begin(&self, key: CacheKey) -> FetchTicket {
        let mut state = self.lock();
        let epoch = *state.epochs.entry(key.clone()).or_insert(0);
        FetchTicket { key, epoch }
    }

    /// Returns false (and stores nothing) when the key was invalidated while
    /// the fetch was in flight.
    pub fn store_goals(&self, ticket: FetchTicket, goals: Vec<Goal>) -> bool {
        debug_assert_eq!(ticket.key, CacheKey::Goals);
        self.store(ticket, Cached::Goals(goals))
    }

    pub fn store_tasks(&self, ticket: FetchTicket, tasks: Vec<Task>) -> bool {
        debug_assert!(ticket.key.is_tasks());
        self.store(ticket, Cached::Tasks(tasks))
    }

    fn store(&self, ticket: FetchTicket, value: Cached) -> bool {
        let mut state = self.lock();
        let current = state.epochs.get(&ticket.key).copied().unwrap_or(0);
        if current != ticket.epoch {
            tracing::debug!(key = %ticket.key, "discarding stale response");
            return false;
        }
        state.entries.insert(ticket.key, value);
        true
    }

    pub fn invalidate(&self, key: &CacheKey) {
        let mut state = self.lock();
        state.entries.remove(key);
        state.bump(key);
        tracing::debug!(%key, "invalidated");
    }

    /// Invalidate `tasks` and every `tasks:<goalId>` key.
    pub fn invalidate_tasks(&self) {
        let mut state = self.lock();
        state.entries.retain(|key, _| !key.is_tasks());
        let keys: Vec<CacheKey> = state
            .epochs
            .keys()
            .filter(|key| key.is_tasks())
            .cloned()
            .collect();
        for key in &keys {
            state.bump(key);
        }
        tracing::debug!(keys = keys.len(), "invalidated task lists");
    }

    /// A task write changes task lists and the parent goal's counters.
    pub fn invalidate_after_task_write(&self) {
        self.invalidate_tasks();
        self.invalidate(&CacheKey::Goals);
    }

    /// Drop everything, including results of fetches still in flight.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        for epoch in state.epochs.values_mut() {
            *epoch += 1;
        }
    }
}
