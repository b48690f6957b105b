pub mod credentials;
pub mod error;
pub mod form;
pub mod id;
pub mod order;
pub mod types;

pub use error::CoreError;
pub use id::{GoalId, TaskId};
pub use order::sort_tasks;
pub use types::{Goal, GoalStatus, GoalType, Priority, Task, Urgency, UrgencyTier, User};
