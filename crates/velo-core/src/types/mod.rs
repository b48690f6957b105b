mod goal;
mod task;
mod user;

pub use goal::{Goal, GoalStatus, GoalType};
pub use task::{Priority, Task, Urgency, UrgencyTier};
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Decode `null` as the type's default; the API sends `null` for unset text.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
