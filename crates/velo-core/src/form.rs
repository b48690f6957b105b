//! Client-side forms and the request payloads they map to.
//!
//! Forms hold raw user input. `validate` narrows a form into a draft whose
//! shape only admits the fields relevant to it; drafts are what get mapped
//! into payloads, so a field that does not belong to the chosen goal type can
//! never reach the wire.

use chrono::NaiveDate;
use serde::Serialize;

use crate::id::GoalId;
use crate::types::{GoalType, Priority};
use crate::CoreError;

pub const MAX_HABIT_FREQUENCY: u8 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trim a user-supplied title and reject it if nothing is left.
pub fn normalize_title(raw: &str) -> Result<String, CoreError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(CoreError::validation("title", "must not be empty"));
    }
    Ok(title.to_string())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDate(raw.to_string()))
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Raw state of the goal creation form.
///
/// Every field can be populated regardless of `goal_type`, exactly as a user
/// can fill in a frequency and then switch the type to `deadline`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalForm {
    pub title: String,
    pub description: String,
    pub goal_type: Option<GoalType>,
    pub deadline: Option<String>,
    pub frequency: Option<u8>,
}

impl GoalForm {
    pub fn validate(&self) -> Result<GoalDraft, CoreError> {
        let title = normalize_title(&self.title)?;
        let goal_type = self
            .goal_type
            .ok_or_else(|| CoreError::validation("goal_type", "is required"))?;

        let kind = match goal_type {
            GoalType::Deadline => {
                let deadline = match self.deadline.as_deref().and_then(non_blank) {
                    Some(raw) => Some(parse_date(&raw)?),
                    None => None,
                };
                GoalKind::Deadline { deadline }
            }
            GoalType::Habit => {
                if let Some(frequency) = self.frequency {
                    if !(1..=MAX_HABIT_FREQUENCY).contains(&frequency) {
                        return Err(CoreError::validation(
                            "frequency",
                            format!("must be between 1 and {MAX_HABIT_FREQUENCY} times per week"),
                        ));
                    }
                }
                GoalKind::Habit {
                    frequency: self.frequency,
                }
            }
            GoalType::Exploration => GoalKind::Exploration,
        };

        Ok(GoalDraft {
            title,
            description: non_blank(&self.description),
            kind,
        })
    }

    pub fn reset(&mut self) {
        *self = GoalForm::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    Deadline { deadline: Option<NaiveDate> },
    Habit { frequency: Option<u8> },
    Exploration,
}

impl GoalKind {
    pub fn goal_type(&self) -> GoalType {
        match self {
            GoalKind::Deadline { .. } => GoalType::Deadline,
            GoalKind::Habit { .. } => GoalType::Habit,
            GoalKind::Exploration => GoalType::Exploration,
        }
    }
}

/// A validated goal, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub kind: GoalKind,
}

impl GoalDraft {
    pub fn to_payload(&self) -> GoalPayload {
        let (deadline, frequency) = match self.kind {
            GoalKind::Deadline { deadline } => (deadline.map(midnight_utc), None),
            GoalKind::Habit { frequency } => (None, frequency),
            GoalKind::Exploration => (None, None),
        };

        GoalPayload {
            title: self.title.clone(),
            description: self.description.clone().unwrap_or_default(),
            goal_type: self.kind.goal_type(),
            deadline,
            frequency,
        }
    }
}

fn midnight_utc(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format(DATE_FORMAT))
}

/// Body of `POST /api/goals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalPayload {
    pub title: String,
    pub description: String,
    pub goal_type: GoalType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u8>,
}

/// Body of `PUT /api/goals/:id`. Type, status and schedule are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoalUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GoalUpdate {
    pub fn validate(self) -> Result<Self, CoreError> {
        if self.title.is_none() && self.description.is_none() {
            return Err(CoreError::validation("update", "nothing to change"));
        }
        let title = self.title.as_deref().map(normalize_title).transpose()?;
        Ok(GoalUpdate {
            title,
            description: self.description.map(|d| d.trim().to_string()),
        })
    }
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<GoalId>,
    pub user_priority: Priority,
}

impl NewTask {
    pub fn new(title: &str, goal_id: Option<GoalId>) -> Result<Self, CoreError> {
        Ok(NewTask {
            title: normalize_title(title)?,
            goal_id,
            user_priority: Priority::default(),
        })
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.user_priority = priority;
        self
    }
}

/// Body of `PUT /api/tasks/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_priority: Option<Priority>,
}

impl TaskUpdate {
    pub fn validate(self) -> Result<Self, CoreError> {
        if self.title.is_none() && self.user_priority.is_none() {
            return Err(CoreError::validation("update", "nothing to change"));
        }
        let title = self.title.as_deref().map(normalize_title).transpose()?;
        Ok(TaskUpdate {
            title,
            user_priority: self.user_priority,
        })
    }
}

/// Body of `PATCH /api/tasks/:id/complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub is_completed: bool,
}

impl Completion {
    /// The server stores whatever it is sent, so the caller's last known
    /// state is flipped here rather than sending a fixed `true`.
    pub fn toggle(current_is_completed: bool) -> Self {
        Completion {
            is_completed: !current_is_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn form(goal_type: GoalType) -> GoalForm {
        GoalForm {
            title: "Learn Rust".to_string(),
            goal_type: Some(goal_type),
            ..GoalForm::default()
        }
    }

    fn payload_json(form: &GoalForm) -> Value {
        serde_json::to_value(form.validate().unwrap().to_payload()).unwrap()
    }

    #[test]
    fn habit_payload_drops_deadline() {
        let mut f = form(GoalType::Habit);
        f.frequency = Some(3);
        f.deadline = Some("2026-01-01".to_string());
        let body = payload_json(&f);
        assert!(body.get("deadline").is_none());
        assert_eq!(body["frequency"], json!(3));
        assert_eq!(body["goal_type"], json!("habit"));
    }

    #[test]
    fn deadline_payload_is_midnight_utc() {
        let mut f = form(GoalType::Deadline);
        f.deadline = Some("2026-06-01".to_string());
        f.frequency = Some(5);
        let body = payload_json(&f);
        assert_eq!(body["deadline"], json!("2026-06-01T00:00:00Z"));
        assert!(body.get("frequency").is_none());
    }

    #[test]
    fn exploration_payload_carries_neither_schedule_field() {
        let mut f = form(GoalType::Exploration);
        f.deadline = Some("2026-06-01".to_string());
        f.frequency = Some(2);
        let body = payload_json(&f);
        assert_eq!(
            body,
            json!({"title": "Learn Rust", "description": "", "goal_type": "exploration"})
        );
    }

    #[test]
    fn missing_schedule_is_omitted_not_defaulted() {
        let body = payload_json(&form(GoalType::Deadline));
        assert!(body.get("deadline").is_none());
        let body = payload_json(&form(GoalType::Habit));
        assert!(body.get("frequency").is_none());
    }

    #[test]
    fn description_is_always_sent() {
        let mut f = form(GoalType::Exploration);
        f.description = "  curiosity  ".to_string();
        assert_eq!(payload_json(&f)["description"], json!("curiosity"));
    }

    #[test]
    fn validation_failures() {
        let mut f = form(GoalType::Habit);
        f.title = "   ".to_string();
        assert!(matches!(
            f.validate(),
            Err(CoreError::Validation { field: "title", .. })
        ));

        let mut f = form(GoalType::Habit);
        f.frequency = Some(8);
        assert!(matches!(
            f.validate(),
            Err(CoreError::Validation {
                field: "frequency",
                ..
            })
        ));

        let mut f = form(GoalType::Deadline);
        f.deadline = Some("06/01/2026".to_string());
        assert!(matches!(f.validate(), Err(CoreError::InvalidDate(_))));

        let mut f = form(GoalType::Deadline);
        f.goal_type = None;
        assert!(f.validate().is_err());
    }

    #[test]
    fn irrelevant_fields_are_not_validated() {
        let mut f = form(GoalType::Exploration);
        f.frequency = Some(99);
        f.deadline = Some("garbage".to_string());
        assert!(f.validate().is_ok());
    }

    #[test]
    fn reset_clears_form() {
        let mut f = form(GoalType::Habit);
        f.frequency = Some(2);
        f.reset();
        assert_eq!(f, GoalForm::default());
    }

    #[test]
    fn new_task_trims_and_defaults_priority() {
        let task = NewTask::new("  Write report  ", Some(GoalId::new("g1").unwrap())).unwrap();
        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({"title": "Write report", "goal_id": "g1", "user_priority": 2})
        );
        assert!(NewTask::new(" \t ", None).is_err());
    }

    #[test]
    fn goal_less_task_omits_goal_id() {
        let task = NewTask::new("Inbox", None).unwrap().with_priority(Priority::High);
        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({"title": "Inbox", "user_priority": 3})
        );
    }

    #[test]
    fn completion_negates_current_state() {
        assert!(Completion::toggle(false).is_completed);
        assert!(!Completion::toggle(true).is_completed);
    }

    #[test]
    fn updates_require_a_change() {
        assert!(TaskUpdate::default().validate().is_err());
        assert!(GoalUpdate::default().validate().is_err());
        let update = TaskUpdate {
            title: Some(" new ".to_string()),
            user_priority: None,
        }
        .validate()
        .unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"title": "new"})
        );
    }
}
