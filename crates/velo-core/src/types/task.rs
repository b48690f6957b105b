use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::id::{GoalId, TaskId};
use crate::CoreError;

/// User-set importance. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Priority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
}

impl Priority {
    pub fn from_level(level: i64) -> Result<Self, CoreError> {
        match level {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(CoreError::InvalidPriority(other.to_string())),
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(level) = s.parse::<i64>() {
            return Priority::from_level(level);
        }
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(CoreError::InvalidPriority(s.to_string())),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

// Task listings carry the numeric level; the create endpoint answers with the label.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Level(i64),
            Label(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Level(level) => Priority::from_level(level),
            Raw::Label(label) => label.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UrgencyTier {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyTier {
    pub fn label(self) -> &'static str {
        match self {
            UrgencyTier::Low => "Low",
            UrgencyTier::Medium => "Medium",
            UrgencyTier::High => "High",
            UrgencyTier::Critical => "Critical",
        }
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Externally computed pressure score, nominally 1-10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urgency(i64);

impl Urgency {
    pub fn new(score: i64) -> Self {
        Self(score)
    }

    /// Out-of-range scores are shown as the lowest tier.
    pub fn tier(self) -> UrgencyTier {
        match self.0 {
            4..=6 => UrgencyTier::Medium,
            7..=8 => UrgencyTier::High,
            9..=10 => UrgencyTier::Critical,
            _ => UrgencyTier::Low,
        }
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Self(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub goal_id: Option<GoalId>,
    pub title: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_priority: Priority,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub ai_urgency: Urgency,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// The deadline, if one is set. The API encodes "no deadline" as the
    /// year-one zero timestamp.
    pub fn due(&self) -> Option<DateTime<Utc>> {
        self.deadline.filter(|d| d.year() > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_decodes_from_level_or_label() {
        let p: Priority = serde_json::from_str("3").unwrap();
        assert_eq!(p, Priority::High);
        let p: Priority = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(p, Priority::Medium);
        assert!(serde_json::from_str::<Priority>("4").is_err());
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }

    #[test]
    fn priority_serializes_as_level() {
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "1");
        assert_eq!(Priority::default(), Priority::Medium);
        assert!(Priority::High > Priority::Medium);
    }

    #[test]
    fn urgency_tiers() {
        let tiers: Vec<_> = (1..=10).map(|s| Urgency::new(s).tier()).collect();
        assert_eq!(
            tiers,
            vec![
                UrgencyTier::Low,
                UrgencyTier::Low,
                UrgencyTier::Low,
                UrgencyTier::Medium,
                UrgencyTier::Medium,
                UrgencyTier::Medium,
                UrgencyTier::High,
                UrgencyTier::High,
                UrgencyTier::Critical,
                UrgencyTier::Critical,
            ]
        );
        assert_eq!(Urgency::new(0).tier(), UrgencyTier::Low);
        assert_eq!(Urgency::new(42).tier(), UrgencyTier::Low);
    }

    #[test]
    fn decodes_created_task_response() {
        // Shape returned by POST /api/tasks: label priority, no completion flag.
        let json = r#"{
            "id": "t1",
            "title": "Write report",
            "description": "",
            "deadline": "0001-01-01T00:00:00Z",
            "user_priority": "Medium"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.user_priority, Priority::Medium);
        assert!(!task.is_completed);
        assert!(task.goal_id.is_none());
        assert!(task.due().is_none());
        assert_eq!(task.ai_urgency.tier(), UrgencyTier::Low);
    }

    #[test]
    fn decodes_listed_task() {
        let json = r#"{
            "id": "t2",
            "userID": "u1",
            "goal_id": "g1",
            "title": "Stretch",
            "description": "10 minutes",
            "deadline": "2026-03-01T09:00:00Z",
            "estimated_hours": null,
            "user_priority": 1,
            "ai_urgency": 9,
            "is_completed": true,
            "created_at": "2026-02-01T09:00:00Z",
            "updated_at": "2026-02-02T09:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.goal_id, Some(GoalId::new("g1").unwrap()));
        assert_eq!(task.ai_urgency.tier(), UrgencyTier::Critical);
        assert!(task.is_completed);
        assert!(task.due().is_some());
    }
}
