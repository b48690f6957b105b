use velo_core::{Goal, GoalType, Priority, Task};

/// Format a key-value pair for display.
pub fn kv(key: &str, value: &str) -> String {
    format!("{key:>12}: {value}")
}

/// Format a header line.
pub fn header(title: &str) -> String {
    format!("=== {title} ===")
}

pub fn priority_badge(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "HIGH",
        Priority::Medium => "MED",
        Priority::Low => "LOW",
    }
}

pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn task_line(task: &Task) -> String {
    let check = if task.is_completed { "[x]" } else { "[ ]" };
    let due = task
        .due()
        .map(|d| format!("  due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "{check} {:<4} {:<8} {}{due}  ({})",
        priority_badge(task.user_priority),
        task.ai_urgency.tier().label(),
        task.title,
        task.id
    )
}

fn schedule(goal: &Goal) -> String {
    match goal.goal_type {
        GoalType::Deadline => match goal.deadline {
            Some(deadline) => format!("due {}", deadline.format("%Y-%m-%d")),
            None => "deadline".to_string(),
        },
        GoalType::Habit => match goal.frequency {
            Some(frequency) => format!("{frequency}x/week"),
            None => "habit".to_string(),
        },
        GoalType::Exploration => "exploration".to_string(),
    }
}

pub fn goal_line(goal: &Goal) -> String {
    format!(
        "{} {:>3}% {}  [{}, {}]  ({})",
        progress_bar(goal.progress_ratio(), 10),
        goal.progress_percent(),
        goal.title,
        schedule(goal),
        goal.status,
        goal.id
    )
}
