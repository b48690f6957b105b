//! Display order for task lists.
//!
//! Incomplete tasks come first, then completed ones; inside each group the
//! higher `user_priority` wins. The sort is stable so tasks with equal keys
//! keep the order the server returned them in.

use std::cmp::Ordering;

use crate::types::Task;

pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.is_completed
        .cmp(&b.is_completed)
        .then_with(|| b.user_priority.cmp(&a.user_priority))
}

pub fn sort_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(compare_tasks);
    sorted
}

/// True when `tasks` already satisfies the display order.
pub fn is_display_ordered(tasks: &[Task]) -> bool {
    tasks
        .windows(2)
        .all(|pair| compare_tasks(&pair[0], &pair[1]) != Ordering::Greater)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub incomplete: usize,
    pub completed: usize,
}

pub fn count_tasks(tasks: &[Task]) -> TaskCounts {
    let completed = tasks.iter().filter(|t| t.is_completed).count();
    TaskCounts {
        incomplete: tasks.len() - completed,
        completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TaskId;
    use crate::types::{Priority, Urgency};
    use proptest::prelude::*;

    fn task(id: &str, priority: Priority, done: bool) -> Task {
        Task {
            id: TaskId::new(id).unwrap(),
            goal_id: None,
            title: format!("task {id}"),
            description: String::new(),
            deadline: None,
            user_priority: priority,
            ai_urgency: Urgency::default(),
            is_completed: done,
            created_at: None,
            updated_at: None,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn incomplete_before_completed_then_priority_desc() {
        let tasks = vec![
            task("a", Priority::High, true),
            task("b", Priority::Low, false),
            task("c", Priority::High, false),
            task("d", Priority::Medium, true),
            task("e", Priority::Medium, false),
        ];
        let sorted = sort_tasks(&tasks);
        assert_eq!(ids(&sorted), vec!["c", "e", "b", "a", "d"]);
        assert!(is_display_ordered(&sorted));
        assert!(!is_display_ordered(&tasks));
    }

    #[test]
    fn equal_keys_keep_server_order() {
        let tasks = vec![
            task("x", Priority::Medium, false),
            task("y", Priority::Medium, false),
            task("z", Priority::Medium, false),
        ];
        assert_eq!(ids(&sort_tasks(&tasks)), vec!["x", "y", "z"]);
    }

    #[test]
    fn empty_list_sorts_to_empty() {
        assert!(sort_tasks(&[]).is_empty());
        assert!(is_display_ordered(&[]));
    }

    #[test]
    fn counts_groups() {
        let tasks = vec![
            task("a", Priority::High, true),
            task("b", Priority::Low, false),
            task("c", Priority::Low, false),
        ];
        assert_eq!(
            count_tasks(&tasks),
            TaskCounts {
                incomplete: 2,
                completed: 1
            }
        );
    }

    fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
        prop::collection::vec((1i64..=3, any::<bool>()), 0..40).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (level, done))| {
                    task(&i.to_string(), Priority::from_level(level).unwrap(), done)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn no_completed_task_precedes_an_incomplete_one(tasks in arb_tasks()) {
            let sorted = sort_tasks(&tasks);
            let first_done = sorted.iter().position(|t| t.is_completed).unwrap_or(sorted.len());
            prop_assert!(sorted[first_done..].iter().all(|t| t.is_completed));
        }

        #[test]
        fn priorities_non_increasing_within_each_group(tasks in arb_tasks()) {
            let sorted = sort_tasks(&tasks);
            for pair in sorted.windows(2) {
                if pair[0].is_completed == pair[1].is_completed {
                    prop_assert!(pair[0].user_priority >= pair[1].user_priority);
                }
            }
        }

        #[test]
        fn sort_is_a_stable_permutation(tasks in arb_tasks()) {
            let sorted = sort_tasks(&tasks);
            prop_assert_eq!(sorted.len(), tasks.len());
            for pair in sorted.windows(2) {
                if compare_tasks(&pair[0], &pair[1]) == Ordering::Equal {
                    let a: usize = pair[0].id.as_str().parse().unwrap();
                    let b: usize = pair[1].id.as_str().parse().unwrap();
                    prop_assert!(a < b);
                }
            }
            prop_assert_eq!(sort_tasks(&sorted), sorted);
        }
    }
}
