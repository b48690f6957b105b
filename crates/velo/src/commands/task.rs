use clap::{Args, Subcommand};
use velo_core::form::TaskUpdate;
use velo_core::{GoalId, Priority, TaskId};

use crate::commands::Context;
use crate::output::task_line;

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Subcommand)]
enum TaskCommand {
    /// List tasks, most important first
    List {
        /// Only tasks under this goal
        #[arg(long)]
        goal: Option<String>,
    },
    /// Create a task
    Add {
        title: String,
        /// Goal the task belongs to
        #[arg(long)]
        goal: Option<String>,
        /// low, medium, high, or 1-3
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// Toggle a task between open and done
    Done { task_id: String },
    /// Change a task's title or priority
    Edit {
        task_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Delete a task
    Rm { task_id: String },
}

fn goal_filter(goal: Option<String>) -> anyhow::Result<Option<GoalId>> {
    Ok(goal.map(GoalId::new).transpose()?)
}

pub async fn run(ctx: &Context, args: TaskArgs) -> anyhow::Result<()> {
    ctx.require_user().await?;
    let tasks = ctx.velo.tasks();

    match args.command {
        TaskCommand::List { goal } => {
            let goal = goal_filter(goal)?;
            let listed = tasks.list(goal.as_ref()).await?;
            if listed.is_empty() {
                println!("No tasks.");
            }
            for task in &listed {
                println!("{}", task_line(task));
            }
        }
        TaskCommand::Add {
            title,
            goal,
            priority,
        } => {
            let goal = goal_filter(goal)?;
            let task = tasks
                .create_with_priority(&title, goal.as_ref(), priority)
                .await?;
            println!("Created task {} ({})", task.title, task.id);
        }
        TaskCommand::Done { task_id } => {
            let task_id = TaskId::new(task_id)?;
            let Some(task) = tasks.find(&task_id).await? else {
                anyhow::bail!("task {task_id} not found");
            };
            tasks.complete(&task_id, task.is_completed).await?;
            let state = if task.is_completed { "open" } else { "done" };
            println!("Marked {} as {state}", task.title);
        }
        TaskCommand::Edit {
            task_id,
            title,
            priority,
        } => {
            if title.is_none() && priority.is_none() {
                anyhow::bail!("nothing to change; pass --title or --priority");
            }
            let task_id = TaskId::new(task_id)?;
            let task = tasks
                .update(
                    &task_id,
                    TaskUpdate {
                        title,
                        user_priority: priority,
                    },
                )
                .await?;
            println!("Updated task {} ({})", task.title, task.id);
        }
        TaskCommand::Rm { task_id } => {
            let task_id = TaskId::new(task_id)?;
            tasks.delete(&task_id).await?;
            println!("Deleted task {task_id}");
        }
    }
    Ok(())
}
