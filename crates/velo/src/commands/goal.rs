use clap::{Args, Subcommand};
use velo_core::form::{GoalForm, GoalUpdate};
use velo_core::order::count_tasks;
use velo_core::{GoalId, GoalType};

use crate::commands::Context;
use crate::output::{goal_line, header, kv, progress_bar, task_line};

#[derive(Args)]
pub struct GoalArgs {
    #[command(subcommand)]
    command: GoalCommand,
}

#[derive(Subcommand)]
enum GoalCommand {
    /// List goals with their progress
    List,
    /// Create a goal
    Add {
        /// Goal title
        title: String,
        /// deadline, habit, or exploration
        #[arg(long = "type")]
        goal_type: GoalType,
        /// Target date (YYYY-MM-DD) for deadline goals
        #[arg(long)]
        deadline: Option<String>,
        /// Times per week for habit goals
        #[arg(long)]
        frequency: Option<u8>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show one goal and its tasks
    Show { goal_id: String },
    /// Change a goal's title or description
    Edit {
        goal_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Abandon a goal
    Rm { goal_id: String },
}

pub async fn run(ctx: &Context, args: GoalArgs) -> anyhow::Result<()> {
    ctx.require_user().await?;
    let goals = ctx.velo.goals();

    match args.command {
        GoalCommand::List => {
            let listed = goals.list().await;
            if listed.is_empty() {
                println!("No goals yet. Add one with `velo goal add`.");
                return Ok(());
            }
            for goal in &listed {
                println!("{}", goal_line(goal));
            }
        }
        GoalCommand::Add {
            title,
            goal_type,
            deadline,
            frequency,
            description,
        } => {
            let mut form = GoalForm {
                title,
                description,
                goal_type: Some(goal_type),
                deadline,
                frequency,
            };
            let goal = goals.create(&mut form).await?;
            println!("Created goal {} ({})", goal.title, goal.id);
        }
        GoalCommand::Show { goal_id } => {
            let goal_id = GoalId::new(goal_id)?;
            let Some(goal) = goals.find(&goal_id).await? else {
                anyhow::bail!("goal {goal_id} not found");
            };
            let tasks = ctx.velo.tasks().list(Some(&goal_id)).await?;
            let counts = count_tasks(&tasks);

            println!("{}", header(&goal.title));
            if !goal.description.is_empty() {
                println!("{}", kv("description", &goal.description));
            }
            println!("{}", kv("type", goal.goal_type.as_str()));
            println!("{}", kv("status", &goal.status.to_string()));
            if let Some(deadline) = goal.deadline {
                println!("{}", kv("deadline", &deadline.format("%Y-%m-%d").to_string()));
            }
            if let Some(frequency) = goal.frequency {
                println!("{}", kv("frequency", &format!("{frequency}x/week")));
            }
            println!(
                "{}",
                kv(
                    "progress",
                    &format!(
                        "{} {}/{}",
                        progress_bar(goal.progress_ratio(), 20),
                        goal.completed_tasks,
                        goal.total_tasks
                    )
                )
            );
            println!();
            for task in &tasks {
                println!("{}", task_line(task));
            }
            println!("{} open, {} done", counts.incomplete, counts.completed);
        }
        GoalCommand::Edit {
            goal_id,
            title,
            description,
        } => {
            if title.is_none() && description.is_none() {
                anyhow::bail!("nothing to change; pass --title or --description");
            }
            let goal_id = GoalId::new(goal_id)?;
            let goal = goals
                .update(&goal_id, GoalUpdate { title, description })
                .await?;
            println!("Updated goal {} ({})", goal.title, goal.id);
        }
        GoalCommand::Rm { goal_id } => {
            let goal_id = GoalId::new(goal_id)?;
            goals.delete(&goal_id).await?;
            println!("Abandoned goal {goal_id}");
        }
    }
    Ok(())
}
