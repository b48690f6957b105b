use velo_core::order::count_tasks;

use crate::commands::Context;
use crate::output::{header, task_line};

pub async fn run(ctx: &Context) -> anyhow::Result<()> {
    let user = ctx.require_user().await?;
    let tasks = ctx.velo.tasks().list(None).await?;
    let counts = count_tasks(&tasks);

    println!("{}", header(&format!("Today for {}", user.display_name())));
    if tasks.is_empty() {
        println!("Nothing on the list. Add a task with `velo task add`.");
        return Ok(());
    }
    for task in &tasks {
        println!("{}", task_line(task));
    }
    println!();
    println!("{} open, {} done", counts.incomplete, counts.completed);
    Ok(())
}
