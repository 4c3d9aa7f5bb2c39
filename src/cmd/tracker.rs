use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::domain::event::value_as_id;
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct TrackerArgs {
    #[command(subcommand)]
    pub command: TrackerCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TrackerCommand {
    /// List the workspace's projects to check that the tracker is reachable.
    Projects,
}

pub async fn run(ctx: &AppContext, args: TrackerArgs) -> AppResult<()> {
    match args.command {
        TrackerCommand::Projects => {
            let projects = match ctx.issue_tracker.list_projects(&ctx.route).await {
                Err(AppError::Unavailable) => {
                    println!("Tracker unavailable: no API path answered.");
                    return Ok(());
                }
                other => other?,
            };
            for project in projects {
                let id = project.get("id").and_then(value_as_id).unwrap_or_default();
                let name = project.get("name").and_then(|v| v.as_str()).unwrap_or("");
                println!("{id}  {name}");
            }
        }
    }
    Ok(())
}
