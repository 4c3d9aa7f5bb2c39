use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    #[command(subcommand)]
    pub command: DeployCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeployCommand {
    /// List projects on the deployment platform.
    Projects,
    /// Redeploy one service instance.
    Redeploy {
        #[arg(long)]
        service: String,
        #[arg(long)]
        environment: String,
    },
}

pub async fn run(ctx: &AppContext, args: DeployArgs) -> AppResult<()> {
    match args.command {
        DeployCommand::Projects => {
            let projects = ctx.deployment.list_projects().await?;
            if projects.is_empty() {
                println!("No projects found.");
            }
            for project in projects {
                println!("{}  {}", project.id, project.name);
            }
        }
        DeployCommand::Redeploy {
            service,
            environment,
        } => {
            ctx.deployment.redeploy(&service, &environment).await?;
            println!("Redeploy triggered for service {service} in {environment}.");
        }
    }
    Ok(())
}
