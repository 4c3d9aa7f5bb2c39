mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod server;
mod services;
mod store;
#[cfg(test)]
mod testing;
mod workflow;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::batch::{self, BatchArgs};
use crate::cmd::classify::{self, ClassifyArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::deploy::{self, DeployArgs};
use crate::cmd::serve::{self, ServeArgs};
use crate::cmd::ticket::{self, TicketArgs};
use crate::cmd::tracker::{self, TrackerArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;

#[derive(Parser)]
#[command(
    name = "autotriage",
    author,
    version,
    about = "Webhook-driven ticket triage for project trackers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook receiver.
    Serve(ServeArgs),
    /// Classify a prompt and create a ticket for it.
    Ticket(TicketArgs),
    /// Classify prompts and create a ticket for each.
    Batch(BatchArgs),
    /// Print the classification of a piece of text.
    Classify(ClassifyArgs),
    /// Inspect the project tracker.
    Tracker(TrackerArgs),
    /// Operational actions on the deployment platform.
    Deploy(DeployArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Classify(args) => classify::run(args),
        Commands::Serve(args) => serve::run(&load_context()?, args).await,
        Commands::Ticket(args) => ticket::run(&load_context()?, args).await,
        Commands::Batch(args) => batch::run(&load_context()?, args).await,
        Commands::Tracker(args) => tracker::run(&load_context()?, args).await,
        Commands::Deploy(args) => deploy::run(&load_context()?, args).await,
    }
}

fn load_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;
    AppContext::from_config(config)
}
