use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::warn;

use crate::context::AppContext;
use crate::domain::batch::{BatchResult, BatchSummary};
use crate::error::{AppError, AppResult};
use crate::store::TicketStore;
use crate::workflow::batch::BatchOrchestrator;

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Prompts to turn into tickets.
    pub prompts: Vec<String>,
    /// Read additional prompts from a file, one per line.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Override the pause between submissions.
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(ctx: &AppContext, args: BatchArgs) -> AppResult<()> {
    let prompts = collect_prompts(&args)?;
    let delay = args
        .delay_ms
        .map(Duration::from_millis)
        .unwrap_or(ctx.config.batch_delay);
    let orchestrator = BatchOrchestrator::new(ctx.issue_tracker.clone(), ctx.route.clone(), delay);
    let mut store = TicketStore::new();

    let result = tokio::select! {
        result = orchestrator.run_batch(&prompts, &mut store) => result?,
        _ = tokio::signal::ctrl_c() => {
            report_interrupted(&store);
            return Err(AppError::Interrupted);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}

fn collect_prompts(args: &BatchArgs) -> AppResult<Vec<String>> {
    let mut prompts: Vec<String> = args
        .prompts
        .iter()
        .map(|prompt| prompt.trim().to_string())
        .filter(|prompt| !prompt.is_empty())
        .collect();

    if let Some(path) = &args.file {
        let contents = fs::read_to_string(path)?;
        prompts.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    if prompts.is_empty() {
        return Err(AppError::Validation(
            "provide prompts as arguments or via --file".to_string(),
        ));
    }
    Ok(prompts)
}

fn report_interrupted(store: &TicketStore) {
    if store.is_empty() {
        warn!("batch interrupted before the first item");
        return;
    }
    let unfinished: Vec<_> = store.unfinished().collect();
    if unfinished.is_empty() {
        warn!(recorded = store.len(), "batch interrupted between items");
        return;
    }
    for ticket in unfinished {
        warn!(ticket = %ticket.id, title = %ticket.title, "submission interrupted; state unknown");
    }
}

fn print_report(result: &BatchResult) {
    if result.is_empty() {
        println!("Nothing processed.");
        return;
    }
    for (index, entry) in result.entries.iter().enumerate() {
        match &entry.outcome {
            Ok(ticket) => println!(
                "[{}] {} {} ({}, {}, {})",
                index + 1,
                ticket.status.as_str(),
                ticket.id,
                ticket.classification.category,
                ticket.classification.priority,
                ticket.title
            ),
            Err(error) => println!(
                "[{}] failed: {} ({})",
                index + 1,
                error,
                entry.original_prompt
            ),
        }
    }

    let summary = BatchSummary::from(result);
    println!();
    println!(
        "{} processed: {} successful ({} local only), {} failed",
        summary.total, summary.successful, summary.local_only, summary.failed
    );
    for (category, count) in &summary.by_category {
        println!("  {category}: {count}");
    }
    for (priority, count) in &summary.by_priority {
        println!("  priority {priority}: {count}");
    }
}
