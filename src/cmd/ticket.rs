use clap::Args;

use crate::context::AppContext;
use crate::domain::ticket::CommentOutcome;
use crate::error::AppResult;
use crate::workflow::ticket::TicketAssembler;

#[derive(Args, Debug, Clone)]
pub struct TicketArgs {
    /// Description of the work; the first sentence becomes the title.
    #[arg(required = true)]
    pub prompt: Vec<String>,
}

pub async fn run(ctx: &AppContext, args: TicketArgs) -> AppResult<()> {
    let prompt = args.prompt.join(" ");
    let ticket =
        TicketAssembler::assemble_and_submit(&prompt, ctx.issue_tracker.as_ref(), &ctx.route)
            .await?;

    println!(
        "Ticket {} is {} ({}, {}, {} complexity): {}",
        ticket.id,
        ticket.status.as_str(),
        ticket.classification.category,
        ticket.classification.priority,
        ticket.classification.complexity,
        ticket.title
    );
    if let Some(url) = &ticket.remote_url {
        println!("View ticket: {url}");
    }
    if let Some(error) = &ticket.error {
        println!("Creation failed: {error}");
    }
    if let CommentOutcome::Failed(reason) = &ticket.analysis_comment {
        println!("Analysis comment not posted: {reason}");
    }

    Ok(())
}
