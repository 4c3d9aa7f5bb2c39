use std::sync::Arc;

use clap::Args;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::server::{self, ServerState};
use crate::workflow::webhook::WebhookDispatcher;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on; defaults to $PORT or 3000.
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn run(ctx: &AppContext, args: ServeArgs) -> AppResult<()> {
    let dispatcher = WebhookDispatcher::new(ctx.issue_tracker.clone(), ctx.route.clone());
    let state = Arc::new(ServerState::new(dispatcher));
    server::serve(args.port.unwrap_or(ctx.config.port), state).await
}
