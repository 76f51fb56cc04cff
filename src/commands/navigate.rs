use super::{apply_and_show, send_chunked};
use crate::commands::render::session_view;
use crate::session::Action;
use crate::state::Context;

/// Show the current record
#[poise::command(slash_command)]
pub async fn show(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    let view = ctx.data().with_session(user_id, |s| session_view(s)).await;
    send_chunked(&ctx, &view).await
}

/// Go to the next record
#[poise::command(slash_command)]
pub async fn next(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    apply_and_show(&ctx, Action::Next).await
}

/// Go to the previous record
#[poise::command(slash_command)]
pub async fn prev(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    apply_and_show(&ctx, Action::Prev).await
}

/// Discard uploads and go back to the built-in examples
#[poise::command(slash_command)]
pub async fn reset(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    apply_and_show(&ctx, Action::Reset).await
}
