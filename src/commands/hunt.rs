use tracing::info;

use super::send_chunked;
use crate::commands::render::session_view;
use crate::session::Action;
use crate::state::Context;

/// Analyze the current record (submits uploaded batches to the gateway)
#[poise::command(slash_command)]
pub async fn start(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let user_id = ctx.author().id.get();
    info!(user = ctx.author().name, "hunt started");

    ctx.data().dispatch(user_id, Action::Hunt).await;

    let view = ctx.data().with_session(user_id, |s| session_view(s)).await;
    send_chunked(&ctx, &view).await
}
