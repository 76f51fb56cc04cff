mod files;
mod hunt;
mod navigate;
pub mod render;

use crate::session::Action;
use crate::state::Context;

/// Agentic Bug Hunter - RDI code analysis
#[poise::command(
    slash_command,
    subcommands(
        "navigate::show",
        "navigate::next",
        "navigate::prev",
        "navigate::reset",
        "hunt::start",
        "files::upload",
        "files::export"
    )
)]
pub async fn hunt(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Apply a session action for the invoking user and reply with the new view.
async fn apply_and_show(ctx: &Context<'_>, action: Action) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    ctx.data().dispatch(user_id, action).await;
    let view = ctx
        .data()
        .with_session(user_id, |s| render::session_view(s))
        .await;
    send_chunked(ctx, &view).await
}

/// Send a message in Discord-safe chunks (max 1990 chars).
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    let mut remaining = text;
    while !remaining.is_empty() {
        let chunk_len = floor_char_boundary(remaining, 1990);
        let split_at = if chunk_len < remaining.len() {
            remaining[..chunk_len]
                .rfind('\n')
                .map(|i| i + 1)
                .unwrap_or(chunk_len)
        } else {
            chunk_len
        };
        let chunk = &remaining[..split_at];
        remaining = &remaining[split_at..];

        ctx.say(chunk).await?;
    }
    Ok(())
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
