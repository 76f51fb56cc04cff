use poise::serenity_prelude as serenity;
use tracing::info;

use crate::csv_codec::{self, ExportShape};
use crate::record::Record;
use crate::session::Action;
use crate::state::Context;

/// Load buggy code from a CSV attachment
#[poise::command(slash_command)]
pub async fn upload(
    ctx: Context<'_>,
    #[description = "CSV with an id column and a buggy code column"] file: serenity::Attachment,
) -> Result<(), anyhow::Error> {
    if !file.filename.to_lowercase().ends_with(".csv") {
        ctx.say("Please attach a `.csv` file.").await?;
        return Ok(());
    }
    ctx.defer().await?;

    let bytes = file.download().await?;
    let text = String::from_utf8_lossy(&bytes);
    let rows = csv_codec::decode_input(&text);
    if rows.is_empty() {
        ctx.say(
            "No rows found. The CSV needs an `id` column and one of \
             `BuggyCode`, `buggy code`, `code` or `original code`.",
        )
        .await?;
        return Ok(());
    }

    let stubs: Vec<Record> = rows.into_iter().map(Record::from).collect();
    let count = stubs.len();
    info!(user = ctx.author().name, file = file.filename, count, "csv uploaded");

    ctx.data()
        .dispatch(ctx.author().id.get(), Action::Load(stubs))
        .await;
    ctx.say(format!(
        "Loaded **{}** record(s) from `{}`. Use `/hunt start` to analyze them.",
        count, file.filename
    ))
    .await?;
    Ok(())
}

/// Download the session as CSV
#[poise::command(slash_command)]
pub async fn export(
    ctx: Context<'_>,
    #[description = "Include bug type and trust score"] full: Option<bool>,
) -> Result<(), anyhow::Error> {
    let shape = if full.unwrap_or(false) {
        ExportShape::Results
    } else {
        ExportShape::Session
    };

    let records = ctx
        .data()
        .with_session(ctx.author().id.get(), |s| s.export_records(shape).to_vec())
        .await;
    let body = csv_codec::export(&records, shape)?;
    let filename = csv_codec::export_filename(shape, chrono::Utc::now().date_naive());

    ctx.send(
        poise::CreateReply::default()
            .content(format!("Exported **{}** record(s).", records.len()))
            .attachment(serenity::CreateAttachment::bytes(body.into_bytes(), filename)),
    )
    .await?;
    Ok(())
}
