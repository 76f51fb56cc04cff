mod commands;
mod config;
mod csv_codec;
mod gateway;
mod llm;
mod patterns;
mod record;
mod session;
mod state;

use std::str::FromStr;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tracing::{error, info, Level};

use config::{AppConfig, DiscordConfig};
use gateway::GatewayClient;
use llm::LlmClient;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    let level = dotenv::var("LOG_LEVEL")
        .ok()
        .and_then(|s| Level::from_str(&s).ok())
        .unwrap_or(Level::DEBUG);
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = AppConfig::from_env()?;

    // Gateway server runs in the background when a bind address is set
    let server = match config.gateway_bind {
        Some(addr) => {
            let llm = Arc::new(LlmClient::new(&config.llm)?);
            info!("LLM client initialized");
            Some(tokio::spawn(gateway::server::serve(addr, llm)))
        }
        None => None,
    };

    match config.discord {
        Some(discord) => {
            let gateway = Arc::new(GatewayClient::new(&config.gateway)?);
            info!(endpoint = gateway.endpoint(), "Gateway client initialized");
            run_bot(discord, AppState::new(gateway)).await?;
        }
        None => {
            if let Some(handle) = server {
                handle.await??;
            }
        }
    }

    Ok(())
}

async fn run_bot(discord: DiscordConfig, app_state: AppState) -> anyhow::Result<()> {
    let guild_id = discord.guild_id.map(serenity::GuildId::new);
    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::hunt()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, commands, gid).await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, commands).await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting bug hunter Discord bot...");

    let mut client = serenity::ClientBuilder::new(&discord.token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
