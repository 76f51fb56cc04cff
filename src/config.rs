use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_BIND: &str = "127.0.0.1:8787";

pub struct DiscordConfig {
    pub token: String,
    pub guild_id: Option<u64>,
}

pub struct GatewayConfig {
    /// Full URL of the analyze endpoint.
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Runtime configuration, read from the environment (and `.env`).
pub struct AppConfig {
    /// Bot runs only when a token is configured.
    pub discord: Option<DiscordConfig>,
    /// Gateway server runs only when a bind address is configured.
    pub gateway_bind: Option<SocketAddr>,
    pub gateway: GatewayConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord = var("DISCORD_TOKEN").map(|token| DiscordConfig {
            token,
            guild_id: var("DISCORD_GUILD_ID").and_then(|s| s.parse::<u64>().ok()),
        });

        let gateway_bind = var("GATEWAY_BIND")
            .map(|s| s.parse::<SocketAddr>())
            .transpose()
            .context("GATEWAY_BIND must be a socket address like 127.0.0.1:8787")?;

        if discord.is_none() && gateway_bind.is_none() {
            bail!("nothing to run: set DISCORD_TOKEN and/or GATEWAY_BIND");
        }

        let url = var("GATEWAY_URL").unwrap_or_else(|| {
            let bind = gateway_bind
                .map(|a| a.to_string())
                .unwrap_or_else(|| DEFAULT_BIND.to_string());
            format!("http://{}{}", bind, crate::gateway::ANALYZE_PATH)
        });
        let timeout_secs = var("GATEWAY_TIMEOUT_SECS")
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("GATEWAY_TIMEOUT_SECS must be an integer")?
            .unwrap_or(120);
        let max_retries = var("GATEWAY_MAX_RETRIES")
            .map(|s| s.parse::<u32>())
            .transpose()
            .context("GATEWAY_MAX_RETRIES must be an integer")?
            .unwrap_or(2);

        let base_url = var("LLM_BASE_URL").unwrap_or_else(|| "http://localhost:1234/v1".to_string());
        let model = var("LLM_MODEL").unwrap_or_else(|| "qwen/qwen3-8b".to_string());

        Ok(Self {
            discord,
            gateway_bind,
            gateway: GatewayConfig {
                url,
                timeout: Duration::from_secs(timeout_secs),
                max_retries,
            },
            llm: LlmConfig {
                base_url,
                model,
                api_key: var("LLM_API_KEY"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_requires_something_to_run() {
        assert!(config(&[]).is_err());
        assert!(config(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_gateway_url_follows_bind() {
        let cfg = config(&[("GATEWAY_BIND", "0.0.0.0:9000")]).unwrap();
        assert_eq!(cfg.gateway.url, "http://0.0.0.0:9000/analyze-rdi");
        assert!(cfg.discord.is_none());
        assert_eq!(cfg.gateway.max_retries, 2);
        assert_eq!(cfg.gateway.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_bot_only_uses_remote_gateway() {
        let cfg = config(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_GUILD_ID", "42"),
            ("GATEWAY_URL", "https://example.test/functions/v1/analyze-rdi"),
            ("GATEWAY_MAX_RETRIES", "0"),
        ])
        .unwrap();
        let discord = cfg.discord.unwrap();
        assert_eq!(discord.guild_id, Some(42));
        assert!(cfg.gateway_bind.is_none());
        assert_eq!(cfg.gateway.url, "https://example.test/functions/v1/analyze-rdi");
        assert_eq!(cfg.gateway.max_retries, 0);
        assert!(cfg.llm.api_key.is_none());
    }

    #[test]
    fn test_rejects_bad_bind() {
        assert!(config(&[("GATEWAY_BIND", "not-an-addr")]).is_err());
    }
}
