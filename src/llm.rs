use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::LlmConfig;
use crate::record::BugType;

const TOOL_NAME: &str = "suggest_fixes";

const SYSTEM_PROMPT: &str = "You are an expert RDI (Remote Device Interface) code analyzer for semiconductor test systems. You analyze buggy RDI code and produce corrected versions.

You will receive CSV rows where each row has an \"ID\" and \"BuggyCode\" column. For each row, analyze the buggy RDI code and produce:
1. CorrectedCode - the fixed version
2. Explanation - why it failed
3. BugType - one of: Logic, Hardware Constraints, Syntax, Lifecycle, Parameter Order
4. APIContext - relevant RDI API documentation for the fix
5. TrustScore - 0-100 confidence score

Common RDI bugs to look for:
- Incorrect iClamp parameter order: should be (pin, mode, highLimit, lowLimit)
- Improper lifecycle: operations outside RDI_BEGIN/RDI_END blocks
- Voltage range violations: AVI64 pins max 30V, DVI16 pins max 20V
- Port/pin type mismatches: analog ports must pair with analog pins
- Measurement binding order: smartVec().burstUpload() must be called before measure()
- Missing RDI_END causing resource leaks

You MUST respond using the suggest_fixes tool with the analysis results.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Payment required. Please add credits to your workspace.")]
    PaymentRequired,
    #[error("AI gateway error: {0}")]
    Upstream(u16),
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No tool call response from AI")]
    MissingToolCall,
    #[error("Failed to parse LLM JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Ask the model to analyze a CSV batch, forcing the `suggest_fixes` tool.
    /// Returns the tool arguments as parsed JSON, shaped `{ "results": [...] }`.
    pub async fn suggest_fixes(&self, csv_content: &str) -> Result<Value, LlmError> {
        let messages = vec![
            Message {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: format!(
                    "Analyze the following CSV of buggy RDI code and return fixes for each row:\n\n{}",
                    csv_content
                ),
            },
        ];
        let body = json!({
            "model": self.model,
            "messages": messages,
            "tools": [suggest_fixes_tool()],
            "tool_choice": { "type": "function", "function": { "name": TOOL_NAME } },
        });

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => LlmError::RateLimited,
                402 => LlmError::PaymentRequired,
                code => {
                    error!(status = code, body = %text, "AI gateway error");
                    LlmError::Upstream(code)
                }
            });
        }

        let json: Value = resp.json().await?;
        let args = tool_arguments(&json).ok_or(LlmError::MissingToolCall)?;
        debug!(len = args.len(), "tool call arguments received");
        Ok(serde_json::from_str(args)?)
    }
}

/// Extract `choices[0].message.tool_calls[0].function.arguments`.
fn tool_arguments(json: &Value) -> Option<&str> {
    json["choices"]
        .get(0)
        .and_then(|c| c["message"]["tool_calls"].get(0))
        .and_then(|t| t["function"]["arguments"].as_str())
        .filter(|a| !a.is_empty())
}

fn suggest_fixes_tool() -> Value {
    let bug_types: Vec<&str> = BugType::ALL.iter().map(BugType::as_str).collect();
    json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": "Return analysis results for each buggy RDI code row.",
            "parameters": {
                "type": "object",
                "properties": {
                    "results": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "buggyCode": { "type": "string" },
                                "correctedCode": { "type": "string" },
                                "explanation": { "type": "string" },
                                "bugType": { "type": "string", "enum": bug_types },
                                "apiContext": { "type": "string" },
                                "trustScore": { "type": "number" }
                            },
                            "required": [
                                "id", "buggyCode", "correctedCode", "explanation",
                                "bugType", "apiContext", "trustScore"
                            ],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["results"],
                "additionalProperties": false
            }
        }
    })
}
