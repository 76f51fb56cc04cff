use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{decode_results, AnalyzeRequest, GatewayError};
use crate::config::GatewayConfig;
use crate::csv_codec;
use crate::record::Record;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Submits record batches to the analysis gateway.
pub struct GatewayClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
            max_retries: config.max_retries,
            retry_backoff: RETRY_BACKOFF,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit a batch and wait for the analyzed records.
    ///
    /// Transient failures (network errors, 5xx) are retried with a linear
    /// backoff. Fires `Cancelled` as soon as `cancel` does.
    pub async fn submit(
        &self,
        records: &[Record],
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, GatewayError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let payload = AnalyzeRequest {
            csv_content: csv_codec::encode_submission(records)?,
        };
        info!(endpoint = %self.endpoint, count = records.len(), "submitting batch for analysis");

        let mut attempt = 0;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                outcome = self.send_once(&payload, records) => outcome,
            };

            match outcome {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %err, "gateway submission failed, retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                        _ = tokio::time::sleep(self.retry_backoff * attempt) => {}
                    }
                }
                Ok(analyzed) => {
                    info!(count = analyzed.len(), "analysis batch received");
                    return Ok(analyzed);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        payload: &AnalyzeRequest,
        submitted: &[Record],
    ) -> Result<Vec<Record>, GatewayError> {
        let resp = self.client.post(&self.endpoint).json(payload).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::from_status(status.as_u16(), &body));
        }
        decode_results(&body, submitted)
    }
}
