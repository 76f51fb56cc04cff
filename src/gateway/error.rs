use std::fmt;

use thiserror::Error;

use super::ErrorBody;

/// Why a transport-level failure happened, for the user-actionable cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportReason {
    /// HTTP 429. Retry later.
    RateLimited,
    /// HTTP 402. Credits exhausted.
    QuotaExhausted,
    Generic,
}

impl fmt::Display for TransportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportReason::RateLimited => "rate limited",
            TransportReason::QuotaExhausted => "quota exhausted",
            TransportReason::Generic => "gateway failure",
        })
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{reason}: {message}")]
    Transport {
        reason: TransportReason,
        status: Option<u16>,
        message: String,
    },
    #[error("gateway response violated contract: {0}")]
    Protocol(String),
    #[error("failed to encode submission: {0}")]
    Encode(#[from] csv::Error),
    #[error("submission superseded")]
    Cancelled,
}

impl GatewayError {
    /// Classify a non-success HTTP status, pulling `{ "error": .. }` out of the
    /// body when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let reason = match status {
            429 => TransportReason::RateLimited,
            402 => TransportReason::QuotaExhausted,
            _ => TransportReason::Generic,
        };
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("gateway returned status {}", status));
        GatewayError::Transport {
            reason,
            status: Some(status),
            message,
        }
    }

    pub fn reason(&self) -> Option<TransportReason> {
        match self {
            GatewayError::Transport { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Network failures and upstream 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport {
                reason: TransportReason::Generic,
                status,
                ..
            } => matches!(status, None | Some(500 | 502 | 503 | 504)),
            _ => false,
        }
    }

    /// Short text suitable for showing to whoever started the submission.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Transport {
                reason: TransportReason::RateLimited,
                ..
            } => "Rate limit exceeded. Please try again later.".to_string(),
            GatewayError::Transport {
                reason: TransportReason::QuotaExhausted,
                ..
            } => "Analysis quota exhausted. Please add credits to the workspace.".to_string(),
            GatewayError::Transport {
                status: Some(code),
                ..
            } => format!("Analysis gateway failed with status {}.", code),
            GatewayError::Transport { .. } => "Could not reach the analysis gateway.".to_string(),
            GatewayError::Protocol(_) => "Analysis failed: unexpected response from the gateway.".to_string(),
            GatewayError::Encode(_) => "Analysis failed: the batch could not be encoded.".to_string(),
            GatewayError::Cancelled => "Analysis was superseded by a newer request.".to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport {
            reason: TransportReason::Generic,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
