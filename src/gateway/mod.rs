//! Analysis gateway: the HTTP contract between the hunter and the remote
//! analysis service, plus a client and a server speaking it.

pub mod client;
pub mod error;
pub mod server;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tracing::warn;

use crate::record::Record;

pub use client::GatewayClient;
pub use error::{GatewayError, TransportReason};

pub const ANALYZE_PATH: &str = "/analyze-rdi";

pub const CSV_REQUIRED_MESSAGE: &str = "csvContent is required";
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const PAYMENT_REQUIRED_MESSAGE: &str = "Payment required. Please add credits to your workspace.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub csv_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Decode a success body into records, positionally matched to `submitted`.
///
/// The body must be a JSON object with a `results` array; anything else is a
/// protocol violation, as is an empty array for a non-empty submission.
/// Entries beyond the submitted count have no record to stand for and are
/// dropped; a shorter array leaves the trailing records unanalyzed.
pub fn decode_results(body: &str, submitted: &[Record]) -> Result<Vec<Record>, GatewayError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::Protocol(format!("response is not JSON: {}", e)))?;
    let results = json
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::Protocol("missing `results` array".to_string()))?;

    if results.is_empty() && !submitted.is_empty() {
        return Err(GatewayError::Protocol("empty `results` array".to_string()));
    }
    if results.len() > submitted.len() {
        warn!(
            returned = results.len(),
            submitted = submitted.len(),
            "dropping surplus analysis results"
        );
    }

    Ok(results
        .iter()
        .zip(submitted)
        .map(|(value, sent)| Record::from_result_value(value, sent))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BugType;

    #[test]
    fn test_decode_results_defaults() {
        let submitted = vec![Record::stub("A", "a();"), Record::stub("B", "b();")];
        let body = r#"{"results":[
            {"id":"A","buggyCode":"a();","correctedCode":"A();","explanation":"x","bugType":"Syntax","apiContext":"","trustScore":77},
            {"id":"B","correctedCode":"B();"}
        ]}"#;
        let records = decode_results(body, &submitted).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bug_type, BugType::Syntax);
        assert_eq!(records[1].bug_type, BugType::Logic);
        assert_eq!(records[1].trust_score, 80);
        assert_eq!(records[1].buggy_code, "b();");
    }

    #[test]
    fn test_surplus_results_dropped() {
        let submitted = vec![Record::stub("A", "a();")];
        let body = r#"{"results":[
            {"id":"A","trustScore":90},
            {"correctedCode":"extra();","trustScore":90}
        ]}"#;
        let records = decode_results(body, &submitted).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| !r.id.is_empty()));
    }

    #[test]
    fn test_short_results_kept_positionally() {
        let submitted = vec![Record::stub("A", "a();"), Record::stub("B", "b();")];
        let records = decode_results(r#"{"results":[{"trustScore":90}]}"#, &submitted).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "A");
    }

    #[test]
    fn test_empty_results_for_batch_is_protocol_error() {
        let submitted = vec![Record::stub("A", "a();")];
        assert!(matches!(
            decode_results(r#"{"results":[]}"#, &submitted),
            Err(GatewayError::Protocol(_))
        ));
        assert!(decode_results(r#"{"results":[]}"#, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_results_protocol_errors() {
        assert!(matches!(
            decode_results(r#"{"fixes":[]}"#, &[]),
            Err(GatewayError::Protocol(_))
        ));
        assert!(matches!(
            decode_results(r#"{"results":"none"}"#, &[]),
            Err(GatewayError::Protocol(_))
        ));
        assert!(matches!(
            decode_results("<html>", &[]),
            Err(GatewayError::Protocol(_))
        ));
    }

    #[test]
    fn test_missing_csv_content_defaults_empty() {
        let req: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert!(req.csv_content.is_empty());
    }
}
