use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Trust score assigned when the gateway omits one or sends a non-number.
pub const DEFAULT_TRUST_SCORE: u8 = 80;

/// Closed set of bug classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BugType {
    #[default]
    Logic,
    #[serde(rename = "Hardware Constraints")]
    HardwareConstraints,
    Syntax,
    Lifecycle,
    #[serde(rename = "Parameter Order")]
    ParameterOrder,
}

impl BugType {
    pub const ALL: [BugType; 5] = [
        BugType::Logic,
        BugType::HardwareConstraints,
        BugType::Syntax,
        BugType::Lifecycle,
        BugType::ParameterOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BugType::Logic => "Logic",
            BugType::HardwareConstraints => "Hardware Constraints",
            BugType::Syntax => "Syntax",
            BugType::Lifecycle => "Lifecycle",
            BugType::ParameterOrder => "Parameter Order",
        }
    }

    /// Parse untrusted input. Anything unrecognised becomes `Logic`.
    pub fn parse_lenient(raw: &str) -> Self {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .unwrap_or_default()
    }
}

impl fmt::Display for BugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    High,
    Medium,
    Low,
}

impl TrustLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => TrustLevel::High,
            75..=89 => TrustLevel::Medium,
            _ => TrustLevel::Low,
        }
    }
}

/// One unit of analysis work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub buggy_code: String,
    pub corrected_code: String,
    /// May contain `**bold**` spans.
    pub explanation: String,
    pub bug_type: BugType,
    pub api_context: String,
    /// 0 means "not yet analyzed".
    pub trust_score: u8,
}

/// A row decoded from an uploaded CSV, before analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub id: String,
    pub buggy_code: String,
}

impl Record {
    /// Create a stub record awaiting analysis.
    pub fn stub(id: impl Into<String>, buggy_code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buggy_code: buggy_code.into(),
            corrected_code: String::new(),
            explanation: String::new(),
            bug_type: BugType::default(),
            api_context: String::new(),
            trust_score: 0,
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.trust_score > 0
    }

    pub fn trust_level(&self) -> TrustLevel {
        TrustLevel::from_score(self.trust_score)
    }

    /// Build a record from one entry of a gateway `results` array.
    ///
    /// Missing fields are defaulted individually. `id` and `buggyCode` fall back
    /// to `submitted`, the record sent at the same position, so the id stays
    /// non-empty.
    pub fn from_result_value(value: &Value, submitted: &Record) -> Self {
        let text = |key: &str| -> Option<String> {
            match value.get(key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            }
        };

        let mut missing = Vec::new();
        let mut field = |key: &'static str| {
            text(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };

        let mut id = field("id");
        let mut buggy_code = field("buggyCode");
        let corrected_code = field("correctedCode");
        let explanation = field("explanation");
        let api_context = field("apiContext");

        if id.trim().is_empty() {
            id = submitted.id.clone();
        }
        if buggy_code.is_empty() {
            buggy_code = submitted.buggy_code.clone();
        }

        let bug_type = match value.get("bugType").and_then(Value::as_str) {
            Some(raw) => BugType::parse_lenient(raw),
            None => {
                missing.push("bugType");
                BugType::default()
            }
        };

        let trust_score = match value.get("trustScore").and_then(Value::as_f64) {
            // 0 is reserved for stubs, so an analyzed record scores at least 1.
            Some(n) if n.is_finite() => n.round().clamp(1.0, 100.0) as u8,
            _ => {
                missing.push("trustScore");
                DEFAULT_TRUST_SCORE
            }
        };

        if !missing.is_empty() {
            debug!(id = %id, ?missing, "result record missing fields, defaulted");
        }

        Self {
            id,
            buggy_code,
            corrected_code,
            explanation,
            bug_type,
            api_context,
            trust_score,
        }
    }
}

impl From<InputRow> for Record {
    fn from(row: InputRow) -> Self {
        Record::stub(row.id, row.buggy_code)
    }
}
