//! CSV codec for uploaded batches and exported sessions.
//!
//! Quoted fields may carry commas, doubled quotes and line breaks. Every
//! field is trimmed on decode, quoted or not.

use chrono::NaiveDate;
use csv::{QuoteStyle, ReaderBuilder, Terminator, Trim, WriterBuilder};
use tracing::debug;

use crate::record::{InputRow, Record};

/// Lowercased header spellings accepted for the buggy code column.
pub const CODE_HEADERS: [&str; 4] = ["buggycode", "buggy code", "code", "original code"];

const SUBMISSION_HEADERS: [&str; 2] = ["ID", "BuggyCode"];
const SESSION_HEADERS: [&str; 5] = ["ID", "Explanation", "Context", "Original Code", "Corrected Code"];
const RESULT_HEADERS: [&str; 7] = [
    "ID",
    "BugType",
    "TrustScore",
    "Explanation",
    "APIContext",
    "BuggyCode",
    "CorrectedCode",
];

/// The two downloadable export layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportShape {
    /// id, explanation, context, original, corrected
    Session,
    /// Session columns plus bug type and trust score.
    Results,
}

impl ExportShape {
    fn file_prefix(&self) -> &'static str {
        match self {
            ExportShape::Session => "abh-session",
            ExportShape::Results => "abh-results",
        }
    }
}

/// Decode uploaded CSV text into `(id, buggyCode)` rows.
///
/// Returns an empty vec when the input has no data row or lacks an `id`
/// column or a recognised code column. Blank rows, unreadable rows and rows
/// missing either value are skipped.
pub fn decode_input(text: &str) -> Vec<InputRow> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(str::to_lowercase).collect(),
        Err(e) => {
            debug!(error = %e, "unreadable csv header");
            return Vec::new();
        }
    };

    let id_idx = header.iter().position(|h| h == "id");
    let code_idx = header
        .iter()
        .position(|h| CODE_HEADERS.contains(&h.as_str()));
    let (Some(id_idx), Some(code_idx)) = (id_idx, code_idx) else {
        debug!(?header, "csv header lacks id or code column");
        return Vec::new();
    };

    let mut out = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(row = row + 1, error = %e, "skipping unreadable csv row");
                continue;
            }
        };
        let id = record.get(id_idx).unwrap_or_default();
        let code = record.get(code_idx).unwrap_or_default();
        if id.is_empty() || code.is_empty() {
            if record.iter().any(|c| !c.is_empty()) {
                debug!(row = row + 1, "skipping csv row without id or code");
            }
            continue;
        }
        out.push(InputRow {
            id: id.to_string(),
            buggy_code: code.to_string(),
        });
    }
    out
}

/// Quotes only fields holding a comma, quote or line break; rows end in `\n`.
fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

/// Flush the writer and drop the final terminator, so rows are only joined
/// by newlines.
fn finish(writer: csv::Writer<Vec<u8>>) -> csv::Result<String> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    // Fields come in as &str and the writer only adds ASCII.
    let mut out = String::from_utf8_lossy(&bytes).into_owned();
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// Minimal `ID,BuggyCode` payload sent to the analysis gateway.
pub fn encode_submission(records: &[Record]) -> csv::Result<String> {
    let mut wtr = writer();
    wtr.write_record(SUBMISSION_HEADERS)?;
    for r in records {
        wtr.write_record([r.id.as_str(), r.buggy_code.as_str()])?;
    }
    finish(wtr)
}

pub fn export(records: &[Record], shape: ExportShape) -> csv::Result<String> {
    let mut wtr = writer();
    match shape {
        ExportShape::Session => {
            wtr.write_record(SESSION_HEADERS)?;
            for r in records {
                wtr.write_record([
                    r.id.as_str(),
                    r.explanation.as_str(),
                    r.api_context.as_str(),
                    r.buggy_code.as_str(),
                    r.corrected_code.as_str(),
                ])?;
            }
        }
        ExportShape::Results => {
            wtr.write_record(RESULT_HEADERS)?;
            for r in records {
                let score = r.trust_score.to_string();
                wtr.write_record([
                    r.id.as_str(),
                    r.bug_type.as_str(),
                    score.as_str(),
                    r.explanation.as_str(),
                    r.api_context.as_str(),
                    r.buggy_code.as_str(),
                    r.corrected_code.as_str(),
                ])?;
            }
        }
    }
    finish(wtr)
}

/// Download name with an ISO date suffix, e.g. `abh-session-2026-02-21.csv`.
pub fn export_filename(shape: ExportShape, date: NaiveDate) -> String {
    format!("{}-{}.csv", shape.file_prefix(), date.format("%Y-%m-%d"))
}
