use crate::record::TrustLevel;
use crate::session::SessionState;

const CORRECTED_PLACEHOLDER: &str = "// Run analysis to see corrected code...";

/// Render the session's current record as Discord markdown.
pub fn session_view(state: &SessionState) -> String {
    let Some(current) = state.current() else {
        return "No records loaded. Use `/hunt upload` or `/hunt reset`.".to_string();
    };

    let mut out = format!(
        "**{}** ({} / {})\n\n**buggy.rdi**\n```cpp\n{}\n```\n",
        current.id,
        state.index + 1,
        state.batch.len(),
        current.buggy_code
    );

    let corrected = state
        .active
        .as_ref()
        .map(|r| r.corrected_code.as_str())
        .unwrap_or(CORRECTED_PLACEHOLDER);
    out.push_str(&format!("**corrected.rdi**\n```cpp\n{}\n```\n", corrected));

    if state.is_hunting() {
        out.push_str("\n*Analyzing RDI patterns...*\n");
    } else if let Some(bug) = &state.active {
        let level = match bug.trust_level() {
            TrustLevel::High => "high",
            TrustLevel::Medium => "medium",
            TrustLevel::Low => "low",
        };
        out.push_str(&format!(
            "\n**Trust:** {}% ({}) | **Bug Type:** {}\n\n**Explanation**\n{}\n\n**API Context**\n{}\n",
            bug.trust_score, level, bug.bug_type, bug.explanation, bug.api_context
        ));
    } else {
        out.push_str("\nUse `/hunt start` to analyze this code.\n");
    }

    if let Some(err) = &state.last_error {
        out.push_str(&format!("\n**Last analysis failed:** {}\n", err));
    }
    out
}
