use common::models::{Classification, Decision, Profile};
use serde::Deserialize;
use tracing::warn;

use crate::classifier::ClassifierError;

#[derive(Debug, Deserialize)]
struct RawVerdict {
    decision: String,
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Removes a surrounding markdown code fence (```` ```json ... ``` ````) if present.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let text = match text.strip_prefix("```") {
        Some(rest) => {
            // Drop the info string (`json`, `JSON`, ...) up to the first newline or brace.
            let body_start = rest.find(['\n', '{']).unwrap_or(rest.len());
            &rest[body_start..]
        }
        None => text,
    };
    text.trim().strip_suffix("```").unwrap_or(text).trim()
}

pub fn parse_verdict(raw: &str) -> Result<Classification, ClassifierError> {
    let body = strip_code_fences(raw);
    let verdict: RawVerdict =
        serde_json::from_str(body).map_err(|e| ClassifierError::Parse(e.to_string()))?;

    let decision = Decision::parse(&verdict.decision).ok_or_else(|| {
        ClassifierError::Parse(format!("unknown decision {:?}", verdict.decision))
    })?;

    let profile = match verdict.profile.as_deref() {
        Some(name) => Profile::parse(name).unwrap_or_else(|| {
            warn!("Unknown profile {:?}, using {}", name, Profile::default());
            Profile::default()
        }),
        None => Profile::default(),
    };

    Ok(Classification {
        decision,
        profile,
        reason: verdict.reason.unwrap_or_default(),
    })
}
