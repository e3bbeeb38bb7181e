//! Parsing of free-form engine responses into strict types
//!
//! Engine output is untrusted input: it may be wrapped in markdown fences,
//! carry prose around the JSON object, or be malformed entirely. Every
//! parser here degrades to a conservative default instead of propagating
//! ambiguity upward.

use super::{Confidence, ConfidenceReport, FileSelection, QueryRoute};
use serde::Deserialize;

/// Extract the first JSON object from a response, tolerating code fences
pub(crate) fn extract_json(response: &str) -> Option<&str> {
    let inner = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
    } else {
        response
    };

    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    if end < start {
        return None;
    }
    Some(inner[start..=end].trim())
}

#[derive(Deserialize)]
struct ClassificationResponse {
    action: String,
}

/// Parse a classification response; uncertain input routes to code search
pub(crate) fn parse_classification(response: &str) -> QueryRoute {
    if let Some(json) = extract_json(response) {
        if let Ok(parsed) = serde_json::from_str::<ClassificationResponse>(json) {
            match parsed.action.to_uppercase().as_str() {
                "SEARCH_CODE" => return QueryRoute::SearchCode,
                "USE_MEMORY" => return QueryRoute::UseMemory,
                "DIRECT" => return QueryRoute::Direct,
                _ => {}
            }
        }
    }

    let upper = response.to_uppercase();
    if upper.contains("SEARCH_CODE") {
        QueryRoute::SearchCode
    } else if upper.contains("USE_MEMORY") {
        QueryRoute::UseMemory
    } else if upper.contains("DIRECT") {
        QueryRoute::Direct
    } else {
        tracing::warn!("unparseable classification response, defaulting to code search");
        QueryRoute::SearchCode
    }
}

#[derive(Deserialize)]
struct SelectionResponse {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    sufficient: bool,
}

/// Parse a file selection response, clamping to `max_files`.
///
/// When the JSON cannot be parsed, falls back to scanning the raw response
/// for paths that exist in the index.
pub(crate) fn parse_selection(
    response: &str,
    known_paths: &[&str],
    max_files: usize,
) -> FileSelection {
    if let Some(json) = extract_json(response) {
        if let Ok(parsed) = serde_json::from_str::<SelectionResponse>(json) {
            return FileSelection {
                paths: parsed.files.into_iter().take(max_files).collect(),
                sufficient: parsed.sufficient,
            };
        }
    }

    tracing::warn!("unparseable selection response, scanning for known paths");
    let paths: Vec<String> = known_paths
        .iter()
        .filter(|p| response.contains(**p))
        .take(max_files)
        .map(|p| p.to_string())
        .collect();

    FileSelection {
        paths,
        sufficient: false,
    }
}

#[derive(Deserialize)]
struct ConfidenceResponse {
    confidence: String,
    #[serde(default)]
    suggestion: Option<String>,
}

/// Parse a confidence response; anything unparseable is `LOW`
pub(crate) fn parse_confidence(response: &str) -> ConfidenceReport {
    if let Some(json) = extract_json(response) {
        if let Ok(parsed) = serde_json::from_str::<ConfidenceResponse>(json) {
            if let Some(level) = confidence_from_str(&parsed.confidence) {
                let suggested_term = parsed
                    .suggestion
                    .filter(|s| !s.trim().is_empty() && s.trim().to_lowercase() != "null");
                return ConfidenceReport {
                    level,
                    suggested_term,
                };
            }
        }
    }

    let upper = response.to_uppercase();
    let level = if upper.contains("HIGH") {
        Confidence::High
    } else if upper.contains("MEDIUM") {
        Confidence::Medium
    } else if upper.contains("LOW") {
        Confidence::Low
    } else {
        tracing::warn!("unparseable confidence response, defaulting to LOW");
        Confidence::Low
    };

    ConfidenceReport {
        level,
        suggested_term: None,
    }
}

fn confidence_from_str(s: &str) -> Option<Confidence> {
    match s.trim().to_uppercase().as_str() {
        "HIGH" => Some(Confidence::High),
        "MEDIUM" => Some(Confidence::Medium),
        "LOW" => Some(Confidence::Low),
        _ => None,
    }
}
