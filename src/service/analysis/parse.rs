//! Parsing of AI completion text into analysis payloads

use serde_json::Value;

use super::normalize::normalize_analysis;
use crate::model::{AnalysisPayload, LocationHints};

pub const UNSTRUCTURED_ERROR: &str = "Response was not structured JSON";

/// Strip markdown code fences the model sometimes wraps JSON in
pub fn strip_code_fences(text: &str) -> String {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

/// Parse completion text and normalize it.
///
/// Falls back to the outermost `{...}` span when the text has prose around
/// the JSON. Unparseable text is returned as an unstructured payload.
pub fn parse_analysis_response(text: &str, hints: &LocationHints) -> AnalysisPayload {
    let cleaned = strip_code_fences(text);

    match extract_json(&cleaned) {
        Some(value) => normalize_analysis(Some(value), hints),
        None => {
            tracing::warn!(
                response_length = cleaned.len(),
                "AI analysis response was not valid JSON"
            );
            AnalysisPayload::unstructured(cleaned, UNSTRUCTURED_ERROR)
        }
    }
}

fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str(&text[start..=end]).ok()
}
