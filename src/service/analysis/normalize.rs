//! Normalization of loosely-typed analysis JSON into `CaseAnalysis`
//!
//! AI responses routinely drift from the requested schema: numbers arrive as
//! strings, lists as scalars, objects as bare strings. Every field is repaired
//! to its nearest safe representation instead of failing the whole analysis.

use serde_json::{Map, Value};

use crate::model::{
    AnalysisPayload, CaseAnalysis, CategoryConfidence, EvidencePriority, FallbackReason,
    FilingAuthority, FilingViability, LegalSection, LocationHints, SanctionRecommendation,
};

pub const MAX_NEXT_STEPS: usize = 15;
pub const MAX_EVIDENCE_PRIORITY: usize = 20;
pub const MAX_TIMELINE_CHARS: usize = 200;

/// Marker key carried by payloads that could not be parsed upstream
const RAW_MARKER: &str = "raw";

/// Normalize an analysis value into the fixed schema.
///
/// - `None` yields an unstructured payload with an empty `raw`
/// - objects carrying a `raw` marker are passed through as unstructured
/// - any other non-object is kept as unstructured text
pub fn normalize_analysis(data: Option<Value>, hints: &LocationHints) -> AnalysisPayload {
    let data = match data {
        None | Some(Value::Null) => {
            return AnalysisPayload::unstructured("", "No analysis data");
        }
        Some(Value::Object(map)) => map,
        Some(other) => {
            return AnalysisPayload::unstructured(
                other.to_string(),
                "Analysis was not a JSON object",
            );
        }
    };

    if data.contains_key(RAW_MARKER) {
        return AnalysisPayload::unstructured(
            coerce_string(data.get(RAW_MARKER)),
            coerce_string(data.get("error")),
        );
    }

    AnalysisPayload::Normalized(Box::new(normalize_fields(&data, hints)))
}

/// Parse-and-clamp constructor for an analysis object
pub fn normalize_fields(data: &Map<String, Value>, hints: &LocationHints) -> CaseAnalysis {
    CaseAnalysis {
        country: string_or_hint(data.get("country"), &hints.country),
        state: string_or_hint(data.get("state"), &hints.state),
        city: string_or_hint(data.get("city"), &hints.city),
        pincode: string_or_hint(data.get("pincode"), &hints.pincode),
        language: coerce_string(data.get("language")),
        keywords: string_list(data.get("keywords")),
        sentiment: clamp_or_zero(data.get("sentiment"), -1.0, 1.0),
        category_confidence: normalize_category_confidence(data.get("category_confidence")),
        summary: coerce_string(data.get("summary")),
        legal_sections: normalize_legal_sections(data.get("legal_sections")),
        sanction_recommendations: normalize_sanctions(data.get("sanction_recommendations")),
        filing_viability: normalize_filing_viability(data.get("filing_viability")),
        filing_authorities: normalize_filing_authorities(data.get("filing_authorities")),
        next_steps: string_list(data.get("next_steps"))
            .into_iter()
            .take(MAX_NEXT_STEPS)
            .collect(),
        evidence_priority: normalize_evidence_priority(data.get("evidence_priority")),
        timeline_estimate: coerce_string(data.get("timeline_estimate"))
            .chars()
            .take(MAX_TIMELINE_CHARS)
            .collect(),
        fallback_reason: data
            .get("fallback_reason")
            .and_then(|v| serde_json::from_value::<FallbackReason>(v.clone()).ok()),
    }
}

fn normalize_category_confidence(value: Option<&Value>) -> CategoryConfidence {
    let mut confidence = CategoryConfidence::default();
    let source = value.and_then(Value::as_object);

    for category in CategoryConfidence::CATEGORIES {
        let raw = source.and_then(|m| m.get(category));
        confidence.set(category, clamp_or_zero(raw, 0.0, 1.0));
    }

    confidence
}

fn normalize_legal_sections(value: Option<&Value>) -> Vec<LegalSection> {
    list_items(value)
        .iter()
        .map(|item| match item {
            Value::Object(obj) => LegalSection {
                section: coerce_string(obj.get("section")),
                description: coerce_string(obj.get("description")),
                citation: coerce_string(obj.get("citation")),
            },
            other => LegalSection {
                section: coerce_string(Some(other)),
                ..Default::default()
            },
        })
        .collect()
}

fn normalize_sanctions(value: Option<&Value>) -> Vec<SanctionRecommendation> {
    list_items(value)
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| SanctionRecommendation {
            code: coerce_string(obj.get("code")),
            name: coerce_string(obj.get("name")),
            description: coerce_string(obj.get("description")),
            confidence: clamp_or_zero(obj.get("confidence"), 0.0, 1.0),
        })
        .collect()
}

fn normalize_filing_viability(value: Option<&Value>) -> FilingViability {
    let Some(obj) = value.and_then(Value::as_object) else {
        return FilingViability::default();
    };

    FilingViability {
        viable: obj.get("viable").is_some_and(is_truthy),
        rationale: coerce_string(obj.get("rationale")),
        missing_evidence: string_list(obj.get("missing_evidence")),
        recommended_actions: string_list(obj.get("recommended_actions")),
    }
}

fn normalize_filing_authorities(value: Option<&Value>) -> Vec<FilingAuthority> {
    list_items(value)
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| FilingAuthority {
            authority_type: coerce_string(obj.get("authority_type")),
            name: coerce_string(obj.get("name")),
            address: coerce_string(obj.get("address")),
            phone_numbers: phone_numbers(obj.get("phone_numbers")),
            online_portal: coerce_string(obj.get("online_portal")),
            jurisdiction: coerce_string(obj.get("jurisdiction")),
            how_to_file: coerce_string(obj.get("how_to_file")),
            notes: coerce_string(obj.get("notes")),
        })
        .collect()
}

fn normalize_evidence_priority(value: Option<&Value>) -> Vec<EvidencePriority> {
    list_items(value)
        .iter()
        .take(MAX_EVIDENCE_PRIORITY)
        .map(|item| match item {
            Value::Object(obj) => EvidencePriority {
                item: coerce_string(obj.get("item")),
                rationale: coerce_string(obj.get("rationale")),
                priority: coerce_string(obj.get("priority")),
            },
            other => EvidencePriority {
                item: coerce_string(Some(other)),
                ..Default::default()
            },
        })
        .collect()
}

/// Phone numbers may arrive as a list, a single number or a single string
fn phone_numbers(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|v| coerce_string(Some(v))).collect(),
        Some(other) if is_truthy(other) => vec![coerce_string(Some(other))],
        _ => Vec::new(),
    }
}

fn list_items(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    list_items(value)
        .iter()
        .map(|v| coerce_string(Some(v)))
        .collect()
}

fn string_or_hint(value: Option<&Value>, hint: &str) -> String {
    match value {
        None | Some(Value::Null) => hint.to_string(),
        Some(v) => coerce_string(Some(v)),
    }
}

/// Coerce any JSON value into a display string; null and missing become empty
pub(crate) fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Coerce a JSON value into a finite float
pub(crate) fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;

    (!number.is_nan()).then_some(number)
}

fn clamp_or_zero(value: Option<&Value>, min: f64, max: f64) -> f64 {
    coerce_f64(value).map_or(0.0, |v| v.clamp(min, max))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
