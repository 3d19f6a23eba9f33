//! Deterministic local analysis used when the AI backend cannot answer

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use super::normalize::normalize_fields;
use crate::model::{AnalysisRequest, CaseAnalysis, FallbackReason};

pub const MAX_KEYWORDS: usize = 7;
pub const SUMMARY_MAX_CHARS: usize = 280;
const ELLIPSIS: char = '…';

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{4,}").expect("valid keyword regex"));

/// Build a fallback analysis for the request.
///
/// The output goes through the same normalization as AI responses, so it is
/// schema-conformant by construction.
pub fn build_fallback(request: &AnalysisRequest, reason: FallbackReason) -> CaseAnalysis {
    let hints = &request.hints;
    let description = request.description.as_str();

    let mut data = json!({
        "country": hints.country,
        "state": hints.state,
        "city": hints.city,
        "pincode": hints.pincode,
        "language": request.language,
        "keywords": top_keywords(&format!("{} {}", request.title, description), MAX_KEYWORDS),
        "sentiment": 0.0,
        "category_confidence": {
            "general": if description.is_empty() { 0.0 } else { 0.6 },
            "fraud": 0.2,
            "security": 0.1,
            "compliance": 0.1,
            "financial": 0.2,
        },
        "summary": fallback_summary(description),
        "legal_sections": [],
        "sanction_recommendations": [],
        "filing_viability": {
            "viable": false,
            "rationale": format!(
                "Fallback used ({}). Provide more evidence and retry once AI availability improves.",
                reason.as_str()
            ),
            "missing_evidence": ["supporting documents", "witness statements"],
            "recommended_actions": ["compile documents", "note chronology of events"],
        },
        "filing_authorities": [],
        "next_steps": [
            "Gather all available evidence",
            "Prepare a chronological event log",
            "Consult legal counsel for refinement",
        ],
        "evidence_priority": [
            {"item": "Primary digital evidence", "rationale": "Directly supports core allegation", "priority": "high"},
            {"item": "Witness statements", "rationale": "Corroborates incident timeline", "priority": "medium"},
        ],
        "timeline_estimate": "Initial preparation 1-2 weeks; filing thereafter",
        "fallback_reason": reason,
    });

    if hints.is_india()
        && let Value::Object(ref mut map) = data
    {
        map.insert("legal_sections".to_string(), india_legal_sections());
        map.insert("filing_authorities".to_string(), india_filing_authorities());
    }

    match data {
        Value::Object(ref map) => normalize_fields(map, hints),
        _ => CaseAnalysis::default(),
    }
}

/// Summary is the description verbatim up to 280 characters, else truncated with an ellipsis
pub fn fallback_summary(description: &str) -> String {
    if description.is_empty() {
        return "No description provided.".to_string();
    }

    if description.chars().count() > SUMMARY_MAX_CHARS {
        let mut summary: String = description.chars().take(SUMMARY_MAX_CHARS).collect();
        summary.push(ELLIPSIS);
        summary
    } else {
        description.to_string()
    }
}

/// Most frequent alphabetic tokens of length >= 4, case-folded.
///
/// Ties keep first-appearance order.
pub fn top_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, word) in WORD_REGEX.find_iter(text).enumerate() {
        let entry = counts
            .entry(word.as_str().to_lowercase())
            .or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(word, _, _)| word)
        .collect()
}

fn india_legal_sections() -> Value {
    json!([{
        "section": "IT Act, 2000",
        "description": "General provisions related to cyber offences",
        "citation": "",
    }])
}

fn india_filing_authorities() -> Value {
    json!([{
        "authority_type": "Cyber Crime Portal",
        "name": "National Cyber Crime Reporting Portal",
        "address": "",
        "phone_numbers": ["1930", "112"],
        "online_portal": "https://cybercrime.gov.in",
        "jurisdiction": "Pan-India",
        "how_to_file": "File a complaint on the portal; attach evidence.",
        "notes": "Fallback data shown while AI is unavailable.",
    }])
}
