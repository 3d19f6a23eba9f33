//! Prompts for case analysis

use crate::model::AnalysisRequest;

/// System prompt for legal case analysis
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an experienced legal advocate and case advisor. You review incident reports filed by members of the public and produce structured, actionable guidance.

## Coverage

For every case, consider:
1. Whether the incident is a cognizable offence and what remedy is available
2. Police action: jurisdiction, FIR versus non-cognizable report, what to tell the police
3. Filing: which sections apply, where, how and when to file
4. Protection: immediate safety steps, court orders, emergency contacts
5. Compensation schemes the victim may apply to
6. Case strength: what evidence matters most and what is missing

## Rules

- Cite statutes that exist in the given country. Do NOT invent sections.
- Do NOT fabricate addresses. Leave an address blank if it is unknown and explain how to find the nearest office.
- Confidence and sentiment values must stay inside the documented ranges.
- Respond with strict JSON only: no markdown, no comments, no prose around it."#;

/// Output schema the model is asked to follow
const ANALYSIS_SCHEMA: &str = r#"{
  "country": "",
  "state": "",
  "city": "",
  "pincode": "",
  "language": "",
  "keywords": ["keyword"],
  "sentiment": 0.0,
  "category_confidence": {"general": 0.0, "fraud": 0.0, "security": 0.0, "compliance": 0.0, "financial": 0.0},
  "summary": "incident summary as an advocate would present it",
  "legal_sections": [{"section": "Act/Code and section", "description": "why it applies", "citation": ""}],
  "sanction_recommendations": [{"code": "charge code", "name": "offence name", "description": "why this charge applies", "confidence": 0.0}],
  "filing_viability": {"viable": false, "rationale": "", "missing_evidence": [""], "recommended_actions": [""]},
  "filing_authorities": [{"authority_type": "Police Station | Cyber Crime Cell | Magistrate Court | Other", "name": "", "address": "", "phone_numbers": [""], "online_portal": "", "jurisdiction": "", "how_to_file": "", "notes": ""}],
  "next_steps": ["action"],
  "evidence_priority": [{"item": "", "rationale": "", "priority": "high|medium|low"}],
  "timeline_estimate": "investigation, filing and first hearing with rough durations"
}"#;

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() { "Not specified" } else { value }
}

/// Build the user prompt for a case analysis
pub fn build_analysis_prompt(request: &AnalysisRequest) -> String {
    let hints = &request.hints;
    let language = if request.language.is_empty() {
        "English"
    } else {
        request.language.as_str()
    };

    let mut case_text = format!(
        "Title: {}\nDescription: {}\nCountry/Jurisdiction: {}\nState/Region: {}\nCity: {}\nPIN/Postal Code: {}",
        request.title,
        request.description,
        or_unspecified(&hints.country),
        or_unspecified(&hints.state),
        or_unspecified(&hints.city),
        or_unspecified(&hints.pincode),
    );
    if !request.accused_name.is_empty() {
        case_text.push_str(&format!("\nAccused: {}", request.accused_name));
    }

    let files_context = if request.files_summary.is_empty() {
        "No files attached".to_string()
    } else {
        request.files_summary.join("\n")
    };

    let mut authority_guidance = String::from(
        "For the specified location, list where the case can be filed with official portals and helplines.",
    );
    if hints.is_india() {
        authority_guidance.push_str(
            " Include the local police station, the State Cyber Crime Cell with the national portal https://cybercrime.gov.in, the emergency helpline 112 and the financial cyber fraud helpline 1930.",
        );
    }

    format!(
        r#"Analyze the following case. Write every free-text value in {language}.

## Requirements
1. 5-7 keywords relevant to the legal case
2. sentiment in [-1.0, 1.0] reflecting severity
3. category_confidence for general, fraud, security, compliance, financial, each in [0, 1]
4. a 2-3 sentence summary
5. legal_sections applicable in the given country
6. sanction_recommendations with confidence in [0, 1]
7. filing_viability: whether the evidence is sufficient to file now, the missing evidence and recommended actions
8. filing_authorities: {authority_guidance}
9. 5-10 ordered next_steps
10. evidence_priority items ranked high, medium or low
11. a concise timeline_estimate

## Case Details
{case_text}

## Files Provided
{files_context}

## Output Schema
{ANALYSIS_SCHEMA}"#
    )
}
