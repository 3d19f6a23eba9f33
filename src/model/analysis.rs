//! Structured legal analysis attached to a case
//!
//! `CaseAnalysis` is the normalized schema every analysis source (AI response or
//! local fallback) is coerced into. `AnalysisPayload` is what callers receive:
//! either a normalized analysis or the unstructured text that could not be parsed.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Location hints supplied alongside an analysis request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocationHints {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub pincode: String,
}

impl LocationHints {
    /// Build hints from optional request fields, trimming whitespace
    pub fn from_parts(
        country: Option<&str>,
        state: Option<&str>,
        city: Option<&str>,
        pincode: Option<&str>,
    ) -> Self {
        let clean = |v: Option<&str>| v.unwrap_or_default().trim().to_string();
        Self {
            country: clean(country),
            state: clean(state),
            city: clean(city),
            pincode: clean(pincode),
        }
    }

    pub fn is_india(&self) -> bool {
        self.country.trim().eq_ignore_ascii_case("india")
    }
}

/// Why the fallback generator was used instead of the AI backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// AI integration disabled for this deployment
    NoBackend,
    /// Provider reported a rate limit or exhausted quota
    RateLimited,
    /// Any other provider or network failure
    AiError,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::NoBackend => "no_backend",
            FallbackReason::RateLimited => "rate_limited",
            FallbackReason::AiError => "ai_error",
        }
    }
}

/// Confidence per fixed case category, each in [0.0, 1.0]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryConfidence {
    pub general: f64,
    pub fraud: f64,
    pub security: f64,
    pub compliance: f64,
    pub financial: f64,
}

impl CategoryConfidence {
    /// Category names scored by every analysis
    pub const CATEGORIES: [&'static str; 5] =
        ["general", "fraud", "security", "compliance", "financial"];

    pub fn set(&mut self, category: &str, value: f64) {
        match category {
            "general" => self.general = value,
            "fraud" => self.fraud = value,
            "security" => self.security = value,
            "compliance" => self.compliance = value,
            "financial" => self.financial = value,
            _ => {}
        }
    }

    pub fn values(&self) -> [f64; 5] {
        [
            self.general,
            self.fraud,
            self.security,
            self.compliance,
            self.financial,
        ]
    }
}

/// Statute or act that applies to the facts of the case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LegalSection {
    pub section: String,
    pub description: String,
    pub citation: String,
}

/// Charge recommendation with confidence in [0.0, 1.0]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SanctionRecommendation {
    pub code: String,
    pub name: String,
    pub description: String,
    pub confidence: f64,
}

/// Whether the case can be filed now, and what is missing if not
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilingViability {
    pub viable: bool,
    pub rationale: String,
    pub missing_evidence: Vec<String>,
    pub recommended_actions: Vec<String>,
}

/// Body to which a case may be reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilingAuthority {
    pub authority_type: String,
    pub name: String,
    pub address: String,
    pub phone_numbers: Vec<String>,
    pub online_portal: String,
    pub jurisdiction: String,
    pub how_to_file: String,
    pub notes: String,
}

/// Evidence item ranked by importance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EvidencePriority {
    pub item: String,
    pub rationale: String,
    pub priority: String,
}

/// Normalized analysis schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseAnalysis {
    pub country: String,
    pub state: String,
    pub city: String,
    pub pincode: String,
    pub language: String,
    pub keywords: Vec<String>,
    /// Severity-weighted sentiment in [-1.0, 1.0]
    pub sentiment: f64,
    pub category_confidence: CategoryConfidence,
    pub summary: String,
    pub legal_sections: Vec<LegalSection>,
    pub sanction_recommendations: Vec<SanctionRecommendation>,
    pub filing_viability: FilingViability,
    pub filing_authorities: Vec<FilingAuthority>,
    /// Ordered actionable steps, at most 15
    pub next_steps: Vec<String>,
    /// At most 20 ranked items
    pub evidence_priority: Vec<EvidencePriority>,
    /// At most 200 characters
    pub timeline_estimate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

/// Analysis text that could not be turned into the normalized schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UnstructuredAnalysis {
    pub raw: String,
    pub error: String,
}

/// Result of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AnalysisPayload {
    Normalized(Box<CaseAnalysis>),
    Unstructured(UnstructuredAnalysis),
}

impl AnalysisPayload {
    pub fn unstructured(raw: impl Into<String>, error: impl Into<String>) -> Self {
        AnalysisPayload::Unstructured(UnstructuredAnalysis {
            raw: raw.into(),
            error: error.into(),
        })
    }

    pub fn as_normalized(&self) -> Option<&CaseAnalysis> {
        match self {
            AnalysisPayload::Normalized(analysis) => Some(analysis),
            AnalysisPayload::Unstructured(_) => None,
        }
    }
}

/// Input to an analysis run
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub title: String,
    pub accused_name: String,
    pub description: String,
    pub hints: LocationHints,
    pub language: String,
    /// One line per attached file, e.g. "Evidence file: receipt.pdf"
    pub files_summary: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_trim_and_detect_india() {
        let hints = LocationHints::from_parts(Some("  InDiA "), None, Some(" Pune"), None);
        assert_eq!(hints.country, "InDiA");
        assert_eq!(hints.city, "Pune");
        assert_eq!(hints.state, "");
        assert!(hints.is_india());

        let other = LocationHints::from_parts(Some("Indiana"), None, None, None);
        assert!(!other.is_india());
    }

    #[test]
    fn test_unstructured_payload_serializes_flat() {
        let payload = AnalysisPayload::unstructured("not json", "Response was not structured JSON");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["raw"], "not json");
        assert_eq!(value["error"], "Response was not structured JSON");
    }

    #[test]
    fn test_fallback_reason_omitted_when_absent() {
        let payload = AnalysisPayload::Normalized(Box::default());
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("fallback_reason").is_none());
        assert_eq!(value["category_confidence"]["general"], 0.0);
    }
}
