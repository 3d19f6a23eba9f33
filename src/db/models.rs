//! Database row models and their conversion into domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::model::{
    ActivityLog, AnalysisRecord, AttachmentType, Case, CaseAnalysis, CaseComment, CaseDocument,
    CaseIntake, ChatAttachment, ChatMessage, ChatSession, FallbackReason, IntegrationSetting,
};

/// Decode a JSON column, falling back to the type's default on shape mismatch
fn from_json<T: DeserializeOwned + Default>(value: serde_json::Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// Database representation of a case
#[derive(Debug, Clone, FromRow)]
pub struct CaseRow {
    pub id: i64,
    pub case_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub priority: String,
    pub severity: String,
    pub incident_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub location: String,
    pub involved_parties: String,
    pub estimated_value: Option<f64>,
    pub confidential: bool,
    pub tags: serde_json::Value,
    pub intake: serde_json::Value,
    pub created_by: i64,
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[sqlx(flatten)]
    pub analysis: AnalysisColumns,
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// Allow-listed analysis columns on the cases table
#[derive(Debug, Clone, Default, FromRow)]
pub struct AnalysisColumns {
    pub analysis_country: String,
    pub analysis_state: String,
    pub analysis_city: String,
    pub analysis_pincode: String,
    pub analysis_language: String,
    pub analysis_keywords: serde_json::Value,
    pub analysis_sentiment: Option<f64>,
    pub analysis_category_confidence: serde_json::Value,
    pub analysis_summary: String,
    pub analysis_legal_sections: serde_json::Value,
    pub analysis_sanction_recommendations: serde_json::Value,
    pub analysis_filing_viability: serde_json::Value,
    pub analysis_filing_authorities: serde_json::Value,
    pub analysis_next_steps: serde_json::Value,
    pub analysis_evidence_priority: serde_json::Value,
    pub analysis_timeline_estimate: String,
    pub analysis_fallback_reason: Option<String>,
}

/// Column names written by the analysis applier, in bind order
pub const ANALYSIS_COLUMNS: [&str; 17] = [
    "analysis_country",
    "analysis_state",
    "analysis_city",
    "analysis_pincode",
    "analysis_language",
    "analysis_keywords",
    "analysis_sentiment",
    "analysis_category_confidence",
    "analysis_summary",
    "analysis_legal_sections",
    "analysis_sanction_recommendations",
    "analysis_filing_viability",
    "analysis_filing_authorities",
    "analysis_next_steps",
    "analysis_evidence_priority",
    "analysis_timeline_estimate",
    "analysis_fallback_reason",
];

impl AnalysisColumns {
    pub fn from_analysis(analysis: &CaseAnalysis) -> Self {
        let to_json = |v: serde_json::Result<serde_json::Value>| v.unwrap_or_default();
        Self {
            analysis_country: analysis.country.clone(),
            analysis_state: analysis.state.clone(),
            analysis_city: analysis.city.clone(),
            analysis_pincode: analysis.pincode.clone(),
            analysis_language: analysis.language.clone(),
            analysis_keywords: to_json(serde_json::to_value(&analysis.keywords)),
            analysis_sentiment: Some(analysis.sentiment),
            analysis_category_confidence: to_json(serde_json::to_value(
                &analysis.category_confidence,
            )),
            analysis_summary: analysis.summary.clone(),
            analysis_legal_sections: to_json(serde_json::to_value(&analysis.legal_sections)),
            analysis_sanction_recommendations: to_json(serde_json::to_value(
                &analysis.sanction_recommendations,
            )),
            analysis_filing_viability: to_json(serde_json::to_value(&analysis.filing_viability)),
            analysis_filing_authorities: to_json(serde_json::to_value(
                &analysis.filing_authorities,
            )),
            analysis_next_steps: to_json(serde_json::to_value(&analysis.next_steps)),
            analysis_evidence_priority: to_json(serde_json::to_value(&analysis.evidence_priority)),
            analysis_timeline_estimate: analysis.timeline_estimate.clone(),
            analysis_fallback_reason: analysis.fallback_reason.map(|r| r.as_str().to_string()),
        }
    }

    pub fn into_analysis(self) -> CaseAnalysis {
        CaseAnalysis {
            country: self.analysis_country,
            state: self.analysis_state,
            city: self.analysis_city,
            pincode: self.analysis_pincode,
            language: self.analysis_language,
            keywords: from_json(self.analysis_keywords),
            sentiment: self.analysis_sentiment.unwrap_or(0.0),
            category_confidence: from_json(self.analysis_category_confidence),
            summary: self.analysis_summary,
            legal_sections: from_json(self.analysis_legal_sections),
            sanction_recommendations: from_json(self.analysis_sanction_recommendations),
            filing_viability: from_json(self.analysis_filing_viability),
            filing_authorities: from_json(self.analysis_filing_authorities),
            next_steps: from_json(self.analysis_next_steps),
            evidence_priority: from_json(self.analysis_evidence_priority),
            timeline_estimate: self.analysis_timeline_estimate,
            fallback_reason: self.analysis_fallback_reason.and_then(|r| {
                serde_json::from_value::<FallbackReason>(serde_json::Value::String(r)).ok()
            }),
        }
    }
}

impl CaseRow {
    /// Convert database row to domain model
    pub fn into_domain(self) -> Result<Case, String> {
        Ok(Case {
            id: self.id,
            case_id: self.case_id,
            title: self.title,
            description: self.description,
            category: self.category.parse()?,
            status: self.status.parse()?,
            priority: self.priority.parse()?,
            severity: self.severity.parse()?,
            incident_date: self.incident_date,
            deadline: self.deadline,
            location: self.location,
            involved_parties: self.involved_parties,
            estimated_value: self.estimated_value,
            confidential: self.confidential,
            tags: from_json(self.tags),
            intake: from_json::<CaseIntake>(self.intake),
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            created_at: self.created_at,
            updated_at: self.updated_at,
            closed_at: self.closed_at,
            analysis: self.analysis.into_analysis(),
            analyzed_at: self.analyzed_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRecordRow {
    pub case_id: i64,
    pub keywords: serde_json::Value,
    pub sentiment: Option<f64>,
    pub category_confidence: serde_json::Value,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisRecordRow {
    pub fn into_domain(self) -> AnalysisRecord {
        AnalysisRecord {
            case_id: self.case_id,
            keywords: from_json(self.keywords),
            sentiment: self.sentiment,
            category_confidence: from_json(self.category_confidence),
            summary: self.summary,
            analyzed_at: self.analyzed_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CaseDocumentRow {
    pub id: i64,
    pub case_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub content_hash: String,
    pub size_bytes: i64,
    pub description: String,
    pub uploaded_by: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<CaseDocumentRow> for CaseDocument {
    fn from(row: CaseDocumentRow) -> Self {
        CaseDocument {
            id: row.id,
            case_id: row.case_id,
            file_name: row.file_name,
            file_path: row.file_path,
            content_hash: row.content_hash,
            size_bytes: row.size_bytes,
            description: row.description,
            uploaded_by: row.uploaded_by,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CaseCommentRow {
    pub id: i64,
    pub case_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CaseCommentRow> for CaseComment {
    fn from(row: CaseCommentRow) -> Self {
        CaseComment {
            id: row.id,
            case_id: row.case_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatSessionRow {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatSessionRow> for ChatSession {
    fn from(row: ChatSessionRow) -> Self {
        ChatSession {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatMessageRow {
    pub id: i64,
    pub session_id: i64,
    pub is_user: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessageRow {
    pub fn into_domain(self, attachments: Vec<ChatAttachment>) -> ChatMessage {
        ChatMessage {
            id: self.id,
            session_id: self.session_id,
            is_user: self.is_user,
            content: self.content,
            created_at: self.created_at,
            attachments,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatAttachmentRow {
    pub id: i64,
    pub message_id: i64,
    pub attachment_type: String,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub text_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatAttachmentRow {
    pub fn into_domain(self) -> ChatAttachment {
        ChatAttachment {
            id: self.id,
            message_id: self.message_id,
            attachment_type: self
                .attachment_type
                .parse()
                .unwrap_or(AttachmentType::Other),
            file_path: self.file_path,
            file_name: self.file_name,
            text_content: self.text_content,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct IntegrationSettingRow {
    pub name: String,
    pub value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<IntegrationSettingRow> for IntegrationSetting {
    fn from(row: IntegrationSettingRow) -> Self {
        IntegrationSetting {
            name: row.name,
            value: row.value,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogRow {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLogRow> for ActivityLog {
    fn from(row: ActivityLogRow) -> Self {
        ActivityLog {
            id: row.id,
            actor_id: row.actor_id,
            action: row.action,
            target_type: row.target_type,
            target_id: row.target_id,
            meta: row.meta,
            created_at: row.created_at,
        }
    }
}

/// Query parameters for listing cases
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCasesQuery {
    /// Restrict to cases created by this user (unset for admins)
    pub owner: Option<i64>,
    pub status: Option<String>,
    pub category: Option<String>,
    /// Public case reference, matched case-insensitively
    pub case_ref: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Paginated response for cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedCases {
    pub cases: Vec<Case>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CaseStatus, CategoryConfidence, EvidencePriority, FilingAuthority, FilingViability,
        LegalSection, SanctionRecommendation,
    };
    use serde_json::json;

    fn sample_analysis() -> CaseAnalysis {
        CaseAnalysis {
            country: "India".to_string(),
            state: "Maharashtra".to_string(),
            city: "Mumbai".to_string(),
            pincode: "400001".to_string(),
            language: "Marathi".to_string(),
            keywords: vec!["phishing".to_string(), "bank".to_string()],
            sentiment: -0.75,
            category_confidence: CategoryConfidence {
                general: 0.2,
                fraud: 0.9,
                security: 0.4,
                compliance: 0.0,
                financial: 0.8,
            },
            summary: "Victim lost funds to a phishing link.".to_string(),
            legal_sections: vec![LegalSection {
                section: "IT Act 66D".to_string(),
                description: "Cheating by personation using computer resource".to_string(),
                citation: String::new(),
            }],
            sanction_recommendations: vec![SanctionRecommendation {
                code: "66D".to_string(),
                name: "Cheating by personation".to_string(),
                description: "Impersonated bank staff".to_string(),
                confidence: 0.7,
            }],
            filing_viability: FilingViability {
                viable: true,
                rationale: "Transaction trail is available".to_string(),
                missing_evidence: vec!["bank statement".to_string()],
                recommended_actions: vec!["call 1930".to_string()],
            },
            filing_authorities: vec![FilingAuthority {
                authority_type: "Cyber Crime Cell".to_string(),
                name: "Mumbai Cyber Police".to_string(),
                phone_numbers: vec!["1930".to_string()],
                ..Default::default()
            }],
            next_steps: vec!["Freeze the account".to_string()],
            evidence_priority: vec![EvidencePriority {
                item: "SMS with link".to_string(),
                rationale: "Shows the lure".to_string(),
                priority: "high".to_string(),
            }],
            timeline_estimate: "Complaint within 24 hours".to_string(),
            fallback_reason: Some(FallbackReason::RateLimited),
        }
    }

    fn sample_row(analysis: AnalysisColumns) -> CaseRow {
        let now = Utc::now();
        CaseRow {
            id: 7,
            case_id: "CASE-0A1B2C3D".to_string(),
            title: "Phishing".to_string(),
            description: "Link in SMS".to_string(),
            category: "cybercrime".to_string(),
            status: "in_progress".to_string(),
            priority: "high".to_string(),
            severity: "major".to_string(),
            incident_date: NaiveDate::from_ymd_opt(2024, 3, 9),
            deadline: None,
            location: "Mumbai".to_string(),
            involved_parties: String::new(),
            estimated_value: Some(45000.0),
            confidential: true,
            tags: json!(["upi", "sms"]),
            intake: json!({"fir_number": "FIR/17", "victim_info": {"age": 34}}),
            created_by: 3,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
            analysis,
            analyzed_at: Some(now),
        }
    }

    #[test]
    fn test_applied_analysis_round_trips_through_columns() {
        let analysis = sample_analysis();
        let row = sample_row(AnalysisColumns::from_analysis(&analysis));
        let case = row.into_domain().unwrap();
        assert_eq!(case.analysis, analysis);
    }

    #[test]
    fn test_default_columns_map_to_default_analysis() {
        let columns = AnalysisColumns {
            analysis_keywords: json!([]),
            analysis_category_confidence: json!({}),
            analysis_filing_viability: json!({}),
            ..Default::default()
        };
        let case = sample_row(columns).into_domain().unwrap();
        assert_eq!(case.analysis, CaseAnalysis::default());
    }

    #[test]
    fn test_case_row_into_domain() {
        let case = sample_row(AnalysisColumns::default()).into_domain().unwrap();
        assert_eq!(case.status, CaseStatus::InProgress);
        assert_eq!(case.tags, vec!["upi", "sms"]);
        assert_eq!(case.intake.fir_number.as_deref(), Some("FIR/17"));
        assert_eq!(case.intake.victim_info.unwrap()["age"], 34);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut row = sample_row(AnalysisColumns::default());
        row.status = "archived".to_string();
        assert!(row.into_domain().is_err());
    }

    #[test]
    fn test_analysis_column_list_matches_struct() {
        assert_eq!(ANALYSIS_COLUMNS.len(), 17);
        assert!(ANALYSIS_COLUMNS.iter().all(|c| c.starts_with("analysis_")));
    }
}
