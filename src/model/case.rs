use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::analysis::CaseAnalysis;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

/// Explicit status actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Approve,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action:?} a case in status {from}")]
pub struct InvalidTransition {
    pub from: CaseStatus,
    pub action: StatusAction,
}

impl CaseStatus {
    /// Apply a status action.
    ///
    /// Approving only moves OPEN cases forward and is a no-op otherwise.
    /// Nothing leaves CLOSED.
    pub fn apply(self, action: StatusAction) -> Result<CaseStatus, InvalidTransition> {
        match (self, action) {
            (CaseStatus::Open, StatusAction::Approve) => Ok(CaseStatus::InProgress),
            (status, StatusAction::Approve) => Ok(status),
            (CaseStatus::Closed, StatusAction::Close) => Err(InvalidTransition {
                from: self,
                action,
            }),
            (_, StatusAction::Close) => Ok(CaseStatus::Closed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::InProgress => "in_progress",
            CaseStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CaseStatus::Open),
            "in_progress" => Ok(CaseStatus::InProgress),
            "closed" => Ok(CaseStatus::Closed),
            other => Err(format!("unknown case status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseCategory {
    #[default]
    General,
    Fraud,
    Security,
    Compliance,
    Financial,
    Cybercrime,
    IdentityTheft,
    IntellectualProperty,
    Corruption,
    MoneyLaundering,
    DataBreach,
    Regulatory,
}

impl CaseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::General => "general",
            CaseCategory::Fraud => "fraud",
            CaseCategory::Security => "security",
            CaseCategory::Compliance => "compliance",
            CaseCategory::Financial => "financial",
            CaseCategory::Cybercrime => "cybercrime",
            CaseCategory::IdentityTheft => "identity_theft",
            CaseCategory::IntellectualProperty => "intellectual_property",
            CaseCategory::Corruption => "corruption",
            CaseCategory::MoneyLaundering => "money_laundering",
            CaseCategory::DataBreach => "data_breach",
            CaseCategory::Regulatory => "regulatory",
        }
    }
}

impl FromStr for CaseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown case category '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CasePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl CasePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePriority::Low => "low",
            CasePriority::Medium => "medium",
            CasePriority::High => "high",
            CasePriority::Critical => "critical",
        }
    }
}

impl FromStr for CasePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(CasePriority::Low),
            "medium" => Ok(CasePriority::Medium),
            "high" => Ok(CasePriority::High),
            "critical" => Ok(CasePriority::Critical),
            other => Err(format!("unknown case priority '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseSeverity {
    Minor,
    #[default]
    Moderate,
    Major,
    Severe,
}

impl CaseSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseSeverity::Minor => "minor",
            CaseSeverity::Moderate => "moderate",
            CaseSeverity::Major => "major",
            CaseSeverity::Severe => "severe",
        }
    }
}

impl FromStr for CaseSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor" => Ok(CaseSeverity::Minor),
            "moderate" => Ok(CaseSeverity::Moderate),
            "major" => Ok(CaseSeverity::Major),
            "severe" => Ok(CaseSeverity::Severe),
            other => Err(format!("unknown case severity '{}'", other)),
        }
    }
}

/// Police intake details captured alongside the case.
///
/// Every field is optional; sub-documents are kept as free-form JSON because
/// their shape varies by case type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseIntake {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub victim_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub suspect_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub stolen_items: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub evidence_collected: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub witnesses_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub medical_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub apprehension_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub follow_up_actions: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fir_number: Option<String>,
    /// Theft, Assault, Cyber Crime, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_occurrence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub police_station_jurisdiction: Option<String>,
    /// "lat,long"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_coordinates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub complainant_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub victim_details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub accused_details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motive: Option<String>,
    /// cctv, photos, videos, audio, documents, forensic_reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub evidence_catalog: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub officer_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub seized_items: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks_notes: Option<String>,
}

impl CaseIntake {
    /// Overlay fields present in `other` onto `self`
    pub fn merge(&mut self, other: CaseIntake) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            victim_info,
            suspect_info,
            incident_sequence,
            stolen_items,
            evidence_collected,
            witnesses_info,
            medical_info,
            apprehension_info,
            follow_up_actions,
            fir_number,
            case_type,
            reporting_datetime,
            place_occurrence,
            area_street,
            city_district,
            police_station_jurisdiction,
            gps_coordinates,
            complainant_info,
            victim_details,
            accused_details,
            motive,
            evidence_catalog,
            officer_info,
            seized_items,
            remarks_notes,
        );
    }
}

/// Investigation case record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Case {
    pub id: i64,
    /// Public reference, e.g. CASE-1A2B3C4D
    pub case_id: String,
    pub title: String,
    pub description: String,
    pub category: CaseCategory,
    pub status: CaseStatus,
    pub priority: CasePriority,
    pub severity: CaseSeverity,
    pub incident_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub location: String,
    pub involved_parties: String,
    pub estimated_value: Option<f64>,
    pub confidential: bool,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub intake: CaseIntake,
    pub created_by: i64,
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Latest analysis; all defaults until the first analysis run
    pub analysis: CaseAnalysis,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl Case {
    pub fn is_visible_to(&self, user_id: i64, is_admin: bool) -> bool {
        is_admin || self.created_by == user_id
    }
}

/// Generate a public case reference
pub fn generate_case_reference() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("CASE-{}", hex[..8].to_uppercase())
}

/// Fields accepted when creating a case
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewCase {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: CaseCategory,
    #[serde(default)]
    pub priority: CasePriority,
    #[serde(default)]
    pub severity: CaseSeverity,
    pub incident_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub involved_parties: String,
    pub estimated_value: Option<f64>,
    #[serde(default)]
    pub confidential: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub assigned_to: Option<i64>,
    #[serde(flatten)]
    pub intake: CaseIntake,
}

/// Partial update of descriptive fields; status is changed only through actions
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CaseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<CaseCategory>,
    pub priority: Option<CasePriority>,
    pub severity: Option<CaseSeverity>,
    pub incident_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub location: Option<String>,
    pub involved_parties: Option<String>,
    pub estimated_value: Option<f64>,
    pub confidential: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<i64>,
    #[serde(flatten)]
    pub intake: CaseIntake,
}

impl CaseUpdate {
    /// Apply the update onto an existing case
    pub fn apply_to(self, case: &mut Case) {
        if let Some(title) = self.title {
            case.title = title;
        }
        if let Some(description) = self.description {
            case.description = description;
        }
        if let Some(category) = self.category {
            case.category = category;
        }
        if let Some(priority) = self.priority {
            case.priority = priority;
        }
        if let Some(severity) = self.severity {
            case.severity = severity;
        }
        if self.incident_date.is_some() {
            case.incident_date = self.incident_date;
        }
        if self.deadline.is_some() {
            case.deadline = self.deadline;
        }
        if let Some(location) = self.location {
            case.location = location;
        }
        if let Some(parties) = self.involved_parties {
            case.involved_parties = parties;
        }
        if self.estimated_value.is_some() {
            case.estimated_value = self.estimated_value;
        }
        if let Some(confidential) = self.confidential {
            case.confidential = confidential;
        }
        if let Some(tags) = self.tags {
            case.tags = tags;
        }
        if self.assigned_to.is_some() {
            case.assigned_to = self.assigned_to;
        }
        case.intake.merge(self.intake);
    }
}

/// File attached to a case
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseDocument {
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

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaseComment {
    pub id: i64,
    pub case_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Secondary analysis record kept one-per-case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisRecord {
    pub case_id: i64,
    pub keywords: Vec<String>,
    pub sentiment: Option<f64>,
    pub category_confidence: super::analysis::CategoryConfidence,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Case with its documents and comments
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: Case,
    pub documents: Vec<CaseDocument>,
    pub comments: Vec<CaseComment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_moves_open_forward() {
        assert_eq!(
            CaseStatus::Open.apply(StatusAction::Approve),
            Ok(CaseStatus::InProgress)
        );
        assert_eq!(
            CaseStatus::InProgress.apply(StatusAction::Approve),
            Ok(CaseStatus::InProgress)
        );
        assert_eq!(
            CaseStatus::Closed.apply(StatusAction::Approve),
            Ok(CaseStatus::Closed)
        );
    }

    #[test]
    fn test_close_is_terminal() {
        assert_eq!(
            CaseStatus::Open.apply(StatusAction::Close),
            Ok(CaseStatus::Closed)
        );
        assert_eq!(
            CaseStatus::InProgress.apply(StatusAction::Close),
            Ok(CaseStatus::Closed)
        );
        assert!(CaseStatus::Closed.apply(StatusAction::Close).is_err());
    }

    #[test]
    fn test_enum_round_trip_through_strings() {
        for status in [CaseStatus::Open, CaseStatus::InProgress, CaseStatus::Closed] {
            assert_eq!(status.as_str().parse::<CaseStatus>().unwrap(), status);
        }
        assert_eq!(
            "money_laundering".parse::<CaseCategory>().unwrap(),
            CaseCategory::MoneyLaundering
        );
        assert_eq!(CaseCategory::IdentityTheft.as_str(), "identity_theft");
        assert!("unknown".parse::<CasePriority>().is_err());
    }

    #[test]
    fn test_case_reference_format() {
        let reference = generate_case_reference();
        assert!(reference.starts_with("CASE-"));
        assert_eq!(reference.len(), 13);
        assert!(reference[5..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_intake_merge_only_overwrites_present_fields() {
        let mut intake = CaseIntake {
            fir_number: Some("FIR-1".to_string()),
            motive: Some("theft".to_string()),
            ..Default::default()
        };
        intake.merge(CaseIntake {
            motive: Some("revenge".to_string()),
            gps_coordinates: Some("18.52,73.85".to_string()),
            ..Default::default()
        });
        assert_eq!(intake.fir_number.as_deref(), Some("FIR-1"));
        assert_eq!(intake.motive.as_deref(), Some("revenge"));
        assert_eq!(intake.gps_coordinates.as_deref(), Some("18.52,73.85"));
    }

    #[test]
    fn test_new_case_accepts_flattened_intake() {
        let body = serde_json::json!({
            "title": "Phone snatched",
            "description": "Two men on a bike",
            "fir_number": "FIR/2024/17",
            "victim_info": {"name": "A"}
        });
        let new_case: NewCase = serde_json::from_value(body).unwrap();
        assert_eq!(new_case.category, CaseCategory::General);
        assert_eq!(new_case.priority, CasePriority::Medium);
        assert_eq!(new_case.intake.fir_number.as_deref(), Some("FIR/2024/17"));
        assert_eq!(new_case.intake.victim_info.unwrap()["name"], "A");
    }
}
