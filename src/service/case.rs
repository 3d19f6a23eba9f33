//! Case lifecycle: intake, documents, comments, analysis and status actions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::db::DbError;
use crate::db::admin::ActivitySink;
use crate::db::models::{ListCasesQuery, PaginatedCases};
use crate::db::repository::{CaseStore, NewDocument};
use crate::model::{
    AnalysisPayload, AnalysisRecord, AnalysisRequest, Caller, Case, CaseAnalysis, CaseComment,
    CaseDetail, CaseDocument, CaseStatus, CaseUpdate, InvalidTransition, LocationHints,
    NewActivity, NewCase, StatusAction, UnstructuredAnalysis, generate_case_reference,
};
use crate::service::analysis::validation::is_indian_state;
use crate::service::analysis::{AnalysisError, AnalysisService};
use crate::service::queue::{AnalysisJob, AnalysisJobHandler, AnalysisQueue};
use crate::service::storage::{FileKind, FileStore, FileStoreError};

const MAX_TITLE_CHARS: usize = 200;
const MAX_DOCUMENT_DESCRIPTION_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum CaseServiceError {
    #[error("Database error: {0}")]
    DbError(#[from] DbError),

    #[error("Case not found: {0}")]
    NotFound(i64),

    #[error("Admin role required")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("AI response was not structured: {}", .0.error)]
    MalformedAnalysis(UnstructuredAnalysis),

    #[error("File upload failed: {0}")]
    Storage(#[from] FileStoreError),
}

/// Location and language for an explicit analysis run
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
pub struct AnalyzeCaseRequest {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub language: Option<String>,
}

/// Base64 document upload
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct UploadDocumentRequest {
    pub file_name: String,
    pub content_base64: String,
    #[serde(default)]
    pub description: String,
}

/// Runs analysis for a stored case and writes the result back
pub struct CaseAnalyzer {
    repository: Arc<dyn CaseStore>,
    analysis: Arc<AnalysisService>,
}

impl CaseAnalyzer {
    pub fn new(repository: Arc<dyn CaseStore>, analysis: Arc<AnalysisService>) -> Self {
        Self {
            repository,
            analysis,
        }
    }

    async fn build_request(&self, case: &Case, hints: LocationHints) -> AnalysisRequest {
        let files_summary = match self.repository.list_documents(case.id).await {
            Ok(documents) => documents_summary(&documents),
            Err(e) => {
                tracing::warn!(case_id = case.id, error = %e, "Failed to list case documents");
                Vec::new()
            }
        };

        AnalysisRequest {
            title: case.title.clone(),
            accused_name: accused_name(case),
            description: case.description.clone(),
            hints,
            language: String::new(),
            files_summary,
        }
    }

    fn apply_payload(payload: AnalysisPayload) -> Result<CaseAnalysis, CaseServiceError> {
        match payload {
            AnalysisPayload::Normalized(analysis) => Ok(*analysis),
            AnalysisPayload::Unstructured(raw) => Err(CaseServiceError::MalformedAnalysis(raw)),
        }
    }

    /// Explicit run: location and language are validated first
    pub async fn analyze(
        &self,
        case: &Case,
        hints: LocationHints,
        language: Option<&str>,
    ) -> Result<Case, CaseServiceError> {
        let request = self.build_request(case, hints).await;
        let payload = self.analysis.generate_validated(request, language).await?;
        let analysis = Self::apply_payload(payload)?;

        let updated = self.repository.apply_analysis(case.id, &analysis).await?;
        tracing::info!(
            case_id = %updated.case_id,
            fallback_reason = analysis.fallback_reason.map(|r| r.as_str()).unwrap_or("none"),
            "Case analysis applied"
        );
        Ok(updated)
    }
}

#[async_trait]
impl AnalysisJobHandler for CaseAnalyzer {
    async fn handle(&self, job: AnalysisJob) -> Result<(), CaseServiceError> {
        let case = self.repository.get(job.case_id).await?;

        let request = self.build_request(&case, job.hints).await;
        let payload = self.analysis.generate(&request).await?;
        let analysis = Self::apply_payload(payload)?;

        self.repository.apply_analysis(case.id, &analysis).await?;
        Ok(())
    }
}

/// Accused name from the intake details, when recorded as text
fn accused_name(case: &Case) -> String {
    case.intake
        .accused_details
        .as_ref()
        .and_then(|details| details.get("name"))
        .and_then(|name| name.as_str())
        .map(|name| name.trim().to_string())
        .unwrap_or_default()
}

fn documents_summary(documents: &[CaseDocument]) -> Vec<String> {
    documents
        .iter()
        .map(|d| {
            if d.description.is_empty() {
                format!("Document: {}", d.file_name)
            } else {
                format!("Document: {} ({})", d.file_name, d.description)
            }
        })
        .collect()
}

/// Location hints for an explicit run from the request and the previous analysis
fn location_for_rerun(request: &AnalyzeCaseRequest, previous: &CaseAnalysis) -> LocationHints {
    let stored_state = if is_indian_state(&previous.state) {
        previous.state.as_str()
    } else {
        ""
    };
    let pick = |given: &Option<String>, stored: &str| -> String {
        given.clone().unwrap_or_else(|| stored.to_string())
    };

    LocationHints::from_parts(
        Some(pick(&request.country, &previous.country).as_str()),
        Some(pick(&request.state, stored_state).as_str()),
        Some(pick(&request.city, &previous.city).as_str()),
        Some(pick(&request.pincode, &previous.pincode).as_str()),
    )
}

fn validate_title(title: &str) -> Result<(), CaseServiceError> {
    if title.trim().is_empty() {
        return Err(CaseServiceError::Validation("Case title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CaseServiceError::Validation(format!(
            "Case title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(())
}

fn validate_new_case(new_case: &NewCase) -> Result<(), CaseServiceError> {
    validate_title(&new_case.title)?;
    if new_case.description.trim().is_empty() {
        return Err(CaseServiceError::Validation(
            "Case description is required".to_string(),
        ));
    }
    Ok(())
}

pub struct CaseService {
    repository: Arc<dyn CaseStore>,
    activity: Arc<dyn ActivitySink>,
    analyzer: Arc<CaseAnalyzer>,
    queue: AnalysisQueue,
    files: FileStore,
}

impl CaseService {
    pub fn new(
        repository: Arc<dyn CaseStore>,
        activity: Arc<dyn ActivitySink>,
        analyzer: Arc<CaseAnalyzer>,
        queue: AnalysisQueue,
        files: FileStore,
    ) -> Self {
        Self {
            repository,
            activity,
            analyzer,
            queue,
            files,
        }
    }

    /// Load a case the caller may act on; other users' cases are not found
    async fn load(&self, caller: Caller, id: i64) -> Result<Case, CaseServiceError> {
        let case = self.repository.get(id).await.map_err(|e| match e {
            DbError::NotFound(_) => CaseServiceError::NotFound(id),
            other => CaseServiceError::DbError(other),
        })?;

        if !case.is_visible_to(caller.user_id, caller.is_admin) {
            return Err(CaseServiceError::NotFound(id));
        }
        Ok(case)
    }

    async fn record_activity(&self, activity: NewActivity) {
        if let Err(e) = self.activity.record(&activity).await {
            tracing::warn!(action = activity.action, error = %e, "Failed to record activity");
        }
    }

    /// Create a case and queue its background analysis
    pub async fn create(
        &self,
        caller: Caller,
        new_case: NewCase,
        hints: LocationHints,
    ) -> Result<Case, CaseServiceError> {
        validate_new_case(&new_case)?;

        let case = self
            .repository
            .create(&new_case, &generate_case_reference(), caller.user_id)
            .await?;
        tracing::info!(case_id = %case.case_id, user_id = caller.user_id, "Case created");

        let job = AnalysisJob {
            case_id: case.id,
            hints,
        };
        if let Err(e) = self.queue.submit(job) {
            tracing::warn!(case_id = %case.case_id, error = %e, "Background analysis not queued");
        }

        Ok(case)
    }

    /// Own cases, or every case for admins
    pub async fn list(
        &self,
        caller: Caller,
        mut query: ListCasesQuery,
    ) -> Result<PaginatedCases, CaseServiceError> {
        query.owner = if caller.is_admin {
            None
        } else {
            Some(caller.user_id)
        };
        Ok(self.repository.list(query).await?)
    }

    pub async fn get(&self, caller: Caller, id: i64) -> Result<CaseDetail, CaseServiceError> {
        let case = self.load(caller, id).await?;
        let documents = self.repository.list_documents(id).await?;
        let comments = self.repository.list_comments(id).await?;

        Ok(CaseDetail {
            case,
            documents,
            comments,
        })
    }

    pub async fn update(
        &self,
        caller: Caller,
        id: i64,
        update: CaseUpdate,
    ) -> Result<Case, CaseServiceError> {
        let mut case = self.load(caller, id).await?;
        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        if update
            .description
            .as_ref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(CaseServiceError::Validation(
                "Case description is required".to_string(),
            ));
        }

        update.apply_to(&mut case);
        let updated = self.repository.update(&case).await?;
        tracing::info!(case_id = %updated.case_id, "Case updated");
        Ok(updated)
    }

    pub async fn delete(&self, caller: Caller, id: i64) -> Result<(), CaseServiceError> {
        let case = self.load(caller, id).await?;
        if !self.repository.delete(id).await? {
            return Err(CaseServiceError::NotFound(id));
        }

        self.record_activity(NewActivity {
            actor_id: Some(caller.user_id),
            action: "case_deleted",
            target_type: "case",
            target_id: case.id.to_string(),
            meta: serde_json::json!({ "case_id": case.case_id, "title": case.title }),
        })
        .await;

        tracing::info!(case_id = %case.case_id, user_id = caller.user_id, "Case deleted");
        Ok(())
    }

    pub async fn add_document(
        &self,
        caller: Caller,
        id: i64,
        upload: UploadDocumentRequest,
    ) -> Result<CaseDocument, CaseServiceError> {
        let case = self.load(caller, id).await?;
        let description = upload.description.trim().to_string();
        if description.chars().count() > MAX_DOCUMENT_DESCRIPTION_CHARS {
            return Err(CaseServiceError::Validation(format!(
                "Document description must be at most {} characters",
                MAX_DOCUMENT_DESCRIPTION_CHARS
            )));
        }

        let stored = self
            .files
            .store_base64(FileKind::CaseDocument, &upload.file_name, &upload.content_base64)
            .await?;

        let document = self
            .repository
            .add_document(&NewDocument {
                case_id: case.id,
                file_name: stored.file_name,
                file_path: stored.relative_path,
                content_hash: stored.content_hash,
                size_bytes: stored.size_bytes,
                description,
                uploaded_by: caller.user_id,
            })
            .await?;

        tracing::info!(case_id = %case.case_id, document_id = document.id, "Document uploaded");
        Ok(document)
    }

    pub async fn add_comment(
        &self,
        caller: Caller,
        id: i64,
        content: &str,
    ) -> Result<CaseComment, CaseServiceError> {
        let case = self.load(caller, id).await?;
        let content = content.trim();
        if content.is_empty() {
            return Err(CaseServiceError::Validation(
                "Comment content is required".to_string(),
            ));
        }

        Ok(self
            .repository
            .add_comment(case.id, caller.user_id, content)
            .await?)
    }

    /// Run analysis now and apply it to the case.
    ///
    /// Location fields omitted from the request fall back to the values of
    /// the previous analysis; an empty value clears the field. A stored state
    /// that is not an Indian state is not reused.
    pub async fn analyze(
        &self,
        caller: Caller,
        id: i64,
        request: AnalyzeCaseRequest,
    ) -> Result<Case, CaseServiceError> {
        let case = self.load(caller, id).await?;
        let hints = location_for_rerun(&request, &case.analysis);

        self.analyzer
            .analyze(&case, hints, request.language.as_deref())
            .await
    }

    pub async fn analysis_record(
        &self,
        caller: Caller,
        id: i64,
    ) -> Result<Option<AnalysisRecord>, CaseServiceError> {
        let case = self.load(caller, id).await?;
        Ok(self.repository.get_analysis_record(case.id).await?)
    }

    pub async fn close(&self, caller: Caller, id: i64) -> Result<Case, CaseServiceError> {
        let case = self.load(caller, id).await?;
        let status = case.status.apply(StatusAction::Close)?;

        let closed = self
            .repository
            .set_status(case.id, status, Some(Utc::now()))
            .await?;
        tracing::info!(case_id = %closed.case_id, user_id = caller.user_id, "Case closed");
        Ok(closed)
    }

    /// Admin approval moves an open case to in progress
    pub async fn approve(&self, caller: Caller, id: i64) -> Result<Case, CaseServiceError> {
        if !caller.is_admin {
            return Err(CaseServiceError::Forbidden);
        }
        let case = self.load(caller, id).await?;
        let status = case.status.apply(StatusAction::Approve)?;
        if status == case.status {
            return Ok(case);
        }

        let approved = self
            .repository
            .set_status(case.id, status, case.closed_at)
            .await?;

        self.record_activity(NewActivity {
            actor_id: Some(caller.user_id),
            action: "case_approved",
            target_type: "case",
            target_id: approved.id.to_string(),
            meta: serde_json::json!({
                "case_id": approved.case_id,
                "from": CaseStatus::Open.as_str(),
                "to": approved.status.as_str(),
            }),
        })
        .await;

        tracing::info!(case_id = %approved.case_id, "Case approved");
        Ok(approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::model::{ActivityLog, CaseIntake};
    use crate::service::analysis::StaticKey;
    use crate::service::llm::testing::{ScriptedFactory, ScriptedGenerator};
    use serde_json::json;

    fn case_with_intake(intake: CaseIntake) -> Case {
        let now = Utc::now();
        Case {
            id: 1,
            case_id: "CASE-00000001".to_string(),
            title: "Chain snatching".to_string(),
            description: "Near the market".to_string(),
            category: Default::default(),
            status: CaseStatus::Open,
            priority: Default::default(),
            severity: Default::default(),
            incident_date: None,
            deadline: None,
            location: String::new(),
            involved_parties: String::new(),
            estimated_value: None,
            confidential: false,
            tags: Vec::new(),
            intake,
            created_by: 5,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
            analysis: CaseAnalysis::default(),
            analyzed_at: None,
        }
    }

    /// Case store kept in memory
    #[derive(Default)]
    struct MemoryCases {
        cases: Mutex<HashMap<i64, Case>>,
        documents: Mutex<Vec<CaseDocument>>,
        comments: Mutex<Vec<CaseComment>>,
    }

    impl MemoryCases {
        fn insert(&self, case: Case) {
            self.cases.lock().unwrap().insert(case.id, case);
        }

        fn find(&self, id: i64) -> Result<Case, DbError> {
            self.cases
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("case {}", id)))
        }

        fn modify(&self, id: i64, change: impl FnOnce(&mut Case)) -> Result<Case, DbError> {
            let mut cases = self.cases.lock().unwrap();
            let case = cases
                .get_mut(&id)
                .ok_or_else(|| DbError::NotFound(format!("case {}", id)))?;
            change(case);
            case.updated_at = Utc::now();
            Ok(case.clone())
        }
    }

    #[async_trait]
    impl CaseStore for MemoryCases {
        async fn create(
            &self,
            new_case: &NewCase,
            case_ref: &str,
            created_by: i64,
        ) -> Result<Case, DbError> {
            let id = self.cases.lock().unwrap().len() as i64 + 1;
            let mut case = case_with_intake(new_case.intake.clone());
            case.id = id;
            case.case_id = case_ref.to_string();
            case.title = new_case.title.clone();
            case.description = new_case.description.clone();
            case.created_by = created_by;
            self.insert(case.clone());
            Ok(case)
        }

        async fn get(&self, id: i64) -> Result<Case, DbError> {
            self.find(id)
        }

        async fn update(&self, case: &Case) -> Result<Case, DbError> {
            let updated = case.clone();
            self.modify(case.id, |stored| *stored = updated)
        }

        async fn set_status(
            &self,
            id: i64,
            status: CaseStatus,
            closed_at: Option<chrono::DateTime<Utc>>,
        ) -> Result<Case, DbError> {
            self.modify(id, |case| {
                case.status = status;
                case.closed_at = closed_at;
            })
        }

        async fn delete(&self, id: i64) -> Result<bool, DbError> {
            Ok(self.cases.lock().unwrap().remove(&id).is_some())
        }

        async fn list(&self, query: ListCasesQuery) -> Result<PaginatedCases, DbError> {
            let cases: Vec<Case> = self
                .cases
                .lock()
                .unwrap()
                .values()
                .filter(|c| query.owner.is_none_or(|owner| c.created_by == owner))
                .cloned()
                .collect();
            Ok(PaginatedCases {
                total_count: cases.len() as i64,
                cases,
                page: 1,
                page_size: 20,
                total_pages: 1,
            })
        }

        async fn apply_analysis(
            &self,
            id: i64,
            analysis: &CaseAnalysis,
        ) -> Result<Case, DbError> {
            let analysis = analysis.clone();
            self.modify(id, |case| {
                case.analysis = analysis;
                case.analyzed_at = Some(Utc::now());
            })
        }

        async fn get_analysis_record(&self, _id: i64) -> Result<Option<AnalysisRecord>, DbError> {
            Ok(None)
        }

        async fn add_document(&self, document: &NewDocument) -> Result<CaseDocument, DbError> {
            let mut documents = self.documents.lock().unwrap();
            let stored = CaseDocument {
                id: documents.len() as i64 + 1,
                case_id: document.case_id,
                file_name: document.file_name.clone(),
                file_path: document.file_path.clone(),
                content_hash: document.content_hash.clone(),
                size_bytes: document.size_bytes,
                description: document.description.clone(),
                uploaded_by: document.uploaded_by,
                uploaded_at: Utc::now(),
            };
            documents.push(stored.clone());
            Ok(stored)
        }

        async fn list_documents(&self, case_id: i64) -> Result<Vec<CaseDocument>, DbError> {
            Ok(self
                .documents
                .lock()
                .unwrap()
                .iter()
                .filter(|d| d.case_id == case_id)
                .cloned()
                .collect())
        }

        async fn add_comment(
            &self,
            case_id: i64,
            user_id: i64,
            content: &str,
        ) -> Result<CaseComment, DbError> {
            let mut comments = self.comments.lock().unwrap();
            let now = Utc::now();
            let comment = CaseComment {
                id: comments.len() as i64 + 1,
                case_id,
                user_id,
                content: content.to_string(),
                created_at: now,
                updated_at: now,
            };
            comments.push(comment.clone());
            Ok(comment)
        }

        async fn list_comments(&self, case_id: i64) -> Result<Vec<CaseComment>, DbError> {
            Ok(self
                .comments
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.case_id == case_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MemoryActivity {
        entries: Mutex<Vec<NewActivity>>,
    }

    impl MemoryActivity {
        fn actions(&self) -> Vec<&'static str> {
            self.entries.lock().unwrap().iter().map(|a| a.action).collect()
        }
    }

    #[async_trait]
    impl ActivitySink for MemoryActivity {
        async fn record(&self, activity: &NewActivity) -> Result<ActivityLog, DbError> {
            let mut entries = self.entries.lock().unwrap();
            entries.push(activity.clone());
            Ok(ActivityLog {
                id: entries.len() as i64,
                actor_id: activity.actor_id,
                action: activity.action.to_string(),
                target_type: activity.target_type.to_string(),
                target_id: activity.target_id.clone(),
                meta: activity.meta.clone(),
                created_at: Utc::now(),
            })
        }
    }

    const OWNER: Caller = Caller {
        user_id: 5,
        is_admin: false,
    };
    const ADMIN: Caller = Caller {
        user_id: 1,
        is_admin: true,
    };
    const STRANGER: Caller = Caller {
        user_id: 9,
        is_admin: false,
    };

    struct Fixture {
        store: Arc<MemoryCases>,
        activity: Arc<MemoryActivity>,
        service: CaseService,
        _dir: tempfile::TempDir,
    }

    /// Service over in-memory stores with the AI integration disabled
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryCases::default());
        let activity = Arc::new(MemoryActivity::default());
        let analysis = Arc::new(AnalysisService::new(
            Arc::new(StaticKey(None)),
            Arc::new(ScriptedFactory(ScriptedGenerator::replying("{}"))),
            false,
        ));
        let analyzer = Arc::new(CaseAnalyzer::new(store.clone(), analysis));
        let (queue, _workers) = AnalysisQueue::start(analyzer.clone(), 1, 4);
        let service = CaseService::new(
            store.clone(),
            activity.clone(),
            analyzer,
            queue,
            FileStore::new(dir.path()),
        );

        Fixture {
            store,
            activity,
            service,
            _dir: dir,
        }
    }

    fn seeded(status: CaseStatus) -> Case {
        let mut case = case_with_intake(CaseIntake::default());
        case.status = status;
        case
    }

    #[tokio::test]
    async fn test_approve_requires_admin() {
        let f = fixture();
        f.store.insert(seeded(CaseStatus::Open));

        let err = f.service.approve(OWNER, 1).await.unwrap_err();
        assert!(matches!(err, CaseServiceError::Forbidden));
        assert_eq!(f.store.find(1).unwrap().status, CaseStatus::Open);
        assert!(f.activity.actions().is_empty());
    }

    #[tokio::test]
    async fn test_approve_logs_only_real_transitions() {
        let f = fixture();
        f.store.insert(seeded(CaseStatus::Open));

        let approved = f.service.approve(ADMIN, 1).await.unwrap();
        assert_eq!(approved.status, CaseStatus::InProgress);
        assert_eq!(f.activity.actions(), vec!["case_approved"]);

        let again = f.service.approve(ADMIN, 1).await.unwrap();
        assert_eq!(again.status, CaseStatus::InProgress);
        assert_eq!(f.activity.actions().len(), 1);
    }

    #[tokio::test]
    async fn test_approve_leaves_closed_case_alone() {
        let f = fixture();
        f.store.insert(seeded(CaseStatus::Closed));

        let case = f.service.approve(ADMIN, 1).await.unwrap();
        assert_eq!(case.status, CaseStatus::Closed);
        assert!(f.activity.actions().is_empty());
    }

    #[tokio::test]
    async fn test_other_users_case_is_not_found() {
        let f = fixture();
        f.store.insert(seeded(CaseStatus::Open));

        assert!(matches!(
            f.service.get(STRANGER, 1).await,
            Err(CaseServiceError::NotFound(1))
        ));
        assert!(matches!(
            f.service.delete(STRANGER, 1).await,
            Err(CaseServiceError::NotFound(1))
        ));
        assert!(f.service.get(OWNER, 1).await.is_ok());
        assert!(f.service.get(ADMIN, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_close_stamps_time_and_rejects_second_close() {
        let f = fixture();
        f.store.insert(seeded(CaseStatus::InProgress));

        let closed = f.service.close(OWNER, 1).await.unwrap();
        assert_eq!(closed.status, CaseStatus::Closed);
        assert!(closed.closed_at.is_some());

        let err = f.service.close(OWNER, 1).await.unwrap_err();
        assert!(matches!(err, CaseServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_delete_is_recorded() {
        let f = fixture();
        f.store.insert(seeded(CaseStatus::Open));

        f.service.delete(OWNER, 1).await.unwrap();
        assert!(f.store.find(1).is_err());
        assert_eq!(f.activity.actions(), vec!["case_deleted"]);
    }

    #[tokio::test]
    async fn test_create_runs_background_analysis() {
        let f = fixture();
        let new_case = NewCase {
            title: "Pickpocketing".to_string(),
            description: "Wallet taken on a crowded train".to_string(),
            ..Default::default()
        };
        let hints = LocationHints::from_parts(Some("India"), Some("Kerala"), None, None);

        let case = f.service.create(OWNER, new_case, hints).await.unwrap();
        assert!(case.analyzed_at.is_none());

        let analyzed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let stored = f.store.find(case.id).unwrap();
                if stored.analyzed_at.is_some() {
                    return stored;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("background analysis did not run");

        assert_eq!(analyzed.analysis.state, "Kerala");
        assert_eq!(analyzed.analysis.legal_sections.len(), 1);
    }

    #[tokio::test]
    async fn test_rerun_ignores_invalid_stored_state() {
        let f = fixture();
        let mut case = seeded(CaseStatus::Open);
        case.analysis.state = "Ontario".to_string();
        case.analysis.city = "Toronto".to_string();
        f.store.insert(case);

        let analyzed = f
            .service
            .analyze(OWNER, 1, AnalyzeCaseRequest::default())
            .await
            .unwrap();
        assert_eq!(analyzed.analysis.country, "India");
        assert_eq!(analyzed.analysis.state, "");
        assert_eq!(analyzed.analysis.city, "Toronto");
    }

    #[test]
    fn test_rerun_location_falls_back_only_for_omitted_fields() {
        let previous = CaseAnalysis {
            country: "India".to_string(),
            state: "Kerala".to_string(),
            city: "Kochi".to_string(),
            pincode: "682001".to_string(),
            ..Default::default()
        };

        let hints = location_for_rerun(&AnalyzeCaseRequest::default(), &previous);
        assert_eq!(hints.state, "Kerala");
        assert_eq!(hints.pincode, "682001");

        let request = AnalyzeCaseRequest {
            state: Some(String::new()),
            city: Some(" Thrissur ".to_string()),
            ..Default::default()
        };
        let hints = location_for_rerun(&request, &previous);
        assert_eq!(hints.state, "");
        assert_eq!(hints.city, "Thrissur");
        assert_eq!(hints.country, "India");
    }

    #[test]
    fn test_accused_name_from_intake() {
        let case = case_with_intake(CaseIntake {
            accused_details: Some(json!({"name": " Unknown biker ", "age": 25})),
            ..Default::default()
        });
        assert_eq!(accused_name(&case), "Unknown biker");
        assert_eq!(accused_name(&case_with_intake(CaseIntake::default())), "");
    }

    #[test]
    fn test_new_case_validation() {
        let mut new_case = NewCase {
            title: "x".repeat(201),
            description: "d".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_new_case(&new_case),
            Err(CaseServiceError::Validation(_))
        ));

        new_case.title = "Burglary".to_string();
        assert!(validate_new_case(&new_case).is_ok());

        new_case.description = "  ".to_string();
        assert!(validate_new_case(&new_case).is_err());
    }

    #[test]
    fn test_unstructured_payload_is_not_applied() {
        let payload = AnalysisPayload::unstructured("oops", "Response was not structured JSON");
        assert!(matches!(
            CaseAnalyzer::apply_payload(payload),
            Err(CaseServiceError::MalformedAnalysis(_))
        ));
    }

    #[test]
    fn test_documents_summary() {
        let now = Utc::now();
        let document = |name: &str, description: &str| CaseDocument {
            id: 1,
            case_id: 1,
            file_name: name.to_string(),
            file_path: String::new(),
            content_hash: String::new(),
            size_bytes: 1,
            description: description.to_string(),
            uploaded_by: 1,
            uploaded_at: now,
        };
        assert_eq!(
            documents_summary(&[document("fir.pdf", ""), document("cctv.mp4", "shop camera")]),
            vec!["Document: fir.pdf", "Document: cctv.mp4 (shop camera)"]
        );
    }
}
