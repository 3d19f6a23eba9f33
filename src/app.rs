//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::db::admin::{ActivityLogRepository, SettingsRepository};
use crate::db::chat::ChatRepository;
use crate::db::repository::{CaseRepository, CaseStore};
use crate::model::Config;
use crate::service::llm::GeminiFactory;
use crate::service::{
    AnalysisQueue, AnalysisService, CaseAnalyzer, CaseService, ChatService, FileStore,
    SettingsKeySource, SettingsService,
};

/// Application state containing all services and shared resources
pub struct AppState {
    /// Database connection pool
    pub db_pool: PgPool,
    /// Analysis backend selection, shared by cases, chat and the public endpoint
    pub analysis_service: Arc<AnalysisService>,
    pub case_service: Arc<CaseService>,
    pub chat_service: Arc<ChatService>,
    pub settings_service: Arc<SettingsService>,
    /// Background analysis workers
    pub workers: Vec<JoinHandle<()>>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. Upload directory creation
    /// 3. Analysis queue startup
    /// 4. Service dependency graph construction
    pub async fn new(config: Config) -> Result<Self, AppError> {
        // Initialize PostgreSQL database
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        // Initialize database schema
        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        let upload_dir = config.storage.upload_dir.clone();
        tokio::fs::create_dir_all(&upload_dir)
            .await
            .map_err(|e| AppError::StorageInit(format!("{}: {}", upload_dir.display(), e)))?;
        let files = FileStore::new(upload_dir);

        let case_repository: Arc<dyn CaseStore> = Arc::new(CaseRepository::new(db_pool.clone()));
        let settings_repository = SettingsRepository::new(db_pool.clone());
        let activity_repository = ActivityLogRepository::new(db_pool.clone());

        let analysis_service = Arc::new(AnalysisService::new(
            Arc::new(SettingsKeySource::new(settings_repository.clone())),
            Arc::new(GeminiFactory::new(config.analysis.model.clone())),
            config.analysis.ai_enabled,
        ));
        if !config.analysis.ai_enabled {
            tracing::warn!("AI integration disabled, analysis will use the fallback generator");
        }

        let analyzer = Arc::new(CaseAnalyzer::new(
            Arc::clone(&case_repository),
            Arc::clone(&analysis_service),
        ));
        let (queue, workers) = AnalysisQueue::start(
            analyzer.clone(),
            config.analysis.workers,
            config.analysis.queue_capacity,
        );

        let case_service = Arc::new(CaseService::new(
            case_repository,
            Arc::new(activity_repository.clone()),
            analyzer,
            queue,
            files.clone(),
        ));

        let chat_service = Arc::new(ChatService::new(
            Arc::new(ChatRepository::new(db_pool.clone())),
            Arc::clone(&analysis_service),
            files,
        ));

        let settings_service = Arc::new(SettingsService::new(
            settings_repository,
            activity_repository,
        ));

        Ok(Self {
            db_pool,
            analysis_service,
            case_service,
            chat_service,
            settings_service,
            workers,
        })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Upload directory could not be created
    #[error("Storage initialization failed: {0}")]
    StorageInit(String),
}
