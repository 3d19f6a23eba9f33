//! Database module for PostgreSQL persistence

pub mod admin;
pub mod chat;
pub mod models;
pub mod repository;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::env;

// Environment variable names
const ENV_POSTGRES_HOST: &str = "CASE_INTEL_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "CASE_INTEL_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "CASE_INTEL_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "CASE_INTEL_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "CASE_INTEL_POSTGRES_DB";

// Default values
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "case_intel";
const DEFAULT_POSTGRES_PASSWORD: &str = "case_intel";
const DEFAULT_POSTGRES_DB: &str = "case_intel";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS cases (
        id BIGSERIAL PRIMARY KEY,
        case_id VARCHAR(50) NOT NULL UNIQUE,
        title VARCHAR(200) NOT NULL,
        description TEXT NOT NULL,
        category VARCHAR(50) NOT NULL DEFAULT 'general',
        status VARCHAR(20) NOT NULL DEFAULT 'open',
        priority VARCHAR(20) NOT NULL DEFAULT 'medium',
        severity VARCHAR(20) NOT NULL DEFAULT 'moderate',
        incident_date DATE,
        deadline DATE,
        location TEXT NOT NULL DEFAULT '',
        involved_parties TEXT NOT NULL DEFAULT '',
        estimated_value DOUBLE PRECISION,
        confidential BOOLEAN NOT NULL DEFAULT FALSE,
        tags JSONB NOT NULL DEFAULT '[]',
        intake JSONB NOT NULL DEFAULT '{}',
        created_by BIGINT NOT NULL,
        assigned_to BIGINT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        closed_at TIMESTAMPTZ,
        analysis_country TEXT NOT NULL DEFAULT '',
        analysis_state TEXT NOT NULL DEFAULT '',
        analysis_city TEXT NOT NULL DEFAULT '',
        analysis_pincode TEXT NOT NULL DEFAULT '',
        analysis_language TEXT NOT NULL DEFAULT '',
        analysis_keywords JSONB NOT NULL DEFAULT '[]',
        analysis_sentiment DOUBLE PRECISION,
        analysis_category_confidence JSONB NOT NULL DEFAULT '{}',
        analysis_summary TEXT NOT NULL DEFAULT '',
        analysis_legal_sections JSONB NOT NULL DEFAULT '[]',
        analysis_sanction_recommendations JSONB NOT NULL DEFAULT '[]',
        analysis_filing_viability JSONB NOT NULL DEFAULT '{}',
        analysis_filing_authorities JSONB NOT NULL DEFAULT '[]',
        analysis_next_steps JSONB NOT NULL DEFAULT '[]',
        analysis_evidence_priority JSONB NOT NULL DEFAULT '[]',
        analysis_timeline_estimate TEXT NOT NULL DEFAULT '',
        analysis_fallback_reason VARCHAR(20),
        analyzed_at TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_cases_created_by ON cases(created_by)",
    "CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status)",
    "CREATE INDEX IF NOT EXISTS idx_cases_created_at ON cases(created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS case_analyses (
        case_id BIGINT PRIMARY KEY REFERENCES cases(id) ON DELETE CASCADE,
        keywords JSONB NOT NULL DEFAULT '[]',
        sentiment DOUBLE PRECISION,
        category_confidence JSONB NOT NULL DEFAULT '{}',
        summary TEXT NOT NULL DEFAULT '',
        analyzed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS case_documents (
        id BIGSERIAL PRIMARY KEY,
        case_id BIGINT NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
        file_name TEXT NOT NULL,
        file_path TEXT NOT NULL,
        content_hash VARCHAR(64) NOT NULL,
        size_bytes BIGINT NOT NULL,
        description VARCHAR(200) NOT NULL DEFAULT '',
        uploaded_by BIGINT NOT NULL,
        uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_case_documents_case_id ON case_documents(case_id)",
    r#"
    CREATE TABLE IF NOT EXISTS case_comments (
        id BIGSERIAL PRIMARY KEY,
        case_id BIGINT NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
        user_id BIGINT NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_case_comments_case_id ON case_comments(case_id)",
    r#"
    CREATE TABLE IF NOT EXISTS chat_sessions (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_chat_sessions_user_id ON chat_sessions(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        id BIGSERIAL PRIMARY KEY,
        session_id BIGINT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
        is_user BOOLEAN NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_session_id ON chat_messages(session_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS chat_attachments (
        id BIGSERIAL PRIMARY KEY,
        message_id BIGINT NOT NULL REFERENCES chat_messages(id) ON DELETE CASCADE,
        attachment_type VARCHAR(20) NOT NULL,
        file_path TEXT,
        file_name TEXT,
        text_content TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS integration_settings (
        name VARCHAR(100) PRIMARY KEY,
        value TEXT,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS activity_logs (
        id BIGSERIAL PRIMARY KEY,
        actor_id BIGINT,
        action VARCHAR(100) NOT NULL,
        target_type VARCHAR(50) NOT NULL DEFAULT '',
        target_id VARCHAR(50) NOT NULL DEFAULT '',
        meta JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_activity_logs_created_at ON activity_logs(created_at)",
];

/// Initialize database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(statements = SCHEMA.len(), "Database schema initialized");

    Ok(())
}
