//! Repository for chat sessions, messages and attachments

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::DbError;
use super::models::{ChatAttachmentRow, ChatMessageRow, ChatSessionRow};
use crate::model::{ChatAttachment, ChatMessage, ChatSession, NewAttachment};

/// Chat persistence used by the chat service
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_session(&self, user_id: i64) -> Result<ChatSession, DbError>;
    async fn get_session(&self, id: i64) -> Result<ChatSession, DbError>;
    async fn list_sessions(&self, user_id: i64) -> Result<Vec<ChatSession>, DbError>;
    async fn touch_session(&self, id: i64) -> Result<(), DbError>;
    async fn append_message(
        &self,
        session_id: i64,
        is_user: bool,
        content: &str,
        attachments: &[NewAttachment],
    ) -> Result<ChatMessage, DbError>;
    async fn list_messages(&self, session_id: i64) -> Result<Vec<ChatMessage>, DbError>;
}

#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for ChatRepository {
    async fn create_session(&self, user_id: i64) -> Result<ChatSession, DbError> {
        let row: ChatSessionRow =
            sqlx::query_as("INSERT INTO chat_sessions (user_id) VALUES ($1) RETURNING *")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.into())
    }

    async fn get_session(&self, id: i64) -> Result<ChatSession, DbError> {
        let row: ChatSessionRow = sqlx::query_as("SELECT * FROM chat_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("chat session {}", id)))?;

        Ok(row.into())
    }

    /// Sessions of a user, most recently updated first
    async fn list_sessions(&self, user_id: i64) -> Result<Vec<ChatSession>, DbError> {
        let rows: Vec<ChatSessionRow> = sqlx::query_as(
            "SELECT * FROM chat_sessions WHERE user_id = $1 ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn touch_session(&self, id: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE chat_sessions SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append a message and its attachments in one transaction
    async fn append_message(
        &self,
        session_id: i64,
        is_user: bool,
        content: &str,
        attachments: &[NewAttachment],
    ) -> Result<ChatMessage, DbError> {
        let mut tx = self.pool.begin().await?;

        let message: ChatMessageRow = sqlx::query_as(
            r#"
            INSERT INTO chat_messages (session_id, is_user, content, created_at)
            VALUES ($1, $2, $3, clock_timestamp())
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(is_user)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let row: ChatAttachmentRow = sqlx::query_as(
                r#"
                INSERT INTO chat_attachments (message_id, attachment_type, file_path, file_name, text_content)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(message.id)
            .bind(attachment.attachment_type.as_str())
            .bind(&attachment.file_path)
            .bind(&attachment.file_name)
            .bind(&attachment.text_content)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row.into_domain());
        }

        tx.commit().await?;

        tracing::debug!(
            session_id,
            message_id = message.id,
            attachments = stored.len(),
            "Appended chat message"
        );
        Ok(message.into_domain(stored))
    }

    /// Messages of a session in creation order, with attachments
    async fn list_messages(&self, session_id: i64) -> Result<Vec<ChatMessage>, DbError> {
        let rows: Vec<ChatMessageRow> = sqlx::query_as(
            "SELECT * FROM chat_messages WHERE session_id = $1 ORDER BY created_at, id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let attachment_rows: Vec<ChatAttachmentRow> = sqlx::query_as(
            r#"
            SELECT a.* FROM chat_attachments a
            JOIN chat_messages m ON m.id = a.message_id
            WHERE m.session_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_message: HashMap<i64, Vec<ChatAttachment>> = HashMap::new();
        for row in attachment_rows {
            by_message
                .entry(row.message_id)
                .or_default()
                .push(row.into_domain());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let attachments = by_message.remove(&row.id).unwrap_or_default();
                row.into_domain(attachments)
            })
            .collect())
    }
}
