//! Chat pipeline: one AI reply per user message, with linear history

use std::sync::Arc;

use crate::db::DbError;
use crate::db::chat::ChatStore;
use crate::model::{
    AttachmentType, Caller, ChatExchange, ChatMessage, ChatSession, ChatSessionDetail,
    NewAttachment,
};
use crate::service::analysis::parse::strip_code_fences;
use crate::service::analysis::{AnalysisError, AnalysisService};
use crate::service::storage::{FileKind, FileStore, FileStoreError};

const CHAT_PREAMBLE: &str = "You are an AI assistant for a Case Analysis System specialized in legal case analysis and evidence review. Help the user with their query, paying special attention to any evidence or case information provided.";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Database error: {0}")]
    DbError(#[from] DbError),

    #[error("Chat session not found: {0}")]
    SessionNotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("AI integration is disabled")]
    AiDisabled,

    #[error("AI service failed to respond")]
    AiFailed,

    #[error("File upload failed: {0}")]
    Storage(#[from] FileStoreError),
}

/// Base64-encoded file sent with a chat message
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct ChatFile {
    pub file_name: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
    /// Free-text description of the accused
    pub accused: Option<String>,
    #[serde(default)]
    pub evidence_files: Vec<ChatFile>,
    #[serde(default)]
    pub audio_files: Vec<ChatFile>,
}

/// Build the prompt for the next reply.
///
/// `history` holds the earlier messages of the session, without the message
/// being answered.
pub fn build_chat_prompt(
    history: &[ChatMessage],
    content: &str,
    attachments: &[NewAttachment],
) -> String {
    let context = history
        .iter()
        .map(|m| {
            let author = if m.is_user { "User" } else { "Assistant" };
            format!("{}: {}", author, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let attachments_context = if attachments.is_empty() {
        "None".to_string()
    } else {
        attachments
            .iter()
            .map(NewAttachment::summary_line)
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Previous conversation:
{context}

Attachments provided:
{attachments_context}

User message: {content}

Provide a thorough, helpful response. Analyze any evidence provided, consider the accused information, and give legal or investigative guidance as appropriate for a case analysis system."#
    )
}

pub struct ChatService {
    repository: Arc<dyn ChatStore>,
    analysis: Arc<AnalysisService>,
    files: FileStore,
}

impl ChatService {
    pub fn new(
        repository: Arc<dyn ChatStore>,
        analysis: Arc<AnalysisService>,
        files: FileStore,
    ) -> Self {
        Self {
            repository,
            analysis,
            files,
        }
    }

    /// Sessions are only visible to their owner
    async fn load_session(&self, caller: Caller, id: i64) -> Result<ChatSession, ChatError> {
        let session = self.repository.get_session(id).await.map_err(|e| match e {
            DbError::NotFound(_) => ChatError::SessionNotFound(id),
            other => ChatError::DbError(other),
        })?;

        if session.user_id != caller.user_id {
            return Err(ChatError::SessionNotFound(id));
        }
        Ok(session)
    }

    pub async fn create_session(&self, caller: Caller) -> Result<ChatSession, ChatError> {
        let session = self.repository.create_session(caller.user_id).await?;
        tracing::info!(session_id = session.id, user_id = caller.user_id, "Chat session created");
        Ok(session)
    }

    pub async fn list_sessions(&self, caller: Caller) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.repository.list_sessions(caller.user_id).await?)
    }

    pub async fn get_session(
        &self,
        caller: Caller,
        id: i64,
    ) -> Result<ChatSessionDetail, ChatError> {
        let session = self.load_session(caller, id).await?;
        let messages = self.repository.list_messages(session.id).await?;
        Ok(ChatSessionDetail { session, messages })
    }

    async fn store_attachments(
        &self,
        request: &SendMessageRequest,
    ) -> Result<Vec<NewAttachment>, ChatError> {
        let mut attachments = Vec::new();

        if let Some(accused) = request.accused.as_deref().map(str::trim)
            && !accused.is_empty()
        {
            attachments.push(NewAttachment {
                attachment_type: AttachmentType::Accused,
                file_path: None,
                file_name: None,
                text_content: Some(accused.to_string()),
            });
        }

        let files = request
            .evidence_files
            .iter()
            .map(|f| (AttachmentType::Evidence, f))
            .chain(request.audio_files.iter().map(|f| (AttachmentType::Audio, f)));
        for (attachment_type, file) in files {
            let stored = self
                .files
                .store_base64(FileKind::ChatAttachment, &file.file_name, &file.content_base64)
                .await?;
            attachments.push(NewAttachment {
                attachment_type,
                file_path: Some(stored.relative_path),
                file_name: Some(stored.file_name),
                text_content: None,
            });
        }

        Ok(attachments)
    }

    /// Persist the user message, ask the AI once and persist its reply
    pub async fn send_message(
        &self,
        caller: Caller,
        session_id: i64,
        request: SendMessageRequest,
    ) -> Result<ChatExchange, ChatError> {
        let session = self.load_session(caller, session_id).await?;
        let content = request.content.trim().to_string();
        let attachments = self.store_attachments(&request).await?;
        if content.is_empty() && attachments.is_empty() {
            return Err(ChatError::Validation(
                "Message content or an attachment is required".to_string(),
            ));
        }

        let user_message = self
            .repository
            .append_message(session.id, true, &content, &attachments)
            .await?;

        let generator = self.analysis.generator().await?;
        if !self.analysis.ai_enabled() {
            return Err(ChatError::AiDisabled);
        }

        let history: Vec<ChatMessage> = self
            .repository
            .list_messages(session.id)
            .await?
            .into_iter()
            .filter(|m| m.id != user_message.id)
            .collect();
        let prompt = build_chat_prompt(&history, &content, &attachments);

        let reply = match generator.complete(CHAT_PREAMBLE, &prompt).await {
            Ok(text) => strip_code_fences(&text),
            Err(e) => {
                tracing::error!(session_id = session.id, error = %e, "Chat completion failed");
                return Err(ChatError::AiFailed);
            }
        };

        let ai_message = self
            .repository
            .append_message(session.id, false, &reply, &[])
            .await?;
        self.repository.touch_session(session.id).await?;

        tracing::info!(
            session_id = session.id,
            history_length = history.len(),
            attachments = attachments.len(),
            "Chat reply stored"
        );

        Ok(ChatExchange {
            user_message,
            ai_message,
        })
    }
}
