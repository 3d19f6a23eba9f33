use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatSession {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session with its ordered message history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatSessionDetail {
    #[serde(flatten)]
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    Evidence,
    Audio,
    Accused,
    Other,
}

impl AttachmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentType::Evidence => "evidence",
            AttachmentType::Audio => "audio",
            AttachmentType::Accused => "accused",
            AttachmentType::Other => "other",
        }
    }
}

impl FromStr for AttachmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evidence" => Ok(AttachmentType::Evidence),
            "audio" => Ok(AttachmentType::Audio),
            "accused" => Ok(AttachmentType::Accused),
            "other" => Ok(AttachmentType::Other),
            other => Err(format!("unknown attachment type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatAttachment {
    pub id: i64,
    pub message_id: i64,
    pub attachment_type: AttachmentType,
    /// Stored path for file attachments
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    /// Free text for accused info and notes
    pub text_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: i64,
    /// true when authored by the user, false for assistant replies
    pub is_user: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<ChatAttachment>,
}

/// Attachment about to be stored with a new user message
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub attachment_type: AttachmentType,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub text_content: Option<String>,
}

impl NewAttachment {
    /// Line describing the attachment in the chat prompt
    pub fn summary_line(&self) -> String {
        match self.attachment_type {
            AttachmentType::Accused => {
                format!("Accused: {}", self.text_content.as_deref().unwrap_or_default())
            }
            AttachmentType::Evidence => format!(
                "Evidence file: {}",
                self.file_name.as_deref().unwrap_or_default()
            ),
            AttachmentType::Audio => {
                format!("Audio file: {}", self.file_name.as_deref().unwrap_or_default())
            }
            AttachmentType::Other => format!(
                "Attachment: {}",
                self.file_name
                    .as_deref()
                    .or(self.text_content.as_deref())
                    .unwrap_or_default()
            ),
        }
    }
}

/// Both sides of one chat exchange
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatExchange {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let accused = NewAttachment {
            attachment_type: AttachmentType::Accused,
            file_path: None,
            file_name: None,
            text_content: Some("Ravi K".to_string()),
        };
        assert_eq!(accused.summary_line(), "Accused: Ravi K");

        let audio = NewAttachment {
            attachment_type: AttachmentType::Audio,
            file_path: Some("chat_attachments/abc-call.mp3".to_string()),
            file_name: Some("call.mp3".to_string()),
            text_content: None,
        };
        assert_eq!(audio.summary_line(), "Audio file: call.mp3");
    }
}
