use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message from the public contact form. Independent of the content
/// graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub category: MessageCategory,
    pub subject: Option<String>,
    pub message: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    General,
    Feedback,
    BugReport,
    Collaboration,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Feedback => "feedback",
            Self::BugReport => "bug_report",
            Self::Collaboration => "collaboration",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Self::General),
            "feedback" => Some(Self::Feedback),
            "bug_report" => Some(Self::BugReport),
            "collaboration" => Some(Self::Collaboration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Unread,
    Read,
    Replied,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Replied => "replied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unread" => Some(Self::Unread),
            "read" => Some(Self::Read),
            "replied" => Some(Self::Replied),
            _ => None,
        }
    }
}

/// Input for submitting a contact message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageInput {
    pub email: String,
    pub name: String,
    pub category: MessageCategory,
    pub subject: Option<String>,
    pub message: String,
}

/// Input for moving a message through unread/read/replied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMessageInput {
    pub status: MessageStatus,
}

/// Equality filters for listing contact messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageFilter {
    pub status: Option<MessageStatus>,
    pub category: Option<MessageCategory>,
}
