use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::issue::IssueStatus;

/// The thing an issue or page connection points at.
///
/// The source data kept this as a loose `attached_to_type` +
/// `attached_to_id` column pair; here it is a tagged union so every
/// consumption site matches exhaustively. It still lands in the
/// database as two columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AttachTarget {
    Project(Uuid),
    Quest(Uuid),
}

impl AttachTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Project(_) => "project",
            Self::Quest(_) => "quest",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Project(id) | Self::Quest(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "project" => Some(Self::Project(id)),
            "quest" => Some(Self::Quest(id)),
            _ => None,
        }
    }
}

/// A connection from a page to a project or quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConnection {
    pub id: Uuid,
    pub page_id: Uuid,
    pub target: AttachTarget,
    pub created_at: DateTime<Utc>,
}

/// Per-devlog work record for an issue.
///
/// Captures, for one devlog × issue pair, an optional status change
/// made during that session plus free-text work notes. Purely
/// historical; it does not drive the issue's own workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevlogIssueLink {
    pub id: Uuid,
    /// The devlog page this work record belongs to.
    pub page_id: Uuid,
    pub issue_id: Uuid,
    /// Status the issue was moved to during the devlog session, if any.
    pub status_change: Option<IssueStatus>,
    pub work_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-devlog work record for a sub-quest, mirroring
/// [`DevlogIssueLink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevlogSubquestLink {
    pub id: Uuid,
    pub page_id: Uuid,
    pub subquest_id: Uuid,
    /// Whether the sub-quest was checked off during the session.
    pub completed: Option<bool>,
    pub work_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording devlog work on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDevlogIssueLinkInput {
    pub issue_id: Uuid,
    pub status_change: Option<IssueStatus>,
    pub work_notes: Option<String>,
}

/// Input for recording devlog work on a sub-quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDevlogSubquestLinkInput {
    pub subquest_id: Uuid,
    pub completed: Option<bool>,
    pub work_notes: Option<String>,
}

/// Input for connecting a page to a project or quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePageConnectionInput {
    pub target: AttachTarget,
}
