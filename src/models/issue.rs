use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::link::AttachTarget;

/// A bug or improvement record attached to exactly one project or quest.
///
/// Bugs must carry a severity; improvements never do. Both invariants
/// are validated at create and update time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub target: AttachTarget,
    pub issue_type: IssueType,
    /// Required iff `issue_type` is `Bug`.
    pub severity: Option<Severity>,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Improvement,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Improvement => "improvement",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bug" => Some(Self::Bug),
            "improvement" => Some(Self::Improvement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "major" => Some(Self::Major),
            "minor" => Some(Self::Minor),
            _ => None,
        }
    }
}

/// The workflow status of an issue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Blocked,
    Done,
    Postponed,
    Cancelled,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
            Self::Postponed => "postponed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "blocked" => Some(Self::Blocked),
            "done" => Some(Self::Done),
            "postponed" => Some(Self::Postponed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Display sort rank used inside devlog section buckets.
    pub fn priority(&self) -> u8 {
        match self {
            Self::InProgress => 1,
            Self::Blocked => 2,
            Self::Postponed => 3,
            Self::Open => 4,
            Self::Done => 5,
            Self::Cancelled => 6,
        }
    }

    /// Done and cancelled issues are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

/// Input for creating a new issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssueInput {
    pub target: AttachTarget,
    pub issue_type: IssueType,
    pub severity: Option<Severity>,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
}

/// Input for updating an existing issue. All fields are optional for
/// partial updates; omitting `description` or `severity` keeps the
/// stored value rather than clearing it. Changing `issue_type` to
/// improvement drops any stored severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateIssueInput {
    pub issue_type: Option<IssueType>,
    pub severity: Option<Severity>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
}

/// Equality filters for listing issues.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFilter {
    pub issue_type: Option<IssueType>,
    pub status: Option<IssueStatus>,
    pub severity: Option<Severity>,
}
