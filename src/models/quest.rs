use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::Visibility;
use super::tag::Tag;

/// A task/work item, optionally owned by a project.
///
/// Quests carry ordered checkable [`SubQuest`] records and can nest one
/// level via `parent_id` (a side quest under a main quest). Content
/// attached to a quest is considered to belong to its owning project
/// transitively, one level deep; see the cascade views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: Uuid,
    pub title: String,
    pub quest_type: QuestType,
    pub status: QuestStatus,
    pub description: Option<String>,
    pub visibility: Visibility,
    /// Owning project, if any.
    pub project_id: Option<Uuid>,
    /// Parent quest for side quests. `None` for top-level quests.
    pub parent_id: Option<Uuid>,
    pub tags: Vec<Tag>,
    pub subquests: Vec<SubQuest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Main,
    Side,
    Future,
}

impl QuestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Side => "side",
            Self::Future => "future",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "main" => Some(Self::Main),
            "side" => Some(Self::Side),
            "future" => Some(Self::Future),
            _ => None,
        }
    }
}

/// The lifecycle status of a quest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Planned,
    Active,
    OnHold,
    Completed,
    Failed,
    Abandoned,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(Self::Planned),
            "active" => Some(Self::Active),
            "on_hold" => Some(Self::OnHold),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }
}

/// An ordered checkable step under a quest.
///
/// Positions are unique per quest and contiguous by convention;
/// reordering rewrites all positions in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQuest {
    pub id: Uuid,
    pub quest_id: Uuid,
    pub title: String,
    pub completed: bool,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestInput {
    pub title: String,
    pub quest_type: QuestType,
    pub status: Option<QuestStatus>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub project_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for updating an existing quest. All fields are optional for
/// partial updates; omitting a nullable field (`description`,
/// `parent_id`) keeps its stored value rather than clearing it.
/// `tag_ids` follows replace-all semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuestInput {
    pub title: Option<String>,
    pub quest_type: Option<QuestType>,
    pub status: Option<QuestStatus>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub project_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for creating a sub-quest. Appended after the current last
/// position when `position` is not given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubQuestInput {
    pub title: String,
    pub position: Option<i64>,
}

/// Input for updating a sub-quest (title edit or completion toggle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSubQuestInput {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Equality filters for listing quests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestFilter {
    pub quest_type: Option<QuestType>,
    pub status: Option<QuestStatus>,
    pub visibility: Option<Visibility>,
    pub project_id: Option<Uuid>,
}
