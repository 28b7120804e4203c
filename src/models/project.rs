use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tag::Tag;

/// Who can see an entity on the public surface.
///
/// Visibility is a convention applied by callers passing an explicit
/// filter on reads; the store itself does not enforce it as a security
/// boundary. Mutation is guarded separately by the session middleware.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// A top-level container for quests, pages and issues.
///
/// Projects may nest via `parent_id`, forming a tree. Each project gets
/// a unique URL-safe slug derived from its title; collisions are
/// resolved with `-1`, `-2`… suffixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Unique URL-safe identifier derived from the title.
    pub slug: String,
    pub status: ProjectStatus,
    pub visibility: Visibility,
    /// Parent project for nesting. `None` for root projects.
    pub parent_id: Option<Uuid>,
    /// External link (repository, live site, …).
    pub link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The lifecycle status of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Active,
    Completed,
    OnHold,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(Self::Planning),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "on_hold" => Some(Self::OnHold),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Input for creating a new project. The slug is derived from the title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub visibility: Option<Visibility>,
    pub parent_id: Option<Uuid>,
    pub link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Tags to attach. `None` means no tags.
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for updating an existing project. All fields are optional for
/// partial updates. Omitting a nullable field (`description`, `link`,
/// dates, `parent_id`) keeps its stored value; updates cannot clear
/// these fields back to null.
///
/// `tag_ids` follows replace-all semantics: `None` leaves the existing
/// tag links unchanged, `Some(v)` replaces them with exactly `v`
/// (`Some(vec![])` clears all tags).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub visibility: Option<Visibility>,
    pub parent_id: Option<Uuid>,
    pub link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Equality filters for listing projects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub visibility: Option<Visibility>,
    pub parent_id: Option<Uuid>,
}
