use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::link::PageConnection;
use super::project::{ProjectStatus, Visibility};
use super::tag::Tag;

/// A content document: blog post, devlog entry, notes or project doc.
///
/// Pages connect to zero or more projects/quests via [`PageConnection`].
/// Devlogs conventionally have at most one connection; this is not
/// enforced, and the devlog view uses the first connection by creation
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub page_type: PageType,
    pub content: String,
    pub visibility: Visibility,
    /// Project-doc pages carry their own status/date fields.
    pub project_status: Option<ProjectStatus>,
    pub project_start_date: Option<NaiveDate>,
    pub project_end_date: Option<NaiveDate>,
    pub tags: Vec<Tag>,
    pub connections: Vec<PageConnection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Blog,
    Devlog,
    Notes,
    ProjectDoc,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Devlog => "devlog",
            Self::Notes => "notes",
            Self::ProjectDoc => "project_doc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "blog" => Some(Self::Blog),
            "devlog" => Some(Self::Devlog),
            "notes" => Some(Self::Notes),
            "project_doc" => Some(Self::ProjectDoc),
            _ => None,
        }
    }
}

/// Input for creating a new page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePageInput {
    pub title: String,
    pub page_type: PageType,
    pub content: String,
    pub visibility: Option<Visibility>,
    pub project_status: Option<ProjectStatus>,
    pub project_start_date: Option<NaiveDate>,
    pub project_end_date: Option<NaiveDate>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for updating an existing page. All fields are optional for
/// partial updates; omitting a nullable field (`project_status`, the
/// project dates) keeps its stored value rather than clearing it.
/// `tag_ids` follows replace-all semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePageInput {
    pub title: Option<String>,
    pub page_type: Option<PageType>,
    pub content: Option<String>,
    pub visibility: Option<Visibility>,
    pub project_status: Option<ProjectStatus>,
    pub project_start_date: Option<NaiveDate>,
    pub project_end_date: Option<NaiveDate>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Equality filters for listing pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageFilter {
    pub page_type: Option<PageType>,
    pub visibility: Option<Visibility>,
}
