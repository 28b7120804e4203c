use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named colored label.
///
/// Tags attach to projects, quests, pages and inventory items via join
/// tables. Names are unique; writes with a given tag-id set use
/// replace-all semantics at the owning entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    /// Hex color string, e.g. `#c0ffee`.
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagInput {
    pub name: String,
    pub color: String,
}

/// Input for updating an existing tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTagInput {
    pub name: Option<String>,
    pub color: Option<String>,
}
