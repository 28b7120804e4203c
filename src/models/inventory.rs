use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::Visibility;
use super::tag::Tag;

/// A display item on the character sheet: regular inventory or a
/// locked/unlocked achievement.
///
/// Items are manually ordered within their type; reordering writes all
/// positions in one transaction so a failure never leaves a partially
/// reordered list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    /// Short machine-ish name, e.g. `rusty_sword`.
    pub item_name: String,
    /// Display title shown in the popup.
    pub title: String,
    pub item_type: ItemType,
    pub visibility: Visibility,
    /// Icon reference (asset name or emoji).
    pub icon: String,
    /// Free-text popup content.
    pub popup_content: Option<String>,
    /// Manual sort position, unique per `item_type`.
    pub position: i64,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Inventory,
    Achievement,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Achievement => "achievement",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inventory" => Some(Self::Inventory),
            "achievement" => Some(Self::Achievement),
            _ => None,
        }
    }
}

/// Input for creating a new inventory item. Appended after the current
/// last position of its type when `position` is not given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemInput {
    pub item_name: String,
    pub title: String,
    pub item_type: ItemType,
    pub visibility: Option<Visibility>,
    pub icon: String,
    pub popup_content: Option<String>,
    pub position: Option<i64>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for updating an existing item. All fields optional; omitting
/// `popup_content` keeps the stored value rather than clearing it.
/// `tag_ids` follows replace-all semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemInput {
    pub item_name: Option<String>,
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub icon: Option<String>,
    pub popup_content: Option<String>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for the batch reorder call: item ids in their new display
/// order for one item type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderItemsInput {
    pub item_type: ItemType,
    pub item_ids: Vec<Uuid>,
}

/// Equality filters for listing inventory items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    pub item_type: Option<ItemType>,
    pub visibility: Option<Visibility>,
}
