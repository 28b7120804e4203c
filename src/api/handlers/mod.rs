use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{middleware::bearer_token, AppState};
use crate::auth::AuthError;
use crate::models::*;
use crate::stats;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
///
/// Validation errors raised by the store (missing targets, reorder
/// payload mismatches, duplicate tag names) are safe to expose and come
/// back as BAD_REQUEST with the original message.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("not found")
        || msg.contains("severity")
        || msg.contains("Reorder")
        || msg.contains("does not belong")
        || msg.contains("is not a")
        || msg.contains("already exists")
    {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Auth
// ============================================================

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match state.sessions.login(&input.password) {
        Ok(token) => Ok(Json(serde_json::json!({ "token": token }))),
        Err(AuthError::InvalidPassword | AuthError::NotConfigured) => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid credentials".to_string(),
        )),
        Err(AuthError::Database(e)) => Err(internal_error(e)),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
    {
        state.sessions.logout(token);
    }
    StatusCode::NO_CONTENT
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Result<Json<Vec<Project>>, (StatusCode, String)> {
    state
        .db
        .get_all_projects(&filter)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

pub async fn get_project_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .db
        .get_project_by_slug(&slug)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

pub async fn list_child_projects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Project>>, (StatusCode, String)> {
    state
        .db
        .get_child_projects(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    state
        .db
        .create_project(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .db
        .update_project(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_project(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Project not found".to_string()))
    }
}

pub async fn get_project_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, (StatusCode, String)> {
    state
        .db
        .get_project_view(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

/// Query parameters for the project tree.
#[derive(Debug, Deserialize)]
pub struct ProjectTreeQuery {
    /// Optional project UUID to root the tree at.
    pub root: Option<Uuid>,
    /// Maximum nesting depth. Defaults to 3.
    pub depth: Option<usize>,
}

pub async fn get_project_tree(
    State(state): State<AppState>,
    Query(query): Query<ProjectTreeQuery>,
) -> Result<Json<Vec<ProjectTreeNode>>, (StatusCode, String)> {
    state
        .db
        .get_project_tree(query.root, query.depth.unwrap_or(3))
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Quests
// ============================================================

pub async fn list_quests(
    State(state): State<AppState>,
    Query(filter): Query<QuestFilter>,
) -> Result<Json<Vec<Quest>>, (StatusCode, String)> {
    state
        .db
        .get_all_quests(&filter)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_quest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Quest>, (StatusCode, String)> {
    state
        .db
        .get_quest(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Quest not found".to_string()))
}

pub async fn list_project_quests(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Quest>>, (StatusCode, String)> {
    state
        .db
        .get_quests_by_project(project_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn list_child_quests(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Quest>>, (StatusCode, String)> {
    state
        .db
        .get_child_quests(id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_quest(
    State(state): State<AppState>,
    Json(input): Json<CreateQuestInput>,
) -> Result<(StatusCode, Json<Quest>), (StatusCode, String)> {
    state
        .db
        .create_quest(input)
        .map(|q| (StatusCode::CREATED, Json(q)))
        .map_err(internal_error)
}

pub async fn update_quest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateQuestInput>,
) -> Result<Json<Quest>, (StatusCode, String)> {
    state
        .db
        .update_quest(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Quest not found".to_string()))
}

pub async fn delete_quest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_quest(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Quest not found".to_string()))
    }
}

pub async fn get_quest_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestView>, (StatusCode, String)> {
    state
        .db
        .get_quest_view(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Quest not found".to_string()))
}

// ============================================================
// Sub-quests
// ============================================================

pub async fn list_subquests(
    State(state): State<AppState>,
    Path(quest_id): Path<Uuid>,
) -> Result<Json<Vec<SubQuest>>, (StatusCode, String)> {
    state
        .db
        .get_quest(quest_id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Quest not found".to_string()))?;

    state
        .db
        .get_subquests(quest_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_subquest(
    State(state): State<AppState>,
    Path(quest_id): Path<Uuid>,
    Json(input): Json<CreateSubQuestInput>,
) -> Result<(StatusCode, Json<SubQuest>), (StatusCode, String)> {
    state
        .db
        .create_subquest(quest_id, input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(internal_error)
}

pub async fn update_subquest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSubQuestInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.update_subquest(id, input).map_err(internal_error)? {
        Ok(StatusCode::OK)
    } else {
        Err((StatusCode::NOT_FOUND, "Sub-quest not found".to_string()))
    }
}

pub async fn delete_subquest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_subquest(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Sub-quest not found".to_string()))
    }
}

/// Input for reordering a quest's sub-quests.
#[derive(Debug, Deserialize)]
pub struct ReorderSubquestsInput {
    /// Every sub-quest of the quest, in the desired order.
    pub subquest_ids: Vec<Uuid>,
}

pub async fn reorder_subquests(
    State(state): State<AppState>,
    Path(quest_id): Path<Uuid>,
    Json(input): Json<ReorderSubquestsInput>,
) -> Result<Json<Vec<SubQuest>>, (StatusCode, String)> {
    state
        .db
        .reorder_subquests(quest_id, &input.subquest_ids)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Pages
// ============================================================

pub async fn list_pages(
    State(state): State<AppState>,
    Query(filter): Query<PageFilter>,
) -> Result<Json<Vec<Page>>, (StatusCode, String)> {
    state
        .db
        .get_all_pages(&filter)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Page>, (StatusCode, String)> {
    state
        .db
        .get_page(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Page not found".to_string()))
}

pub async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<CreatePageInput>,
) -> Result<(StatusCode, Json<Page>), (StatusCode, String)> {
    state
        .db
        .create_page(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePageInput>,
) -> Result<Json<Page>, (StatusCode, String)> {
    state
        .db
        .update_page(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Page not found".to_string()))
}

pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_page(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Page not found".to_string()))
    }
}

pub async fn get_devlog_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DevlogView>, (StatusCode, String)> {
    state
        .db
        .get_devlog_view(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Page not found".to_string()))
}

// ============================================================
// Page Connections
// ============================================================

pub async fn list_page_connections(
    State(state): State<AppState>,
    Path(page_id): Path<Uuid>,
) -> Result<Json<Vec<PageConnection>>, (StatusCode, String)> {
    state
        .db
        .get_page(page_id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Page not found".to_string()))?;

    state
        .db
        .get_page_connections(page_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn connect_page(
    State(state): State<AppState>,
    Path(page_id): Path<Uuid>,
    Json(input): Json<CreatePageConnectionInput>,
) -> Result<(StatusCode, Json<PageConnection>), (StatusCode, String)> {
    state
        .db
        .connect_page(page_id, input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

pub async fn disconnect_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.disconnect_page(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Connection not found".to_string()))
    }
}

// ============================================================
// Devlog Links
// ============================================================

pub async fn list_devlog_issue_links(
    State(state): State<AppState>,
    Path(page_id): Path<Uuid>,
) -> Result<Json<Vec<DevlogIssueLink>>, (StatusCode, String)> {
    state
        .db
        .get_devlog_issue_links(page_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn link_devlog_issue(
    State(state): State<AppState>,
    Path(page_id): Path<Uuid>,
    Json(input): Json<CreateDevlogIssueLinkInput>,
) -> Result<(StatusCode, Json<DevlogIssueLink>), (StatusCode, String)> {
    state
        .db
        .link_devlog_issue(page_id, input)
        .map(|l| (StatusCode::CREATED, Json(l)))
        .map_err(internal_error)
}

pub async fn unlink_devlog_issue(
    State(state): State<AppState>,
    Path((page_id, issue_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .db
        .unlink_devlog_issue(page_id, issue_id)
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Link not found".to_string()))
    }
}

pub async fn list_devlog_subquest_links(
    State(state): State<AppState>,
    Path(page_id): Path<Uuid>,
) -> Result<Json<Vec<DevlogSubquestLink>>, (StatusCode, String)> {
    state
        .db
        .get_devlog_subquest_links(page_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn link_devlog_subquest(
    State(state): State<AppState>,
    Path(page_id): Path<Uuid>,
    Json(input): Json<CreateDevlogSubquestLinkInput>,
) -> Result<(StatusCode, Json<DevlogSubquestLink>), (StatusCode, String)> {
    state
        .db
        .link_devlog_subquest(page_id, input)
        .map(|l| (StatusCode::CREATED, Json(l)))
        .map_err(internal_error)
}

pub async fn unlink_devlog_subquest(
    State(state): State<AppState>,
    Path((page_id, subquest_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .db
        .unlink_devlog_subquest(page_id, subquest_id)
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Link not found".to_string()))
    }
}

// ============================================================
// Issues
// ============================================================

pub async fn list_issues(
    State(state): State<AppState>,
    Query(filter): Query<IssueFilter>,
) -> Result<Json<Vec<Issue>>, (StatusCode, String)> {
    state
        .db
        .get_all_issues(&filter)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Issue>, (StatusCode, String)> {
    state
        .db
        .get_issue(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Issue not found".to_string()))
}

pub async fn list_project_issues(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Issue>>, (StatusCode, String)> {
    state
        .db
        .get_issues_by_target(AttachTarget::Project(id))
        .map(Json)
        .map_err(internal_error)
}

pub async fn list_quest_issues(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Issue>>, (StatusCode, String)> {
    state
        .db
        .get_issues_by_target(AttachTarget::Quest(id))
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_issue(
    State(state): State<AppState>,
    Json(input): Json<CreateIssueInput>,
) -> Result<(StatusCode, Json<Issue>), (StatusCode, String)> {
    state
        .db
        .create_issue(input)
        .map(|i| (StatusCode::CREATED, Json(i)))
        .map_err(internal_error)
}

pub async fn update_issue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateIssueInput>,
) -> Result<Json<Issue>, (StatusCode, String)> {
    state
        .db
        .update_issue(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Issue not found".to_string()))
}

pub async fn delete_issue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_issue(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Issue not found".to_string()))
    }
}

// ============================================================
// Tags
// ============================================================

pub async fn list_tags(
    State(state): State<AppState>,
) -> Result<Json<Vec<Tag>>, (StatusCode, String)> {
    state.db.get_all_tags().map(Json).map_err(internal_error)
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tag>, (StatusCode, String)> {
    state
        .db
        .get_tag(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Tag not found".to_string()))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<CreateTagInput>,
) -> Result<(StatusCode, Json<Tag>), (StatusCode, String)> {
    state
        .db
        .create_tag(input)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(internal_error)
}

pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTagInput>,
) -> Result<Json<Tag>, (StatusCode, String)> {
    state
        .db
        .update_tag(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Tag not found".to_string()))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_tag(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Tag not found".to_string()))
    }
}

// ============================================================
// Inventory
// ============================================================

pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<Vec<InventoryItem>>, (StatusCode, String)> {
    state
        .db
        .get_all_items(&filter)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, (StatusCode, String)> {
    state
        .db
        .get_item(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> Result<(StatusCode, Json<InventoryItem>), (StatusCode, String)> {
    state
        .db
        .create_item(input)
        .map(|i| (StatusCode::CREATED, Json(i)))
        .map_err(internal_error)
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> Result<Json<InventoryItem>, (StatusCode, String)> {
    state
        .db
        .update_item(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_item(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Item not found".to_string()))
    }
}

pub async fn reorder_items(
    State(state): State<AppState>,
    Json(input): Json<ReorderItemsInput>,
) -> Result<Json<Vec<InventoryItem>>, (StatusCode, String)> {
    state
        .db
        .reorder_items(&input)
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Contact Messages
// ============================================================

pub async fn list_messages(
    State(state): State<AppState>,
    Query(filter): Query<MessageFilter>,
) -> Result<Json<Vec<ContactMessage>>, (StatusCode, String)> {
    state
        .db
        .get_all_messages(&filter)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactMessage>, (StatusCode, String)> {
    state
        .db
        .get_message(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Message not found".to_string()))
}

pub async fn create_message(
    State(state): State<AppState>,
    Json(input): Json<CreateMessageInput>,
) -> Result<(StatusCode, Json<ContactMessage>), (StatusCode, String)> {
    state
        .db
        .create_message(input)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(internal_error)
}

pub async fn update_message_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMessageInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state
        .db
        .update_message_status(id, input.status)
        .map_err(internal_error)?
    {
        Ok(StatusCode::OK)
    } else {
        Err((StatusCode::NOT_FOUND, "Message not found".to_string()))
    }
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.delete_message(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Message not found".to_string()))
    }
}

// ============================================================
// Search
// ============================================================

/// Query parameters for portfolio search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search term matched against titles, descriptions and content.
    pub q: String,
    /// Comma-separated entity types to search. Defaults to all of them.
    pub types: Option<String>,
    /// Maximum number of results per entity type. Defaults to 10.
    pub limit: Option<u32>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, (StatusCode, String)> {
    let types: Vec<SearchType> = match &query.types {
        Some(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                SearchType::from_str(s)
                    .ok_or((StatusCode::BAD_REQUEST, format!("Unknown search type: {s}")))
            })
            .collect::<Result<_, _>>()?,
        None => SearchType::ALL.to_vec(),
    };

    state
        .db
        .search_portfolio(&query.q, &types, query.limit.unwrap_or(10))
        .map(Json)
        .map_err(internal_error)
}

// ============================================================
// Character Sheet
// ============================================================

pub async fn character_sheet(
    State(state): State<AppState>,
) -> Result<Json<stats::CharacterSheet>, (StatusCode, String)> {
    state
        .db
        .character_counts()
        .map(|counts| Json(stats::character_sheet(counts)))
        .map_err(internal_error)
}
