mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::SessionGuard;
use crate::db::Database;

/// Shared handler state: the store plus the admin session guard.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionGuard,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        let sessions = SessionGuard::new(db.clone());
        Self { db, sessions }
    }
}

pub fn create_router(state: AppState) -> Router {
    // Anyone can read the portfolio, log in, or drop a contact message.
    let public = Router::new()
        .route("/projects", get(handlers::list_projects))
        .route("/projects/tree", get(handlers::get_project_tree))
        .route("/projects/slug/{slug}", get(handlers::get_project_by_slug))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/projects/{id}/children", get(handlers::list_child_projects))
        .route("/projects/{id}/quests", get(handlers::list_project_quests))
        .route("/projects/{id}/issues", get(handlers::list_project_issues))
        .route("/projects/{id}/view", get(handlers::get_project_view))
        .route("/quests", get(handlers::list_quests))
        .route("/quests/{id}", get(handlers::get_quest))
        .route("/quests/{id}/children", get(handlers::list_child_quests))
        .route("/quests/{id}/issues", get(handlers::list_quest_issues))
        .route("/quests/{id}/subquests", get(handlers::list_subquests))
        .route("/quests/{id}/view", get(handlers::get_quest_view))
        .route("/pages", get(handlers::list_pages))
        .route("/pages/{id}", get(handlers::get_page))
        .route("/pages/{id}/connections", get(handlers::list_page_connections))
        .route("/pages/{id}/issue-links", get(handlers::list_devlog_issue_links))
        .route("/pages/{id}/subquest-links", get(handlers::list_devlog_subquest_links))
        .route("/pages/{id}/devlog-view", get(handlers::get_devlog_view))
        .route("/issues", get(handlers::list_issues))
        .route("/issues/{id}", get(handlers::get_issue))
        .route("/tags", get(handlers::list_tags))
        .route("/tags/{id}", get(handlers::get_tag))
        .route("/items", get(handlers::list_items))
        .route("/items/{id}", get(handlers::get_item))
        .route("/search", get(handlers::search))
        .route("/character-sheet", get(handlers::character_sheet))
        .route("/messages", post(handlers::create_message))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/health", get(handlers::health));

    // Everything that writes, plus the contact inbox, needs a session.
    let admin = Router::new()
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}", put(handlers::update_project))
        .route("/projects/{id}", delete(handlers::delete_project))
        .route("/quests", post(handlers::create_quest))
        .route("/quests/{id}", put(handlers::update_quest))
        .route("/quests/{id}", delete(handlers::delete_quest))
        .route("/quests/{id}/subquests", post(handlers::create_subquest))
        .route("/quests/{id}/subquests/reorder", put(handlers::reorder_subquests))
        .route("/subquests/{id}", put(handlers::update_subquest))
        .route("/subquests/{id}", delete(handlers::delete_subquest))
        .route("/pages", post(handlers::create_page))
        .route("/pages/{id}", put(handlers::update_page))
        .route("/pages/{id}", delete(handlers::delete_page))
        .route("/pages/{id}/connections", post(handlers::connect_page))
        .route("/connections/{id}", delete(handlers::disconnect_page))
        .route("/pages/{id}/issue-links", post(handlers::link_devlog_issue))
        .route(
            "/pages/{page_id}/issue-links/{issue_id}",
            delete(handlers::unlink_devlog_issue),
        )
        .route("/pages/{id}/subquest-links", post(handlers::link_devlog_subquest))
        .route(
            "/pages/{page_id}/subquest-links/{subquest_id}",
            delete(handlers::unlink_devlog_subquest),
        )
        .route("/issues", post(handlers::create_issue))
        .route("/issues/{id}", put(handlers::update_issue))
        .route("/issues/{id}", delete(handlers::delete_issue))
        .route("/tags", post(handlers::create_tag))
        .route("/tags/{id}", put(handlers::update_tag))
        .route("/tags/{id}", delete(handlers::delete_tag))
        .route("/items", post(handlers::create_item))
        .route("/items/reorder", put(handlers::reorder_items))
        .route("/items/{id}", put(handlers::update_item))
        .route("/items/{id}", delete(handlers::delete_item))
        .route("/messages", get(handlers::list_messages))
        .route("/messages/{id}", get(handlers::get_message))
        .route("/messages/{id}/status", put(handlers::update_message_status))
        .route("/messages/{id}", delete(handlers::delete_message))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    Router::new()
        .nest("/api/v1", public.merge(admin))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
