//! Session middleware guarding the admin surface.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use super::AppState;

/// Extract the bearer token from an Authorization header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// Reject requests that do not carry a live session token.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(bearer_token) {
        Some(token) if state.sessions.authenticated(token) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("rejected request with invalid or expired session token");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("rejected request without Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
