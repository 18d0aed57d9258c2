//! services/api/src/web/middleware.rs
//!
//! Caller identification for protected routes.
//!
//! Sign-in is handled by the upstream identity provider, which forwards the
//! signed-in user's id in the `x-user-id` header.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The signed-in user a request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Reads the caller's id from the request headers.
pub fn user_from_headers(headers: &HeaderMap) -> Result<Uuid, (StatusCode, String)> {
    let user_id_str = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "x-user-id header is required".to_string(),
            )
        })?;

    Uuid::parse_str(user_id_str.trim()).map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid x-user-id format".to_string(),
        )
    })
}

/// Middleware that rejects requests without a valid caller id.
///
/// If valid, inserts a `CurrentUser` into the request extensions for handlers to use.
pub async fn require_user(
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let user_id = user_from_headers(req.headers()).inspect_err(|(_, reason)| {
        warn!("Rejected {} {}: {}", req.method(), req.uri().path(), reason);
    })?;

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}
