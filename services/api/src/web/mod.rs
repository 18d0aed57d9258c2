pub mod middleware;
pub mod profile;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_user;
pub use rest::ApiDoc;
pub use state::AppState;

/// Uploaded images and source material travel inline as data URIs.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds every `/api` route behind the caller-identification middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Learning features
        .route("/api/tutor", post(rest::tutor_handler))
        .route("/api/essay-feedback", post(rest::essay_feedback_handler))
        .route("/api/essay-feedback/chat", post(rest::essay_chat_handler))
        .route("/api/quiz", post(rest::generate_quiz_handler))
        .route("/api/quiz/grade", post(rest::grade_quiz_handler))
        .route("/api/reflection", post(rest::reflection_handler))
        .route("/api/talk-buddy", post(rest::talk_buddy_handler))
        .route("/api/explain-feature", post(rest::explain_feature_handler))
        .route("/api/learning-path", post(rest::learning_path_handler))
        // Profile & history
        .route(
            "/api/profile",
            post(profile::ensure_profile_handler).get(profile::get_profile_handler),
        )
        .route("/api/profile/settings", put(profile::update_settings_handler))
        .route("/api/history/courses", get(profile::list_courses_handler))
        .route("/api/history/courses/{id}", get(profile::get_course_handler))
        .route("/api/history/essays", get(profile::list_essays_handler))
        .route("/api/history/essays/{id}", get(profile::get_essay_handler))
        .route(
            "/api/history/conversations",
            get(profile::list_conversations_handler),
        )
        .route(
            "/api/history/conversations/{id}",
            get(profile::get_conversation_handler),
        )
        .layer(axum_middleware::from_fn(require_user))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
