//! services/api/src/web/profile.rs
//!
//! Profile, settings and history endpoints. All of them act on the caller's own records.

use crate::web::middleware::CurrentUser;
use crate::web::rest::{flow_failure, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use medha_core::domain::{
    ConversationRecord, EssayRecord, GenerationResult, ProfileSettings, UserProfile,
};
use medha_core::flows::profile;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Identity details captured at sign-up.
#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnsureProfilePayload {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

//=========================================================================================
// Profile & Settings
//=========================================================================================

/// Create the caller's profile on first sign-in, or return the existing one.
#[utoipa::path(
    post,
    path = "/api/profile",
    request_body = EnsureProfilePayload,
    responses(
        (status = 200, description = "The caller's profile"),
        (status = 500, description = "The profile could not be loaded")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn ensure_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<EnsureProfilePayload>,
) -> Result<Json<UserProfile>, HandlerError> {
    profile::ensure_profile(
        &state.flows,
        user_id,
        payload.display_name.as_deref(),
        payload.email.as_deref(),
    )
    .await
    .map(Json)
    .map_err(|e| flow_failure("Failed to load your profile.", e))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "The caller's profile"),
        (status = 404, description = "No profile exists yet")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<UserProfile>, HandlerError> {
    profile::get_profile(&state.flows, user_id)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to load your profile.", e))
}

/// Merge onboarding answers or settings into the caller's profile.
#[utoipa::path(
    put,
    path = "/api/profile/settings",
    request_body(content_type = "application/json", description = "Any subset of profile settings; absent fields are kept."),
    responses(
        (status = 200, description = "The updated profile"),
        (status = 500, description = "The settings could not be saved")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(settings): Json<ProfileSettings>,
) -> Result<Json<UserProfile>, HandlerError> {
    profile::update_settings(&state.flows, user_id, settings)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to save your settings.", e))
}

//=========================================================================================
// History
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/history/courses",
    responses((status = 200, description = "Saved courses, newest first")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<GenerationResult>>, HandlerError> {
    profile::course_history(&state.flows, user_id)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to load your courses.", e))
}

#[utoipa::path(
    get,
    path = "/api/history/courses/{id}",
    responses(
        (status = 200, description = "One saved course"),
        (status = 404, description = "No such course for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The course id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerationResult>, HandlerError> {
    profile::get_course(&state.flows, user_id, id)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to load the course.", e))
}

#[utoipa::path(
    get,
    path = "/api/history/essays",
    responses((status = 200, description = "Saved essays with their feedback, newest first")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn list_essays_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<EssayRecord>>, HandlerError> {
    profile::essay_history(&state.flows, user_id)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to load your essays.", e))
}

#[utoipa::path(
    get,
    path = "/api/history/essays/{id}",
    responses(
        (status = 200, description = "One saved essay"),
        (status = 404, description = "No such essay for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The essay id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_essay_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<EssayRecord>, HandlerError> {
    profile::get_essay(&state.flows, user_id, id)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to load the essay.", e))
}

#[utoipa::path(
    get,
    path = "/api/history/conversations",
    responses((status = 200, description = "Talk Buddy conversations, most recently active first")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn list_conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<ConversationRecord>>, HandlerError> {
    profile::conversation_history(&state.flows, user_id)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to load your conversations.", e))
}

#[utoipa::path(
    get,
    path = "/api/history/conversations/{id}",
    responses(
        (status = 200, description = "One conversation with all its messages"),
        (status = 404, description = "No such conversation for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The conversation id."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationRecord>, HandlerError> {
    profile::get_conversation(&state.flows, user_id, id)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to load the conversation.", e))
}
