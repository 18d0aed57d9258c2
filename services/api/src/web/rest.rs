//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the learning-feature endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Handlers only translate between JSON and the core flows. A failed flow is
//! reported with one generic message per feature.

use crate::web::middleware::CurrentUser;
use crate::web::profile;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use medha_core::domain::{
    ChatMessage, EssayFeedback, GenerationResult, GradeResult, QuizAnswer, QuizQuestion,
    ReflectionAssessment,
};
use medha_core::flows::essay::{self, EssayChatRequest, EssayFeedbackRequest, EssayFeedbackResult};
use medha_core::flows::explain::{self, LearningPathRequest};
use medha_core::flows::my_tutor::{self, TutorRequest};
use medha_core::flows::quiz::{self, GradeQuizRequest};
use medha_core::flows::reflection;
use medha_core::flows::talk_buddy::{self, TalkBuddyReply, TalkBuddyRequest};
use medha_core::schema::{EssayChatReply, LearningPath};
use medha_core::{FlowError, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        tutor_handler,
        essay_feedback_handler,
        essay_chat_handler,
        generate_quiz_handler,
        grade_quiz_handler,
        reflection_handler,
        talk_buddy_handler,
        explain_feature_handler,
        learning_path_handler,
        profile::ensure_profile_handler,
        profile::get_profile_handler,
        profile::update_settings_handler,
        profile::list_courses_handler,
        profile::get_course_handler,
        profile::list_essays_handler,
        profile::get_essay_handler,
        profile::list_conversations_handler,
        profile::get_conversation_handler,
    ),
    components(
        schemas(
            TutorPayload,
            EssayFeedbackPayload,
            EssayChatPayload,
            QuizGeneratePayload,
            QuizGradePayload,
            ReflectionPayload,
            TalkBuddyPayload,
            ExplainFeaturePayload,
            ExplainFeatureResponse,
            LearningPathPayload,
            QuizResponse,
            profile::EnsureProfilePayload,
        )
    ),
    tags(
        (name = "Medha API", description = "AI tutoring: courses, essay feedback, quizzes, reflections and conversation practice.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

pub type HandlerError = (StatusCode, String);

/// Maps a flow failure to a response. Invalid input is echoed back; every other
/// failure is logged and reported with `message`.
pub fn flow_failure(message: &str, e: FlowError) -> HandlerError {
    match e {
        FlowError::InvalidInput(reason) => (StatusCode::BAD_REQUEST, reason.to_string()),
        FlowError::Port(PortError::NotFound(what)) => (StatusCode::NOT_FOUND, what),
        other => {
            error!("{}: {}", message, other);
            (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
        }
    }
}

//=========================================================================================
// API Payload and Response Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TutorPayload {
    /// The topic or question to build a course around.
    pub prompt: String,
    /// Text extracted from an uploaded source file.
    #[serde(default)]
    pub source_material: Option<String>,
    /// A user-defined outline the course should follow.
    #[serde(default)]
    pub course_structure: Option<String>,
    #[serde(default)]
    pub research_mode: bool,
    /// A `data:<mimetype>;base64,...` image for context.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EssayFeedbackPayload {
    pub essay: String,
    pub topic: String,
    pub grade_level: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EssayChatPayload {
    pub essay: String,
    pub topic: String,
    pub grade_level: String,
    #[schema(value_type = Object)]
    pub initial_feedback: EssayFeedback,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub chat_history: Vec<ChatMessage>,
    pub query: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizGeneratePayload {
    pub course_content: String,
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<QuizQuestion>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizGradePayload {
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<QuizQuestion>,
    #[schema(value_type = Vec<Object>)]
    pub user_answers: Vec<QuizAnswer>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionPayload {
    pub reflection_text: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TalkBuddyPayload {
    pub prompt: String,
    pub language: String,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainFeaturePayload {
    pub feature_title: String,
    #[serde(default)]
    pub feature_description: String,
}

#[derive(Serialize, ToSchema)]
pub struct ExplainFeatureResponse {
    pub explanation: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathPayload {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub performance_data: serde_json::Value,
    pub career_path: String,
    pub academic_level: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a course, visual aid and narration for a topic.
#[utoipa::path(
    post,
    path = "/api/tutor",
    request_body = TutorPayload,
    responses(
        (status = 200, description = "The generated course; `id` is set when it was saved to history"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "The course could not be generated")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn tutor_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<TutorPayload>,
) -> Result<Json<GenerationResult>, HandlerError> {
    let request = TutorRequest {
        owner_id: user_id,
        prompt: payload.prompt,
        source_material: payload.source_material,
        structure_hint: payload.course_structure,
        research_mode: payload.research_mode,
        image: payload.image,
    };
    my_tutor::my_tutor(&state.flows, request)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to generate the course. Please try again.", e))
}

/// Get structured feedback on an essay.
#[utoipa::path(
    post,
    path = "/api/essay-feedback",
    request_body = EssayFeedbackPayload,
    responses(
        (status = 200, description = "Feedback on five dimensions plus the marked-up essay"),
        (status = 400, description = "Invalid input (e.g. an essay under 50 characters)"),
        (status = 500, description = "Feedback could not be generated")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn essay_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<EssayFeedbackPayload>,
) -> Result<Json<EssayFeedbackResult>, HandlerError> {
    let request = EssayFeedbackRequest {
        owner_id: user_id,
        essay: payload.essay,
        topic: payload.topic,
        grade_level: payload.grade_level,
    };
    essay::essay_feedback(&state.flows, request)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to get essay feedback. Please try again.", e))
}

/// Ask a follow-up question about essay feedback.
#[utoipa::path(
    post,
    path = "/api/essay-feedback/chat",
    request_body = EssayChatPayload,
    responses(
        (status = 200, description = "The tutor's reply and an optional revised essay"),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "No reply could be generated")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn essay_chat_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EssayChatPayload>,
) -> Result<Json<EssayChatReply>, HandlerError> {
    let request = EssayChatRequest {
        essay: payload.essay,
        topic: payload.topic,
        grade_level: payload.grade_level,
        initial_feedback: payload.initial_feedback,
        chat_history: payload.chat_history,
        query: payload.query,
    };
    essay::essay_feedback_chat(&state.flows, request)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Sorry, I couldn't answer that. Please try again.", e))
}

/// Generate a multiple-choice quiz from course content.
#[utoipa::path(
    post,
    path = "/api/quiz",
    request_body = QuizGeneratePayload,
    responses(
        (status = 200, description = "The generated questions", body = QuizResponse),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "The quiz could not be generated")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn generate_quiz_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuizGeneratePayload>,
) -> Result<Json<QuizResponse>, HandlerError> {
    quiz::generate_quiz(&state.flows, &payload.course_content)
        .await
        .map(|questions| Json(QuizResponse { questions }))
        .map_err(|e| flow_failure("Failed to generate the quiz. Please try again.", e))
}

/// Grade a quiz submission and credit the points to the user's score.
#[utoipa::path(
    post,
    path = "/api/quiz/grade",
    request_body = QuizGradePayload,
    responses(
        (status = 200, description = "Score, points and per-question feedback"),
        (status = 500, description = "The quiz could not be graded")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn grade_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<QuizGradePayload>,
) -> Result<Json<GradeResult>, HandlerError> {
    let request = GradeQuizRequest {
        owner_id: Some(user_id),
        questions: payload.questions,
        user_answers: payload.user_answers,
    };
    quiz::grade_quiz(&state.flows, request)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to grade the quiz. Please try again.", e))
}

/// Assess a free-text reflection and award up to 10 points.
#[utoipa::path(
    post,
    path = "/api/reflection",
    request_body = ReflectionPayload,
    responses(
        (status = 200, description = "Feedback and the points awarded"),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "The reflection could not be assessed")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn reflection_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<ReflectionPayload>,
) -> Result<Json<ReflectionAssessment>, HandlerError> {
    reflection::analyze_reflection(&state.flows, user_id, &payload.reflection_text)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to analyze your reflection. Please try again.", e))
}

/// Take one turn of a language-practice conversation.
#[utoipa::path(
    post,
    path = "/api/talk-buddy",
    request_body = TalkBuddyPayload,
    responses(
        (status = 200, description = "The reply, its audio and the conversation id"),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "No reply could be generated")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn talk_buddy_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<TalkBuddyPayload>,
) -> Result<Json<TalkBuddyReply>, HandlerError> {
    let request = TalkBuddyRequest {
        owner_id: Some(user_id),
        prompt: payload.prompt,
        language: payload.language,
        messages: payload.messages,
        conversation_id: payload.conversation_id,
    };
    talk_buddy::talk_buddy(&state.flows, request)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Sorry, I'm having trouble responding right now.", e))
}

/// Explain one of the platform's features.
#[utoipa::path(
    post,
    path = "/api/explain-feature",
    request_body = ExplainFeaturePayload,
    responses(
        (status = 200, description = "A Markdown explanation", body = ExplainFeatureResponse),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "No explanation could be generated")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn explain_feature_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExplainFeaturePayload>,
) -> Result<Json<ExplainFeatureResponse>, HandlerError> {
    explain::explain_feature(&state.flows, &payload.feature_title, &payload.feature_description)
        .await
        .map(|explanation| Json(ExplainFeatureResponse { explanation }))
        .map_err(|e| flow_failure("Failed to explain this feature. Please try again.", e))
}

/// Recommend modules for the user's career path and level.
#[utoipa::path(
    post,
    path = "/api/learning-path",
    request_body = LearningPathPayload,
    responses(
        (status = 200, description = "Recommended modules and the reasoning behind them"),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "No learning path could be generated")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn learning_path_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<LearningPathPayload>,
) -> Result<Json<LearningPath>, HandlerError> {
    let request = LearningPathRequest {
        student_id: user_id.to_string(),
        performance_data: payload.performance_data,
        career_path: payload.career_path,
        academic_level: payload.academic_level,
    };
    explain::personalized_learning_path(&state.flows, request)
        .await
        .map(Json)
        .map_err(|e| flow_failure("Failed to build a learning path. Please try again.", e))
}
