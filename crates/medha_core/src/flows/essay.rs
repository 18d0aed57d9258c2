//! crates/medha_core/src/flows/essay.rs
//!
//! Essay feedback and the follow-up chat about that feedback.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{FlowContext, FlowResult};
use crate::domain::{ChatMessage, EssayFeedback, EssayRecord};
use crate::prompts;
use crate::schema::{self, EssayChatReply, SchemaError};

#[derive(Debug, Clone)]
pub struct EssayFeedbackRequest {
    pub owner_id: Uuid,
    pub essay: String,
    pub topic: String,
    pub grade_level: String,
}

impl EssayFeedbackRequest {
    pub fn validate(&self) -> Result<(), SchemaError> {
        schema::require_text("topic", &self.topic)?;
        schema::require_text("gradeLevel", &self.grade_level)?;
        schema::validate_essay(&self.essay)
    }
}

/// Feedback plus the id of the stored essay, absent when it could not be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayFeedbackResult {
    #[serde(flatten)]
    pub feedback: EssayFeedback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essay_id: Option<Uuid>,
}

pub async fn essay_feedback(
    ctx: &FlowContext,
    request: EssayFeedbackRequest,
) -> FlowResult<EssayFeedbackResult> {
    request.validate()?;
    info!("Essay feedback requested for topic '{}'.", request.topic);

    let feedback = ctx
        .complete(
            &prompts::essay_feedback(&request.essay, &request.topic, &request.grade_level),
            &schema::essay_feedback_shape(),
            schema::parse_essay_feedback,
        )
        .await?;

    let record = EssayRecord {
        id: ctx.db.new_record_id(),
        user_id: request.owner_id,
        essay: request.essay,
        topic: request.topic,
        grade_level: request.grade_level,
        feedback,
        created_at: Utc::now(),
    };
    let saved = ctx.persist("essay", ctx.db.save_essay(&record)).await;

    Ok(EssayFeedbackResult {
        feedback: record.feedback,
        essay_id: saved.then_some(record.id),
    })
}

#[derive(Debug, Clone)]
pub struct EssayChatRequest {
    pub essay: String,
    pub topic: String,
    pub grade_level: String,
    pub initial_feedback: EssayFeedback,
    pub chat_history: Vec<ChatMessage>,
    pub query: String,
}

/// Answers a follow-up question about earlier feedback. Nothing is persisted.
pub async fn essay_feedback_chat(
    ctx: &FlowContext,
    request: EssayChatRequest,
) -> FlowResult<EssayChatReply> {
    schema::require_text("query", &request.query)?;
    schema::require_text("essay", &request.essay)?;
    schema::require_text("topic", &request.topic)?;
    schema::require_text("gradeLevel", &request.grade_level)?;

    ctx.complete(
        &prompts::essay_chat(&request),
        &schema::essay_chat_shape(),
        schema::parse_essay_chat_reply,
    )
    .await
}
