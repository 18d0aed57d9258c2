//! crates/medha_core/src/flows/profile.rs
//!
//! Profile setup and settings, and read access to a user's saved history.
//! These go straight to the record store; no model is involved.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{FlowContext, FlowResult};
use crate::domain::{
    ConversationRecord, EssayRecord, GenerationResult, ProfileSettings, UserProfile,
};

/// Returns the user's profile, creating it with a zero score on first sign-in.
pub async fn ensure_profile(
    ctx: &FlowContext,
    uid: Uuid,
    display_name: Option<&str>,
    email: Option<&str>,
) -> FlowResult<UserProfile> {
    let profile = ctx
        .read(
            "profile setup",
            ctx.db.get_or_create_profile(uid, display_name, email, Utc::now()),
        )
        .await?;
    if !profile.settings.has_completed_onboarding() {
        info!("User {} has not completed onboarding.", uid);
    }
    Ok(profile)
}

pub async fn get_profile(ctx: &FlowContext, uid: Uuid) -> FlowResult<UserProfile> {
    ctx.read("profile lookup", ctx.db.get_profile(uid)).await
}

/// Merges `settings` into the stored profile and returns the result.
pub async fn update_settings(
    ctx: &FlowContext,
    uid: Uuid,
    settings: ProfileSettings,
) -> FlowResult<UserProfile> {
    ctx.read(
        "settings update",
        ctx.db.merge_profile_settings(uid, &settings),
    )
    .await?;
    get_profile(ctx, uid).await
}

pub async fn course_history(ctx: &FlowContext, uid: Uuid) -> FlowResult<Vec<GenerationResult>> {
    ctx.read("course history", ctx.db.list_courses(uid)).await
}

pub async fn get_course(ctx: &FlowContext, uid: Uuid, id: Uuid) -> FlowResult<GenerationResult> {
    ctx.read("course lookup", ctx.db.get_course(uid, id)).await
}

pub async fn essay_history(ctx: &FlowContext, uid: Uuid) -> FlowResult<Vec<EssayRecord>> {
    ctx.read("essay history", ctx.db.list_essays(uid)).await
}

pub async fn get_essay(ctx: &FlowContext, uid: Uuid, id: Uuid) -> FlowResult<EssayRecord> {
    ctx.read("essay lookup", ctx.db.get_essay(uid, id)).await
}

pub async fn conversation_history(
    ctx: &FlowContext,
    uid: Uuid,
) -> FlowResult<Vec<ConversationRecord>> {
    ctx.read("conversation history", ctx.db.list_conversations(uid))
        .await
}

pub async fn get_conversation(
    ctx: &FlowContext,
    uid: Uuid,
    id: Uuid,
) -> FlowResult<ConversationRecord> {
    ctx.read("conversation lookup", ctx.db.get_conversation(uid, id))
        .await
}
