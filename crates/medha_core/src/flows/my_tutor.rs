//! crates/medha_core/src/flows/my_tutor.rs
//!
//! Course generation: the primary course content, then a visual aid and a spoken
//! explanation produced side by side, merged and saved to the owner's history.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{size_guard, FlowContext, FlowResult};
use crate::domain::GenerationResult;
use crate::prompts;
use crate::schema::{self, ImagePlan};

#[derive(Debug, Clone)]
pub struct TutorRequest {
    pub owner_id: Uuid,
    pub prompt: String,
    pub source_material: Option<String>,
    pub structure_hint: Option<String>,
    pub research_mode: bool,
    /// A `data:<mimetype>;base64,...` URI.
    pub image: Option<String>,
}

impl TutorRequest {
    pub fn validate(&self) -> Result<(), schema::SchemaError> {
        schema::require_text("prompt", &self.prompt)?;
        if let Some(image) = &self.image {
            schema::validate_data_uri("image", image)?;
        }
        Ok(())
    }
}

/// Generates a course for `request`, returning it with its history id when it could be saved.
pub async fn my_tutor(ctx: &FlowContext, request: TutorRequest) -> FlowResult<GenerationResult> {
    request.validate()?;
    let started = Instant::now();
    info!("Tutor flow started for topic '{}'.", request.prompt);

    let draft = ctx
        .complete(
            &prompts::tutor(&request),
            &schema::tutor_shape(),
            schema::parse_tutor_output,
        )
        .await?;

    // Neither side cancels the other; each resolves to `None` on failure.
    let (image_url, audio_url) = futures::join!(
        visual_aid(ctx, &request.prompt),
        ctx.speak(&draft.explanation)
    );

    let mut result = GenerationResult {
        explanation: draft.explanation,
        course: draft.course,
        reflection_prompt: draft.reflection_prompt,
        related_resources: draft.related_resources,
        image_url,
        audio_url,
        id: None,
        created_at: None,
        prompt: Some(request.prompt.clone()),
    };

    let id = ctx.db.new_record_id();
    let created_at = Utc::now();
    let mut stored = result.clone();
    stored.id = Some(id);
    stored.created_at = Some(created_at);
    stored.image_url = size_guard("image", stored.image_url);
    stored.audio_url = size_guard("audio", stored.audio_url);

    if ctx
        .persist("course history", ctx.db.save_course(request.owner_id, &stored))
        .await
    {
        result.id = Some(id);
        result.created_at = Some(created_at);
    }

    info!("Tutor flow finished in {:?}.", started.elapsed());
    Ok(result)
}

/// Picks exactly one visual-aid strategy, then runs only that one.
async fn visual_aid(ctx: &FlowContext, topic: &str) -> Option<String> {
    let plan = ctx
        .degrade("Visual aid planning", async {
            let value = ctx
                .completion
                .complete_structured(&prompts::image_plan(topic), &schema::image_plan_shape())
                .await?;
            Ok(value.and_then(|v| match schema::parse_image_plan(v) {
                Ok(plan) => Some(plan),
                Err(e) => {
                    warn!("Ignoring unusable visual aid plan: {}", e);
                    None
                }
            }))
        })
        .await?;

    match plan {
        ImagePlan::Search { query } => {
            info!("Searching for an existing image: '{}'", query);
            ctx.degrade("Image search", ctx.image_search.find_image(&query))
                .await
        }
        ImagePlan::Generate { prompt } => {
            info!("Generating an illustration.");
            ctx.degrade("Image generation", async {
                ctx.images.generate_image(&prompt).await.map(Some)
            })
            .await
        }
    }
}
