//! crates/medha_core/src/flows/reflection.rs
//!
//! Scoring of a student's written reflection on what they learned.

use tracing::info;
use uuid::Uuid;

use super::{FlowContext, FlowResult};
use crate::domain::ReflectionAssessment;
use crate::prompts;
use crate::schema;

/// Scores a learning reflection from 0 to 10 and credits the points to the owner.
pub async fn analyze_reflection(
    ctx: &FlowContext,
    owner_id: Uuid,
    reflection_text: &str,
) -> FlowResult<ReflectionAssessment> {
    schema::require_text("reflectionText", reflection_text)?;

    let assessment = ctx
        .complete(
            &prompts::reflection(reflection_text),
            &schema::reflection_shape(),
            schema::parse_reflection,
        )
        .await?;
    info!("Reflection scored {} points.", assessment.points_awarded);

    if assessment.points_awarded > 0 {
        ctx.persist(
            "reflection points",
            ctx.db.increment_student_score(owner_id, assessment.points_awarded),
        )
        .await;
    }

    Ok(assessment)
}
