//! crates/medha_core/src/flows/explain.rs
//!
//! Small informational flows: explaining a platform feature, and recommending a
//! learning path from a student's performance.

use serde_json::Value;

use super::{FlowContext, FlowResult};
use crate::prompts;
use crate::schema::{self, LearningPath};

pub async fn explain_feature(
    ctx: &FlowContext,
    feature_title: &str,
    feature_description: &str,
) -> FlowResult<String> {
    schema::require_text("featureTitle", feature_title)?;

    ctx.complete(
        &prompts::explain_feature(feature_title, feature_description),
        &schema::feature_explanation_shape(),
        schema::parse_feature_explanation,
    )
    .await
}

#[derive(Debug, Clone)]
pub struct LearningPathRequest {
    pub student_id: String,
    /// Free-form per-module performance figures, passed to the model as JSON.
    pub performance_data: Value,
    pub career_path: String,
    pub academic_level: String,
}

pub async fn personalized_learning_path(
    ctx: &FlowContext,
    request: LearningPathRequest,
) -> FlowResult<LearningPath> {
    schema::require_text("careerPath", &request.career_path)?;
    schema::require_text("academicLevel", &request.academic_level)?;

    ctx.complete(
        &prompts::learning_path(&request),
        &schema::learning_path_shape(),
        schema::parse_learning_path,
    )
    .await
}
