//! crates/medha_core/src/flows/quiz.rs
//!
//! Quiz generation from course text, and grading of a submission.

use tracing::info;
use uuid::Uuid;

use super::{FlowContext, FlowResult};
use crate::domain::{GradeResult, QuizAnswer, QuizQuestion};
use crate::grading;
use crate::prompts;
use crate::schema;

pub async fn generate_quiz(ctx: &FlowContext, course_content: &str) -> FlowResult<Vec<QuizQuestion>> {
    schema::require_text("courseContent", course_content)?;

    let questions = ctx
        .complete(
            &prompts::quiz(course_content),
            &schema::quiz_shape(),
            schema::parse_quiz,
        )
        .await?;
    info!("Generated a quiz with {} questions.", questions.len());
    Ok(questions)
}

#[derive(Debug, Clone)]
pub struct GradeQuizRequest {
    pub owner_id: Option<Uuid>,
    pub questions: Vec<QuizQuestion>,
    pub user_answers: Vec<QuizAnswer>,
}

/// Grades a submission locally and credits the owner's score.
///
/// Every call is a new submission: grading the same answers twice credits twice.
/// Questions arrive from the client, so each one is checked before anything is scored.
pub async fn grade_quiz(ctx: &FlowContext, request: GradeQuizRequest) -> FlowResult<GradeResult> {
    for question in &request.questions {
        schema::validate_question(question)?;
    }

    let result = grading::grade(&request.questions, &request.user_answers);
    info!(
        "Quiz graded: {}% ({} points).",
        result.score, result.points_awarded
    );

    if let Some(owner_id) = request.owner_id {
        if result.points_awarded > 0 {
            ctx.persist(
                "quiz points",
                ctx.db.increment_student_score(owner_id, result.points_awarded),
            )
            .await;
        }
    }

    Ok(result)
}
