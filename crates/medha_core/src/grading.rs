//! crates/medha_core/src/grading.rs
//!
//! Local quiz grading. No model is involved: answers are compared against the
//! stored correct answers and turned into a percentage and a point award.

use crate::domain::{AnswerFeedback, GradeResult, QuizAnswer, QuizQuestion};

/// Points earned per correct answer.
pub const POINTS_PER_CORRECT_ANSWER: u32 = 5;

/// Grades answers against questions, pairing them by index.
///
/// A question with no answer counts as incorrect with an empty `user_answer`;
/// answers beyond the last question are ignored. A quiz without questions
/// scores 0 and awards nothing.
pub fn grade(questions: &[QuizQuestion], answers: &[QuizAnswer]) -> GradeResult {
    let feedback: Vec<AnswerFeedback> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let user_answer = answers
                .get(index)
                .map(|a| a.selected_answer.clone())
                .unwrap_or_default();
            AnswerFeedback {
                question: question.question.clone(),
                is_correct: user_answer == question.correct_answer,
                user_answer,
                correct_answer: question.correct_answer.clone(),
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    let correct = feedback.iter().filter(|f| f.is_correct).count() as u32;
    let total = questions.len() as u32;

    GradeResult {
        score: percentage(correct, total),
        points_awarded: correct * POINTS_PER_CORRECT_ANSWER,
        feedback,
    }
}

/// `round(100 × correct / total)`, half away from zero; 0 when `total` is 0.
fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (200 * correct + total) / (2 * total)
}
