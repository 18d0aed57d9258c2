//! crates/medha_core/src/domain.rs
//!
//! Defines the core records produced and persisted by the tutoring flows.
//! They serialize with camelCase field names, which is the shape the UI layer
//! and the record store both expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Course Generation
//=========================================================================================

/// A single lesson. `content` is Markdown using `- ` bullets and `#`/`##` headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseLesson {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub title: String,
    pub lessons: Vec<CourseLesson>,
}

/// A generated course. Always holds at least one module, each with at least one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseArtifact {
    pub title: String,
    pub overview: String,
    pub modules: Vec<CourseModule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Article,
    Other,
}

/// An external resource suggested alongside a course.
/// `video_id` is present exactly when `resource_type` is `Video`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedResource {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// The merged output of the course generation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection_prompt: Option<String>,
    #[serde(default)]
    pub related_resources: Vec<RelatedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

//=========================================================================================
// Essay Feedback
//=========================================================================================

/// Per-dimension essay feedback plus a revision marked up with
/// `**added**` and `~~removed~~` spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayFeedback {
    pub grammar_feedback: String,
    pub coherence_feedback: String,
    pub relevance_feedback: String,
    pub creativity_feedback: String,
    pub overall_feedback: String,
    pub highlighted_essay: String,
}

/// A submitted essay and the feedback it received, as stored in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub essay: String,
    pub topic: String,
    pub grade_level: String,
    pub feedback: EssayFeedback,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Quizzes & Reflections
//=========================================================================================

/// A multiple-choice question. `correct_answer` is always one of the four `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question: String,
    pub selected_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
}

/// The outcome of grading one quiz submission. Never stored on its own;
/// `points_awarded` is folded into the owner's `student_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub score: u32,
    pub points_awarded: u32,
    pub feedback: Vec<AnswerFeedback>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionAssessment {
    pub feedback: String,
    pub points_awarded: u32,
}

//=========================================================================================
// Users
//=========================================================================================

/// Free-form preferences captured at onboarding and in settings.
/// Absent fields are left untouched when merged into a stored profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_email: Option<String>,
    /// Any other preference the UI chooses to store.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProfileSettings {
    /// Overlays every field present in `other` onto `self`.
    pub fn merge(&mut self, other: &ProfileSettings) {
        fn overlay(slot: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        overlay(&mut self.career_path, &other.career_path);
        overlay(&mut self.academic_level, &other.academic_level);
        overlay(&mut self.learning_goal, &other.learning_goal);
        overlay(&mut self.first_name, &other.first_name);
        overlay(&mut self.last_name, &other.last_name);
        overlay(&mut self.gender, &other.gender);
        overlay(&mut self.nationality, &other.nationality);
        overlay(&mut self.date_of_birth, &other.date_of_birth);
        overlay(&mut self.category, &other.category);
        overlay(&mut self.primary_contact_number, &other.primary_contact_number);
        overlay(&mut self.student_contact_number, &other.student_contact_number);
        overlay(&mut self.student_email, &other.student_email);
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// True once the onboarding questions have been answered.
    pub fn has_completed_onboarding(&self) -> bool {
        self.career_path.as_deref().is_some_and(|s| !s.is_empty())
            && self.academic_level.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A user's profile. `student_score` only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: Uuid,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub student_score: u64,
    #[serde(flatten)]
    pub settings: ProfileSettings,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Conversations
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            audio_url: None,
        }
    }

    pub fn bot(text: impl Into<String>, audio_url: Option<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            audio_url,
        }
    }
}

/// An append-only Talk Buddy thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub language: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user+bot exchange to be appended to a conversation, creating it if needed.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub language: String,
    /// Used only when the conversation does not exist yet.
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub at: DateTime<Utc>,
}
