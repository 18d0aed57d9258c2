//! crates/medha_core/src/schema.rs
//!
//! Input and output contracts for every model-backed operation.
//!
//! Model responses are untrusted: each shape has a parse-and-validate function
//! that turns a raw `serde_json::Value` into a typed record or a `SchemaError`.
//! Each shape also carries the JSON-schema descriptor sent with the request.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::{
    CourseArtifact, EssayFeedback, QuizQuestion, ReflectionAssessment, RelatedResource,
    ResourceType,
};

/// Used when the model returns a course but leaves the explanation blank.
pub const FALLBACK_EXPLANATION: &str =
    "I'm sorry, I couldn't come up with an explanation for that.";

/// Essays shorter than this are rejected before any model call.
pub const MIN_ESSAY_CHARS: usize = 50;

pub const MAX_REFLECTION_POINTS: u32 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Malformed {0}")]
    Malformed(String),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl SchemaError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        SchemaError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Describes the record shape requested from a structured completion.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputShape {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, SchemaError> {
    serde_json::from_value(value).map_err(|e| SchemaError::Malformed(format!("{what}: {e}")))
}

//=========================================================================================
// Input Validation
//=========================================================================================

/// Rejects blank required text fields.
pub fn require_text(field: &str, value: &str) -> Result<(), SchemaError> {
    if value.trim().is_empty() {
        return Err(SchemaError::invalid(field, "must not be empty"));
    }
    Ok(())
}

/// Checks for the `data:<mimetype>;base64,<encoded_data>` form.
pub fn validate_data_uri(field: &str, value: &str) -> Result<(), SchemaError> {
    let rest = value
        .strip_prefix("data:")
        .ok_or_else(|| SchemaError::invalid(field, "expected a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| SchemaError::invalid(field, "data URI has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| SchemaError::invalid(field, "data URI must be base64 encoded"))?;

    let valid_mime = mime
        .split_once('/')
        .is_some_and(|(kind, sub)| !kind.is_empty() && !sub.is_empty());
    if !valid_mime {
        return Err(SchemaError::invalid(field, "data URI must carry a MIME type"));
    }

    let valid_payload = !payload.is_empty()
        && payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='));
    if !valid_payload {
        return Err(SchemaError::invalid(field, "data URI payload is not base64"));
    }
    Ok(())
}

pub fn validate_essay(essay: &str) -> Result<(), SchemaError> {
    if essay.trim().chars().count() < MIN_ESSAY_CHARS {
        return Err(SchemaError::invalid(
            "essay",
            format!("must be at least {MIN_ESSAY_CHARS} characters long"),
        ));
    }
    Ok(())
}

//=========================================================================================
// Course Generation Output
//=========================================================================================

/// The validated primary output of the tutor prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorDraft {
    pub explanation: String,
    pub course: Option<CourseArtifact>,
    pub reflection_prompt: Option<String>,
    pub related_resources: Vec<RelatedResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTutorOutput {
    #[serde(default)]
    explanation: String,
    course: Option<CourseArtifact>,
    reflection_prompt: Option<String>,
    #[serde(default)]
    related_resources: Vec<RawResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    title: String,
    url: String,
    #[serde(rename = "type", default)]
    resource_type: String,
    video_id: Option<String>,
}

pub fn tutor_shape() -> OutputShape {
    OutputShape {
        name: "tutor_course",
        description: "A short explanation, a structured course, a reflection prompt and related resources.",
        schema: json!({
            "type": "object",
            "properties": {
                "explanation": { "type": "string", "description": "A brief, one-paragraph explanation of the topic." },
                "course": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "overview": { "type": "string" },
                        "modules": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "title": { "type": "string" },
                                    "lessons": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "title": { "type": "string" },
                                                "content": { "type": "string", "description": "Markdown using headings, bold text and '- ' list markers." }
                                            },
                                            "required": ["title", "content"]
                                        }
                                    }
                                },
                                "required": ["title", "lessons"]
                            }
                        }
                    },
                    "required": ["title", "overview", "modules"]
                },
                "reflectionPrompt": { "type": "string", "description": "A metacognitive question asking the learner to reflect on what they learned." },
                "relatedResources": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "url": { "type": "string" },
                            "type": { "type": "string", "enum": ["video", "article", "other"] },
                            "videoId": { "type": "string", "description": "The YouTube video ID when the resource is a YouTube video." }
                        },
                        "required": ["title", "url", "type"]
                    }
                }
            },
            "required": ["explanation", "course", "relatedResources"]
        }),
    }
}

pub fn parse_tutor_output(value: Value) -> Result<TutorDraft, SchemaError> {
    let raw: RawTutorOutput = decode(value, "tutor output")?;

    if let Some(course) = &raw.course {
        validate_course(course)?;
    }

    let explanation = if raw.explanation.trim().is_empty() {
        FALLBACK_EXPLANATION.to_string()
    } else {
        raw.explanation
    };

    let related_resources = raw
        .related_resources
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .map(normalize_resource)
        .collect();

    Ok(TutorDraft {
        explanation,
        course: raw.course,
        reflection_prompt: raw.reflection_prompt.filter(|p| !p.trim().is_empty()),
        related_resources,
    })
}

/// A course needs at least one module, and every module at least one lesson.
pub fn validate_course(course: &CourseArtifact) -> Result<(), SchemaError> {
    if course.modules.is_empty() {
        return Err(SchemaError::invalid("course.modules", "course has no modules"));
    }
    if let Some(module) = course.modules.iter().find(|m| m.lessons.is_empty()) {
        return Err(SchemaError::invalid(
            "course.modules.lessons",
            format!("module '{}' has no lessons", module.title),
        ));
    }
    Ok(())
}

fn normalize_resource(raw: RawResource) -> RelatedResource {
    let declared = match raw.resource_type.trim().to_ascii_lowercase().as_str() {
        "video" => ResourceType::Video,
        "article" => ResourceType::Article,
        _ => ResourceType::Other,
    };

    match declared {
        ResourceType::Video => {
            let video_id = raw
                .video_id
                .filter(|id| !id.trim().is_empty())
                .or_else(|| extract_video_id(&raw.url));
            match video_id {
                Some(id) => RelatedResource {
                    title: raw.title,
                    url: raw.url,
                    resource_type: ResourceType::Video,
                    video_id: Some(id),
                },
                None => RelatedResource {
                    title: raw.title,
                    url: raw.url,
                    resource_type: ResourceType::Other,
                    video_id: None,
                },
            }
        }
        other => RelatedResource {
            title: raw.title,
            url: raw.url,
            resource_type: other,
            video_id: None,
        },
    }
}

/// Pulls the 11-character YouTube video id out of a watch, short-link, embed or shorts URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    let re = VIDEO_ID.get_or_init(|| {
        Regex::new(
            r"(?:youtube(?:-nocookie)?\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
        )
        .expect("video id pattern is valid")
    });
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

//=========================================================================================
// Visual Aid Plan
//=========================================================================================

/// The single visual-aid strategy chosen for a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePlan {
    /// Find an existing photo or diagram.
    Search { query: String },
    /// Synthesize a new illustration.
    Generate { prompt: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImagePlan {
    strategy: String,
    image_query: Option<String>,
    image_prompt: Option<String>,
}

pub fn image_plan_shape() -> OutputShape {
    OutputShape {
        name: "visual_aid_plan",
        description: "Choose exactly one way to illustrate the course: search for a real image or generate one.",
        schema: json!({
            "type": "object",
            "properties": {
                "strategy": { "type": "string", "enum": ["search", "generate"] },
                "imageQuery": { "type": "string", "description": "Search terms for a real photo or diagram, when strategy is 'search'." },
                "imagePrompt": { "type": "string", "description": "A creative image-generation prompt, when strategy is 'generate'." }
            },
            "required": ["strategy"]
        }),
    }
}

pub fn parse_image_plan(value: Value) -> Result<ImagePlan, SchemaError> {
    let raw: RawImagePlan = decode(value, "image plan")?;
    let text = |field: &str, v: Option<String>| -> Result<String, SchemaError> {
        v.filter(|s| !s.trim().is_empty())
            .ok_or_else(|| SchemaError::invalid(field, "missing for the chosen strategy"))
    };
    match raw.strategy.trim().to_ascii_lowercase().as_str() {
        "search" => Ok(ImagePlan::Search {
            query: text("imageQuery", raw.image_query)?,
        }),
        "generate" => Ok(ImagePlan::Generate {
            prompt: text("imagePrompt", raw.image_prompt)?,
        }),
        other => Err(SchemaError::invalid(
            "strategy",
            format!("unknown strategy '{other}'"),
        )),
    }
}

//=========================================================================================
// Essay Feedback Output
//=========================================================================================

pub fn essay_feedback_shape() -> OutputShape {
    OutputShape {
        name: "essay_feedback",
        description: "Per-dimension essay feedback and a highlighted revision.",
        schema: json!({
            "type": "object",
            "properties": {
                "grammarFeedback": { "type": "string" },
                "coherenceFeedback": { "type": "string" },
                "relevanceFeedback": { "type": "string" },
                "creativityFeedback": { "type": "string" },
                "overallFeedback": { "type": "string" },
                "highlightedEssay": { "type": "string", "description": "The essay with additions as **text** and deletions as ~~text~~." }
            },
            "required": ["grammarFeedback", "coherenceFeedback", "relevanceFeedback", "creativityFeedback", "overallFeedback", "highlightedEssay"]
        }),
    }
}

pub fn parse_essay_feedback(value: Value) -> Result<EssayFeedback, SchemaError> {
    let feedback: EssayFeedback = decode(value, "essay feedback")?;
    for (field, text) in [
        ("grammarFeedback", &feedback.grammar_feedback),
        ("coherenceFeedback", &feedback.coherence_feedback),
        ("relevanceFeedback", &feedback.relevance_feedback),
        ("creativityFeedback", &feedback.creativity_feedback),
        ("overallFeedback", &feedback.overall_feedback),
    ] {
        require_text(field, text)?;
    }
    Ok(feedback)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayChatReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_essay: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEssayChatReply {
    response: String,
    updated_essay: Option<String>,
}

pub fn essay_chat_shape() -> OutputShape {
    OutputShape {
        name: "essay_chat_reply",
        description: "A conversational reply and, when a revision was requested, the full updated essay.",
        schema: json!({
            "type": "object",
            "properties": {
                "response": { "type": "string" },
                "updatedEssay": { "type": "string", "description": "The complete revised essay using **added** and ~~removed~~ markup." }
            },
            "required": ["response"]
        }),
    }
}

pub fn parse_essay_chat_reply(value: Value) -> Result<EssayChatReply, SchemaError> {
    let raw: RawEssayChatReply = decode(value, "essay chat reply")?;
    require_text("response", &raw.response)?;
    Ok(EssayChatReply {
        response: raw.response,
        updated_essay: raw.updated_essay.filter(|e| !e.trim().is_empty()),
    })
}

//=========================================================================================
// Quiz Output
//=========================================================================================

#[derive(Deserialize)]
struct RawQuiz {
    #[serde(default)]
    questions: Vec<QuizQuestion>,
}

pub fn quiz_shape() -> OutputShape {
    OutputShape {
        name: "quiz",
        description: "A multiple-choice quiz of 5 to 7 questions.",
        schema: json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": { "type": "string" },
                            "options": { "type": "array", "items": { "type": "string" }, "minItems": 4, "maxItems": 4 },
                            "correctAnswer": { "type": "string", "description": "Exactly one of the options." },
                            "explanation": { "type": "string" }
                        },
                        "required": ["question", "options", "correctAnswer", "explanation"]
                    }
                }
            },
            "required": ["questions"]
        }),
    }
}

/// Checks a single question: four options, one of which is the correct answer.
pub fn validate_question(question: &QuizQuestion) -> Result<(), SchemaError> {
    require_text("question", &question.question)?;
    if question.options.len() != 4 {
        return Err(SchemaError::invalid(
            "options",
            format!("expected 4 options, got {}", question.options.len()),
        ));
    }
    if !question.options.contains(&question.correct_answer) {
        return Err(SchemaError::invalid(
            "correctAnswer",
            "is not one of the options",
        ));
    }
    Ok(())
}

/// Keeps the well-formed questions; a quiz with none left is invalid.
pub fn parse_quiz(value: Value) -> Result<Vec<QuizQuestion>, SchemaError> {
    let raw: RawQuiz = decode(value, "quiz")?;
    let questions: Vec<QuizQuestion> = raw
        .questions
        .into_iter()
        .filter(|q| match validate_question(q) {
            Ok(()) => true,
            Err(e) => {
                warn!("Discarding quiz question '{}': {}", q.question, e);
                false
            }
        })
        .collect();

    if questions.is_empty() {
        return Err(SchemaError::invalid("questions", "no valid questions"));
    }
    Ok(questions)
}

//=========================================================================================
// Reflection Output
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReflection {
    feedback: String,
    points_awarded: f64,
}

pub fn reflection_shape() -> OutputShape {
    OutputShape {
        name: "reflection_assessment",
        description: "Encouraging feedback on a learning reflection and a 0-10 point award.",
        schema: json!({
            "type": "object",
            "properties": {
                "feedback": { "type": "string" },
                "pointsAwarded": { "type": "integer", "minimum": 0, "maximum": 10 }
            },
            "required": ["feedback", "pointsAwarded"]
        }),
    }
}

pub fn parse_reflection(value: Value) -> Result<ReflectionAssessment, SchemaError> {
    let raw: RawReflection = decode(value, "reflection assessment")?;
    require_text("feedback", &raw.feedback)?;
    if !raw.points_awarded.is_finite() {
        return Err(SchemaError::invalid("pointsAwarded", "not a number"));
    }
    let points = raw.points_awarded.round().clamp(0.0, MAX_REFLECTION_POINTS as f64) as u32;
    Ok(ReflectionAssessment {
        feedback: raw.feedback,
        points_awarded: points,
    })
}

//=========================================================================================
// Talk Buddy, Feature Explanation & Learning Path Output
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBuddyReply {
    response_text: String,
}

pub fn buddy_shape() -> OutputShape {
    OutputShape {
        name: "talk_buddy_reply",
        description: "The language partner's reply.",
        schema: json!({
            "type": "object",
            "properties": { "responseText": { "type": "string" } },
            "required": ["responseText"]
        }),
    }
}

pub fn parse_buddy_reply(value: Value) -> Result<String, SchemaError> {
    let raw: RawBuddyReply = decode(value, "talk buddy reply")?;
    require_text("responseText", &raw.response_text)?;
    Ok(raw.response_text)
}

#[derive(Deserialize)]
struct RawFeatureExplanation {
    explanation: String,
}

pub fn feature_explanation_shape() -> OutputShape {
    OutputShape {
        name: "feature_explanation",
        description: "A Markdown explanation of a platform feature.",
        schema: json!({
            "type": "object",
            "properties": { "explanation": { "type": "string" } },
            "required": ["explanation"]
        }),
    }
}

pub fn parse_feature_explanation(value: Value) -> Result<String, SchemaError> {
    let raw: RawFeatureExplanation = decode(value, "feature explanation")?;
    require_text("explanation", &raw.explanation)?;
    Ok(raw.explanation)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub module_recommendations: Vec<String>,
    pub reasoning: String,
}

pub fn learning_path_shape() -> OutputShape {
    OutputShape {
        name: "learning_path",
        description: "Recommended learning modules and the reasoning behind them.",
        schema: json!({
            "type": "object",
            "properties": {
                "moduleRecommendations": { "type": "array", "items": { "type": "string" } },
                "reasoning": { "type": "string" }
            },
            "required": ["moduleRecommendations", "reasoning"]
        }),
    }
}

pub fn parse_learning_path(value: Value) -> Result<LearningPath, SchemaError> {
    let mut path: LearningPath = decode(value, "learning path")?;
    path.module_recommendations.retain(|m| !m.trim().is_empty());
    if path.module_recommendations.is_empty() {
        return Err(SchemaError::invalid(
            "moduleRecommendations",
            "no modules recommended",
        ));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct: &str) -> Value {
        json!({
            "question": "What is 2 + 2?",
            "options": options,
            "correctAnswer": correct,
            "explanation": "Basic arithmetic."
        })
    }

    #[test]
    fn data_uri_requires_mime_and_base64_payload() {
        assert!(validate_data_uri("image", "data:image/png;base64,iVBORw0KGgo=").is_ok());
        assert!(validate_data_uri("image", "https://example.com/cat.png").is_err());
        assert!(validate_data_uri("image", "data:;base64,AAAA").is_err());
        assert!(validate_data_uri("image", "data:image/png,AAAA").is_err());
        assert!(validate_data_uri("image", "data:image/png;base64,").is_err());
        assert!(validate_data_uri("image", "data:image/png;base64,not base64!").is_err());
    }

    #[test]
    fn short_essays_are_rejected() {
        assert!(validate_essay("Too short.").is_err());
        assert!(validate_essay(&"word ".repeat(12)).is_ok());
    }

    #[test]
    fn video_ids_are_extracted_from_common_url_forms() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
        assert_eq!(extract_video_id("https://example.com/article"), None);
    }

    #[test]
    fn resources_carry_a_video_id_exactly_when_they_are_videos() {
        let draft = parse_tutor_output(json!({
            "explanation": "Photosynthesis turns light into chemical energy.",
            "relatedResources": [
                { "title": "Lecture", "url": "https://www.youtube.com/watch?v=abcdefghijk", "type": "video" },
                { "title": "Clip", "url": "https://vimeo.com/12345", "type": "video" },
                { "title": "Notes", "url": "https://example.com/notes", "type": "article", "videoId": "abcdefghijk" },
                { "title": "Given", "url": "https://example.com/v", "type": "Video", "videoId": "zyxwvutsrqp" }
            ]
        }))
        .unwrap();

        for resource in &draft.related_resources {
            assert_eq!(
                resource.resource_type == ResourceType::Video,
                resource.video_id.is_some(),
                "{resource:?}"
            );
        }
        assert_eq!(draft.related_resources[0].video_id.as_deref(), Some("abcdefghijk"));
        assert_eq!(draft.related_resources[1].resource_type, ResourceType::Other);
        assert_eq!(draft.related_resources[2].video_id, None);
        assert_eq!(draft.related_resources[3].video_id.as_deref(), Some("zyxwvutsrqp"));
    }

    #[test]
    fn courses_without_lessons_are_rejected() {
        let err = parse_tutor_output(json!({
            "explanation": "x",
            "course": { "title": "T", "overview": "O", "modules": [ { "title": "M", "lessons": [] } ] }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Invalid { .. }));

        let err = parse_tutor_output(json!({
            "explanation": "x",
            "course": { "title": "T", "overview": "O", "modules": [] }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Invalid { .. }));
    }

    #[test]
    fn blank_explanation_falls_back() {
        let draft = parse_tutor_output(json!({ "explanation": "  " })).unwrap();
        assert_eq!(draft.explanation, FALLBACK_EXPLANATION);
        assert!(draft.related_resources.is_empty());
    }

    #[test]
    fn image_plan_picks_one_strategy() {
        let plan = parse_image_plan(json!({ "strategy": "search", "imageQuery": "human heart diagram" }))
            .unwrap();
        assert_eq!(plan, ImagePlan::Search { query: "human heart diagram".into() });

        let plan = parse_image_plan(json!({ "strategy": "generate", "imagePrompt": "a watercolor cell" }))
            .unwrap();
        assert_eq!(plan, ImagePlan::Generate { prompt: "a watercolor cell".into() });

        assert!(parse_image_plan(json!({ "strategy": "generate" })).is_err());
        assert!(parse_image_plan(json!({ "strategy": "both" })).is_err());
    }

    #[test]
    fn invalid_quiz_questions_are_discarded() {
        let questions = parse_quiz(json!({
            "questions": [
                question(&["1", "2", "3", "4"], "4"),
                question(&["1", "2", "3", "4"], "5"),
                question(&["1", "2", "4"], "4"),
            ]
        }))
        .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, "4");

        assert!(parse_quiz(json!({ "questions": [question(&["1", "2", "3", "4"], "9")] })).is_err());
        assert!(parse_quiz(json!({})).is_err());
    }

    #[test]
    fn reflection_points_are_clamped() {
        let a = parse_reflection(json!({ "feedback": "Great insight!", "pointsAwarded": 14 })).unwrap();
        assert_eq!(a.points_awarded, 10);
        let a = parse_reflection(json!({ "feedback": "Keep going.", "pointsAwarded": -2 })).unwrap();
        assert_eq!(a.points_awarded, 0);
        let a = parse_reflection(json!({ "feedback": "Nice.", "pointsAwarded": 6.6 })).unwrap();
        assert_eq!(a.points_awarded, 7);
    }

    #[test]
    fn essay_feedback_requires_every_dimension() {
        let mut value = json!({
            "grammarFeedback": "Good.",
            "coherenceFeedback": "Flows well.",
            "relevanceFeedback": "On topic.",
            "creativityFeedback": "Original.",
            "overallFeedback": "Solid work.",
            "highlightedEssay": "The **new** ~~old~~ text."
        });
        assert!(parse_essay_feedback(value.clone()).is_ok());
        value["coherenceFeedback"] = json!("");
        assert!(parse_essay_feedback(value).is_err());
    }

    #[test]
    fn empty_updated_essay_is_treated_as_absent() {
        let reply = parse_essay_chat_reply(json!({ "response": "Sure!", "updatedEssay": "" })).unwrap();
        assert_eq!(reply.updated_essay, None);
    }
}
