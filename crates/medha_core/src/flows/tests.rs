use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use super::essay::{essay_feedback, essay_feedback_chat, EssayChatRequest, EssayFeedbackRequest};
use super::explain::{explain_feature, personalized_learning_path, LearningPathRequest};
use super::my_tutor::{my_tutor, TutorRequest};
use super::profile::{ensure_profile, get_conversation, update_settings};
use super::quiz::{generate_quiz, grade_quiz, GradeQuizRequest};
use super::reflection::analyze_reflection;
use super::talk_buddy::{talk_buddy, TalkBuddyRequest};
use super::{FlowError, MAX_INLINE_MEDIA_LEN};
use crate::domain::{ChatMessage, ProfileSettings, QuizAnswer, QuizQuestion, Sender};
use crate::highlight::{self, Span};
use crate::ports::{
    DatabaseService, ImageGenerationService, ModelPrompt, PortResult, StructuredCompletionService,
};
use crate::schema::OutputShape;
use crate::testing::{Fakes, FAKE_AUDIO_URL, FAKE_IMAGE_URL, FAKE_SEARCH_URL};

//=========================================================================================
// Fixtures
//=========================================================================================

fn course_json() -> Value {
    json!({
        "explanation": "Photosynthesis is how plants turn light into chemical energy.",
        "course": {
            "title": "Photosynthesis 101",
            "overview": "From photons to glucose.",
            "modules": [
                {
                    "title": "Light Reactions",
                    "lessons": [
                        { "title": "Chlorophyll", "content": "# Chlorophyll\n- Absorbs red and blue light" },
                        { "title": "Electron Transport", "content": "## ETC\n- Builds a proton gradient" }
                    ]
                },
                {
                    "title": "Calvin Cycle",
                    "lessons": [ { "title": "Carbon Fixation", "content": "- RuBisCO fixes CO2" } ]
                }
            ]
        },
        "reflectionPrompt": "Which step was hardest to picture, and why?",
        "relatedResources": [
            { "title": "Crash Course", "url": "https://www.youtube.com/watch?v=sQK3Yr4Sc_k", "type": "video" },
            { "title": "Khan Academy", "url": "https://www.khanacademy.org/photosynthesis", "type": "article" }
        ]
    })
}

fn tutor_request(owner_id: Uuid) -> TutorRequest {
    TutorRequest {
        owner_id,
        prompt: "Photosynthesis".to_string(),
        source_material: None,
        structure_hint: None,
        research_mode: false,
        image: None,
    }
}

fn script_tutor(fakes: &Fakes, strategy: &str) {
    fakes.completion.reply("tutor_course", course_json());
    let plan = match strategy {
        "search" => json!({ "strategy": "search", "imageQuery": "chloroplast micrograph" }),
        _ => json!({ "strategy": "generate", "imagePrompt": "a leaf drinking sunlight, watercolor" }),
    };
    fakes.completion.reply("visual_aid_plan", plan);
}

fn feedback_json() -> Value {
    json!({
        "grammarFeedback": "Mostly correct; watch subject-verb agreement.",
        "coherenceFeedback": "Paragraphs flow logically.",
        "relevanceFeedback": "Stays on the topic of climate change.",
        "creativityFeedback": "The opening anecdote is engaging.",
        "overallFeedback": "A strong essay with room to tighten the conclusion.",
        "highlightedEssay": "Climate change ~~are~~ **is** a global problem."
    })
}

fn essay_text() -> String {
    "Climate change are a global problem that affects every country and every person on Earth."
        .to_string()
}

fn question(text: &str, correct: &str) -> QuizQuestion {
    QuizQuestion {
        question: text.to_string(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: correct.to_string(),
        explanation: "...".to_string(),
    }
}

//=========================================================================================
// Course Generation
//=========================================================================================

#[tokio::test]
async fn tutor_returns_a_complete_saved_course() {
    let fakes = Fakes::new();
    script_tutor(&fakes, "generate");
    let owner = Uuid::new_v4();

    let result = my_tutor(&fakes.context(), tutor_request(owner)).await.unwrap();

    assert!(!result.explanation.is_empty());
    let course = result.course.as_ref().unwrap();
    assert_eq!(course.modules.len(), 2);
    assert!(course.modules.iter().all(|m| !m.lessons.is_empty()));
    assert_eq!(result.related_resources.len(), 2);
    assert_eq!(result.related_resources[0].video_id.as_deref(), Some("sQK3Yr4Sc_k"));
    assert_eq!(result.image_url.as_deref(), Some(FAKE_IMAGE_URL));
    assert_eq!(result.audio_url.as_deref(), Some(FAKE_AUDIO_URL));
    assert_eq!(result.prompt.as_deref(), Some("Photosynthesis"));
    assert!(result.id.is_some());
    assert!(result.created_at.is_some());

    let stored = fakes.db.stored_courses();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, owner);
    assert_eq!(stored[0].1.id, result.id);
}

#[tokio::test]
async fn tutor_runs_exactly_one_image_strategy() {
    let fakes = Fakes::new();
    script_tutor(&fakes, "generate");
    my_tutor(&fakes.context(), tutor_request(Uuid::new_v4())).await.unwrap();
    assert_eq!(fakes.images.calls(), 1);
    assert_eq!(fakes.image_search.calls(), 0);

    let fakes = Fakes::new();
    script_tutor(&fakes, "search");
    let result = my_tutor(&fakes.context(), tutor_request(Uuid::new_v4())).await.unwrap();
    assert_eq!(fakes.images.calls(), 0);
    assert_eq!(fakes.image_search.calls(), 1);
    assert_eq!(result.image_url.as_deref(), Some(FAKE_SEARCH_URL));
}

#[tokio::test]
async fn tutor_fails_without_primary_output_and_saves_nothing() {
    let fakes = Fakes::new();
    fakes.completion.reply_empty("tutor_course");

    let err = my_tutor(&fakes.context(), tutor_request(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::NoOutput(_)));
    assert!(fakes.db.stored_courses().is_empty());
    assert_eq!(fakes.speech.calls(), 0);
    assert_eq!(fakes.images.calls(), 0);
}

#[tokio::test]
async fn tutor_rejects_a_course_with_an_empty_module() {
    let fakes = Fakes::new();
    let mut value = course_json();
    value["course"]["modules"][1]["lessons"] = json!([]);
    fakes.completion.reply("tutor_course", value);

    let err = my_tutor(&fakes.context(), tutor_request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::NoOutput(_)));
}

#[tokio::test]
async fn tutor_propagates_primary_call_errors() {
    let fakes = Fakes::new();
    fakes.completion.fail("tutor_course", "service unavailable");

    let err = my_tutor(&fakes.context(), tutor_request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Port(_)));
}

#[tokio::test]
async fn tutor_degrades_when_media_generation_fails() {
    for (image_fails, speech_fails) in [(true, false), (false, true), (true, true)] {
        let fakes = Fakes::new();
        script_tutor(&fakes, "generate");
        fakes.images.set_failing(image_fails);
        fakes.speech.set_failing(speech_fails);

        let result = my_tutor(&fakes.context(), tutor_request(Uuid::new_v4()))
            .await
            .unwrap();

        assert!(!result.explanation.is_empty());
        assert_eq!(result.image_url.is_none(), image_fails, "image fails: {image_fails}");
        assert_eq!(result.audio_url.is_none(), speech_fails, "speech fails: {speech_fails}");
        assert!(result.id.is_some());
    }
}

#[tokio::test]
async fn tutor_skips_the_image_when_no_plan_is_produced() {
    let fakes = Fakes::new();
    fakes.completion.reply("tutor_course", course_json());

    let result = my_tutor(&fakes.context(), tutor_request(Uuid::new_v4()))
        .await
        .unwrap();
    assert!(result.image_url.is_none());
    assert_eq!(fakes.images.calls() + fakes.image_search.calls(), 0);
    assert!(result.audio_url.is_some());
}

#[tokio::test]
async fn tutor_returns_content_even_when_saving_fails() {
    let fakes = Fakes::new();
    script_tutor(&fakes, "generate");
    fakes.db.set_failing_writes(true);

    let result = my_tutor(&fakes.context(), tutor_request(Uuid::new_v4()))
        .await
        .unwrap();
    assert!(result.course.is_some());
    assert!(result.id.is_none());
    assert!(result.created_at.is_none());
}

#[tokio::test]
async fn tutor_does_not_store_oversized_images() {
    let fakes = Fakes::new();
    script_tutor(&fakes, "generate");
    let huge = format!("data:image/png;base64,{}", "A".repeat(MAX_INLINE_MEDIA_LEN));
    let images: Arc<dyn ImageGenerationService> =
        Arc::new(crate::testing::FakeMedia::new(huge.clone()));
    let mut ctx = fakes.context();
    ctx.images = images;

    let result = my_tutor(&ctx, tutor_request(Uuid::new_v4())).await.unwrap();
    assert_eq!(result.image_url.as_deref(), Some(huge.as_str()));
    let stored = fakes.db.stored_courses();
    assert!(stored[0].1.image_url.is_none());
    assert!(stored[0].1.audio_url.is_some());
}

#[tokio::test]
async fn tutor_rejects_invalid_input_before_calling_the_model() {
    let fakes = Fakes::new();
    let mut request = tutor_request(Uuid::new_v4());
    request.image = Some("not-a-data-uri".into());

    let err = my_tutor(&fakes.context(), request).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput(_)));
    assert!(fakes.completion.calls().is_empty());
}

#[tokio::test]
async fn tutor_sends_the_attached_image_with_the_prompt() {
    let fakes = Fakes::new();
    script_tutor(&fakes, "generate");
    let mut request = tutor_request(Uuid::new_v4());
    request.image = Some("data:image/jpeg;base64,/9j/4AAQ".into());
    request.research_mode = true;

    my_tutor(&fakes.context(), request).await.unwrap();
    let (shape, prompt) = fakes.completion.calls().remove(0);
    assert_eq!(shape, "tutor_course");
    assert_eq!(prompt.image.as_deref(), Some("data:image/jpeg;base64,/9j/4AAQ"));
    assert!(prompt.text.contains("research mode"));
}

struct SlowCompletion;

#[async_trait]
impl StructuredCompletionService for SlowCompletion {
    async fn complete_structured(
        &self,
        _prompt: &ModelPrompt,
        _shape: &OutputShape,
    ) -> PortResult<Option<Value>> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(None)
    }
}

#[tokio::test]
async fn primary_calls_are_bounded_by_the_configured_timeout() {
    let fakes = Fakes::new();
    let slow: Arc<dyn StructuredCompletionService> = Arc::new(SlowCompletion);
    let mut ctx = fakes.context();
    ctx.completion = slow;
    ctx.timeouts.primary = Duration::from_millis(20);

    let err = my_tutor(&ctx, tutor_request(Uuid::new_v4())).await.unwrap_err();
    assert!(matches!(err, FlowError::Timeout("tutor_course", _)));
}

//=========================================================================================
// Essay Feedback
//=========================================================================================

#[tokio::test]
async fn essay_feedback_returns_every_dimension_and_an_id() {
    let fakes = Fakes::new();
    fakes.completion.reply("essay_feedback", feedback_json());
    let owner = Uuid::new_v4();

    let result = essay_feedback(
        &fakes.context(),
        EssayFeedbackRequest {
            owner_id: owner,
            essay: essay_text(),
            topic: "Climate Change".into(),
            grade_level: "High School".into(),
        },
    )
    .await
    .unwrap();

    let f = &result.feedback;
    for text in [
        &f.grammar_feedback,
        &f.coherence_feedback,
        &f.relevance_feedback,
        &f.creativity_feedback,
        &f.overall_feedback,
    ] {
        assert!(!text.is_empty());
    }
    let spans = highlight::spans(&f.highlighted_essay);
    assert!(spans.contains(&Span::Removed("are")));
    assert!(spans.contains(&Span::Added("is")));

    let essay_id = result.essay_id.unwrap();
    let stored = fakes.db.stored_essays();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, essay_id);
    assert_eq!(stored[0].user_id, owner);
}

#[tokio::test]
async fn essay_feedback_rejects_short_essays() {
    let fakes = Fakes::new();
    let err = essay_feedback(
        &fakes.context(),
        EssayFeedbackRequest {
            owner_id: Uuid::new_v4(),
            essay: "Too short.".into(),
            topic: "Climate Change".into(),
            grade_level: "High School".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput(_)));
    assert!(fakes.completion.calls().is_empty());
}

#[tokio::test]
async fn essay_chat_returns_a_revision_without_saving() {
    let fakes = Fakes::new();
    fakes.completion.reply(
        "essay_chat_reply",
        json!({ "response": "Here is a tighter version.", "updatedEssay": "Climate change **is** ~~a~~ global." }),
    );
    let initial: crate::domain::EssayFeedback = serde_json::from_value(feedback_json()).unwrap();

    let reply = essay_feedback_chat(
        &fakes.context(),
        EssayChatRequest {
            essay: essay_text(),
            topic: "Climate Change".into(),
            grade_level: "High School".into(),
            initial_feedback: initial,
            chat_history: vec![ChatMessage::user("Thanks!"), ChatMessage::bot("You're welcome.", None)],
            query: "Can you shorten it?".into(),
        },
    )
    .await
    .unwrap();

    assert_eq!(reply.response, "Here is a tighter version.");
    assert!(reply.updated_essay.is_some());
    assert!(fakes.db.stored_essays().is_empty());
}

#[tokio::test]
async fn essay_feedback_is_returned_when_saving_fails() {
    let fakes = Fakes::new();
    fakes.completion.reply("essay_feedback", feedback_json());
    fakes.db.set_failing_writes(true);

    let result = essay_feedback(
        &fakes.context(),
        EssayFeedbackRequest {
            owner_id: Uuid::new_v4(),
            essay: essay_text(),
            topic: "Climate Change".into(),
            grade_level: "High School".into(),
        },
    )
    .await
    .unwrap();

    assert!(!result.feedback.overall_feedback.is_empty());
    assert!(result.essay_id.is_none());
    assert!(fakes.db.stored_essays().is_empty());
}

#[tokio::test]
async fn essay_chat_requires_topic_and_grade_level() {
    let fakes = Fakes::new();
    let initial: crate::domain::EssayFeedback = serde_json::from_value(feedback_json()).unwrap();

    for (topic, grade_level) in [("  ", "High School"), ("Climate Change", "")] {
        let err = essay_feedback_chat(
            &fakes.context(),
            EssayChatRequest {
                essay: essay_text(),
                topic: topic.into(),
                grade_level: grade_level.into(),
                initial_feedback: initial.clone(),
                chat_history: vec![],
                query: "Can you shorten it?".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(_)));
    }
    assert!(fakes.completion.calls().is_empty());
}

//=========================================================================================
// Quizzes & Reflections
//=========================================================================================

#[tokio::test]
async fn quiz_grading_scores_and_credits_points() {
    let fakes = Fakes::new();
    let owner = Uuid::new_v4();
    let request = GradeQuizRequest {
        owner_id: Some(owner),
        questions: vec![question("Q1", "B")],
        user_answers: vec![QuizAnswer {
            question: "Q1".into(),
            selected_answer: "B".into(),
        }],
    };

    let result = grade_quiz(&fakes.context(), request.clone()).await.unwrap();
    assert_eq!(result.score, 100);
    assert_eq!(result.points_awarded, 5);
    assert!(result.feedback[0].is_correct);
    assert_eq!(fakes.db.student_score(owner), 5);

    let again = grade_quiz(&fakes.context(), request).await.unwrap();
    assert_eq!(again, result);
    assert_eq!(fakes.db.student_score(owner), 10);
}

#[tokio::test]
async fn grading_an_empty_quiz_scores_zero_and_credits_nothing() {
    let fakes = Fakes::new();
    let owner = Uuid::new_v4();
    let result = grade_quiz(
        &fakes.context(),
        GradeQuizRequest {
            owner_id: Some(owner),
            questions: vec![],
            user_answers: vec![],
        },
    )
    .await
    .unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.points_awarded, 0);
    assert_eq!(fakes.db.student_score(owner), 0);
}

#[tokio::test]
async fn grading_rejects_malformed_questions() {
    let fakes = Fakes::new();
    let owner = Uuid::new_v4();
    let no_options = QuizQuestion {
        options: vec![],
        ..question("Q1", "Z")
    };
    let answer_not_offered = question("Q2", "Z");

    for bad in [no_options, answer_not_offered] {
        let err = grade_quiz(
            &fakes.context(),
            GradeQuizRequest {
                owner_id: Some(owner),
                questions: vec![question("Q0", "A"), bad.clone()],
                user_answers: vec![
                    QuizAnswer {
                        question: "Q0".into(),
                        selected_answer: "A".into(),
                    },
                    QuizAnswer {
                        question: bad.question.clone(),
                        selected_answer: "Z".into(),
                    },
                ],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(_)));
    }
    assert_eq!(fakes.db.student_score(owner), 0);
}

#[tokio::test]
async fn grading_succeeds_when_the_score_cannot_be_saved() {
    let fakes = Fakes::new();
    fakes.db.set_failing_writes(true);
    let owner = Uuid::new_v4();

    let result = grade_quiz(
        &fakes.context(),
        GradeQuizRequest {
            owner_id: Some(owner),
            questions: vec![question("Q1", "C")],
            user_answers: vec![QuizAnswer {
                question: "Q1".into(),
                selected_answer: "C".into(),
            }],
        },
    )
    .await
    .unwrap();

    assert_eq!(result.score, 100);
    assert_eq!(result.points_awarded, 5);
    assert_eq!(fakes.db.student_score(owner), 0);
}

#[tokio::test]
async fn quiz_generation_keeps_valid_questions() {
    let fakes = Fakes::new();
    fakes.completion.reply(
        "quiz",
        json!({ "questions": [
            { "question": "Where do light reactions happen?", "options": ["Thylakoid", "Stroma", "Nucleus", "Cytoplasm"], "correctAnswer": "Thylakoid", "explanation": "Membrane-bound." },
            { "question": "Broken", "options": ["a", "b", "c", "d"], "correctAnswer": "e", "explanation": "?" }
        ]}),
    );
    let questions = generate_quiz(&fakes.context(), "Photosynthesis course text")
        .await
        .unwrap();
    assert_eq!(questions.len(), 1);

    fakes.completion.reply_empty("quiz");
    let err = generate_quiz(&fakes.context(), "Photosynthesis course text")
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::NoOutput(_)));
}

#[tokio::test]
async fn reflection_points_are_added_to_the_score() {
    let fakes = Fakes::new();
    let owner = Uuid::new_v4();
    fakes.completion.reply(
        "reflection_assessment",
        json!({ "feedback": "Great self-awareness!", "pointsAwarded": 8 }),
    );
    fakes.completion.reply(
        "reflection_assessment",
        json!({ "feedback": "Try to be more specific.", "pointsAwarded": 0 }),
    );

    let first = analyze_reflection(&fakes.context(), owner, "I struggled with async because...")
        .await
        .unwrap();
    assert_eq!(first.points_awarded, 8);
    let second = analyze_reflection(&fakes.context(), owner, "I learned a lot.")
        .await
        .unwrap();
    assert_eq!(second.points_awarded, 0);
    assert_eq!(fakes.db.student_score(owner), 8);
}

//=========================================================================================
// Talk Buddy
//=========================================================================================

#[tokio::test]
async fn conversations_continue_across_turns() {
    let fakes = Fakes::new();
    let owner = Uuid::new_v4();
    fakes.completion.reply("talk_buddy_reply", json!({ "responseText": "¡Hola! ¿Qué tal?" }));
    fakes.completion.reply("talk_buddy_reply", json!({ "responseText": "Muy bien, gracias." }));
    let ctx = fakes.context();

    let first = talk_buddy(
        &ctx,
        TalkBuddyRequest {
            owner_id: Some(owner),
            prompt: "Hola".into(),
            language: "Spanish".into(),
            messages: vec![],
            conversation_id: None,
        },
    )
    .await
    .unwrap();
    let conversation_id = first.conversation_id.unwrap();

    let second = talk_buddy(
        &ctx,
        TalkBuddyRequest {
            owner_id: Some(owner),
            prompt: "¿Cómo estás?".into(),
            language: "Spanish".into(),
            messages: vec![
                ChatMessage::user("Hola"),
                ChatMessage::bot(first.response_text.clone(), None),
            ],
            conversation_id: Some(conversation_id),
        },
    )
    .await
    .unwrap();
    assert_eq!(second.conversation_id, Some(conversation_id));

    let record = get_conversation(&ctx, owner, conversation_id).await.unwrap();
    let texts: Vec<(Sender, &str)> = record
        .messages
        .iter()
        .map(|m| (m.sender, m.text.as_str()))
        .collect();
    assert_eq!(
        texts,
        vec![
            (Sender::User, "Hola"),
            (Sender::Bot, "¡Hola! ¿Qué tal?"),
            (Sender::User, "¿Cómo estás?"),
            (Sender::Bot, "Muy bien, gracias."),
        ]
    );
    assert_eq!(record.title, "Hola");
}

#[tokio::test]
async fn talk_buddy_replies_without_audio_when_speech_fails() {
    let fakes = Fakes::new();
    fakes.speech.set_failing(true);
    fakes.completion.reply("talk_buddy_reply", json!({ "responseText": "Hello there!" }));

    let reply = talk_buddy(
        &fakes.context(),
        TalkBuddyRequest {
            owner_id: Some(Uuid::new_v4()),
            prompt: "Hi".into(),
            language: "English".into(),
            messages: vec![],
            conversation_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(reply.response_text, "Hello there!");
    assert!(reply.audio_url.is_none());
    assert!(reply.conversation_id.is_some());
}

#[tokio::test]
async fn talk_buddy_without_an_owner_is_not_saved() {
    let fakes = Fakes::new();
    fakes.completion.reply("talk_buddy_reply", json!({ "responseText": "Namaste!" }));

    let reply = talk_buddy(
        &fakes.context(),
        TalkBuddyRequest {
            owner_id: None,
            prompt: "Namaste".into(),
            language: "Hindi".into(),
            messages: vec![],
            conversation_id: None,
        },
    )
    .await
    .unwrap();
    assert!(reply.conversation_id.is_none());
    assert_eq!(reply.audio_url.as_deref(), Some(FAKE_AUDIO_URL));
}

#[tokio::test]
async fn talk_buddy_fails_without_a_text_reply() {
    let fakes = Fakes::new();
    let err = talk_buddy(
        &fakes.context(),
        TalkBuddyRequest {
            owner_id: Some(Uuid::new_v4()),
            prompt: "Hi".into(),
            language: "English".into(),
            messages: vec![],
            conversation_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FlowError::NoOutput(_)));
    assert_eq!(fakes.speech.calls(), 0);
}

#[tokio::test]
async fn talk_buddy_replies_when_the_turn_cannot_be_saved() {
    let fakes = Fakes::new();
    fakes.db.set_failing_writes(true);
    fakes.completion.reply("talk_buddy_reply", json!({ "responseText": "Guten Tag!" }));

    let reply = talk_buddy(
        &fakes.context(),
        TalkBuddyRequest {
            owner_id: Some(Uuid::new_v4()),
            prompt: "Hallo".into(),
            language: "German".into(),
            messages: vec![],
            conversation_id: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(reply.response_text, "Guten Tag!");
    assert!(reply.conversation_id.is_none());
}

#[tokio::test]
async fn another_users_thread_id_starts_a_fresh_conversation() {
    let fakes = Fakes::new();
    let ctx = fakes.context();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    fakes.completion.reply("talk_buddy_reply", json!({ "responseText": "Ciao Alice!" }));
    fakes.completion.reply("talk_buddy_reply", json!({ "responseText": "Ciao Bob!" }));

    let alices = talk_buddy(
        &ctx,
        TalkBuddyRequest {
            owner_id: Some(alice),
            prompt: "Ciao".into(),
            language: "Italian".into(),
            messages: vec![],
            conversation_id: None,
        },
    )
    .await
    .unwrap()
    .conversation_id
    .unwrap();

    let reply = talk_buddy(
        &ctx,
        TalkBuddyRequest {
            owner_id: Some(bob),
            prompt: "Buongiorno".into(),
            language: "Italian".into(),
            messages: vec![],
            conversation_id: Some(alices),
        },
    )
    .await
    .unwrap();

    let bobs = reply.conversation_id.unwrap();
    assert_ne!(bobs, alices);
    let record = get_conversation(&ctx, bob, bobs).await.unwrap();
    assert_eq!(record.messages.len(), 2);
    assert_eq!(record.messages[0].text, "Buongiorno");

    let untouched = get_conversation(&ctx, alice, alices).await.unwrap();
    assert_eq!(untouched.messages.len(), 2);
    assert_eq!(untouched.messages[1].text, "Ciao Alice!");
}

//=========================================================================================
// Supplementary Flows & Profiles
//=========================================================================================

#[tokio::test]
async fn feature_explanations_and_learning_paths() {
    let fakes = Fakes::new();
    fakes.completion.reply(
        "feature_explanation",
        json!({ "explanation": "## Talk Buddy\nPractice any language out loud." }),
    );
    fakes.completion.reply(
        "learning_path",
        json!({ "moduleRecommendations": ["Statistics", "Linear Algebra"], "reasoning": "Foundations first." }),
    );
    let ctx = fakes.context();

    let explanation = explain_feature(&ctx, "Talk Buddy", "Conversational practice")
        .await
        .unwrap();
    assert!(explanation.starts_with("## Talk Buddy"));

    let path = personalized_learning_path(
        &ctx,
        LearningPathRequest {
            student_id: "student-1".into(),
            performance_data: json!({ "Algebra": 92 }),
            career_path: "Data Science".into(),
            academic_level: "Undergraduate".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(path.module_recommendations, vec!["Statistics", "Linear Algebra"]);
}

#[tokio::test]
async fn profiles_keep_their_score_and_merge_settings() {
    let fakes = Fakes::new();
    let ctx = fakes.context();
    let uid = Uuid::new_v4();

    let profile = ensure_profile(&ctx, uid, Some("Asha"), Some("asha@example.com"))
        .await
        .unwrap();
    assert_eq!(profile.student_score, 0);

    fakes.db.increment_student_score(uid, 15).await.unwrap();
    let again = ensure_profile(&ctx, uid, Some("Asha"), None).await.unwrap();
    assert_eq!(again.student_score, 15);

    let first = ProfileSettings {
        career_path: Some("Medicine".into()),
        academic_level: Some("High School".into()),
        ..Default::default()
    };
    update_settings(&ctx, uid, first).await.unwrap();
    let second = ProfileSettings {
        learning_goal: Some("Pass biology".into()),
        ..Default::default()
    };
    let merged = update_settings(&ctx, uid, second).await.unwrap();
    assert_eq!(merged.settings.career_path.as_deref(), Some("Medicine"));
    assert_eq!(merged.settings.learning_goal.as_deref(), Some("Pass biology"));
    assert!(merged.settings.has_completed_onboarding());
    assert_eq!(merged.student_score, 15);
}
