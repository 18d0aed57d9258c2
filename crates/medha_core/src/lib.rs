pub mod domain;
pub mod flows;
pub mod grading;
pub mod highlight;
pub mod ports;
pub mod prompts;
pub mod schema;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use domain::{
    AnswerFeedback, ChatMessage, ConversationRecord, ConversationTurn, CourseArtifact,
    CourseLesson, CourseModule, EssayFeedback, EssayRecord, GenerationResult, GradeResult,
    ProfileSettings, QuizAnswer, QuizQuestion, ReflectionAssessment, RelatedResource,
    ResourceType, Sender, UserProfile,
};
pub use flows::{CallTimeouts, FlowContext, FlowError, FlowResult};
pub use ports::{
    DatabaseService, ImageGenerationService, ImageSearchService, ModelPrompt, PortError,
    PortResult, StructuredCompletionService, TextToSpeechService,
};
