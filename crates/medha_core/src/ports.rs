//! crates/medha_core/src/ports.rs
//!
//! The seams between the flows and the outside world: the language model,
//! the two image sources, speech synthesis and the record store. Adapters in
//! the `api` service implement these; tests use in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ConversationRecord, ConversationTurn, EssayRecord, GenerationResult, ProfileSettings,
    UserProfile,
};
use crate::schema::OutputShape;

/// Adapters collapse vendor and driver errors into these two cases.
/// `NotFound` also covers records owned by another user.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unexpected(String),
}

pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Model Ports (Traits)
//=========================================================================================

/// A rendered prompt, optionally carrying an inline image (a base64 data URI)
/// for multimodal models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPrompt {
    pub text: String,
    pub image: Option<String>,
}

impl ModelPrompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

#[async_trait]
pub trait StructuredCompletionService: Send + Sync {
    /// Sends `prompt` to the model, asking for a JSON value conforming to `shape`.
    ///
    /// `Ok(None)` means the model answered but produced nothing parseable.
    async fn complete_structured(
        &self,
        prompt: &ModelPrompt,
        shape: &OutputShape,
    ) -> PortResult<Option<serde_json::Value>>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generates an image and returns a media URL or an embedded data URI.
    async fn generate_image(&self, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait ImageSearchService: Send + Sync {
    /// Looks up an existing photo or diagram matching `query`.
    async fn find_image(&self, query: &str) -> PortResult<Option<String>>;
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Synthesizes `text` and returns a playable `data:audio/wav;base64,...` URI.
    async fn generate_speech(&self, text: &str) -> PortResult<String>;
}

//=========================================================================================
// Record Store Port
//=========================================================================================

/// The per-user record store. Every record lives under its owner's namespace;
/// lookups with a foreign owner id report `NotFound`.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    /// Assigns an identifier for a record that has not been written yet.
    fn new_record_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    // --- Profiles ---
    async fn get_or_create_profile(
        &self,
        uid: Uuid,
        display_name: Option<&str>,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> PortResult<UserProfile>;

    async fn get_profile(&self, uid: Uuid) -> PortResult<UserProfile>;

    async fn merge_profile_settings(&self, uid: Uuid, settings: &ProfileSettings)
        -> PortResult<()>;

    /// Atomically adds `amount` to the owner's `student_score`.
    async fn increment_student_score(&self, uid: Uuid, amount: u32) -> PortResult<()>;

    // --- Courses ---
    /// Writes a course whose `id` and `created_at` have already been assigned.
    async fn save_course(&self, owner_id: Uuid, course: &GenerationResult) -> PortResult<()>;

    async fn get_course(&self, owner_id: Uuid, course_id: Uuid) -> PortResult<GenerationResult>;

    /// Newest first.
    async fn list_courses(&self, owner_id: Uuid) -> PortResult<Vec<GenerationResult>>;

    // --- Essays ---
    async fn save_essay(&self, essay: &EssayRecord) -> PortResult<()>;

    async fn get_essay(&self, owner_id: Uuid, essay_id: Uuid) -> PortResult<EssayRecord>;

    async fn list_essays(&self, owner_id: Uuid) -> PortResult<Vec<EssayRecord>>;

    // --- Conversations ---
    /// Appends the turn's messages to the conversation, creating it when absent.
    async fn append_conversation_turn(&self, turn: &ConversationTurn) -> PortResult<()>;

    async fn get_conversation(
        &self,
        owner_id: Uuid,
        conversation_id: Uuid,
    ) -> PortResult<ConversationRecord>;

    async fn list_conversations(&self, owner_id: Uuid) -> PortResult<Vec<ConversationRecord>>;
}
