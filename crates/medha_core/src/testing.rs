//! In-memory implementations of every port, for exercising flows without a model
//! or a database. Enabled for this crate's tests and through the `test-support` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    ConversationRecord, ConversationTurn, EssayRecord, GenerationResult, ProfileSettings,
    UserProfile,
};
use crate::flows::{CallTimeouts, FlowContext};
use crate::ports::{
    DatabaseService, ImageGenerationService, ImageSearchService, ModelPrompt, PortError,
    PortResult, StructuredCompletionService, TextToSpeechService,
};
use crate::schema::OutputShape;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//=========================================================================================
// Model Fakes
//=========================================================================================

/// Replies to structured completions from per-shape queues of scripted responses.
/// An unscripted shape answers `Ok(None)`.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<HashMap<&'static str, VecDeque<PortResult<Option<Value>>>>>,
    calls: Mutex<Vec<(&'static str, ModelPrompt)>>,
}

impl ScriptedCompletion {
    pub fn reply(&self, shape: &'static str, value: Value) {
        self.push(shape, Ok(Some(value)));
    }

    pub fn reply_empty(&self, shape: &'static str) {
        self.push(shape, Ok(None));
    }

    pub fn fail(&self, shape: &'static str, message: &str) {
        self.push(shape, Err(PortError::Unexpected(message.to_string())));
    }

    fn push(&self, shape: &'static str, reply: PortResult<Option<Value>>) {
        lock(&self.replies).entry(shape).or_default().push_back(reply);
    }

    /// The prompts sent so far, with the shape each one requested.
    pub fn calls(&self) -> Vec<(&'static str, ModelPrompt)> {
        lock(&self.calls).clone()
    }

    pub fn calls_for(&self, shape: &str) -> usize {
        lock(&self.calls).iter().filter(|(s, _)| *s == shape).count()
    }
}

#[async_trait]
impl StructuredCompletionService for ScriptedCompletion {
    async fn complete_structured(
        &self,
        prompt: &ModelPrompt,
        shape: &OutputShape,
    ) -> PortResult<Option<Value>> {
        lock(&self.calls).push((shape.name, prompt.clone()));
        lock(&self.replies)
            .get_mut(shape.name)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Ok(None))
    }
}

/// A media fake that either returns a fixed value or fails, counting its calls.
pub struct FakeMedia {
    output: String,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeMedia {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn produce(&self) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(PortError::Unexpected("quota exceeded".to_string()))
        } else {
            Ok(self.output.clone())
        }
    }
}

#[async_trait]
impl ImageGenerationService for FakeMedia {
    async fn generate_image(&self, _prompt: &str) -> PortResult<String> {
        self.produce()
    }
}

#[async_trait]
impl ImageSearchService for FakeMedia {
    async fn find_image(&self, _query: &str) -> PortResult<Option<String>> {
        self.produce().map(Some)
    }
}

#[async_trait]
impl TextToSpeechService for FakeMedia {
    async fn generate_speech(&self, _text: &str) -> PortResult<String> {
        self.produce()
    }
}

//=========================================================================================
// Record Store Fake
//=========================================================================================

#[derive(Default)]
struct Store {
    profiles: HashMap<Uuid, UserProfile>,
    courses: Vec<(Uuid, GenerationResult)>,
    essays: Vec<EssayRecord>,
    conversations: HashMap<Uuid, ConversationRecord>,
}

/// A `DatabaseService` backed by in-process maps. Writes can be made to fail.
#[derive(Default)]
pub struct MemoryDb {
    store: Mutex<Store>,
    failing_writes: AtomicBool,
}

impl MemoryDb {
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    fn check_write(&self) -> PortResult<()> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("store unavailable".to_string()));
        }
        Ok(())
    }

    pub fn student_score(&self, uid: Uuid) -> u64 {
        lock(&self.store)
            .profiles
            .get(&uid)
            .map(|p| p.student_score)
            .unwrap_or(0)
    }

    pub fn stored_courses(&self) -> Vec<(Uuid, GenerationResult)> {
        lock(&self.store).courses.clone()
    }

    pub fn stored_essays(&self) -> Vec<EssayRecord> {
        lock(&self.store).essays.clone()
    }

    fn blank_profile(uid: Uuid, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            uid,
            display_name: None,
            email: None,
            student_score: 0,
            settings: ProfileSettings::default(),
            created_at: now,
        }
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn get_or_create_profile(
        &self,
        uid: Uuid,
        display_name: Option<&str>,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> PortResult<UserProfile> {
        let mut store = lock(&self.store);
        if let Some(profile) = store.profiles.get(&uid) {
            return Ok(profile.clone());
        }
        self.check_write()?;
        let mut profile = Self::blank_profile(uid, now);
        profile.display_name = display_name.map(str::to_string);
        profile.email = email.map(str::to_string);
        store.profiles.insert(uid, profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, uid: Uuid) -> PortResult<UserProfile> {
        lock(&self.store)
            .profiles
            .get(&uid)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", uid)))
    }

    async fn merge_profile_settings(
        &self,
        uid: Uuid,
        settings: &ProfileSettings,
    ) -> PortResult<()> {
        self.check_write()?;
        let mut store = lock(&self.store);
        let profile = store
            .profiles
            .entry(uid)
            .or_insert_with(|| Self::blank_profile(uid, Utc::now()));
        profile.settings.merge(settings);
        Ok(())
    }

    async fn increment_student_score(&self, uid: Uuid, amount: u32) -> PortResult<()> {
        self.check_write()?;
        let mut store = lock(&self.store);
        let profile = store
            .profiles
            .entry(uid)
            .or_insert_with(|| Self::blank_profile(uid, Utc::now()));
        profile.student_score += u64::from(amount);
        Ok(())
    }

    async fn save_course(&self, owner_id: Uuid, course: &GenerationResult) -> PortResult<()> {
        self.check_write()?;
        if course.id.is_none() {
            return Err(PortError::Unexpected("course has no id".to_string()));
        }
        lock(&self.store).courses.push((owner_id, course.clone()));
        Ok(())
    }

    async fn get_course(&self, owner_id: Uuid, course_id: Uuid) -> PortResult<GenerationResult> {
        lock(&self.store)
            .courses
            .iter()
            .find(|(owner, c)| *owner == owner_id && c.id == Some(course_id))
            .map(|(_, c)| c.clone())
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))
    }

    async fn list_courses(&self, owner_id: Uuid) -> PortResult<Vec<GenerationResult>> {
        let mut courses: Vec<GenerationResult> = lock(&self.store)
            .courses
            .iter()
            .filter(|(owner, _)| *owner == owner_id)
            .map(|(_, c)| c.clone())
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    async fn save_essay(&self, essay: &EssayRecord) -> PortResult<()> {
        self.check_write()?;
        lock(&self.store).essays.push(essay.clone());
        Ok(())
    }

    async fn get_essay(&self, owner_id: Uuid, essay_id: Uuid) -> PortResult<EssayRecord> {
        lock(&self.store)
            .essays
            .iter()
            .find(|e| e.user_id == owner_id && e.id == essay_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Essay {} not found", essay_id)))
    }

    async fn list_essays(&self, owner_id: Uuid) -> PortResult<Vec<EssayRecord>> {
        let mut essays: Vec<EssayRecord> = lock(&self.store)
            .essays
            .iter()
            .filter(|e| e.user_id == owner_id)
            .cloned()
            .collect();
        essays.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(essays)
    }

    async fn append_conversation_turn(&self, turn: &ConversationTurn) -> PortResult<()> {
        self.check_write()?;
        let mut store = lock(&self.store);
        let record = store
            .conversations
            .entry(turn.conversation_id)
            .or_insert_with(|| ConversationRecord {
                id: turn.conversation_id,
                user_id: turn.user_id,
                language: turn.language.clone(),
                title: turn.title.clone(),
                messages: Vec::new(),
                created_at: turn.at,
                updated_at: turn.at,
            });
        if record.user_id != turn.user_id {
            return Err(PortError::NotFound(format!(
                "Conversation {} not found",
                turn.conversation_id
            )));
        }
        record.messages.extend(turn.messages.iter().cloned());
        record.language.clone_from(&turn.language);
        record.updated_at = turn.at;
        Ok(())
    }

    async fn get_conversation(
        &self,
        owner_id: Uuid,
        conversation_id: Uuid,
    ) -> PortResult<ConversationRecord> {
        lock(&self.store)
            .conversations
            .get(&conversation_id)
            .filter(|c| c.user_id == owner_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("Conversation {} not found", conversation_id))
            })
    }

    async fn list_conversations(&self, owner_id: Uuid) -> PortResult<Vec<ConversationRecord>> {
        let mut conversations: Vec<ConversationRecord> = lock(&self.store)
            .conversations
            .values()
            .filter(|c| c.user_id == owner_id)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }
}

//=========================================================================================
// Wiring
//=========================================================================================

pub const FAKE_IMAGE_URL: &str = "data:image/png;base64,iVBORw0KGgo=";
pub const FAKE_SEARCH_URL: &str = "https://upload.wikimedia.org/example.jpg";
pub const FAKE_AUDIO_URL: &str = "data:audio/wav;base64,UklGRg==";

/// Handles to every fake behind a `FlowContext`.
pub struct Fakes {
    pub completion: Arc<ScriptedCompletion>,
    pub images: Arc<FakeMedia>,
    pub image_search: Arc<FakeMedia>,
    pub speech: Arc<FakeMedia>,
    pub db: Arc<MemoryDb>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            completion: Arc::new(ScriptedCompletion::default()),
            images: Arc::new(FakeMedia::new(FAKE_IMAGE_URL)),
            image_search: Arc::new(FakeMedia::new(FAKE_SEARCH_URL)),
            speech: Arc::new(FakeMedia::new(FAKE_AUDIO_URL)),
            db: Arc::new(MemoryDb::default()),
        }
    }

    pub fn context(&self) -> FlowContext {
        FlowContext {
            completion: self.completion.clone(),
            images: self.images.clone(),
            image_search: self.image_search.clone(),
            speech: self.speech.clone(),
            db: self.db.clone(),
            timeouts: CallTimeouts::default(),
        }
    }
}

impl Default for Fakes {
    fn default() -> Self {
        Self::new()
    }
}
