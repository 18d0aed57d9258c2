//! services/api/src/adapters/db.rs
//!
//! Postgres record store for profiles, courses, essays and conversations.
//!
//! Course payloads, essay feedback, profile settings and conversation messages are
//! stored as JSONB so the records round-trip exactly as the flows produce them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medha_core::domain::{
    ChatMessage, ConversationRecord, ConversationTurn, EssayFeedback, EssayRecord,
    GenerationResult, ProfileSettings, UserProfile,
};
use medha_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies `migrations/` (embedded at compile time).
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(what: &str, id: Uuid) -> impl FnOnce(sqlx::Error) -> PortError + '_ {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} {} not found", what, id)),
        other => unexpected(other),
    }
}

//=========================================================================================
// Row types
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    uid: Uuid,
    display_name: Option<String>,
    email: Option<String>,
    student_score: i64,
    settings: Json<ProfileSettings>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            uid: self.uid,
            display_name: self.display_name,
            email: self.email,
            student_score: u64::try_from(self.student_score).unwrap_or(0),
            settings: self.settings.0,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CourseRecord {
    payload: Json<GenerationResult>,
}

#[derive(FromRow)]
struct EssayRow {
    id: Uuid,
    user_id: Uuid,
    essay: String,
    topic: String,
    grade_level: String,
    feedback: Json<EssayFeedback>,
    created_at: DateTime<Utc>,
}
impl EssayRow {
    fn to_domain(self) -> EssayRecord {
        EssayRecord {
            id: self.id,
            user_id: self.user_id,
            essay: self.essay,
            topic: self.topic,
            grade_level: self.grade_level,
            feedback: self.feedback.0,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    user_id: Uuid,
    language: String,
    title: String,
    messages: Json<Vec<ChatMessage>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ConversationRow {
    fn to_domain(self) -> ConversationRecord {
        ConversationRecord {
            id: self.id,
            user_id: self.user_id,
            language: self.language,
            title: self.title,
            messages: self.messages.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "uid, display_name, email, student_score, settings, created_at";
const ESSAY_COLUMNS: &str = "id, user_id, essay, topic, grade_level, feedback, created_at";
const CONVERSATION_COLUMNS: &str =
    "id, user_id, language, title, messages, created_at, updated_at";

//=========================================================================================
// DatabaseService
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_or_create_profile(
        &self,
        uid: Uuid,
        display_name: Option<&str>,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> PortResult<UserProfile> {
        sqlx::query(
            "INSERT INTO users (uid, display_name, email, created_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (uid) DO NOTHING",
        )
        .bind(uid)
        .bind(display_name)
        .bind(email)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        self.get_profile(uid).await
    }

    async fn get_profile(&self, uid: Uuid) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE uid = $1"
        ))
        .bind(uid)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("User", uid))?;
        Ok(record.to_domain())
    }

    async fn merge_profile_settings(
        &self,
        uid: Uuid,
        settings: &ProfileSettings,
    ) -> PortResult<()> {
        // Absent fields are not serialized, so `||` only overwrites the keys supplied.
        sqlx::query(
            "INSERT INTO users (uid, settings) VALUES ($1, $2) \
             ON CONFLICT (uid) DO UPDATE SET settings = users.settings || EXCLUDED.settings",
        )
        .bind(uid)
        .bind(Json(settings))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn increment_student_score(&self, uid: Uuid, amount: u32) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO users (uid, student_score) VALUES ($1, $2) \
             ON CONFLICT (uid) DO UPDATE SET student_score = users.student_score + EXCLUDED.student_score",
        )
        .bind(uid)
        .bind(i64::from(amount))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn save_course(&self, owner_id: Uuid, course: &GenerationResult) -> PortResult<()> {
        let id = course
            .id
            .ok_or_else(|| PortError::Unexpected("Course has no id".to_string()))?;
        sqlx::query("INSERT INTO courses (id, user_id, payload, created_at) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(owner_id)
            .bind(Json(course))
            .bind(course.created_at.unwrap_or_else(Utc::now))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_course(&self, owner_id: Uuid, course_id: Uuid) -> PortResult<GenerationResult> {
        let record = sqlx::query_as::<_, CourseRecord>(
            "SELECT payload FROM courses WHERE id = $1 AND user_id = $2",
        )
        .bind(course_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Course", course_id))?;
        Ok(record.payload.0)
    }

    async fn list_courses(&self, owner_id: Uuid) -> PortResult<Vec<GenerationResult>> {
        let records = sqlx::query_as::<_, CourseRecord>(
            "SELECT payload FROM courses WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.payload.0).collect())
    }

    async fn save_essay(&self, essay: &EssayRecord) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO essays (id, user_id, essay, topic, grade_level, feedback, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(essay.id)
        .bind(essay.user_id)
        .bind(&essay.essay)
        .bind(&essay.topic)
        .bind(&essay.grade_level)
        .bind(Json(&essay.feedback))
        .bind(essay.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_essay(&self, owner_id: Uuid, essay_id: Uuid) -> PortResult<EssayRecord> {
        let record = sqlx::query_as::<_, EssayRow>(&format!(
            "SELECT {ESSAY_COLUMNS} FROM essays WHERE id = $1 AND user_id = $2"
        ))
        .bind(essay_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Essay", essay_id))?;
        Ok(record.to_domain())
    }

    async fn list_essays(&self, owner_id: Uuid) -> PortResult<Vec<EssayRecord>> {
        let records = sqlx::query_as::<_, EssayRow>(&format!(
            "SELECT {ESSAY_COLUMNS} FROM essays WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn append_conversation_turn(&self, turn: &ConversationTurn) -> PortResult<()> {
        let result = sqlx::query(
            "INSERT INTO conversations (id, user_id, language, title, messages, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                 messages = conversations.messages || EXCLUDED.messages, \
                 language = EXCLUDED.language, \
                 updated_at = EXCLUDED.updated_at \
             WHERE conversations.user_id = EXCLUDED.user_id",
        )
        .bind(turn.conversation_id)
        .bind(turn.user_id)
        .bind(&turn.language)
        .bind(&turn.title)
        .bind(Json(&turn.messages))
        .bind(turn.at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        // The conflict branch is skipped when the thread belongs to someone else.
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Conversation {} not found",
                turn.conversation_id
            )));
        }
        Ok(())
    }

    async fn get_conversation(
        &self,
        owner_id: Uuid,
        conversation_id: Uuid,
    ) -> PortResult<ConversationRecord> {
        let record = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1 AND user_id = $2"
        ))
        .bind(conversation_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Conversation", conversation_id))?;
        Ok(record.to_domain())
    }

    async fn list_conversations(&self, owner_id: Uuid) -> PortResult<Vec<ConversationRecord>> {
        let records = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
