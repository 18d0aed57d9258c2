//! crates/medha_core/src/flows/talk_buddy.rs
//!
//! "Talk Buddy", the conversational language partner. Each turn gets a text reply,
//! optional speech, and is appended to the owner's conversation thread.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{size_guard, FlowContext, FlowResult};
use crate::ports::PortError;
use crate::domain::{ChatMessage, ConversationTurn};
use crate::prompts;
use crate::schema;

#[derive(Debug, Clone)]
pub struct TalkBuddyRequest {
    pub owner_id: Option<Uuid>,
    pub prompt: String,
    pub language: String,
    /// Earlier turns of this conversation, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Continue this thread instead of starting a new one.
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkBuddyReply {
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
}

pub async fn talk_buddy(ctx: &FlowContext, request: TalkBuddyRequest) -> FlowResult<TalkBuddyReply> {
    schema::require_text("prompt", &request.prompt)?;
    schema::require_text("language", &request.language)?;

    let response_text = ctx
        .complete(
            &prompts::talk_buddy(&request),
            &schema::buddy_shape(),
            schema::parse_buddy_reply,
        )
        .await?;
    let audio_url = ctx.speak(&response_text).await;

    let conversation_id = match request.owner_id {
        Some(owner_id) => {
            let conversation_id = request
                .conversation_id
                .unwrap_or_else(|| ctx.db.new_record_id());
            let title = request
                .messages
                .first()
                .map(|m| m.text.clone())
                .unwrap_or_else(|| request.prompt.clone());
            let mut turn = ConversationTurn {
                conversation_id,
                user_id: owner_id,
                language: request.language.clone(),
                title,
                messages: vec![
                    ChatMessage::user(request.prompt.clone()),
                    ChatMessage::bot(response_text.clone(), size_guard("audio", audio_url.clone())),
                ],
                at: Utc::now(),
            };

            let appended = ctx
                .store_write("conversation", ctx.db.append_conversation_turn(&turn))
                .await;
            match appended {
                Ok(()) => {
                    info!("Conversation {} extended.", conversation_id);
                    Some(conversation_id)
                }
                // Unknown thread or someone else's: continue in a fresh one.
                Err(PortError::NotFound(_)) if request.conversation_id.is_some() => {
                    turn.conversation_id = ctx.db.new_record_id();
                    let saved = ctx
                        .persist("conversation", ctx.db.append_conversation_turn(&turn))
                        .await;
                    if saved {
                        info!(
                            "Conversation {} not found for owner, started {}.",
                            conversation_id, turn.conversation_id
                        );
                    }
                    saved.then_some(turn.conversation_id)
                }
                Err(_) => request.conversation_id,
            }
        }
        None => None,
    };

    Ok(TalkBuddyReply {
        response_text,
        audio_url,
        conversation_id,
    })
}
