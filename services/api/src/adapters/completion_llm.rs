//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for structured completions against an
//! OpenAI-compatible chat model. It implements the `StructuredCompletionService`
//! port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use medha_core::ports::{ModelPrompt, PortError, PortResult, StructuredCompletionService};
use medha_core::schema::OutputShape;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};

const SYSTEM_INSTRUCTIONS: &str = "You are Medha, a patient and encouraging AI tutor for students. \
Always answer with a single JSON object that matches the requested schema exactly. \
Do not wrap the JSON in code fences and do not add any commentary outside it.";

/// An adapter that implements the `StructuredCompletionService` port using chat completions
/// with a JSON-schema response format.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn user_message(prompt: &ModelPrompt) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(prompt.text.clone())
                .build()?
                .into(),
        ];
        if let Some(image) = &prompt.image {
            parts.push(
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(
                        ImageUrlArgs::default()
                            .url(image.clone())
                            .detail(ImageDetail::Auto)
                            .build()?,
                    )
                    .build()?
                    .into(),
            );
        }
        Ok(ChatCompletionRequestUserMessageArgs::default()
            .content(parts)
            .build()?
            .into())
    }
}

/// Reads the model's reply as JSON. Fenced replies are unwrapped first.
/// Anything that still does not parse is treated as no output.
pub fn parse_reply(shape: &str, content: &str) -> Option<Value> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    if unfenced.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(unfenced) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            warn!("{} reply was JSON but not an object.", shape);
            None
        }
        Err(e) => {
            warn!("{} reply was not valid JSON: {}", shape, e);
            None
        }
    }
}

//=========================================================================================
// `StructuredCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StructuredCompletionService for OpenAiCompletionAdapter {
    async fn complete_structured(
        &self,
        prompt: &ModelPrompt,
        shape: &OutputShape,
    ) -> PortResult<Option<Value>> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_INSTRUCTIONS)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            Self::user_message(prompt).map_err(|e| PortError::Unexpected(e.to_string()))?,
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                name: shape.name.to_string(),
                description: Some(shape.description.to_string()),
                schema: Some(shape.schema.clone()),
                strict: Some(false),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .response_format(response_format)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let started = Instant::now();
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;
        info!("⏱️ Chat completion for {} took: {:?}", shape.name, started.elapsed());

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone());

        Ok(content.and_then(|text| parse_reply(shape.name, &text)))
    }
}
