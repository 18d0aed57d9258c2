//! services/api/src/adapters/image_gen.rs
//!
//! Illustration generation through the OpenAI images API.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::images::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    Client,
};
use async_trait::async_trait;
use medha_core::ports::{ImageGenerationService, PortError, PortResult};

#[derive(Clone)]
pub struct OpenAiImageAdapter {
    client: Client<OpenAIConfig>,
    model: ImageModel,
}

impl OpenAiImageAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        let model = match model {
            "dall-e-3" => ImageModel::DallE3,
            "dall-e-2" => ImageModel::DallE2,
            other => ImageModel::Other(other.to_string()),
        };
        Self { client, model }
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageAdapter {
    /// Returns the image as a `data:image/png;base64,...` URI, or its hosted URL.
    async fn generate_image(&self, prompt: &str) -> PortResult<String> {
        let request = CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(self.model.clone())
            .n(1)
            .size(ImageSize::S1024x1024)
            .response_format(ImageResponseFormat::B64Json)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .images()
            .generate(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let image = response
            .data
            .first()
            .ok_or_else(|| PortError::Unexpected("No image generated".to_string()))?;

        match image.as_ref() {
            Image::B64Json { b64_json, .. } => Ok(format!("data:image/png;base64,{}", b64_json)),
            Image::Url { url, .. } => Ok(url.clone()),
        }
    }
}
