use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse};
use crate::ai::{mime, ThumbnailService};
use crate::models::ThumbnailImage;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;

pub const THUMBNAIL_ASPECT_RATIO: &str = "9:16";

#[derive(Debug, Serialize)]
struct ThumbnailRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ThumbnailGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThumbnailGenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

pub struct GeminiThumbnailClient {
    http: GeminiHttpClient,
}

impl GeminiThumbnailClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ThumbnailService for GeminiThumbnailClient {
    async fn generate_thumbnail(
        &self,
        idea: &str,
        emotion: &str,
        overlay_text: &str,
    ) -> Result<ThumbnailImage> {
        tracing::info!(
            "Requesting thumbnail for '{}' (emotion: {}, overlay: '{}')",
            idea,
            emotion,
            overlay_text
        );

        let request = ThumbnailRequest {
            contents: vec![Content::user_text(prompts::thumbnail_prompt(idea, emotion))],
            generation_config: ThumbnailGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: THUMBNAIL_ASPECT_RATIO.to_string(),
                },
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let inline_data = response.first_inline_data().ok_or_else(|| {
            tracing::error!("Gemini response carried no inline image part");
            Error::generation("Failed to generate image")
        })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&inline_data.data)
            .map_err(|e| {
                Error::Generation(format!("Failed to generate image: invalid base64 ({})", e))
            })?;

        let mime_type = mime::resolve_thumbnail_mime(&inline_data.mime_type, &bytes);

        tracing::debug!("Gemini returned {} ({} bytes)", mime_type, bytes.len());

        Ok(ThumbnailImage::new(mime_type, inline_data.data.clone()))
    }
}
