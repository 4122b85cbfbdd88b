//! Data models and structures
//!
//! Defines the strategy records returned by the text model, the thumbnail
//! image value produced by the image model, and runtime configuration.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STRATEGY_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_THUMBNAIL_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// One short-form video plan addressing a single audience problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRecord {
    pub problem: String,
    pub hook: String,
    pub cinematic_script: String,
    pub voiceover: String,
    pub scenes: String,
    pub seo_title: String,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub description: String,
    pub thumbnail_text: String,
    pub thumbnail_image_idea: String,
    pub emotion: String,
}

impl StrategyRecord {
    /// Tags as display hashtags, each carrying exactly one leading `#`.
    pub fn hashtags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| format!("#{}", tag.trim_start_matches('#')))
            .collect()
    }
}

/// A generated thumbnail held as a mime type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailImage {
    mime_type: String,
    data: String,
}

impl ThumbnailImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn base64_data(&self) -> &str {
        &self.data
    }

    /// `data:<mime>;base64,<payload>`, usable directly as an image source.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decoded_len(&self) -> usize {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map(|bytes| bytes.len())
            .unwrap_or(0)
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub strategy_model: String,
    pub thumbnail_model: String,
    pub gemini_base_url: String,
}

impl Config {
    /// Read configuration from the process environment (and `.env`, if present).
    ///
    /// A missing API key is not rejected here; the remote service reports it.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("GEMINI_API_KEY not set; model requests will be rejected remotely");
            String::new()
        });

        Self::from_parts(
            gemini_api_key,
            std::env::var("STRATEGY_MODEL").ok(),
            std::env::var("THUMBNAIL_MODEL").ok(),
            std::env::var("GEMINI_BASE_URL").ok(),
        )
    }

    pub fn from_parts(
        gemini_api_key: String,
        strategy_model: Option<String>,
        thumbnail_model: Option<String>,
        gemini_base_url: Option<String>,
    ) -> crate::Result<Self> {
        let gemini_base_url = gemini_base_url
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !(gemini_base_url.starts_with("http://") || gemini_base_url.starts_with("https://")) {
            return Err(crate::Error::Config(format!(
                "GEMINI_BASE_URL must be an http(s) URL, got '{}'",
                gemini_base_url
            )));
        }

        Ok(Self {
            gemini_api_key,
            strategy_model: strategy_model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STRATEGY_MODEL.to_string()),
            thumbnail_model: thumbnail_model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_THUMBNAIL_MODEL.to_string()),
            gemini_base_url,
        })
    }
}
