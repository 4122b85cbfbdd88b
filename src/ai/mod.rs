//! AI service integration for strategy and thumbnail generation
//!
//! Defines the two requester seams (text model and image model) and their
//! Gemini and mock implementations.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiStrategyClient, GeminiThumbnailClient};
pub use mock::{MockStrategyClient, MockThumbnailClient};

use crate::models::{StrategyRecord, ThumbnailImage};
use crate::Result;
use async_trait::async_trait;

/// Turns a topic into an ordered list of short-form video strategies.
#[async_trait]
pub trait StrategyService: Send + Sync {
    async fn generate_strategies(&self, topic: &str) -> Result<Vec<StrategyRecord>>;
}

/// Renders a single thumbnail image for one strategy.
///
/// `overlay_text` is accepted for completeness but is drawn over the image by
/// the view rather than requested from the model.
#[async_trait]
pub trait ThumbnailService: Send + Sync {
    async fn generate_thumbnail(
        &self,
        idea: &str,
        emotion: &str,
        overlay_text: &str,
    ) -> Result<ThumbnailImage>;
}
