use super::{StrategyService, ThumbnailService};
use crate::models::{StrategyRecord, ThumbnailImage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A 1x1 PNG, returned by [`MockThumbnailClient`] when nothing is configured.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// A plausible strategy record for `topic`, numbered by `index`.
pub fn sample_strategy(topic: &str, index: usize) -> StrategyRecord {
    let n = index + 1;
    StrategyRecord {
        problem: format!("Problem {} people hit with {}", n, topic),
        hook: format!("Stop doing {} wrong ({})", topic, n),
        cinematic_script: format!("Slow push-in on a frustrated face. Beat {}.", n),
        voiceover: format!("Everyone struggles with {} at first.", topic),
        scenes: "Close-up, then wide shot, then smile.".to_string(),
        seo_title: format!("{} mistake #{} nobody talks about", topic, n),
        keywords: vec![topic.to_string(), format!("{} tips", topic)],
        tags: vec![format!("#{}", topic.replace(' ', "")), "shorts".to_string()],
        description: format!("Fix {} problem {} in under a minute.", topic, n),
        thumbnail_text: format!("FIX THIS {}", n),
        thumbnail_image_idea: format!("Person reacting to {} failure {}", topic, n),
        emotion: "surprise".to_string(),
    }
}

/// Five sample records, the shape a conforming model returns.
pub fn sample_strategies(topic: &str) -> Vec<StrategyRecord> {
    (0..5).map(|i| sample_strategy(topic, i)).collect()
}

type StrategyResponse = std::result::Result<Vec<StrategyRecord>, String>;

/// In-memory strategy requester. Clones share responses and call history.
#[derive(Clone)]
pub struct MockStrategyClient {
    responses: Arc<Mutex<Vec<StrategyResponse>>>,
    topics: Arc<Mutex<Vec<String>>>,
}

impl MockStrategyClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            topics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_strategies(self, strategies: Vec<StrategyRecord>) -> Self {
        self.responses.lock().unwrap().push(Ok(strategies));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.responses.lock().unwrap().push(Err(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.topics.lock().unwrap().len()
    }

    /// Topics received so far, in call order.
    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }
}

impl Default for MockStrategyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StrategyService for MockStrategyClient {
    async fn generate_strategies(&self, topic: &str) -> Result<Vec<StrategyRecord>> {
        let count = {
            let mut topics = self.topics.lock().unwrap();
            topics.push(topic.to_string());
            topics.len()
        };

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(sample_strategies(topic));
        }

        // Cycle through configured responses.
        match &responses[(count - 1) % responses.len()] {
            Ok(strategies) => Ok(strategies.clone()),
            Err(message) => Err(Error::Generation(message.clone())),
        }
    }
}

type ThumbnailResponse = std::result::Result<ThumbnailImage, String>;

/// Arguments of one recorded thumbnail call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCall {
    pub idea: String,
    pub emotion: String,
    pub overlay_text: String,
}

/// In-memory thumbnail requester. Clones share responses and call history.
#[derive(Clone)]
pub struct MockThumbnailClient {
    responses: Arc<Mutex<Vec<ThumbnailResponse>>>,
    calls: Arc<Mutex<Vec<ThumbnailCall>>>,
}

impl MockThumbnailClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image(self, image: ThumbnailImage) -> Self {
        self.responses.lock().unwrap().push(Ok(image));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.responses.lock().unwrap().push(Err(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<ThumbnailCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockThumbnailClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThumbnailService for MockThumbnailClient {
    async fn generate_thumbnail(
        &self,
        idea: &str,
        emotion: &str,
        overlay_text: &str,
    ) -> Result<ThumbnailImage> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ThumbnailCall {
                idea: idea.to_string(),
                emotion: emotion.to_string(),
                overlay_text: overlay_text.to_string(),
            });
            calls.len()
        };

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(ThumbnailImage::from_bytes("image/png", TINY_PNG));
        }

        match &responses[(count - 1) % responses.len()] {
            Ok(image) => Ok(image.clone()),
            Err(message) => Err(Error::Generation(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_strategy_client_default_returns_five_records() {
        let client = MockStrategyClient::new();

        let strategies = client.generate_strategies("home workout").await.unwrap();
        assert_eq!(strategies.len(), 5);
        assert!(strategies[0].problem.contains("home workout"));
        assert_eq!(client.topics(), vec!["home workout".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_strategy_client_cycles_responses() {
        let client = MockStrategyClient::new()
            .with_strategies(sample_strategies("a"))
            .with_failure("boom");

        assert!(client.generate_strategies("x").await.is_ok());
        let err = client.generate_strategies("x").await.unwrap_err();
        assert!(err.is_generation_failure());

        // Should cycle back
        assert!(client.generate_strategies("x").await.is_ok());
        assert_eq!(client.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_thumbnail_client_records_calls_and_shares_state() {
        let client = MockThumbnailClient::new();
        let probe = client.clone();

        let image = client
            .generate_thumbnail("idea", "joy", "TEXT")
            .await
            .unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.decoded_len(), TINY_PNG.len());

        assert_eq!(probe.get_call_count(), 1);
        assert_eq!(
            probe.calls()[0],
            ThumbnailCall {
                idea: "idea".to_string(),
                emotion: "joy".to_string(),
                overlay_text: "TEXT".to_string(),
            }
        );
    }
}
