use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse};
use crate::ai::StrategyService;
use crate::models::StrategyRecord;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Number of strategies the prompt asks for.
pub const EXPECTED_STRATEGIES: usize = 5;

#[derive(Debug, Serialize)]
struct StrategyRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: StrategyGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StrategyGenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

/// Output schema: an array of objects carrying every strategy field.
pub fn strategy_response_schema() -> serde_json::Value {
    let string = serde_json::json!({ "type": "STRING" });
    let string_array = serde_json::json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "problem": string,
                "hook": string,
                "cinematicScript": string,
                "voiceover": string,
                "scenes": string,
                "seoTitle": string,
                "keywords": string_array,
                "tags": string_array,
                "description": string,
                "thumbnailText": string,
                "thumbnailImageIdea": string,
                "emotion": string
            },
            "required": [
                "problem",
                "hook",
                "cinematicScript",
                "voiceover",
                "scenes",
                "seoTitle",
                "keywords",
                "tags",
                "description",
                "thumbnailText",
                "thumbnailImageIdea",
                "emotion"
            ]
        }
    })
}

/// Parse the model's JSON text into strategy records.
///
/// Every field is required; a missing or mistyped field fails the whole batch.
pub fn parse_strategies(text: &str) -> Result<Vec<StrategyRecord>> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!("Model returned malformed strategy JSON: {}", e);
        Error::Generation(format!("Model returned malformed strategy JSON: {}", e))
    })
}

pub struct GeminiStrategyClient {
    http: GeminiHttpClient,
}

impl GeminiStrategyClient {
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
impl StrategyService for GeminiStrategyClient {
    async fn generate_strategies(&self, topic: &str) -> Result<Vec<StrategyRecord>> {
        if topic.trim().is_empty() {
            return Err(Error::generation("Topic must not be empty"));
        }

        tracing::info!(
            "Requesting strategies for topic '{}' (model: {})",
            topic,
            self.http.model()
        );

        let request = StrategyRequest {
            contents: vec![Content::user_text(prompts::strategy_prompt(topic))],
            generation_config: StrategyGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: strategy_response_schema(),
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let text = response
            .text()
            .ok_or_else(|| Error::generation("No response from model"))?;

        let strategies = parse_strategies(&text)?;

        if strategies.len() != EXPECTED_STRATEGIES {
            tracing::warn!(
                "Expected {} strategies, model returned {}",
                EXPECTED_STRATEGIES,
                strategies.len()
            );
        }
        tracing::info!("Received {} strategies", strategies.len());

        Ok(strategies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::ai::mock::sample_strategies;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::body_string_contains;
    use wiremock::{MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

    fn make_client(server: &MockServer) -> GeminiStrategyClient {
        GeminiStrategyClient::new("key".to_string(), DEFAULT_MODEL.to_string())
            .with_base_url(server.uri())
    }

    fn strategies_text(topic: &str) -> String {
        serde_json::to_string(&sample_strategies(topic)).unwrap()
    }

    #[test]
    fn test_schema_requires_all_twelve_fields() {
        let schema = strategy_response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["type"], "OBJECT");

        let required = schema["items"]["required"].as_array().unwrap();
        let properties = schema["items"]["properties"].as_object().unwrap();
        assert_eq!(required.len(), 12);
        assert_eq!(properties.len(), 12);
        for name in required {
            assert!(properties.contains_key(name.as_str().unwrap()));
        }
        assert_eq!(properties["keywords"]["items"]["type"], "STRING");
        assert_eq!(properties["tags"]["type"], "ARRAY");
    }

    #[tokio::test]
    async fn test_generate_strategies_parses_five_records() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response(&strategies_text("budgeting"))),
            )
            .mount(&server)
            .await;

        let strategies = make_client(&server)
            .generate_strategies("budgeting")
            .await
            .unwrap();

        assert_eq!(strategies.len(), 5);
        assert_eq!(strategies, sample_strategies("budgeting"));
        for record in &strategies {
            assert!(!record.seo_title.is_empty());
            assert!(!record.keywords.is_empty());
            assert!(!record.thumbnail_image_idea.is_empty());
        }
    }

    #[tokio::test]
    async fn test_slow_model_reply_still_parses() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_secs(5))
                    .set_body_json(test_support::text_response(&strategies_text("budgeting"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let strategies = make_client(&server)
            .generate_strategies("budgeting")
            .await
            .unwrap();
        assert_eq!(strategies.len(), 5);
    }

    #[tokio::test]
    async fn test_request_carries_topic_schema_and_json_mime_type() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_string_contains("TOPIC: home workout"))
            .and(body_string_contains("\"responseMimeType\":\"application/json\""))
            .and(body_string_contains("\"responseSchema\""))
            .and(body_string_contains("\"thumbnailImageIdea\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response(&strategies_text("home workout"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        make_client(&server)
            .generate_strategies("home workout")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_payload_is_generation_failure() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(test_support::text_response("")))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_strategies("budgeting")
            .await
            .unwrap_err();
        assert!(err.is_generation_failure());
        assert_eq!(err.to_string(), "No response from model");
    }

    #[tokio::test]
    async fn test_no_candidates_is_generation_failure() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_strategies("budgeting")
            .await
            .unwrap_err();
        assert!(err.is_generation_failure());
    }

    #[tokio::test]
    async fn test_non_json_text_is_generation_failure() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response("Sure! Here are five ideas...")),
            )
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_strategies("budgeting")
            .await
            .unwrap_err();
        assert!(err.is_generation_failure());
        assert!(err.to_string().contains("malformed strategy JSON"));
    }

    #[tokio::test]
    async fn test_record_missing_a_field_is_generation_failure() {
        let server = MockServer::start().await;

        let mut records = serde_json::to_value(sample_strategies("budgeting")).unwrap();
        records[3].as_object_mut().unwrap().remove("tags");

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response(&records.to_string())),
            )
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_strategies("budgeting")
            .await
            .unwrap_err();
        assert!(err.is_generation_failure());
    }

    #[tokio::test]
    async fn test_short_batch_is_returned_as_is() {
        let server = MockServer::start().await;

        let two = serde_json::to_string(&sample_strategies("budgeting")[..2]).unwrap();
        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(test_support::text_response(&two)))
            .mount(&server)
            .await;

        let strategies = make_client(&server)
            .generate_strategies("budgeting")
            .await
            .unwrap();
        assert_eq!(strategies.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_topic_makes_no_request() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = make_client(&server).generate_strategies("   ").await.unwrap_err();
        assert!(err.is_generation_failure());
    }
}
