//! Application orchestration: turns user actions into model requests and
//! feeds their results back into the [`Session`].
//!
//! Requests run as independent tokio tasks. Their results come back over an
//! mpsc channel and are applied one at a time by whoever owns the `App`, so
//! the session itself never needs a lock.

use crate::ai::{GeminiStrategyClient, GeminiThumbnailClient, StrategyService, ThumbnailService};
use crate::models::{Config, StrategyRecord, ThumbnailImage};
use crate::session::{Session, StrategyTicket, ThumbnailTicket};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub strategy: Box<dyn StrategyService>,
    pub thumbnail: Box<dyn ThumbnailService>,
}

/// A finished request, as delivered from its task.
enum Completion {
    Strategies {
        ticket: StrategyTicket,
        result: Result<Vec<StrategyRecord>>,
    },
    Thumbnail {
        ticket: ThumbnailTicket,
        result: Result<ThumbnailImage>,
    },
}

/// What changed after a completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Strategies { applied: bool },
    Thumbnail { index: usize, applied: bool },
}

pub struct App {
    strategy: Arc<dyn StrategyService>,
    thumbnail: Arc<dyn ThumbnailService>,
    session: Session,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            strategy: Arc::from(services.strategy),
            thumbnail: Arc::from(services.thumbnail),
            session: Session::new(),
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    /// Construct an app talking to Gemini with the given configuration.
    pub fn new(config: &Config) -> Self {
        // Reuse one HTTP connection pool across both clients.
        let http_client = reqwest::Client::new();

        info!(
            "Strategy model: {}, thumbnail model: {}",
            config.strategy_model, config.thumbnail_model
        );

        let strategy = GeminiStrategyClient::new_with_client(
            config.gemini_api_key.clone(),
            config.strategy_model.clone(),
            http_client.clone(),
        )
        .with_base_url(config.gemini_base_url.clone());

        let thumbnail = GeminiThumbnailClient::new_with_client(
            config.gemini_api_key.clone(),
            config.thumbnail_model.clone(),
            http_client,
        )
        .with_base_url(config.gemini_base_url.clone());

        Self::with_services(AppServices {
            strategy: Box::new(strategy),
            thumbnail: Box::new(thumbnail),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of requests whose results have not been applied yet.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Set the topic and start a strategy request if submitting is allowed.
    pub fn submit(&mut self, topic: &str) -> bool {
        self.session.set_topic(topic);
        let Some(ticket) = self.session.begin_strategy_request() else {
            return false;
        };

        let service = Arc::clone(&self.strategy);
        let topic = ticket.topic.clone();
        self.in_flight += 1;

        spawn_request(
            self.completions_tx.clone(),
            async move { service.generate_strategies(&topic).await },
            move |result| Completion::Strategies { ticket, result },
        );
        true
    }

    /// Start a thumbnail request for card `index` if its action is enabled.
    pub fn request_thumbnail(&mut self, index: usize) -> bool {
        let Some(ticket) = self.session.begin_thumbnail_request(index) else {
            return false;
        };

        let service = Arc::clone(&self.thumbnail);
        let (idea, emotion, overlay_text) = (
            ticket.idea.clone(),
            ticket.emotion.clone(),
            ticket.overlay_text.clone(),
        );
        self.in_flight += 1;

        spawn_request(
            self.completions_tx.clone(),
            async move {
                service
                    .generate_thumbnail(&idea, &emotion, &overlay_text)
                    .await
            },
            move |result| Completion::Thumbnail { ticket, result },
        );
        true
    }

    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        self.session.toggle(index)
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_update(&mut self) -> Option<Update> {
        if self.in_flight == 0 {
            return None;
        }

        let completion = self.completions_rx.recv().await?;
        self.in_flight -= 1;

        let update = match completion {
            Completion::Strategies { ticket, result } => Update::Strategies {
                applied: self.session.complete_strategy_request(&ticket, result),
            },
            Completion::Thumbnail { ticket, result } => Update::Thumbnail {
                index: ticket.index,
                applied: self.session.complete_thumbnail_request(&ticket, result),
            },
        };
        debug!("Applied {:?} ({} still in flight)", update, self.in_flight);
        Some(update)
    }

    /// Apply every outstanding result, returning them in arrival order.
    pub async fn settle(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Some(update) = self.next_update().await {
            updates.push(update);
        }
        updates
    }
}

/// Run `request` on its own task and deliver exactly one completion for it.
///
/// A panicking request still reports back, as a generation failure, so the
/// in-flight count always returns to zero.
fn spawn_request<T, F, C>(tx: mpsc::UnboundedSender<Completion>, request: F, complete: C)
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
    C: FnOnce(Result<T>) -> Completion + Send + 'static,
{
    let task = tokio::spawn(request);
    tokio::spawn(async move {
        let result = task.await.unwrap_or_else(|e| {
            error!("Request task did not finish: {}", e);
            Err(Error::Generation(format!("Request task did not finish: {}", e)))
        });
        // The receiver lives as long as the App; a send error means it is gone.
        let _ = tx.send(complete(result));
    });
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices, Update};
    use crate::ai::mock::sample_strategies;
    use crate::ai::{MockStrategyClient, MockThumbnailClient, StrategyService, ThumbnailService};
    use crate::models::{StrategyRecord, ThumbnailImage};
    use crate::session::{SessionState, ThumbnailState};
    use crate::Result;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct CrashingStrategy;

    #[async_trait]
    impl StrategyService for CrashingStrategy {
        async fn generate_strategies(&self, _topic: &str) -> Result<Vec<StrategyRecord>> {
            panic!("strategy backend crashed");
        }
    }

    struct CrashingThumbnail;

    #[async_trait]
    impl ThumbnailService for CrashingThumbnail {
        async fn generate_thumbnail(
            &self,
            _idea: &str,
            _emotion: &str,
            _overlay_text: &str,
        ) -> Result<ThumbnailImage> {
            panic!("image backend crashed");
        }
    }

    fn build_test_app(strategy: MockStrategyClient, thumbnail: MockThumbnailClient) -> App {
        App::with_services(AppServices {
            strategy: Box::new(strategy),
            thumbnail: Box::new(thumbnail),
        })
    }

    #[tokio::test]
    async fn test_submit_runs_one_request_and_expands_first_card() {
        let strategy = MockStrategyClient::new();
        let probe = strategy.clone();
        let mut app = build_test_app(strategy, MockThumbnailClient::new());

        assert!(app.submit("home workout"));
        assert!(app.session().is_generating());
        assert_eq!(app.pending(), 1);

        let update = app.next_update().await;
        assert_eq!(update, Some(Update::Strategies { applied: true }));
        assert_eq!(probe.topics(), vec!["home workout".to_string()]);

        let expanded: Vec<bool> = app.session().cards().iter().map(|c| c.expanded).collect();
        assert_eq!(expanded, vec![true, false, false, false, false]);
    }

    #[tokio::test]
    async fn test_blank_submit_makes_no_call() {
        let strategy = MockStrategyClient::new();
        let probe = strategy.clone();
        let mut app = build_test_app(strategy, MockThumbnailClient::new());

        assert!(!app.submit("   "));
        assert_eq!(app.pending(), 0);
        assert_eq!(app.next_update().await, None);
        assert_eq!(app.session().state(), &SessionState::Idle);
        assert_eq!(probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_previous_cards() {
        let strategy = MockStrategyClient::new()
            .with_strategies(sample_strategies("first"))
            .with_failure("No response from model");
        let mut app = build_test_app(strategy, MockThumbnailClient::new());

        app.submit("first");
        app.settle().await;
        app.submit("second");
        app.settle().await;

        assert_eq!(app.session().error(), Some("No response from model"));
        assert_eq!(app.session().cards().len(), 5);
        assert_eq!(
            app.session().cards()[0].record,
            sample_strategies("first")[0]
        );
    }

    #[tokio::test]
    async fn test_concurrent_thumbnails_land_on_their_own_cards() {
        let thumbnail = MockThumbnailClient::new()
            .with_image(ThumbnailImage::new("image/png", "AAAA"))
            .with_failure("Failed to generate image");
        let thumbnail_probe = thumbnail.clone();
        let mut app = build_test_app(MockStrategyClient::new(), thumbnail);

        app.submit("budgeting");
        app.settle().await;

        assert!(app.request_thumbnail(0));
        assert!(app.request_thumbnail(3));
        assert!(!app.request_thumbnail(3));
        assert_eq!(app.pending(), 2);

        let updates = app.settle().await;
        assert_eq!(updates.len(), 2);
        assert_eq!(thumbnail_probe.get_call_count(), 2);

        let states: Vec<&ThumbnailState> = app
            .session()
            .cards()
            .iter()
            .map(|c| &c.thumbnail)
            .collect();
        let succeeded = states
            .iter()
            .filter(|s| matches!(s, ThumbnailState::HasThumbnail(_)))
            .count();
        let failed = states
            .iter()
            .filter(|s| matches!(s, ThumbnailState::ThumbnailFailed { .. }))
            .count();
        assert_eq!(succeeded, 1);
        assert_eq!(failed, 1);
        for untouched in [1, 2, 4] {
            assert_eq!(states[untouched], &ThumbnailState::NoThumbnail);
        }
        assert_eq!(app.session().state(), &SessionState::Ready);
    }

    #[tokio::test]
    async fn test_thumbnail_uses_card_fields() {
        let thumbnail = MockThumbnailClient::new();
        let probe = thumbnail.clone();
        let mut app = build_test_app(MockStrategyClient::new(), thumbnail);

        app.submit("budgeting");
        app.settle().await;
        app.request_thumbnail(2);
        app.settle().await;

        let record = &app.session().cards()[2].record;
        let call = &probe.calls()[0];
        assert_eq!(call.idea, record.thumbnail_image_idea);
        assert_eq!(call.emotion, record.emotion);
        assert_eq!(call.overlay_text, record.thumbnail_text);
    }

    #[tokio::test]
    async fn test_stale_thumbnail_is_dropped_after_new_list() {
        let mut app = build_test_app(MockStrategyClient::new(), MockThumbnailClient::new());

        app.submit("first");
        app.settle().await;

        app.request_thumbnail(1);
        app.submit("second");

        let updates = app.settle().await;
        assert_eq!(updates.len(), 2);
        assert!(updates.contains(&Update::Strategies { applied: true }));

        // Whichever order the two tasks finished in, the new list's card 2
        // must not show a thumbnail requested for the old list.
        let card = &app.session().cards()[1];
        assert!(card.record.problem.contains("second"));
        assert_eq!(card.thumbnail, ThumbnailState::NoThumbnail);
    }

    #[tokio::test]
    async fn test_crashed_strategy_task_still_settles() {
        let mut app = App::with_services(AppServices {
            strategy: Box::new(CrashingStrategy),
            thumbnail: Box::new(MockThumbnailClient::new()),
        });

        assert!(app.submit("home workout"));
        let updates = tokio::time::timeout(Duration::from_secs(5), app.settle())
            .await
            .unwrap();

        assert_eq!(updates, vec![Update::Strategies { applied: true }]);
        assert_eq!(app.pending(), 0);
        assert!(matches!(app.session().state(), SessionState::Failed { .. }));
        assert!(app.session().can_submit());
    }

    #[tokio::test]
    async fn test_crashed_thumbnail_task_fails_only_its_card() {
        let mut app = App::with_services(AppServices {
            strategy: Box::new(MockStrategyClient::new()),
            thumbnail: Box::new(CrashingThumbnail),
        });

        app.submit("home workout");
        app.settle().await;
        assert!(app.request_thumbnail(2));
        tokio::time::timeout(Duration::from_secs(5), app.settle())
            .await
            .unwrap();

        assert_eq!(app.pending(), 0);
        let card = &app.session().cards()[2];
        assert!(matches!(card.thumbnail, ThumbnailState::ThumbnailFailed { .. }));
        assert!(card.can_request_thumbnail());
        assert_eq!(app.session().state(), &SessionState::Ready);
    }
}
