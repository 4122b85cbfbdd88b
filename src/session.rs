//! Session and card state
//!
//! Holds everything the view shows: the topic being edited, whether a
//! strategy request is outstanding, the last error, and one [`Card`] per
//! strategy record. Network work happens elsewhere; requests are handed out
//! as tickets and their results fed back with `complete_*`.
//!
//! Every strategy submission starts a new generation. Strategy tickets carry
//! that generation; thumbnail tickets carry the generation of the card list
//! they were issued against. Results that no longer match are dropped instead
//! of overwriting newer state.

use crate::models::{StrategyRecord, ThumbnailImage};
use crate::{Error, Result};
use tracing::{debug, info, warn};

pub const STRATEGY_FAILURE_FALLBACK: &str = "Failed to generate strategy";
pub const THUMBNAIL_FAILURE_FALLBACK: &str = "Failed to generate image";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Generating,
    Ready,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailState {
    NoThumbnail,
    GeneratingThumbnail,
    HasThumbnail(ThumbnailImage),
    ThumbnailFailed { message: String },
}

#[derive(Debug, Clone)]
pub struct Card {
    pub record: StrategyRecord,
    pub expanded: bool,
    pub thumbnail: ThumbnailState,
}

impl Card {
    fn new(record: StrategyRecord, expanded: bool) -> Self {
        Self {
            record,
            expanded,
            thumbnail: ThumbnailState::NoThumbnail,
        }
    }

    /// The generate action is offered until an image exists, and is disabled
    /// while a request for this card is outstanding.
    pub fn can_request_thumbnail(&self) -> bool {
        matches!(
            self.thumbnail,
            ThumbnailState::NoThumbnail | ThumbnailState::ThumbnailFailed { .. }
        )
    }

    pub fn thumbnail_image(&self) -> Option<&ThumbnailImage> {
        match &self.thumbnail {
            ThumbnailState::HasThumbnail(image) => Some(image),
            _ => None,
        }
    }

    pub fn thumbnail_error(&self) -> Option<&str> {
        match &self.thumbnail {
            ThumbnailState::ThumbnailFailed { message } => Some(message),
            _ => None,
        }
    }
}

/// An outstanding strategy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTicket {
    pub generation: u64,
    pub topic: String,
}

/// An outstanding thumbnail request for one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailTicket {
    pub generation: u64,
    pub index: usize,
    pub idea: String,
    pub emotion: String,
    pub overlay_text: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    topic: String,
    state: SessionState,
    cards: Vec<Card>,
    generation: u64,
    cards_generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            topic: String::new(),
            state: SessionState::Idle,
            cards: Vec::new(),
            generation: 0,
            cards_generation: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_generating(&self) -> bool {
        self.state == SessionState::Generating
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.is_generating() && !self.topic.trim().is_empty()
    }

    /// Start a strategy request for the current topic.
    ///
    /// Returns `None`, leaving every piece of state untouched, when the submit
    /// action is disabled.
    pub fn begin_strategy_request(&mut self) -> Option<StrategyTicket> {
        if !self.can_submit() {
            debug!("Submit ignored (generating: {})", self.is_generating());
            return None;
        }

        self.generation += 1;
        self.state = SessionState::Generating;
        info!(
            "Strategy request started for '{}' (generation {})",
            self.topic, self.generation
        );

        Some(StrategyTicket {
            generation: self.generation,
            topic: self.topic.clone(),
        })
    }

    /// Apply a strategy result. Returns `false` if the ticket is stale.
    ///
    /// Success replaces the cards wholesale with only the first expanded.
    /// Failure keeps the cards already on screen.
    pub fn complete_strategy_request(
        &mut self,
        ticket: &StrategyTicket,
        result: Result<Vec<StrategyRecord>>,
    ) -> bool {
        if ticket.generation != self.generation {
            warn!(
                "Discarding stale strategy result (generation {}, current {})",
                ticket.generation, self.generation
            );
            return false;
        }

        match result {
            Ok(records) => {
                info!("Strategy request for '{}' returned {} records", ticket.topic, records.len());
                self.cards = records
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| Card::new(record, i == 0))
                    .collect();
                self.cards_generation = ticket.generation;
                self.state = SessionState::Ready;
            }
            Err(e) => {
                warn!("Strategy request for '{}' failed: {}", ticket.topic, e);
                self.state = SessionState::Failed {
                    message: failure_message(&e, STRATEGY_FAILURE_FALLBACK),
                };
            }
        }
        true
    }

    /// Flip card `index` between expanded and collapsed.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let card = self.cards.get_mut(index)?;
        card.expanded = !card.expanded;
        Some(card.expanded)
    }

    /// Start a thumbnail request for card `index`.
    ///
    /// Returns `None` if the card does not exist, already has an image, or
    /// has a request outstanding.
    pub fn begin_thumbnail_request(&mut self, index: usize) -> Option<ThumbnailTicket> {
        let generation = self.cards_generation;
        let card = self.cards.get_mut(index)?;
        if !card.can_request_thumbnail() {
            debug!("Thumbnail request for card {} ignored", index + 1);
            return None;
        }

        card.thumbnail = ThumbnailState::GeneratingThumbnail;
        info!("Thumbnail request started for card {}", index + 1);

        Some(ThumbnailTicket {
            generation,
            index,
            idea: card.record.thumbnail_image_idea.clone(),
            emotion: card.record.emotion.clone(),
            overlay_text: card.record.thumbnail_text.clone(),
        })
    }

    /// Apply a thumbnail result to its card only. Returns `false` if the
    /// card belongs to an older strategy list.
    pub fn complete_thumbnail_request(
        &mut self,
        ticket: &ThumbnailTicket,
        result: Result<ThumbnailImage>,
    ) -> bool {
        if ticket.generation != self.cards_generation {
            warn!(
                "Discarding stale thumbnail for card {} (generation {}, current {})",
                ticket.index + 1,
                ticket.generation,
                self.cards_generation
            );
            return false;
        }

        let Some(card) = self.cards.get_mut(ticket.index) else {
            return false;
        };

        card.thumbnail = match result {
            Ok(image) => {
                info!("Thumbnail ready for card {}", ticket.index + 1);
                ThumbnailState::HasThumbnail(image)
            }
            Err(e) => {
                warn!("Thumbnail for card {} failed: {}", ticket.index + 1, e);
                ThumbnailState::ThumbnailFailed {
                    message: failure_message(&e, THUMBNAIL_FAILURE_FALLBACK),
                }
            }
        };
        true
    }
}

fn failure_message(err: &Error, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
