pub mod client;
pub mod strategy;
pub mod thumbnail;
pub mod types;

pub use client::GeminiHttpClient;
pub use strategy::GeminiStrategyClient;
pub use thumbnail::GeminiThumbnailClient;
