//! Shorts Strategist - turns a topic into five YouTube Shorts strategies
//!
//! A text model produces scripts, SEO metadata, and thumbnail concepts for
//! five audience problems; an image model renders 9:16 thumbnails on demand.

pub mod ai;
pub mod app;
pub mod cli;
pub mod error;
pub mod models;
pub mod prompts;
pub mod render;
pub mod session;

pub use error::{Error, Result};
