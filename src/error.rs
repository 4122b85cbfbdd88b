//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The model service returned nothing usable, or something unparseable.
    #[error("{0}")]
    Generation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn generation(message: impl Into<String>) -> Self {
        Error::Generation(message.into())
    }

    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Error::Generation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
