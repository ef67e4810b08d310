//! Error types shared across the loader, font, and cache modules

use thiserror::Error;

use crate::request::RequestState;

/// A single candidate source failed to produce a resource.
///
/// These are always absorbed by the fallback loader: the loader advances to
/// the next candidate and never hands one of these to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("HTTP status {status}")]
    Http { status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Failed to parse resource: {0}")]
    Parse(String),
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("Acquisition ended without reporting an outcome")]
    Abandoned,
}

/// Misuse of the request state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request already finished in state {0:?}")]
    AlreadyTerminal(RequestState),
}

#[derive(Error, Debug)]
pub enum FontError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Typeface has no glyphs")]
    MissingGlyphs,
    #[error("Invalid typeface resolution: {0}")]
    InvalidResolution(f32),
}

impl From<FontError> for AcquisitionError {
    fn from(e: FontError) -> Self {
        AcquisitionError::Parse(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("URL not in cache: {0}")]
    NotCached(String),
}
