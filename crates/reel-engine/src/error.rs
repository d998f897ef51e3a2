//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Speech synthesis failed: {0}")]
    SpeechFailed(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Composition failed: {0}")]
    CompositionFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn speech_failed(msg: impl Into<String>) -> Self {
        Self::SpeechFailed(msg.into())
    }

    pub fn asset_not_found(id: impl Into<String>) -> Self {
        Self::AssetNotFound(id.into())
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub fn composition_failed(msg: impl Into<String>) -> Self {
        Self::CompositionFailed(msg.into())
    }
}
