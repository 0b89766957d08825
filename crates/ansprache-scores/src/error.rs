use ansprache_core::config::ConfigError;
use ansprache_core::Context;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("no score entry for ability `{ability}` in context {context}")]
    NotFound { context: Context, ability: String },
    #[error("no abilities registered for context {0}")]
    EmptyContext(Context),
    #[error("feedback for `{ability}` in {context} does not match a pending proposal")]
    InvalidAcceptanceState { context: Context, ability: String },
    #[error("score store is already initialized; reset it first")]
    AlreadyInitialized,
    #[error("importance {0} is outside [0, 1]")]
    InvalidImportance(f64),
    #[error("initial score {0} must be finite and non-negative")]
    InvalidInitialScore(f64),
    #[error("invalid agent configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
