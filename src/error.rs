//! Error types for the summarization engine.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Slack error: {0}")]
    Slack(#[from] SlackError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Slack Web API errors.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("Slack {method} returned an error: {reason}")]
    Api { method: String, reason: String },

    #[error("Slack {method} request failed: {reason}")]
    RequestFailed { method: String, reason: String },

    #[error("Invalid response from Slack {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Summarization and moderation backend errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Summarization request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid response from summarization backend: {reason}")]
    InvalidResponse { reason: String },

    /// The backend answered 2xx but produced no thread summaries. Surfaced
    /// as an error so the caller's eviction loop treats the attempt as
    /// failed, but never retried in place by the retry executor.
    #[error("Summarization backend returned no thread summaries")]
    EmptySummaries,

    #[error("Summarization backend rate limited")]
    RateLimited,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
