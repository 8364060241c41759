//! Error types for genui.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum GenUiError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("Generated code unsafe: {0}")]
    UnsafeCode(String),

    #[error("Render generation failed: {0}")]
    Generation(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("User cancelled render: {0}")]
    RenderDeclined(String),

    #[error("Orchestration aborted: {0}")]
    Aborted(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool loop exceeded max iterations ({0})")]
    IterationLimit(usize),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Server,
    Api,
    Configuration,
    Serialization,
    Render,
    Cancellation,
    Protocol,
    Unknown,
}

impl GenUiError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) | Self::Io(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Provider { .. } => ErrorCategory::Api,
            Self::UnsafeCode(_)
            | Self::Generation(_)
            | Self::Sandbox(_)
            | Self::RenderDeclined(_) => ErrorCategory::Render,
            Self::Aborted(_) => ErrorCategory::Cancellation,
            Self::InvalidState(_) | Self::IterationLimit(_) => ErrorCategory::Protocol,
            Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is the expected result of a user-initiated abort.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Whether this error came out of a render attempt (generation, safety
    /// policy or sandbox execution).
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsafeCode(_) | Self::Generation(_) | Self::Sandbox(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GenUiError>;
