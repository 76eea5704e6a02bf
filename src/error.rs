//! Error types for the ideagen generation pipeline.
//!
//! `ApiError` is the crate error surfaced to callers and providers. Inside the pipeline,
//! provider errors are reclassified into [`FailureReason`] at the agent client boundary
//! and never leave a single-agent task as errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider returned status {status}: {message}")]
    ProviderStatus { status: u16, message: String },

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Why an agent call produced no usable payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    ServiceNotConfigured,
    Transport { message: String },
    NonSuccessStatus { status: Option<u16>, message: String },
    EmptyPayload,
}

impl FailureReason {
    /// Classify a provider error. Anything that is not clearly a status or
    /// configuration problem is treated as transport.
    pub fn from_api_error(error: &ApiError) -> Self {
        match error {
            ApiError::ProviderNotConfigured(_) => FailureReason::ServiceNotConfigured,
            ApiError::ProviderStatus { status, message } => FailureReason::NonSuccessStatus {
                status: Some(*status),
                message: message.clone(),
            },
            ApiError::ProviderAuthFailed(message) => FailureReason::NonSuccessStatus {
                status: Some(401),
                message: message.clone(),
            },
            ApiError::ProviderRateLimit(message) => FailureReason::NonSuccessStatus {
                status: Some(429),
                message: message.clone(),
            },
            ApiError::ProviderModelNotFound(message) => FailureReason::NonSuccessStatus {
                status: Some(404),
                message: message.clone(),
            },
            other => FailureReason::Transport {
                message: other.to_string(),
            },
        }
    }

    pub fn fault(&self) -> GenerationFault {
        match self {
            FailureReason::ServiceNotConfigured => GenerationFault::ServiceUnconfigured,
            FailureReason::Transport { .. } => GenerationFault::TransportFailure,
            FailureReason::NonSuccessStatus { .. } => GenerationFault::NonSuccessStatus,
            FailureReason::EmptyPayload => GenerationFault::EmptyPayload,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::ServiceNotConfigured => write!(f, "service not configured"),
            FailureReason::Transport { message } => write!(f, "transport error: {}", message),
            FailureReason::NonSuccessStatus {
                status: Some(status),
                message,
            } => write!(f, "non-success status {}: {}", status, message),
            FailureReason::NonSuccessStatus {
                status: None,
                message,
            } => write!(f, "non-success status: {}", message),
            FailureReason::EmptyPayload => write!(f, "empty payload"),
        }
    }
}

/// Fault taxonomy for a single agent task. None of these propagate to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFault {
    ServiceUnconfigured,
    TransportFailure,
    NonSuccessStatus,
    EmptyPayload,
    UnparseableResponse,
    /// Not an error: some fields were filled from the default table.
    PartialFieldDefaulted,
}

impl GenerationFault {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationFault::ServiceUnconfigured => "service_unconfigured",
            GenerationFault::TransportFailure => "transport_failure",
            GenerationFault::NonSuccessStatus => "non_success_status",
            GenerationFault::EmptyPayload => "empty_payload",
            GenerationFault::UnparseableResponse => "unparseable_response",
            GenerationFault::PartialFieldDefaulted => "partial_field_defaulted",
        }
    }
}
