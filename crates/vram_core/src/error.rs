//! Engine error types

use thiserror::Error;

/// Errors surfaced by the estimation core.
///
/// Every variant is a deterministic input error; nothing here is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Unknown precision: {0}")]
    UnknownPrecision(String),

    #[error("Unknown quantization: {0}")]
    UnknownQuantization(String),

    #[error("Unknown optimizer: {0}")]
    UnknownOptimizer(String),

    #[error("Unknown fine-tuning method: {0}")]
    UnknownMethod(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("GPU not found: {0}")]
    GpuNotFound(String),

    #[error("Invalid memory requirement: {0} GB")]
    InvalidRequirement(f64),

    #[error("Malformed configuration: {0}")]
    Parse(String),
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for estimation operations
pub type Result<T> = std::result::Result<T, EngineError>;
