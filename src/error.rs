//! Error types for Verity.
//!
//! All errors in Verity are strongly typed using thiserror.
//! Missing or partial evidence is never an error: provider failures are
//! recovered into absent signals before they reach the aggregation engine.
//! Only malformed invocations, invalid configuration and failed shared
//! computations surface to the caller.

use thiserror::Error;

/// Validation errors that occur during input or configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Confidence value {value} is out of range [0.0, 1.0]")]
    ConfidenceOutOfRange {
        value: f64,
    },

    #[error("Base weight for '{kind}' must be finite and non-negative, got {value}")]
    InvalidWeight {
        kind: String,
        value: f64,
    },

    #[error("Threshold '{name}' is invalid: {reason}")]
    InvalidThreshold {
        name: String,
        reason: String,
    },

    #[error("Cache capacity must be at least 1, got {value}")]
    InvalidCapacity {
        value: usize,
    },

    #[error("Article text cannot be empty")]
    EmptyArticleText,

    #[error("Article source URL cannot be empty")]
    EmptySourceUrl,

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        field: String,
        max_length: usize,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Execution errors that occur while analyzing an article.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable {
        provider: String,
        reason: String,
    },

    #[error("Provider '{provider}' timed out after {timeout_ms}ms")]
    ProviderTimeout {
        provider: String,
        timeout_ms: u64,
    },

    #[error("Invalid invocation: {reason}")]
    InvalidInvocation {
        reason: String,
    },

    #[error("Shared computation for {fingerprint} failed: {reason}")]
    CacheComputationFailed {
        fingerprint: String,
        reason: String,
    },

    #[error("Analysis was cancelled")]
    Cancelled,
}

/// Top-level error type for Verity.
#[derive(Debug, Error)]
pub enum VerityError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl VerityError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Shorthand for a provider that could not produce a result.
    #[must_use]
    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if a shared cache computation failed.
    #[must_use]
    pub const fn is_computation_failure(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::CacheComputationFailed { .. })
        )
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Execution(e) => matches!(
                e,
                ExecutionError::ProviderUnavailable { .. }
                    | ExecutionError::ProviderTimeout { .. }
                    | ExecutionError::CacheComputationFailed { .. }
            ),
            Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for Verity operations.
pub type VerityResult<T> = Result<T, VerityError>;
