//! Error types for the reconciler
//!
//! This module defines all error types used throughout the crate.
//!
//! Configuration mistakes in declared resources are NOT errors in this sense:
//! they are reported through a [`Reporter`](crate::diagnostics::Reporter) so a
//! single pass can surface all of them. An [`Error`] always aborts the
//! current operation.

use crate::coin::CoinId;
use crate::state::Mode;
use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (process or declaration file level)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record already exists with a different value than the one requested
    #[error("Conflict: {record} already has value {existing}, not {desired}")]
    Conflict {
        /// Record name
        record: String,
        /// Value currently held by the provider
        existing: String,
        /// Value that was asked for
        desired: String,
    },

    /// Internal invariant violation (wrong model shape, missing desired state)
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// A lifecycle method read a state slot that was never determined
    #[error("State for {coin} in {mode} mode was read before it was determined")]
    Unsequenced {
        /// Resource identity
        coin: CoinId,
        /// Determination mode
        mode: Mode,
    },

    /// Expression evaluation failure
    #[error("Evaluation error: {0}")]
    Eval(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a value conflict error
    pub fn conflict(
        record: impl Into<String>,
        existing: impl Into<String>,
        desired: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            record: record.into(),
            existing: existing.into(),
            desired: desired.into(),
        }
    }

    /// Create an invariant violation
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Create an evaluation error
    pub fn eval(msg: impl Into<String>) -> Self {
        Self::Eval(msg.into())
    }

    /// True for failures that indicate a sequencing or type-checking bug in
    /// the host rather than a problem with the provider or the declarations.
    pub fn is_fatal_internal(&self) -> bool {
        matches!(
            self,
            Self::Invariant(_) | Self::Unsequenced { .. } | Self::Eval(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
