//! Error taxonomy for the read path.
//!
//! Errors cross the cache boundary as values. Nothing here is ever thrown
//! at a UI collaborator; the catalog substitutes fallback data instead.

use std::time::Duration;

use thiserror::Error;

/// Error reported by the remote data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend error {code}: {message}")]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Failure of a (possibly retried) fetch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// A single attempt did not finish within the per-attempt timeout.
    #[error("attempt {attempt} timed out after {after:?}")]
    Timeout { attempt: u32, after: Duration },

    /// The backend answered with an error.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The backend answered, but a record could not be decoded.
    #[error("failed to decode {resource} record: {message}")]
    Decode {
        resource: &'static str,
        message: String,
    },

    /// A shared load ended without delivering a result.
    #[error("{resource} load ended without a result")]
    Interrupted { resource: &'static str },

    /// Every attempt failed; `last` is the error of the final attempt.
    #[error("giving up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// Whether asking again could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Backend(_) | Self::Interrupted { .. } => true,
            Self::Decode { .. } => false,
            Self::Exhausted { last, .. } => last.is_transient(),
        }
    }

    /// The innermost cause, looking through `Exhausted`.
    pub fn root(&self) -> &FetchError {
        match self {
            Self::Exhausted { last, .. } => last.root(),
            other => other,
        }
    }
}
