//! client::error
//!
//! The two failure kinds a façade operation can produce.

use thiserror::Error;

use super::unsupported::UnsupportedOperation;
use crate::engine::EngineError;

/// An operation the façade refuses without calling the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation}: {reason}")]
pub struct UnsupportedError {
    /// Consumer-facing operation name, e.g. `"stash"`.
    pub operation: String,
    pub reason: String,
}

impl UnsupportedError {
    /// The error for a member of the unsupported set.
    pub fn operation(op: UnsupportedOperation) -> Self {
        Self {
            operation: op.name().to_string(),
            reason: "operation not supported by this engine".to_string(),
        }
    }

    /// A merge called without a branch to merge from.
    pub fn branch_not_specified() -> Self {
        Self {
            operation: "merge".to_string(),
            reason: "branch not specified".to_string(),
        }
    }
}

/// Errors returned by [`GitClient`](super::GitClient) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The operation was never attempted.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),

    /// The engine failed; passed through unchanged.
    #[error(transparent)]
    Delegate(#[from] EngineError),
}

impl ClientError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ClientError::Unsupported(_))
    }

    /// The underlying engine error, if this is a delegate failure.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            ClientError::Delegate(err) => Some(err),
            ClientError::Unsupported(_) => None,
        }
    }
}
