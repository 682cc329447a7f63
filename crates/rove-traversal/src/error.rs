//! Error types for the traversal crate.
//!
//! End-of-sequence is deliberately absent here: a finished traversal reports
//! `Ok(None)` from its pull contract. Running out of input is a control
//! condition, not a failure, and must never surface to callers as an error.

use thiserror::Error;

use rove_core::CoreError;

use crate::strategy::VerificationError;

/// Errors that can occur while building or executing a traversal.
#[derive(Debug, Error)]
pub enum TraversalError {
    /// A pre-execution verification strategy rejected the traversal shape.
    ///
    /// Fatal and non-recoverable for this shape under this execution mode;
    /// the traversal must be restructured or run under the standard model.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The branch selector produced no value for a traverser.
    #[error("the selector does not map to a value for traverser: {0}")]
    Selector(String),

    /// A user-level failure raised inside a step's computation.
    ///
    /// Propagated unmodified; the traversal layer performs no recovery.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for traversal operations.
pub type TraversalResult<T> = Result<T, TraversalError>;
