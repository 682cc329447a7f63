//! Computer-mode verification.
//!
//! A static pre-execution pass that rejects traversal shapes provably
//! incompatible with bulk-synchronous execution. Applied to every traversal
//! in the tree; a failure is fatal and non-recoverable for that shape under
//! that mode — the caller must restructure the traversal or run it under
//! the standard model instead.
//!
//! The rule set is extensible: each rule is its own function over one
//! traversal, and the strategy is the conjunction of all of them.

use thiserror::Error;

use crate::error::TraversalResult;
use crate::step::{Requirement, Step};
use crate::traversal::{ExecutionMode, Traversal};

use super::TraversalStrategy;

/// Rejection categories for computer-mode verification.
///
/// Each variant names the offending shape so the caller can restructure the
/// query.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// A branching step routes into two or more barrier-bearing bodies.
    ///
    /// Their aggregates would have to be merged in a globally ordered way
    /// the bulk-synchronous model cannot guarantee.
    #[error(
        "multiple barrier branches: {step} routes into {count} barrier-bearing bodies, \
         which cannot be merged under bulk-synchronous execution"
    )]
    MultipleBarrierBranches {
        /// The offending branching step.
        step: String,
        /// How many of its bodies contain barriers.
        count: usize,
    },

    /// A locally-evaluated child traversal requires access to elements
    /// outside the current partition.
    ///
    /// Local children run to completion within one superstep and cannot
    /// message-pass their way to remote elements.
    #[error(
        "non-local access: the local child {child} of {step} requires access to elements \
         outside the current partition"
    )]
    NonLocalAccess {
        /// The step owning the local child.
        step: String,
        /// The offending child traversal.
        child: String,
    },

    /// A single chain contains more than one reducing barrier.
    ///
    /// The intermediate aggregate state cannot be message-passed between
    /// supersteps.
    #[error(
        "nested aggregation: {traversal} contains {count} reducing barriers in one chain; \
         intermediate aggregate state cannot cross supersteps"
    )]
    NestedAggregation {
        /// The offending traversal.
        traversal: String,
        /// How many barriers the chain contains.
        count: usize,
    },
}

/// Verifies that a traversal shape can run under the computer model.
///
/// Applies only to traversals whose execution mode is
/// [`ExecutionMode::Computer`]; standard-mode traversals pass untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputerVerificationStrategy;

impl ComputerVerificationStrategy {
    /// Creates the verification strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraversalStrategy for ComputerVerificationStrategy {
    fn name(&self) -> &'static str {
        "ComputerVerification"
    }

    fn apply(&self, traversal: &mut Traversal) -> TraversalResult<()> {
        if traversal.mode() != ExecutionMode::Computer {
            return Ok(());
        }
        check_multiple_barrier_branches(traversal)?;
        check_non_local_children(traversal)?;
        check_nested_aggregation(traversal)?;
        Ok(())
    }
}

/// Rejects branching steps with two or more barrier-bearing bodies.
fn check_multiple_barrier_branches(traversal: &Traversal) -> Result<(), VerificationError> {
    for step in traversal.steps() {
        let barrier_bodies = step
            .global_children()
            .iter()
            .filter(|child| child.contains_barrier())
            .count();
        if barrier_bodies >= 2 {
            return Err(VerificationError::MultipleBarrierBranches {
                step: step.display(),
                count: barrier_bodies,
            });
        }
    }
    Ok(())
}

/// Rejects locally-evaluated children that require remote access.
fn check_non_local_children(traversal: &Traversal) -> Result<(), VerificationError> {
    for step in traversal.steps() {
        for child in step.local_children() {
            if child.requirements().contains(Requirement::RemoteAccess) {
                return Err(VerificationError::NonLocalAccess {
                    step: step.display(),
                    child: child.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Rejects chains holding more than one reducing barrier.
fn check_nested_aggregation(traversal: &Traversal) -> Result<(), VerificationError> {
    let barriers = traversal.steps().iter().filter(|step| step.is_barrier()).count();
    if barriers >= 2 {
        return Err(VerificationError::NestedAggregation {
            traversal: traversal.to_string(),
            count: barriers,
        });
    }
    Ok(())
}
