//! Rove Traversal
//!
//! The execution core of the Rove graph query engine: lazily-evaluated
//! pipelines of composable steps that transform and route traversers through
//! a tree of sub-computations.
//!
//! # Overview
//!
//! - **Traversers** ([`Traverser`]): tokens carrying a value, a repetition
//!   count (bulk), a path, and a step position.
//! - **Steps** ([`step::Step`]): pull-based pipeline units chained into
//!   [`Traversal`]s. End-of-sequence is `Ok(None)`, never an error.
//! - **Branching** ([`step::branch::BranchStep`]): evaluates a selector per
//!   traverser and routes splits into registered branch bodies, under either
//!   execution model.
//! - **Verification** ([`strategy::ComputerVerificationStrategy`]): a static
//!   pre-execution pass rejecting shapes the bulk-synchronous model cannot
//!   run.
//!
//! # Example
//!
//! ```
//! use rove_core::Value;
//! use rove_traversal::step::branch::Selector;
//! use rove_traversal::step::pick::PickToken;
//! use rove_traversal::traversal::Traversal;
//!
//! // Route even numbers into one branch, everything else into the default.
//! let mut t = Traversal::inject([1i64, 2, 3, 4]).branch(
//!     Selector::Traversal(Traversal::start().map(|t| {
//!         Ok(Value::Int(t.value().as_int().unwrap_or(0) % 2))
//!     })),
//!     |b| {
//!         b.add_branch(PickToken::of(0i64), Traversal::start().count());
//!         b.add_branch(PickToken::none(), Traversal::start().identity());
//!     },
//! );
//!
//! let values = t.to_values().unwrap();
//! // Two even inputs counted, two odd inputs passed through.
//! assert_eq!(values.len(), 3);
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod step;
pub mod strategy;
pub mod traversal;
pub mod traverser;

// Re-export commonly used types
pub use error::{TraversalError, TraversalResult};
pub use step::branch::{BranchStep, Selector};
pub use step::pick::{Pick, PickKey, PickToken};
pub use step::{BoxedStep, Requirement, RequirementSet, Step, StepId};
pub use strategy::{ComputerVerificationStrategy, StrategySet, TraversalStrategy, VerificationError};
pub use traversal::{ExecutionMode, Traversal};
pub use traverser::{Path, Traverser};
