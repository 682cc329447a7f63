//! Traversal strategies.
//!
//! A strategy is a pass applied to a traversal tree before execution. The
//! [`StrategySet`] applies its strategies to the root traversal and then
//! recursively to every child traversal (selectors and branch bodies
//! included); only after the whole set succeeds does execution begin.
//!
//! The only strategy shipped here is [`ComputerVerificationStrategy`];
//! rewrite strategies belong to the surrounding engine and plug into the
//! same trait.

mod verification;

pub use verification::{ComputerVerificationStrategy, VerificationError};

use std::sync::Arc;

use tracing::debug;

use crate::error::TraversalResult;
use crate::traversal::Traversal;

/// A pass over a traversal tree, applied before execution.
pub trait TraversalStrategy: Send + Sync {
    /// Returns the name of this strategy.
    fn name(&self) -> &'static str;

    /// Applies this strategy to one traversal of the tree.
    ///
    /// The set drives recursion into children; a strategy only inspects the
    /// traversal it is handed (and may look into that traversal's steps'
    /// children for structural rules).
    fn apply(&self, traversal: &mut Traversal) -> TraversalResult<()>;
}

/// An ordered collection of strategies.
#[derive(Clone)]
pub struct StrategySet {
    strategies: Vec<Arc<dyn TraversalStrategy>>,
}

impl StrategySet {
    /// Creates an empty strategy set.
    #[must_use]
    pub fn empty() -> Self {
        Self { strategies: Vec::new() }
    }

    /// Adds a strategy to the end of the set.
    #[must_use]
    pub fn with(mut self, strategy: Arc<dyn TraversalStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns `true` if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Applies every strategy to `traversal`, then recurses into all child
    /// traversals. The first failure aborts the application.
    pub fn apply_to_tree(&self, traversal: &mut Traversal) -> TraversalResult<()> {
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "applying traversal strategy");
            strategy.apply(traversal)?;
        }
        traversal.for_each_child_mut(&mut |child| self.apply_to_tree(child))
    }
}

impl Default for StrategySet {
    /// The standard strategy set: computer-mode verification.
    fn default() -> Self {
        Self::empty().with(Arc::new(ComputerVerificationStrategy::new()))
    }
}
