//! Traversals: owned chains of steps under one pull contract.
//!
//! A [`Traversal`] owns its end step; every step owns its upstream input, so
//! the whole chain (and through branching steps, the whole tree) is a single
//! ownership hierarchy. Pulling the traversal pulls the end step, which
//! pulls upstream on demand.
//!
//! Before the first pull, the traversal is prepared: steps are integrated
//! (ids assigned, the execution mode propagated into every child traversal)
//! and the strategy set is applied to the whole tree. Verification failures
//! surface here, before any traverser flows.

use rove_core::{CoreError, Predicate, Value};
use tracing::debug;

use crate::error::TraversalResult;
use crate::step::barrier::{CountStep, SumStep};
use crate::step::branch::{BranchStep, Selector};
use crate::step::filter::{FilterStep, IsStep, WhereStep};
use crate::step::map::{IdentityStep, MapStep};
use crate::step::pick::{Pick, PickToken};
use crate::step::start::StartStep;
use crate::step::{BoxedStep, IntegrationContext, RequirementSet, Step, StepId};
use crate::strategy::StrategySet;
use crate::traverser::Traverser;

/// The execution model a traversal runs under, decided once per traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Single-threaded, cooperative, strictly pull-based evaluation.
    #[default]
    Standard,
    /// Bulk-synchronous, message-passing evaluation driven by an external
    /// distributed scheduler.
    Computer,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Computer => write!(f, "computer"),
        }
    }
}

/// An owned chain of steps exposing the standard pull contract.
#[derive(Clone, Default)]
pub struct Traversal {
    end: Option<BoxedStep>,
    mode: ExecutionMode,
    strategies: StrategySet,
    prepared: bool,
}

impl Traversal {
    /// Creates an empty, anonymous traversal.
    ///
    /// Anonymous traversals are the building blocks for branch bodies and
    /// selectors: they have no source and produce output only when seeded.
    #[must_use]
    pub fn start() -> Self {
        Self::default()
    }

    /// Creates a traversal sourced from the given values.
    #[must_use]
    pub fn inject(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::start().push(Box::new(StartStep::new(values)))
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    /// Appends a step, wiring the current end as its input.
    #[must_use]
    pub fn push(mut self, mut step: BoxedStep) -> Self {
        if let Some(end) = self.end.take() {
            step.base_mut().set_input(end);
        }
        self.end = Some(step);
        self.prepared = false;
        self
    }

    /// Appends an identity step.
    #[must_use]
    pub fn identity(self) -> Self {
        self.push(Box::new(IdentityStep::new()))
    }

    /// Appends a mapping step.
    #[must_use]
    pub fn map(
        self,
        function: impl Fn(&Traverser) -> Result<Value, CoreError> + Send + Sync + 'static,
    ) -> Self {
        self.push(Box::new(MapStep::new(function)))
    }

    /// Appends a filtering step.
    #[must_use]
    pub fn filter(
        self,
        function: impl Fn(&Traverser) -> Result<bool, CoreError> + Send + Sync + 'static,
    ) -> Self {
        self.push(Box::new(FilterStep::new(function)))
    }

    /// Appends a predicate filter.
    #[must_use]
    pub fn is(self, predicate: Predicate) -> Self {
        self.push(Box::new(IsStep::new(predicate)))
    }

    /// Appends a where-filter: traversers pass iff `child`, seeded with a
    /// split of them, produces at least one result.
    #[must_use]
    pub fn where_by(self, child: Self) -> Self {
        self.push(Box::new(WhereStep::new(child)))
    }

    /// Appends a counting barrier.
    #[must_use]
    pub fn count(self) -> Self {
        self.push(Box::new(CountStep::new()))
    }

    /// Appends a summing barrier.
    #[must_use]
    pub fn sum(self) -> Self {
        self.push(Box::new(SumStep::new()))
    }

    /// Labels the current end step; values it produces become addressable
    /// in the traverser path under this label.
    #[must_use]
    pub fn as_label(mut self, label: impl Into<String>) -> Self {
        if let Some(end) = &mut self.end {
            end.base_mut().add_label(label);
        }
        self
    }

    /// Appends a branching step configured by `configure`.
    ///
    /// ```
    /// use rove_core::Value;
    /// use rove_traversal::step::branch::Selector;
    /// use rove_traversal::step::pick::PickToken;
    /// use rove_traversal::traversal::Traversal;
    ///
    /// let mut t = Traversal::inject([1i64, 2, 3]).branch(Selector::Identity, |b| {
    ///     b.add_branch(PickToken::of(1i64), Traversal::start().identity());
    ///     b.add_branch(PickToken::none(), Traversal::start().count());
    /// });
    /// assert_eq!(t.to_values().unwrap().len(), 2);
    /// ```
    #[must_use]
    pub fn branch(self, selector: Selector, configure: impl FnOnce(&mut BranchStep)) -> Self {
        let mut step = BranchStep::new(selector);
        configure(&mut step);
        self.push(Box::new(step))
    }

    /// Appends a union: every traverser is routed into every body exactly
    /// once, and the combined output is exposed under the pull contract.
    #[must_use]
    pub fn union(self, branches: impl IntoIterator<Item = Self>) -> Self {
        let mut step = BranchStep::new(Selector::Constant(Pick::Any));
        for branch in branches {
            step.add_branch(PickToken::any(), branch);
        }
        self.push(Box::new(step))
    }

    /// Appends a two-way choice on a selector's boolean result.
    #[must_use]
    pub fn choose(self, selector: Selector, on_true: Self, on_false: Self) -> Self {
        let mut step = BranchStep::new(selector);
        step.add_branch(PickToken::of(true), on_true);
        step.add_branch(PickToken::of(false), on_false);
        self.push(Box::new(step))
    }

    /// Sets the execution mode. Takes effect at preparation.
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self.prepared = false;
        self
    }

    /// Replaces the strategy set applied at preparation.
    #[must_use]
    pub fn with_strategies(mut self, strategies: StrategySet) -> Self {
        self.strategies = strategies;
        self.prepared = false;
        self
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Returns the execution mode.
    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Returns the steps head-first.
    #[must_use]
    pub fn steps(&self) -> Vec<&dyn Step> {
        let mut steps = Vec::new();
        let mut current = self.end.as_deref();
        while let Some(step) = current {
            steps.push(step);
            current = step.input();
        }
        steps.reverse();
        steps
    }

    /// Returns `true` if the chain or any child traversal contains a
    /// reducing barrier.
    #[must_use]
    pub fn contains_barrier(&self) -> bool {
        self.steps().iter().any(|step| {
            step.is_barrier()
                || step.local_children().iter().any(|child| child.contains_barrier())
                || step.global_children().iter().any(|child| child.contains_barrier())
        })
    }

    /// Returns the aggregated requirements of the whole tree.
    #[must_use]
    pub fn requirements(&self) -> RequirementSet {
        self.end.as_deref().map_or_else(RequirementSet::defaults, |end| end.requirements())
    }

    /// Returns the id of the entry (head) step.
    #[must_use]
    pub fn entry_step_id(&self) -> StepId {
        self.steps().first().map_or(StepId::UNSET, |step| step.id())
    }

    /// Reports whether the entry step still holds pending seeded
    /// traversers.
    #[must_use]
    pub fn has_starts(&self) -> bool {
        self.end.as_deref().is_some_and(|end| end.has_starts())
    }

    /// Seeds a traverser into the entry step.
    pub fn add_start(&mut self, start: Traverser) {
        if let Some(end) = &mut self.end {
            end.inject(start);
        }
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Prepares the traversal: integrates the tree and applies strategies.
    ///
    /// Runs once; later calls are no-ops. A verification failure leaves the
    /// traversal unprepared and is returned again on every subsequent pull.
    pub fn prepare(&mut self) -> TraversalResult<()> {
        if self.prepared {
            return Ok(());
        }
        debug!(mode = %self.mode, "preparing traversal");
        let mut ctx = IntegrationContext::new(self.mode);
        self.integrate(&mut ctx);
        let strategies = self.strategies.clone();
        if let Err(error) = strategies.apply_to_tree(self) {
            self.prepared = false;
            return Err(error);
        }
        Ok(())
    }

    /// Integrates this traversal into a tree being prepared: adopts the
    /// context's mode and assigns step ids through the chain and all
    /// children.
    pub(crate) fn integrate(&mut self, ctx: &mut IntegrationContext) {
        self.mode = ctx.mode();
        if let Some(end) = &mut self.end {
            end.integrate(ctx);
        }
        self.prepared = true;
    }

    /// Applies `f` to every child traversal of every step in the chain.
    pub(crate) fn for_each_child_mut(
        &mut self,
        f: &mut dyn FnMut(&mut Self) -> TraversalResult<()>,
    ) -> TraversalResult<()> {
        fn visit(
            step: &mut BoxedStep,
            f: &mut dyn FnMut(&mut Traversal) -> TraversalResult<()>,
        ) -> TraversalResult<()> {
            for child in step.local_children_mut() {
                f(child)?;
            }
            for child in step.global_children_mut() {
                f(child)?;
            }
            if let Some(input) = step.base_mut().input_mut() {
                visit(input, f)?;
            }
            Ok(())
        }
        if let Some(end) = &mut self.end {
            visit(end, f)?;
        }
        Ok(())
    }

    /// Returns the next traverser, or `None` at end-of-sequence.
    pub fn next(&mut self) -> TraversalResult<Option<Traverser>> {
        self.prepare()?;
        match &mut self.end {
            Some(end) => end.next(),
            None => Ok(None),
        }
    }

    /// Returns the next value, or `None` at end-of-sequence.
    pub fn next_value(&mut self) -> TraversalResult<Option<Value>> {
        Ok(self.next()?.map(Traverser::into_value))
    }

    /// Drains the traversal into a list of values, expanding bulk.
    pub fn to_values(&mut self) -> TraversalResult<Vec<Value>> {
        let mut values = Vec::new();
        while let Some(traverser) = self.next()? {
            for _ in 0..traverser.bulk() {
                values.push(traverser.value().clone());
            }
        }
        Ok(values)
    }

    /// Drains the traversal into a list of traversers.
    pub fn to_traversers(&mut self) -> TraversalResult<Vec<Traverser>> {
        let mut traversers = Vec::new();
        while let Some(traverser) = self.next()? {
            traversers.push(traverser);
        }
        Ok(traversers)
    }

    /// Clears transient iteration state for a fresh execution. Structure,
    /// registered branches, and assigned step ids are preserved.
    pub fn reset(&mut self) {
        if let Some(end) = &mut self.end {
            end.reset();
        }
    }
}

impl std::fmt::Display for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.end.is_none() {
            return write!(f, "[]");
        }
        write!(f, "[")?;
        for (i, step) in self.steps().iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", step.display())?;
        }
        write!(f, "]")
    }
}
