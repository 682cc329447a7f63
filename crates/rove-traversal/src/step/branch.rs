//! The conditional branching step.
//!
//! [`BranchStep`] evaluates a selector per incoming traverser, resolves the
//! matching branch bodies through the registry, and seeds each resolved body
//! (plus the `any` body, unless the selector itself produced the `any`
//! sentinel) with an independent split of the traverser.
//!
//! The same registry is executed by two explicit algorithms, dispatched by
//! an execution-mode tag decided once at integration time:
//!
//! - **standard**: a cooperative prime/drain loop that yields branch output
//!   under the ordinary pull contract;
//! - **computer**: one upstream traverser per refill, emitting splits tagged
//!   with their target branch's entry step id for an external
//!   bulk-synchronous scheduler to deliver. No local draining occurs.

use std::collections::VecDeque;

use tracing::trace;

use super::pick::{Pick, PickKey, PickToken};
use super::registry::{BranchRegistry, PrimingMode};
use super::{IntegrationContext, Step, StepBase, StepResult};
use crate::error::TraversalError;
use crate::traversal::{ExecutionMode, Traversal};
use crate::traverser::Traverser;

/// The branch selector, evaluated against each incoming traverser.
#[derive(Clone)]
pub enum Selector {
    /// Route on the traverser's current value.
    Identity,
    /// Route every traverser to a fixed sentinel. `Constant(Pick::Any)` is
    /// how a union routes everything to all of its bodies exactly once.
    Constant(Pick),
    /// Evaluate a traversal against the traverser and route on its first
    /// result. Producing no result is an error.
    Traversal(Traversal),
    /// Evaluate a traversal against the traverser and route on whether it
    /// produced any result at all (`true`/`false` keys).
    Test(Traversal),
}

impl Selector {
    /// Evaluates the selector for one traverser.
    fn evaluate(&mut self, start: &Traverser) -> StepResult<PickKey> {
        match self {
            Self::Identity => Ok(PickKey::normalize_value(start.value().clone())),
            Self::Constant(Pick::Any) => Ok(PickKey::Any),
            Self::Constant(Pick::None) => Ok(PickKey::None),
            Self::Traversal(traversal) => {
                traversal.reset();
                traversal.add_start(start.split());
                match traversal.next()? {
                    Some(result) => Ok(PickKey::normalize_value(result.into_value())),
                    None => Err(TraversalError::Selector(start.value().to_string())),
                }
            }
            Self::Test(traversal) => {
                traversal.reset();
                traversal.add_start(start.split());
                let passed = traversal.next()?.is_some();
                Ok(PickKey::normalize_value(passed.into()))
            }
        }
    }

    fn traversal(&self) -> Option<&Traversal> {
        match self {
            Self::Traversal(traversal) | Self::Test(traversal) => Some(traversal),
            _ => None,
        }
    }

    fn traversal_mut(&mut self) -> Option<&mut Traversal> {
        match self {
            Self::Traversal(traversal) | Self::Test(traversal) => Some(traversal),
            _ => None,
        }
    }

    fn reset(&mut self) {
        if let Some(traversal) = self.traversal_mut() {
            traversal.reset();
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "value"),
            Self::Constant(pick) => write!(f, "constant({pick})"),
            Self::Traversal(traversal) => write!(f, "{traversal}"),
            Self::Test(traversal) => write!(f, "test({traversal})"),
        }
    }
}

/// The conditional branching step.
///
/// Built incrementally (one [`BranchStep::add_branch`] call per
/// language-level branch clause), frozen for strategy application, and reset
/// between executions without losing its registered structure.
#[derive(Clone)]
pub struct BranchStep {
    base: StepBase,
    selector: Selector,
    registry: BranchRegistry,
    mode: ExecutionMode,
    /// Whether a standard-mode round has primed yet. The first pull goes
    /// straight to priming; afterwards draining is attempted first.
    primed: bool,
    /// Computer-mode outgoing messages not yet handed to the scheduler.
    outgoing: VecDeque<Traverser>,
}

impl BranchStep {
    /// Creates a branching step with the given selector.
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            base: StepBase::new(),
            selector,
            registry: BranchRegistry::new(),
            mode: ExecutionMode::Standard,
            primed: false,
            outgoing: VecDeque::new(),
        }
    }

    /// Registers a branch body under a pick token.
    ///
    /// Called once per branch clause; `PickToken::none()` registers the
    /// default body and `PickToken::any()` the fires-in-addition body.
    pub fn add_branch(&mut self, token: impl Into<PickToken>, traversal: Traversal) {
        self.registry.register(PickKey::normalize_token(token.into()), traversal);
    }

    /// Returns the branch registry.
    #[must_use]
    pub fn registry(&self) -> &BranchRegistry {
        &self.registry
    }

    /// Evaluates the selector for `start` and seeds every resolved body
    /// (plus the `any` bodies when applicable) with an independent split.
    fn route(&mut self, start: &Traverser) -> StepResult<()> {
        let key = self.selector.evaluate(start)?;
        let targets = self.registry.resolve(&key);
        trace!(key = %key, targets = targets.len(), "routing traverser");
        for index in &targets {
            self.registry.seed(*index, start.split());
        }
        if !key.is_any() {
            for index in self.registry.any_options() {
                self.registry.seed(index, start.split());
            }
        }
        Ok(())
    }

    /// The single-pass, pull-based algorithm.
    fn standard_next(&mut self) -> StepResult<Option<Traverser>> {
        loop {
            if self.primed {
                if let Some(traverser) = self.registry.drain_next()? {
                    return Ok(Some(traverser));
                }
            }
            self.primed = true;

            match self.registry.priming_mode() {
                PrimingMode::Exhaustive => {
                    // Barrier-holding bodies cannot report partial results;
                    // this round must consume everything upstream. Nothing
                    // left means end-of-sequence.
                    match self.base.pull()? {
                        Some(start) => {
                            self.route(&start)?;
                            while let Some(start) = self.base.pull()? {
                                self.route(&start)?;
                            }
                        }
                        None => return Ok(None),
                    }
                }
                PrimingMode::PerTraverser => match self.base.pull()? {
                    Some(start) => self.route(&start)?,
                    None => return Ok(None),
                },
            }
        }
    }

    /// The bulk-synchronous algorithm: one upstream traverser per refill,
    /// splits tagged with their branch's entry step for the external
    /// scheduler. The step keeps no round state beyond the outgoing buffer.
    fn computer_next(&mut self) -> StepResult<Option<Traverser>> {
        loop {
            if let Some(message) = self.outgoing.pop_front() {
                return Ok(Some(message));
            }
            let Some(start) = self.base.pull()? else {
                return Ok(None);
            };
            let key = self.selector.evaluate(&start)?;
            let targets = self.registry.resolve(&key);
            trace!(key = %key, targets = targets.len(), "emitting branch messages");
            for index in &targets {
                let mut split = start.split();
                split.set_step_id(self.registry.entry_step_id(*index));
                self.outgoing.push_back(split);
            }
            if !key.is_any() {
                for index in self.registry.any_options() {
                    let mut split = start.split();
                    split.set_step_id(self.registry.entry_step_id(index));
                    self.outgoing.push_back(split);
                }
            }
        }
    }
}

impl Step for BranchStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Branch"
    }

    fn display(&self) -> String {
        self.to_string()
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        match self.mode {
            ExecutionMode::Standard => self.standard_next(),
            ExecutionMode::Computer => self.computer_next(),
        }
    }

    fn local_children(&self) -> Vec<&Traversal> {
        self.selector.traversal().into_iter().collect()
    }

    fn local_children_mut(&mut self) -> Vec<&mut Traversal> {
        self.selector.traversal_mut().into_iter().collect()
    }

    fn global_children(&self) -> Vec<&Traversal> {
        self.registry.options().map(super::registry::BranchOption::traversal).collect()
    }

    fn global_children_mut(&mut self) -> Vec<&mut Traversal> {
        self.registry.options_mut().map(super::registry::BranchOption::traversal_mut).collect()
    }

    fn integrate_children(&mut self, ctx: &mut IntegrationContext) {
        self.mode = ctx.mode();
        if let Some(traversal) = self.selector.traversal_mut() {
            traversal.integrate(ctx);
        }
        for option in self.registry.options_mut() {
            option.traversal_mut().integrate(ctx);
        }
    }

    fn reset_state(&mut self) {
        self.primed = false;
        self.outgoing.clear();
        self.selector.reset();
        self.registry.reset();
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

impl std::fmt::Display for BranchStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Branch({}, {})", self.selector, self.registry)
    }
}
