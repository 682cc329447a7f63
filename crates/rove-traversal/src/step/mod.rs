//! Step trait and base types.
//!
//! This module defines the [`Step`] trait that all traversal steps
//! implement, plus the shared [`StepBase`] state every step owns.
//!
//! Steps form a chain: each step owns its upstream input, and data flows
//! from the head (a source or a seeded entry point) toward the end. Pulling
//! the end step pulls the whole chain. Branching steps additionally own
//! child traversals: a local child evaluated per traverser (the selector)
//! and global children that traversers are routed into (the branches).

pub mod barrier;
pub mod branch;
pub mod filter;
pub mod map;
pub mod pick;
pub mod registry;
pub mod start;

use std::collections::VecDeque;

use crate::error::TraversalResult;
use crate::traversal::{ExecutionMode, Traversal};
use crate::traverser::Traverser;

/// Result type for step operations.
pub type StepResult<T> = TraversalResult<T>;

/// A boxed step for dynamic dispatch.
pub type BoxedStep = Box<dyn Step>;

impl Clone for BoxedStep {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Identifier of a step within a prepared traversal tree.
///
/// Ids are assigned during integration (head first, children after their
/// parent) and are what computer-mode splits are tagged with so an external
/// scheduler can deliver them to the right branch entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StepId(u64);

impl StepId {
    /// The id of a step that has not been integrated yet.
    pub const UNSET: Self = Self(0);

    /// Creates a step id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step#{}", self.0)
    }
}

/// A capability a step requires of the traversers flowing through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Requirement {
    /// The traverser carries a value.
    Object = 1,
    /// The traverser carries a repetition count.
    Bulk = 1 << 1,
    /// The traverser records the path of values it moved through.
    Path = 1 << 2,
    /// The traverser records labeled path segments.
    LabeledPath = 1 << 3,
    /// The computation must touch elements outside the local partition.
    ///
    /// Under the computer execution model a step chain hops between
    /// partitions via message passing, but a computation evaluated inside a
    /// single superstep (a selector, a where-clause body) cannot; the
    /// verification strategy rejects local children carrying this.
    RemoteAccess = 1 << 4,
}

/// A small set of [`Requirement`]s, propagated from children and upstream
/// steps toward the traversal root.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RequirementSet(u8);

impl RequirementSet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The requirements every step carries.
    #[must_use]
    pub const fn defaults() -> Self {
        Self(Requirement::Object as u8 | Requirement::Bulk as u8)
    }

    /// Returns this set with `requirement` added.
    #[must_use]
    pub const fn with(self, requirement: Requirement) -> Self {
        Self(self.0 | requirement as u8)
    }

    /// Adds a requirement in place.
    pub fn insert(&mut self, requirement: Requirement) {
        self.0 |= requirement as u8;
    }

    /// Returns `true` if the set contains `requirement`.
    #[must_use]
    pub const fn contains(self, requirement: Requirement) -> bool {
        self.0 & requirement as u8 != 0
    }

    /// Returns the union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Debug for RequirementSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const ALL: [Requirement; 5] = [
            Requirement::Object,
            Requirement::Bulk,
            Requirement::Path,
            Requirement::LabeledPath,
            Requirement::RemoteAccess,
        ];
        let mut set = f.debug_set();
        for requirement in ALL {
            if self.contains(requirement) {
                set.entry(&requirement);
            }
        }
        set.finish()
    }
}

/// State threaded through step integration: id assignment and the execution
/// mode the traversal tree will run under.
#[derive(Debug)]
pub struct IntegrationContext {
    counter: u64,
    mode: ExecutionMode,
}

impl IntegrationContext {
    /// Creates a context for the given execution mode.
    #[must_use]
    pub const fn new(mode: ExecutionMode) -> Self {
        Self { counter: 0, mode }
    }

    /// Returns the next fresh step id.
    pub fn next_id(&mut self) -> StepId {
        self.counter += 1;
        StepId::new(self.counter)
    }

    /// Returns the execution mode being integrated for.
    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

/// The step trait for pull-based traversal execution.
///
/// # Lifecycle
///
/// 1. **Construction**: steps are chained during traversal building.
/// 2. **Integration**: ids are assigned and the execution mode is
///    propagated into every child traversal.
/// 3. **Execution**: `next` is pulled repeatedly; `Ok(None)` signals
///    end-of-sequence (a control condition, never an error).
/// 4. **Reset**: `reset` clears transient iteration state only; the step
///    chain and any registered children survive for the next execution.
///
/// # Thread Safety
///
/// The `Send` bound allows traversals to be moved between threads, but
/// steps maintain mutable internal state and are not `Sync`.
pub trait Step: Send {
    /// Returns the shared base state.
    fn base(&self) -> &StepBase;

    /// Returns the shared base state mutably.
    fn base_mut(&mut self) -> &mut StepBase;

    /// Returns the name of this step type.
    fn name(&self) -> &'static str;

    /// Returns the next traverser, or `None` at end-of-sequence.
    fn next(&mut self) -> StepResult<Option<Traverser>>;

    /// Deep-clones this step, including its upstream chain and all child
    /// traversals. Clones share no mutable state with the original.
    fn clone_box(&self) -> BoxedStep;

    /// Returns this step's id.
    fn id(&self) -> StepId {
        self.base().id()
    }

    /// Returns a structural description of this step for diagnostics.
    ///
    /// Defaults to the step name; steps with children enumerate them.
    fn display(&self) -> String {
        self.name().to_owned()
    }

    /// Returns the upstream step, if any.
    fn input(&self) -> Option<&dyn Step> {
        self.base().input()
    }

    /// Seeds a traverser into the head of this step's chain.
    fn inject(&mut self, start: Traverser) {
        self.base_mut().inject(start);
    }

    /// Reports whether the head of this step's chain has pending seeded
    /// traversers that have not been consumed yet.
    fn has_starts(&self) -> bool {
        self.base().has_starts()
    }

    /// Clears transient iteration state, recursively through the upstream
    /// chain. Structure (the chain itself, child traversals) is preserved.
    fn reset(&mut self) {
        self.base_mut().reset_base();
        self.reset_state();
    }

    /// Hook for clearing step-specific transient state.
    fn reset_state(&mut self) {}

    /// Returns `true` if this step must consume all input before producing
    /// output (a reducing barrier).
    fn is_barrier(&self) -> bool {
        false
    }

    /// Requirements contributed by this step itself, beyond the defaults.
    fn step_requirements(&self) -> RequirementSet {
        RequirementSet::empty()
    }

    /// Returns the full requirement set of this step: its own, its
    /// upstream chain's, and its children's.
    fn requirements(&self) -> RequirementSet {
        let mut requirements = RequirementSet::defaults().union(self.step_requirements());
        if let Some(input) = self.base().input() {
            requirements = requirements.union(input.requirements());
        }
        for child in self.local_children() {
            requirements = requirements.union(child.requirements());
        }
        for child in self.global_children() {
            requirements = requirements.union(child.requirements());
        }
        if !self.base().labels().is_empty() {
            requirements.insert(Requirement::LabeledPath);
        }
        requirements
    }

    /// Child traversals evaluated per traverser (selectors, where-clauses).
    fn local_children(&self) -> Vec<&Traversal> {
        Vec::new()
    }

    /// Child traversals that traversers are routed into (branches).
    fn global_children(&self) -> Vec<&Traversal> {
        Vec::new()
    }

    /// Mutable access to local children, for strategy application.
    fn local_children_mut(&mut self) -> Vec<&mut Traversal> {
        Vec::new()
    }

    /// Mutable access to global children, for strategy application.
    fn global_children_mut(&mut self) -> Vec<&mut Traversal> {
        Vec::new()
    }

    /// Integrates this step into a traversal tree: assigns ids head-first
    /// through the upstream chain, then integrates children.
    fn integrate(&mut self, ctx: &mut IntegrationContext) {
        if let Some(input) = self.base_mut().input_mut() {
            input.integrate(ctx);
        }
        let id = ctx.next_id();
        self.base_mut().set_id(id);
        self.integrate_children(ctx);
    }

    /// Hook for integrating child traversals.
    fn integrate_children(&mut self, _ctx: &mut IntegrationContext) {}
}

/// Base state shared by all steps.
pub struct StepBase {
    /// Assigned during integration.
    id: StepId,
    /// Labels applied to traversers this step produces.
    labels: Vec<String>,
    /// The upstream step, if this step is not the head of its chain.
    input: Option<BoxedStep>,
    /// Seeded traversers waiting to be consumed. Only the head of a chain
    /// receives seeds; `inject` routes them there.
    starts: VecDeque<Traverser>,
}

impl StepBase {
    /// Creates base state for a head step.
    #[must_use]
    pub fn new() -> Self {
        Self { id: StepId::UNSET, labels: Vec::new(), input: None, starts: VecDeque::new() }
    }

    /// Returns the step id.
    #[must_use]
    pub const fn id(&self) -> StepId {
        self.id
    }

    /// Sets the step id.
    pub fn set_id(&mut self, id: StepId) {
        self.id = id;
    }

    /// Returns the labels attached to this step.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Attaches a label to this step.
    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.push(label.into());
    }

    /// Returns the upstream step, if any.
    #[must_use]
    pub fn input(&self) -> Option<&dyn Step> {
        self.input.as_deref()
    }

    /// Returns the upstream step mutably, if any.
    pub fn input_mut(&mut self) -> Option<&mut BoxedStep> {
        self.input.as_mut()
    }

    /// Attaches an upstream step. The previous input, if any, is dropped.
    pub fn set_input(&mut self, input: BoxedStep) {
        self.input = Some(input);
    }

    /// Seeds a traverser into the head of the chain.
    pub fn inject(&mut self, start: Traverser) {
        match &mut self.input {
            Some(input) => input.inject(start),
            None => self.starts.push_back(start),
        }
    }

    /// Reports pending seeds at the head of the chain.
    #[must_use]
    pub fn has_starts(&self) -> bool {
        match &self.input {
            Some(input) => input.has_starts(),
            None => !self.starts.is_empty(),
        }
    }

    /// Pulls the next traverser: local seeds first, then the upstream step.
    pub fn pull(&mut self) -> StepResult<Option<Traverser>> {
        if let Some(start) = self.starts.pop_front() {
            return Ok(Some(start));
        }
        match &mut self.input {
            Some(input) => input.next(),
            None => Ok(None),
        }
    }

    /// Clears pending seeds and resets the upstream chain.
    pub fn reset_base(&mut self) {
        self.starts.clear();
        if let Some(input) = &mut self.input {
            input.reset();
        }
    }
}

impl Default for StepBase {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StepBase {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            labels: self.labels.clone(),
            input: self.input.clone(),
            starts: self.starts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rove_core::Value;

    #[test]
    fn requirement_set_operations() {
        let mut set = RequirementSet::defaults();
        assert!(set.contains(Requirement::Object));
        assert!(set.contains(Requirement::Bulk));
        assert!(!set.contains(Requirement::Path));

        set.insert(Requirement::Path);
        assert!(set.contains(Requirement::Path));

        let other = RequirementSet::empty().with(Requirement::RemoteAccess);
        let union = set.union(other);
        assert!(union.contains(Requirement::RemoteAccess));
        assert!(union.contains(Requirement::Object));

        assert!(RequirementSet::empty().is_empty());
        assert!(!union.is_empty());
    }

    #[test]
    fn step_base_seeding() {
        let mut base = StepBase::new();
        assert!(!base.has_starts());

        base.inject(Traverser::new(Value::Int(1)));
        assert!(base.has_starts());

        let pulled = base.pull().expect("pull cannot fail on a bare base");
        assert_eq!(pulled.map(Traverser::into_value), Some(Value::Int(1)));
        assert!(!base.has_starts());
    }

    #[test]
    fn integration_assigns_sequential_ids() {
        let mut ctx = IntegrationContext::new(ExecutionMode::Standard);
        assert_eq!(ctx.next_id(), StepId::new(1));
        assert_eq!(ctx.next_id(), StepId::new(2));
    }
}
