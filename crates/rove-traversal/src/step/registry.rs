//! The branch registry: ordered pick-key to sub-traversal options.

use super::pick::PickKey;
use super::{Step, StepBase, StepId, StepResult};
use crate::traversal::Traversal;
use crate::traverser::Traverser;

/// How the branching step primes a round, selected once at registration
/// time.
///
/// A branch body holding a reducing barrier cannot report partial results,
/// so as soon as any registered body contains a barrier anywhere in its
/// closure, priming must exhaust all remaining upstream traversers before
/// draining begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimingMode {
    /// Consume exactly one upstream traverser per round.
    #[default]
    PerTraverser,
    /// Consume all remaining upstream traversers before draining.
    Exhaustive,
}

/// Terminal marker appended to every registered branch body.
///
/// It gives each body a uniform exit point that stamps emitted traversers
/// with its step id, and it keeps the body's entry queue observable from the
/// outside (`has_starts`) even when the body holds a barrier that would
/// otherwise answer for itself.
#[derive(Clone)]
pub struct EndStep {
    base: StepBase,
}

impl EndStep {
    /// Creates an end marker.
    #[must_use]
    pub fn new() -> Self {
        Self { base: StepBase::new() }
    }
}

impl Default for EndStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for EndStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "End"
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        match self.base.pull()? {
            Some(mut traverser) => {
                traverser.set_step_id(self.base.id());
                Ok(Some(traverser))
            }
            None => Ok(None),
        }
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

/// One registered branch: a normalized key and the body it routes into.
#[derive(Clone)]
pub struct BranchOption {
    key: PickKey,
    traversal: Traversal,
}

impl BranchOption {
    /// Returns the option's key.
    #[must_use]
    pub fn key(&self) -> &PickKey {
        &self.key
    }

    /// Returns the option's body.
    #[must_use]
    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    /// Returns the option's body mutably.
    pub fn traversal_mut(&mut self) -> &mut Traversal {
        &mut self.traversal
    }
}

/// Insertion-ordered multimap from pick key to branch bodies.
///
/// Several options may share a key; global registration order is what
/// draining follows. Built once during traversal construction and treated
/// as read-only structure afterwards — only the bodies' transient iteration
/// state changes between runs.
#[derive(Clone, Default)]
pub struct BranchRegistry {
    options: Vec<BranchOption>,
    priming_mode: PrimingMode,
}

impl BranchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a branch body under `key`.
    ///
    /// The body gets the [`EndStep`] terminal marker appended, and the
    /// priming mode is recomputed: once any registered body contains a
    /// barrier, priming stays exhaustive for the life of the registry.
    pub fn register(&mut self, key: PickKey, traversal: Traversal) {
        let traversal = traversal.push(Box::new(EndStep::new()));
        if traversal.contains_barrier() {
            self.priming_mode = PrimingMode::Exhaustive;
        }
        self.options.push(BranchOption { key, traversal });
    }

    /// Returns the priming mode selected by the registered bodies.
    #[must_use]
    pub const fn priming_mode(&self) -> PrimingMode {
        self.priming_mode
    }

    /// Returns the number of registered options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` if no options are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Iterates over the registered options in registration order.
    pub fn options(&self) -> impl Iterator<Item = &BranchOption> {
        self.options.iter()
    }

    /// Iterates mutably over the registered options.
    pub fn options_mut(&mut self) -> impl Iterator<Item = &mut BranchOption> {
        self.options.iter_mut()
    }

    /// Resolves the options a probe key routes to.
    ///
    /// Two-phase matching per option (structural equality, then predicate
    /// test); if nothing matches, falls back to the options registered under
    /// the `none` sentinel.
    #[must_use]
    pub fn resolve(&self, probe: &PickKey) -> Vec<usize> {
        let matched: Vec<usize> = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.key.matches(probe))
            .map(|(index, _)| index)
            .collect();
        if !matched.is_empty() {
            return matched;
        }
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| matches!(option.key, PickKey::None))
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns the options registered under the `any` sentinel.
    #[must_use]
    pub fn any_options(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| matches!(option.key, PickKey::Any))
            .map(|(index, _)| index)
            .collect()
    }

    /// Seeds a split traverser into an option's body.
    pub fn seed(&mut self, index: usize, traverser: Traverser) {
        if let Some(option) = self.options.get_mut(index) {
            option.traversal.add_start(traverser);
        }
    }

    /// Returns the entry step id of an option's body.
    #[must_use]
    pub fn entry_step_id(&self, index: usize) -> StepId {
        self.options.get(index).map_or(StepId::UNSET, |option| option.traversal.entry_step_id())
    }

    /// Yields the next drained traverser, scanning options in registration
    /// order. An option only qualifies while its entry still reports a
    /// pending seeded traverser; barriers that were never fed this round are
    /// skipped rather than asked for an empty aggregate.
    pub fn drain_next(&mut self) -> StepResult<Option<Traverser>> {
        for option in &mut self.options {
            if option.traversal.has_starts() {
                if let Some(traverser) = option.traversal.next()? {
                    return Ok(Some(traverser));
                }
            }
        }
        Ok(None)
    }

    /// Resets the transient iteration state of every body. Registered
    /// structure is untouched.
    pub fn reset(&mut self) {
        for option in &mut self.options {
            option.traversal.reset();
        }
    }
}

impl std::fmt::Display for BranchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", option.key, option.traversal)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::pick::PickToken;
    use rove_core::{Predicate, Value};

    fn key(token: PickToken) -> PickKey {
        PickKey::normalize_token(token)
    }

    #[test]
    fn resolve_matches_numeric_keys_across_types() {
        let mut registry = BranchRegistry::new();
        registry.register(key(PickToken::of(1i64)), Traversal::start().identity());
        registry.register(key(PickToken::of(2i64)), Traversal::start().identity());

        let probe = PickKey::normalize_value(Value::Float(2.0));
        assert_eq!(registry.resolve(&probe), vec![1]);
    }

    #[test]
    fn resolve_falls_back_to_none() {
        let mut registry = BranchRegistry::new();
        registry.register(key(PickToken::of(1i64)), Traversal::start().identity());
        registry.register(key(PickToken::none()), Traversal::start().identity());

        let probe = PickKey::normalize_value(Value::Int(42));
        assert_eq!(registry.resolve(&probe), vec![1]);
    }

    #[test]
    fn resolve_collects_all_matching_options() {
        let mut registry = BranchRegistry::new();
        registry.register(key(PickToken::of(1i64)), Traversal::start().identity());
        registry.register(
            key(PickToken::predicate(Predicate::gt(0i64))),
            Traversal::start().identity(),
        );
        registry.register(key(PickToken::of(1i64)), Traversal::start().identity());

        let probe = PickKey::normalize_value(Value::Int(1));
        assert_eq!(registry.resolve(&probe), vec![0, 1, 2]);
    }

    #[test]
    fn resolve_without_match_or_none_is_empty() {
        let mut registry = BranchRegistry::new();
        registry.register(key(PickToken::of(1i64)), Traversal::start().identity());
        let probe = PickKey::normalize_value(Value::Int(42));
        assert!(registry.resolve(&probe).is_empty());
    }

    #[test]
    fn any_options_are_separate_from_resolution() {
        let mut registry = BranchRegistry::new();
        registry.register(key(PickToken::of(1i64)), Traversal::start().identity());
        registry.register(key(PickToken::any()), Traversal::start().identity());

        let probe = PickKey::normalize_value(Value::Int(1));
        assert_eq!(registry.resolve(&probe), vec![0]);
        assert_eq!(registry.any_options(), vec![1]);
    }

    #[test]
    fn barrier_bodies_switch_priming_mode_permanently() {
        let mut registry = BranchRegistry::new();
        assert_eq!(registry.priming_mode(), PrimingMode::PerTraverser);

        registry.register(key(PickToken::of(1i64)), Traversal::start().count());
        assert_eq!(registry.priming_mode(), PrimingMode::Exhaustive);

        // A later barrier-free body does not lower the mode.
        registry.register(key(PickToken::of(2i64)), Traversal::start().identity());
        assert_eq!(registry.priming_mode(), PrimingMode::Exhaustive);
    }

    #[test]
    fn drain_skips_unseeded_barrier_bodies() {
        let mut registry = BranchRegistry::new();
        registry.register(key(PickToken::of(1i64)), Traversal::start().count());
        registry.register(key(PickToken::of(2i64)), Traversal::start().count());

        registry.seed(1, Traverser::new(Value::Int(9)));
        let drained = registry.drain_next().expect("drain succeeds").expect("one result");
        // Only the seeded count fires; the unseeded one must not emit 0.
        assert_eq!(drained.value(), &Value::Int(1));
        assert_eq!(registry.drain_next().expect("drain succeeds"), None);
    }
}
