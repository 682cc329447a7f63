//! Traversers: the tokens that flow through a traversal.
//!
//! A [`Traverser`] carries a current value, a repetition count ("bulk"), the
//! path of values it has moved through, and its current step position. It is
//! owned by the pipeline and passed by move; [`Traverser::split`] produces an
//! independent copy for routing into another branch.

mod path;

pub use path::{Path, PathSegment};

use rove_core::Value;

use crate::step::StepId;

/// A single token in transit through a traversal.
///
/// # Invariants
///
/// - `bulk >= 1` always; constructors and setters clamp.
/// - `split` duplicates the full bulk into the new traverser (broadcast
///   semantics: branch routing fans a traverser out, it does not partition
///   it).
#[derive(Debug, Clone, PartialEq)]
pub struct Traverser {
    value: Value,
    bulk: u64,
    path: Path,
    step_id: StepId,
}

impl Traverser {
    /// Creates a traverser carrying `value` with bulk 1.
    ///
    /// The path starts with the initial value, unlabeled.
    #[must_use]
    pub fn new(value: Value) -> Self {
        let mut path = Path::new();
        path.extend(value.clone(), &[]);
        Self { value, bulk: 1, path, step_id: StepId::UNSET }
    }

    /// Sets the bulk, clamping to at least 1.
    #[must_use]
    pub fn with_bulk(mut self, bulk: u64) -> Self {
        self.bulk = bulk.max(1);
        self
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the traverser and returns its value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the repetition count this traverser represents.
    #[must_use]
    pub const fn bulk(&self) -> u64 {
        self.bulk
    }

    /// Sets the bulk, clamping to at least 1.
    pub fn set_bulk(&mut self, bulk: u64) {
        self.bulk = bulk.max(1);
    }

    /// Returns the path of values this traverser has moved through.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the step this traverser is currently routed to.
    #[must_use]
    pub const fn step_id(&self) -> StepId {
        self.step_id
    }

    /// Routes this traverser to the given step.
    pub fn set_step_id(&mut self, step_id: StepId) {
        self.step_id = step_id;
    }

    /// Produces an independent traverser with the same value, path, and
    /// bulk, routable to a different branch. The original is unaffected.
    #[must_use]
    pub fn split(&self) -> Self {
        self.clone()
    }

    /// Moves the traverser to a new value, extending the path with the
    /// producing step's labels.
    #[must_use]
    pub fn advance(mut self, value: Value, labels: &[String]) -> Self {
        self.path.extend(value.clone(), labels);
        self.value = value;
        self
    }
}

impl std::fmt::Display for Traverser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bulk == 1 {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}x{}", self.value, self.bulk)
        }
    }
}
