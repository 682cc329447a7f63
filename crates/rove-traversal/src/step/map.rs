//! Value-mapping steps.

use std::sync::Arc;

use rove_core::{CoreError, Value};

use super::{Requirement, RequirementSet, Step, StepBase, StepResult};
use crate::traverser::Traverser;

/// A user-supplied mapping function.
///
/// Failures are user-level ([`CoreError`]) and propagate through the
/// traversal unmodified.
pub type MapFn = Arc<dyn Fn(&Traverser) -> Result<Value, CoreError> + Send + Sync>;

/// Maps each traverser's value through a function, extending its path.
#[derive(Clone)]
pub struct MapStep {
    base: StepBase,
    function: MapFn,
    extra_requirements: RequirementSet,
}

impl MapStep {
    /// Creates a map step from a function.
    pub fn new(
        function: impl Fn(&Traverser) -> Result<Value, CoreError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            base: StepBase::new(),
            function: Arc::new(function),
            extra_requirements: RequirementSet::empty(),
        }
    }

    /// Declares an extra requirement for this step.
    ///
    /// The graph layer marks property-walk mappings with
    /// [`Requirement::RemoteAccess`] this way, which is what computer-mode
    /// verification keys on.
    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.extra_requirements.insert(requirement);
        self
    }
}

impl Step for MapStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Map"
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        match self.base.pull()? {
            Some(traverser) => {
                let value = (self.function)(&traverser)?;
                let labels = self.base.labels().to_vec();
                Ok(Some(traverser.advance(value, &labels)))
            }
            None => Ok(None),
        }
    }

    fn step_requirements(&self) -> RequirementSet {
        self.extra_requirements
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

/// Passes traversers through unchanged.
#[derive(Clone)]
pub struct IdentityStep {
    base: StepBase,
}

impl IdentityStep {
    /// Creates an identity step.
    #[must_use]
    pub fn new() -> Self {
        Self { base: StepBase::new() }
    }
}

impl Default for IdentityStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for IdentityStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        self.base.pull()
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}
