//! Filtering steps.

use std::sync::Arc;

use rove_core::{CoreError, Predicate};

use super::{IntegrationContext, Step, StepBase, StepResult};
use crate::traversal::Traversal;
use crate::traverser::Traverser;

/// A user-supplied filter function.
pub type FilterFn = Arc<dyn Fn(&Traverser) -> Result<bool, CoreError> + Send + Sync>;

/// Drops traversers for which the function returns `false`.
#[derive(Clone)]
pub struct FilterStep {
    base: StepBase,
    function: FilterFn,
}

impl FilterStep {
    /// Creates a filter step from a function.
    pub fn new(
        function: impl Fn(&Traverser) -> Result<bool, CoreError> + Send + Sync + 'static,
    ) -> Self {
        Self { base: StepBase::new(), function: Arc::new(function) }
    }
}

impl Step for FilterStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Filter"
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        while let Some(traverser) = self.base.pull()? {
            if (self.function)(&traverser)? {
                return Ok(Some(traverser));
            }
        }
        Ok(None)
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

/// Drops traversers whose value fails a [`Predicate`].
#[derive(Clone)]
pub struct IsStep {
    base: StepBase,
    predicate: Predicate,
}

impl IsStep {
    /// Creates a predicate filter.
    #[must_use]
    pub fn new(predicate: Predicate) -> Self {
        Self { base: StepBase::new(), predicate }
    }
}

impl Step for IsStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Is"
    }

    fn display(&self) -> String {
        format!("Is({})", self.predicate)
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        while let Some(traverser) = self.base.pull()? {
            if self.predicate.test(traverser.value()) {
                return Ok(Some(traverser));
            }
        }
        Ok(None)
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

/// Passes a traverser iff a child traversal, seeded with a split of it,
/// produces at least one result.
///
/// The child is a local child: it is evaluated to completion per traverser,
/// within the current superstep under the computer model — which is why
/// verification inspects its requirements.
#[derive(Clone)]
pub struct WhereStep {
    base: StepBase,
    child: Traversal,
}

impl WhereStep {
    /// Creates a where-filter over a child traversal.
    #[must_use]
    pub fn new(child: Traversal) -> Self {
        Self { base: StepBase::new(), child }
    }
}

impl Step for WhereStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Where"
    }

    fn display(&self) -> String {
        format!("Where({})", self.child)
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        while let Some(traverser) = self.base.pull()? {
            self.child.reset();
            self.child.add_start(traverser.split());
            if self.child.next()?.is_some() {
                return Ok(Some(traverser));
            }
        }
        Ok(None)
    }

    fn local_children(&self) -> Vec<&Traversal> {
        vec![&self.child]
    }

    fn local_children_mut(&mut self) -> Vec<&mut Traversal> {
        vec![&mut self.child]
    }

    fn integrate_children(&mut self, ctx: &mut IntegrationContext) {
        self.child.integrate(ctx);
    }

    fn reset_state(&mut self) {
        self.child.reset();
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rove_core::Value;

    #[test]
    fn filter_drops_failing_traversers() {
        let mut step = FilterStep::new(|t| Ok(t.value().as_int().is_some_and(|i| i % 2 == 0)));
        step.inject(Traverser::new(Value::Int(1)));
        step.inject(Traverser::new(Value::Int(2)));
        step.inject(Traverser::new(Value::Int(3)));

        let out = step.next().expect("no failure").expect("one survivor");
        assert_eq!(out.value(), &Value::Int(2));
        assert_eq!(step.next().expect("no failure"), None);
    }

    #[test]
    fn is_step_uses_predicates() {
        let mut step = IsStep::new(Predicate::gt(10i64));
        step.inject(Traverser::new(Value::Int(5)));
        step.inject(Traverser::new(Value::Float(15.0)));

        let out = step.next().expect("no failure").expect("one survivor");
        assert_eq!(out.value(), &Value::Float(15.0));
    }

    #[test]
    fn where_step_keeps_matching_traversers() {
        let child = Traversal::start().is(Predicate::gt(10i64));
        let mut step = WhereStep::new(child);
        step.inject(Traverser::new(Value::Int(15)));
        step.inject(Traverser::new(Value::Int(5)));

        let out = step.next().expect("no failure").expect("one survivor");
        assert_eq!(out.value(), &Value::Int(15));
        assert_eq!(step.next().expect("no failure"), None);
    }
}
