//! Traversal sources.

use rove_core::Value;

use super::{Step, StepBase, StepResult};
use crate::traverser::Traverser;

/// Head step that turns a fixed list of values into traversers.
///
/// Seeded traversers (from `inject`) are served before the injected values,
/// so a traversal with a source can still be used as a branch body.
#[derive(Clone)]
pub struct StartStep {
    base: StepBase,
    values: Vec<Value>,
    cursor: usize,
}

impl StartStep {
    /// Creates a source over the given values.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { base: StepBase::new(), values, cursor: 0 }
    }
}

impl Step for StartStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Start"
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        if let Some(seeded) = self.base.pull()? {
            return Ok(Some(seeded));
        }
        if self.cursor < self.values.len() {
            let value = self.values[self.cursor].clone();
            self.cursor += 1;
            return Ok(Some(Traverser::new(value)));
        }
        Ok(None)
    }

    fn has_starts(&self) -> bool {
        self.base.has_starts() || self.cursor < self.values.len()
    }

    fn reset_state(&mut self) {
        self.cursor = 0;
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_emits_values_in_order() {
        let mut step = StartStep::new(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(step.next().expect("no failure").map(Traverser::into_value), Some(Value::Int(1)));
        assert_eq!(step.next().expect("no failure").map(Traverser::into_value), Some(Value::Int(2)));
        assert_eq!(step.next().expect("no failure"), None);
    }

    #[test]
    fn reset_rewinds_the_source() {
        let mut step = StartStep::new(vec![Value::Int(1)]);
        assert!(step.next().expect("no failure").is_some());
        assert_eq!(step.next().expect("no failure"), None);

        step.reset();
        assert_eq!(step.next().expect("no failure").map(Traverser::into_value), Some(Value::Int(1)));
    }

    #[test]
    fn seeds_are_served_before_values() {
        let mut step = StartStep::new(vec![Value::Int(1)]);
        step.inject(Traverser::new(Value::Int(99)));
        assert_eq!(step.next().expect("no failure").map(Traverser::into_value), Some(Value::Int(99)));
        assert_eq!(step.next().expect("no failure").map(Traverser::into_value), Some(Value::Int(1)));
    }
}
