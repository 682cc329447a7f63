//! Reducing barrier steps.
//!
//! A barrier consumes all available input before producing output. Branch
//! registration detects barriers anywhere in a branch body's closure and
//! switches the branching step to exhaustive priming, because a
//! barrier-holding branch cannot report partial results.

use rove_core::types::number;
use rove_core::{CoreError, Value};

use super::{Step, StepBase, StepResult};
use crate::traverser::Traverser;

/// Counts incoming traversers, weighted by bulk, and emits a single total.
#[derive(Clone)]
pub struct CountStep {
    base: StepBase,
    done: bool,
}

impl CountStep {
    /// Creates a count barrier.
    #[must_use]
    pub fn new() -> Self {
        Self { base: StepBase::new(), done: false }
    }
}

impl Default for CountStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for CountStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Count"
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        if self.done {
            return Ok(None);
        }
        let mut total: u64 = 0;
        while let Some(traverser) = self.base.pull()? {
            total += traverser.bulk();
        }
        self.done = true;
        #[allow(clippy::cast_possible_wrap)]
        let total = total as i64;
        Ok(Some(Traverser::new(Value::Int(total))))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset_state(&mut self) {
        self.done = false;
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

/// Sums incoming numeric values, weighted by bulk, and emits a single total.
///
/// Non-numeric input is a user-level type mismatch and propagates as such.
#[derive(Clone)]
pub struct SumStep {
    base: StepBase,
    done: bool,
}

impl SumStep {
    /// Creates a sum barrier.
    #[must_use]
    pub fn new() -> Self {
        Self { base: StepBase::new(), done: false }
    }
}

impl Default for SumStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for SumStep {
    fn base(&self) -> &StepBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut StepBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Sum"
    }

    fn next(&mut self) -> StepResult<Option<Traverser>> {
        if self.done {
            return Ok(None);
        }
        let mut total = Value::Int(0);
        while let Some(traverser) = self.base.pull()? {
            let contribution = scale_by_bulk(traverser.value(), traverser.bulk())
                .ok_or_else(|| {
                    CoreError::type_mismatch_with_value(
                        "number",
                        traverser.value().type_name(),
                        traverser.value(),
                    )
                })?;
            total = number::add(&total, &contribution).ok_or_else(|| {
                CoreError::type_mismatch("number", contribution.type_name())
            })?;
        }
        self.done = true;
        Ok(Some(Traverser::new(total)))
    }

    fn is_barrier(&self) -> bool {
        true
    }

    fn reset_state(&mut self) {
        self.done = false;
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

/// Multiplies a numeric value by a bulk count.
#[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
fn scale_by_bulk(value: &Value, bulk: u64) -> Option<Value> {
    match value {
        Value::Int(i) => Some(match i.checked_mul(bulk as i64) {
            Some(product) => Value::Int(product),
            None => Value::Float(*i as f64 * bulk as f64),
        }),
        Value::Float(f) => Some(Value::Float(f * bulk as f64)),
        _ => None,
    }
}
