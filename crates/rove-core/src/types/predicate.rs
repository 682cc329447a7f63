//! Value predicates.
//!
//! A [`Predicate`] tests a concrete [`Value`]. Predicates appear in two
//! roles: as filters (`is(gt(10))`) and as branch selection keys, where a
//! branch registered under `gt(10)` receives every traverser whose selector
//! value passes the test.
//!
//! Equality between predicates is structural (same operator, same operands),
//! which is what key identity in a branch registry needs. Testing a
//! predicate against a value is a separate operation; see
//! `rove-traversal`'s pick-token matcher for how the two are combined.

use serde::{Deserialize, Serialize};

use super::number;
use super::value::Value;

/// A test against a single value.
///
/// Numeric operands compare type-agnostically, so `gt(10)` matches
/// `Float(15.0)`. Non-comparable operands simply fail the test; `test` never
/// errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Equal to the operand.
    Eq(Value),
    /// Not equal to the operand.
    Neq(Value),
    /// Strictly less than the operand.
    Lt(Value),
    /// Less than or equal to the operand.
    Lte(Value),
    /// Strictly greater than the operand.
    Gt(Value),
    /// Greater than or equal to the operand.
    Gte(Value),
    /// Equal to at least one of the operands.
    Within(Vec<Value>),
    /// Equal to none of the operands.
    Without(Vec<Value>),
    /// In the half-open range `[low, high)`.
    Between(Value, Value),
    /// Both predicates pass.
    And(Box<Predicate>, Box<Predicate>),
    /// At least one predicate passes.
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Creates an equality predicate.
    #[must_use]
    pub fn eq(value: impl Into<Value>) -> Self {
        Self::Eq(value.into())
    }

    /// Creates an inequality predicate.
    #[must_use]
    pub fn neq(value: impl Into<Value>) -> Self {
        Self::Neq(value.into())
    }

    /// Creates a less-than predicate.
    #[must_use]
    pub fn lt(value: impl Into<Value>) -> Self {
        Self::Lt(value.into())
    }

    /// Creates a less-than-or-equal predicate.
    #[must_use]
    pub fn lte(value: impl Into<Value>) -> Self {
        Self::Lte(value.into())
    }

    /// Creates a greater-than predicate.
    #[must_use]
    pub fn gt(value: impl Into<Value>) -> Self {
        Self::Gt(value.into())
    }

    /// Creates a greater-than-or-equal predicate.
    #[must_use]
    pub fn gte(value: impl Into<Value>) -> Self {
        Self::Gte(value.into())
    }

    /// Creates a membership predicate.
    #[must_use]
    pub fn within(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::Within(values.into_iter().map(Into::into).collect())
    }

    /// Creates an exclusion predicate.
    #[must_use]
    pub fn without(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::Without(values.into_iter().map(Into::into).collect())
    }

    /// Creates a half-open range predicate over `[low, high)`.
    #[must_use]
    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between(low.into(), high.into())
    }

    /// Combines this predicate with another; both must pass.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Combines this predicate with another; either may pass.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Tests this predicate against a concrete value.
    #[must_use]
    pub fn test(&self, value: &Value) -> bool {
        match self {
            Self::Eq(operand) => values_equal(value, operand),
            Self::Neq(operand) => !values_equal(value, operand),
            Self::Lt(operand) => {
                matches!(number::compare(value, operand), Some(std::cmp::Ordering::Less))
            }
            Self::Lte(operand) => matches!(
                number::compare(value, operand),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            ),
            Self::Gt(operand) => {
                matches!(number::compare(value, operand), Some(std::cmp::Ordering::Greater))
            }
            Self::Gte(operand) => matches!(
                number::compare(value, operand),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ),
            Self::Within(operands) => operands.iter().any(|operand| values_equal(value, operand)),
            Self::Without(operands) => !operands.iter().any(|operand| values_equal(value, operand)),
            Self::Between(low, high) => {
                matches!(
                    number::compare(value, low),
                    Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
                ) && matches!(number::compare(value, high), Some(std::cmp::Ordering::Less))
            }
            Self::And(left, right) => left.test(value) && right.test(value),
            Self::Or(left, right) => left.test(value) || right.test(value),
        }
    }
}

/// Equality that treats numeric values type-agnostically and everything else
/// natively.
fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is_number() && b.is_number() {
        number::equals(a, b)
    } else {
        a == b
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq(v) => write!(f, "eq({v})"),
            Self::Neq(v) => write!(f, "neq({v})"),
            Self::Lt(v) => write!(f, "lt({v})"),
            Self::Lte(v) => write!(f, "lte({v})"),
            Self::Gt(v) => write!(f, "gt({v})"),
            Self::Gte(v) => write!(f, "gte({v})"),
            Self::Within(vs) => write!(f, "within({})", Value::Array(vs.clone())),
            Self::Without(vs) => write!(f, "without({})", Value::Array(vs.clone())),
            Self::Between(low, high) => write!(f, "between({low}, {high})"),
            Self::And(left, right) => write!(f, "and({left}, {right})"),
            Self::Or(left, right) => write!(f, "or({left}, {right})"),
        }
    }
}
