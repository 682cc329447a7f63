//! Pick tokens and branch key matching.
//!
//! A branch is registered under a pick token: a concrete value, a predicate,
//! or one of the reserved sentinels. Before any matching happens the token
//! is normalized into a [`PickKey`], which fixes two things the raw
//! representation would get wrong:
//!
//! - numbers compare type-agnostically, so a branch keyed `1` receives a
//!   selector result of `1.0`;
//! - predicate keys are equal to other predicate keys structurally, but
//!   test-match against concrete probe values by evaluating the predicate.
//!
//! The second relation is asymmetric, so it is implemented as an explicit
//! two-phase lookup (structural equality, then predicate evaluation) rather
//! than an overloaded equality operator.

use rove_core::types::number;
use rove_core::{Predicate, Value};

/// Reserved routing sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// The branch that fires in addition to any specifically matched branch.
    Any,
    /// The default branch, taken when no other key matches.
    None,
}

impl std::fmt::Display for Pick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::None => write!(f, "none"),
        }
    }
}

/// What callers register a branch under.
#[derive(Debug, Clone, PartialEq)]
pub enum PickToken {
    /// A concrete value key.
    Value(Value),
    /// A predicate key, matching any selector value that passes the test.
    Predicate(Predicate),
    /// A reserved sentinel key.
    Pick(Pick),
}

impl PickToken {
    /// Creates a value token.
    #[must_use]
    pub fn of(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Creates a predicate token.
    #[must_use]
    pub fn predicate(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }

    /// The `any` sentinel token.
    #[must_use]
    pub const fn any() -> Self {
        Self::Pick(Pick::Any)
    }

    /// The `none` sentinel token.
    #[must_use]
    pub const fn none() -> Self {
        Self::Pick(Pick::None)
    }
}

impl From<Value> for PickToken {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Predicate> for PickToken {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<Pick> for PickToken {
    fn from(pick: Pick) -> Self {
        Self::Pick(pick)
    }
}

/// A normalized branch comparison key.
#[derive(Debug, Clone)]
pub enum PickKey {
    /// A non-numeric value, compared by native equality.
    Exact(Value),
    /// A numeric value, compared type-agnostically.
    Numeric(Value),
    /// A predicate, structurally equal to other predicates and test-matching
    /// concrete values.
    Predicate(Predicate),
    /// The `any` sentinel.
    Any,
    /// The `none` sentinel.
    None,
}

impl PickKey {
    /// Normalizes a registration token. Total over any input.
    #[must_use]
    pub fn normalize_token(token: PickToken) -> Self {
        match token {
            PickToken::Value(value) => Self::normalize_value(value),
            PickToken::Predicate(predicate) => Self::Predicate(predicate),
            PickToken::Pick(Pick::Any) => Self::Any,
            PickToken::Pick(Pick::None) => Self::None,
        }
    }

    /// Normalizes a selector result. Total over any value.
    #[must_use]
    pub fn normalize_value(value: Value) -> Self {
        if value.is_number() {
            Self::Numeric(value)
        } else {
            Self::Exact(value)
        }
    }

    /// Returns `true` if this is the `any` sentinel.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns the concrete value behind this key, if it has one.
    #[must_use]
    pub const fn concrete_value(&self) -> Option<&Value> {
        match self {
            Self::Exact(value) | Self::Numeric(value) => Some(value),
            _ => None,
        }
    }

    /// Tests whether this registered key matches a probe key.
    ///
    /// Phase one is structural equality; phase two lets a predicate key
    /// test-match the probe's concrete value.
    #[must_use]
    pub fn matches(&self, probe: &Self) -> bool {
        if self == probe {
            return true;
        }
        if let (Self::Predicate(predicate), Some(value)) = (self, probe.concrete_value()) {
            return predicate.test(value);
        }
        false
    }
}

impl PartialEq for PickKey {
    /// Structural key equality: numeric keys by type-agnostic numeric
    /// comparison, everything else by native equality. Predicate keys never
    /// structurally equal value keys; use [`PickKey::matches`] for routing.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Numeric(a), Self::Numeric(b)) => number::equals(a, b),
            (Self::Predicate(a), Self::Predicate(b)) => a == b,
            (Self::Any, Self::Any) | (Self::None, Self::None) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PickKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(value) | Self::Numeric(value) => write!(f, "{value}"),
            Self::Predicate(predicate) => write!(f, "{predicate}"),
            Self::Any => write!(f, "any"),
            Self::None => write!(f, "none"),
        }
    }
}
