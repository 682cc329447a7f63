//! Type-agnostic numeric comparison.
//!
//! Branch routing must treat an integer `1` and a floating `1.0` as the same
//! key, so every numeric comparison in the engine goes through this module
//! rather than through `Value`'s derived equality.
//!
//! The `Int` × `Float` comparison is exact: the float is decomposed instead
//! of casting the integer to `f64`, so magnitudes beyond 2^53 never compare
//! equal by accident. `NaN` is not comparable to anything and yields `None`.

use std::cmp::Ordering;

use super::value::Value;

/// 2^63 as an `f64`. Floats at or above this are greater than any `i64`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Compares two numeric values, ignoring their representation.
///
/// Returns `None` if either value is non-numeric or if a float operand is
/// `NaN`.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => cmp_int_float(*x, *y),
        (Value::Float(x), Value::Int(y)) => cmp_int_float(*y, *x).map(Ordering::reverse),
        _ => None,
    }
}

/// Returns `true` if both values are numeric and numerically equal.
#[must_use]
pub fn equals(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

/// Adds two numeric values.
///
/// `Int` + `Int` stays integral, promoting to `Float` on overflow; any
/// `Float` operand produces a `Float`. Returns `None` for non-numeric
/// operands.
#[must_use]
pub fn add(a: &Value, b: &Value) -> Option<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(match x.checked_add(*y) {
            Some(sum) => Value::Int(sum),
            None => Value::Float(*x as f64 + *y as f64),
        }),
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            Some(Value::Float(*x as f64 + y))
        }
        (Value::Float(x), Value::Float(y)) => Some(Value::Float(x + y)),
        _ => None,
    }
}

/// Compares an `i64` against an `f64` without losing integer precision.
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if f < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    // f is finite and within [-2^63, 2^63), so its truncation converts
    // exactly.
    let truncated = f.trunc();
    #[allow(clippy::cast_possible_truncation)]
    let f_int = truncated as i64;
    match i.cmp(&f_int) {
        Ordering::Equal => {
            let fraction = f - truncated;
            if fraction > 0.0 {
                Some(Ordering::Less)
            } else if fraction < 0.0 {
                Some(Ordering::Greater)
            } else {
                Some(Ordering::Equal)
            }
        }
        ord => Some(ord),
    }
}
