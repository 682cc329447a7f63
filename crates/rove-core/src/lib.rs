//! Rove Core
//!
//! This crate provides the fundamental types shared across the Rove traversal
//! engine.
//!
//! # Overview
//!
//! The core crate defines the value model that traversers carry and the
//! comparison machinery that branch routing is built on:
//!
//! - **Values**: [`Value`] enum for the payloads flowing through a traversal
//! - **Numbers**: type-agnostic numeric comparison in [`types::number`], so an
//!   integer `1` and a floating `1.0` route identically
//! - **Predicates**: [`Predicate`] for value tests (`gt(10)`, `within([...])`)
//!   used both as filters and as branch selection keys
//! - **Errors**: [`CoreError`] for user-level value validation failures
//!
//! # Example
//!
//! ```
//! use rove_core::{Predicate, Value};
//! use rove_core::types::number;
//!
//! let age: Value = 30i64.into();
//! assert_eq!(age.as_int(), Some(30));
//!
//! // Numeric comparison ignores the representation.
//! assert!(number::equals(&Value::Int(1), &Value::Float(1.0)));
//!
//! // Predicates test concrete values.
//! assert!(Predicate::gt(10i64).test(&Value::Int(15)));
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use types::{Predicate, Value};
