//! End-to-end branching tests.
//!
//! These tests exercise:
//! - Pick-token routing (numeric, predicate, sentinel keys)
//! - The standard prime/drain algorithm, with and without barriers
//! - The computer algorithm's tagged message emission
//! - Clone independence and reset semantics
//! - Error propagation through the branching step

use rove_core::{CoreError, Predicate, Value};
use rove_traversal::step::branch::{BranchStep, Selector};
use rove_traversal::step::pick::PickToken;
use rove_traversal::step::{IntegrationContext, Step};
use rove_traversal::traversal::{ExecutionMode, Traversal};
use rove_traversal::traverser::Traverser;
use rove_traversal::TraversalError;

/// A branch body that maps every traverser to a fixed marker string.
fn tagged(tag: &'static str) -> Traversal {
    Traversal::start().map(move |_| Ok(Value::String(tag.to_owned())))
}

fn int_selector(f: impl Fn(i64) -> i64 + Send + Sync + 'static) -> Selector {
    Selector::Traversal(Traversal::start().map(move |t| {
        t.value()
            .as_int()
            .map(|i| Value::Int(f(i)))
            .ok_or_else(|| CoreError::type_mismatch("int", t.value().type_name()))
    }))
}

// ============================================================================
// Routing
// ============================================================================

mod routing {
    use super::*;

    #[test]
    fn selector_routes_to_the_matching_key_only() {
        // Scenario A: selector yields 2; branches for 1, 2, and none.
        let mut t = Traversal::inject([2i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), tagged("one"));
            b.add_branch(PickToken::of(2i64), tagged("two"));
            b.add_branch(PickToken::none(), tagged("default"));
        });
        assert_eq!(t.to_values().expect("routing succeeds"), vec![Value::String("two".into())]);
    }

    #[test]
    fn numeric_routing_is_representation_agnostic() {
        // A branch keyed with the integer 1 receives a floating 1.0.
        let mut t = Traversal::inject([10i64])
            .branch(Selector::Traversal(Traversal::start().map(|_| Ok(Value::Float(1.0)))), |b| {
                b.add_branch(PickToken::of(1i64), tagged("one"));
                b.add_branch(PickToken::none(), tagged("default"));
            });
        assert_eq!(t.to_values().expect("routing succeeds"), vec![Value::String("one".into())]);
    }

    #[test]
    fn predicate_branch_fires_on_matching_value() {
        // Scenario B: predicate gt(10), input 15.
        let mut t = Traversal::inject([15i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::predicate(Predicate::gt(10i64)), tagged("big"));
            b.add_branch(PickToken::none(), tagged("small"));
        });
        assert_eq!(t.to_values().expect("routing succeeds"), vec![Value::String("big".into())]);
    }

    #[test]
    fn all_matching_options_fire() {
        // An exact key and a predicate key can both match one selector value.
        let mut t = Traversal::inject([5i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(5i64), tagged("exact"));
            b.add_branch(PickToken::predicate(Predicate::gt(1i64)), tagged("predicate"));
        });
        assert_eq!(
            t.to_values().expect("routing succeeds"),
            vec![Value::String("exact".into()), Value::String("predicate".into())]
        );
    }

    #[test]
    fn unmatched_selector_falls_back_to_none() {
        let mut t = Traversal::inject([42i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), tagged("one"));
            b.add_branch(PickToken::none(), tagged("default"));
        });
        assert_eq!(
            t.to_values().expect("routing succeeds"),
            vec![Value::String("default".into())]
        );
    }

    #[test]
    fn no_match_and_no_none_yields_end_of_sequence() {
        // Scenario D: nothing matches, no default registered.
        let mut t = Traversal::inject([42i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), tagged("one"));
        });
        assert_eq!(t.to_values().expect("exhaustion is not an error"), Vec::<Value>::new());
    }

    #[test]
    fn any_branch_fires_in_addition_to_the_match() {
        let mut t = Traversal::inject([1i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), tagged("one"));
            b.add_branch(PickToken::any(), tagged("always"));
        });
        assert_eq!(
            t.to_values().expect("routing succeeds"),
            vec![Value::String("one".into()), Value::String("always".into())]
        );
    }

    #[test]
    fn any_branch_fires_even_without_a_match() {
        let mut t = Traversal::inject([9i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), tagged("one"));
            b.add_branch(PickToken::any(), tagged("always"));
        });
        assert_eq!(
            t.to_values().expect("routing succeeds"),
            vec![Value::String("always".into())]
        );
    }

    #[test]
    fn any_selector_result_does_not_double_fire_the_any_branch() {
        // A union routes via the any sentinel; each body fires exactly once.
        let mut t = Traversal::inject([7i64]).union([tagged("left"), tagged("right")]);
        assert_eq!(
            t.to_values().expect("union succeeds"),
            vec![Value::String("left".into()), Value::String("right".into())]
        );
    }
}

// ============================================================================
// Standard algorithm
// ============================================================================

mod standard_algorithm {
    use super::*;

    #[test]
    fn streaming_branches_interleave_per_traverser() {
        // Without barriers, each round primes exactly one upstream
        // traverser, so outputs interleave by input.
        let mut t = Traversal::inject([1i64, 2]).union([
            Traversal::start().identity(),
            Traversal::start().map(|t| {
                Ok(Value::Int(t.value().as_int().unwrap_or(0) + 10))
            }),
        ]);
        assert_eq!(
            t.to_values().expect("union succeeds"),
            vec![Value::Int(1), Value::Int(11), Value::Int(2), Value::Int(12)]
        );
    }

    #[test]
    fn barrier_branches_prime_exhaustively() {
        // A counting body forces the round to consume all upstream input
        // before draining; the count sees every routed traverser at once.
        let mut t = Traversal::inject([1i64, 2, 3]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::predicate(Predicate::gt(1i64)), Traversal::start().count());
            b.add_branch(PickToken::none(), tagged("small"));
        });
        assert_eq!(
            t.to_values().expect("branching succeeds"),
            vec![Value::Int(2), Value::String("small".into())]
        );
    }

    #[test]
    fn unseeded_barrier_bodies_stay_silent() {
        // No traverser routes to the count; it must not emit a zero.
        let mut t = Traversal::inject([1i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(99i64), Traversal::start().count());
            b.add_branch(PickToken::none(), tagged("default"));
        });
        assert_eq!(
            t.to_values().expect("branching succeeds"),
            vec![Value::String("default".into())]
        );
    }

    #[test]
    fn branch_output_continues_downstream() {
        // Branch output composes with further steps under the pull contract.
        let mut t = Traversal::inject([1i64, 2, 3])
            .union([Traversal::start().identity(), Traversal::start().identity()])
            .count();
        assert_eq!(t.to_values().expect("pipeline succeeds"), vec![Value::Int(6)]);
    }

    #[test]
    fn bulk_is_broadcast_to_every_branch() {
        let mut t = Traversal::start().union([
            Traversal::start().identity(),
            Traversal::start().identity(),
        ]);
        t.add_start(Traverser::new(Value::Int(5)).with_bulk(3));
        // Both bodies receive the full bulk; expansion yields 6 values.
        assert_eq!(t.to_values().expect("union succeeds").len(), 6);
    }

    #[test]
    fn choose_routes_on_test_selectors() {
        let big = Traversal::start().is(Predicate::gt(10i64));
        let mut t = Traversal::inject([15i64, 3]).choose(
            Selector::Test(big),
            tagged("big"),
            tagged("small"),
        );
        assert_eq!(
            t.to_values().expect("choose succeeds"),
            vec![Value::String("big".into()), Value::String("small".into())]
        );
    }
}

// ============================================================================
// Computer algorithm
// ============================================================================

mod computer_algorithm {
    use super::*;

    fn integrated(mut step: BranchStep) -> BranchStep {
        let mut ctx = IntegrationContext::new(ExecutionMode::Computer);
        step.integrate(&mut ctx);
        step
    }

    #[test]
    fn splits_are_tagged_with_branch_entry_steps() {
        let mut step = BranchStep::new(Selector::Identity);
        step.add_branch(PickToken::of(1i64), Traversal::start().identity());
        step.add_branch(PickToken::any(), Traversal::start().identity());
        let mut step = integrated(step);

        step.inject(Traverser::new(Value::Int(1)));

        let first = step.next().expect("no failure").expect("matched split");
        let second = step.next().expect("no failure").expect("any split");
        assert_eq!(first.step_id(), step.registry().entry_step_id(0));
        assert_eq!(second.step_id(), step.registry().entry_step_id(1));
        assert_ne!(first.step_id(), second.step_id());

        // Messages carry the original value; no local draining happened.
        assert_eq!(first.value(), &Value::Int(1));
        assert_eq!(second.value(), &Value::Int(1));
        assert_eq!(step.next().expect("no failure"), None);
    }

    #[test]
    fn each_refill_consumes_exactly_one_upstream_traverser() {
        let mut step = BranchStep::new(Selector::Identity);
        step.add_branch(PickToken::of(1i64), Traversal::start().identity());
        let mut step = integrated(step);

        step.inject(Traverser::new(Value::Int(1)));
        step.inject(Traverser::new(Value::Int(1)));

        let _ = step.next().expect("no failure").expect("first message");
        // The second upstream traverser has not been consumed yet.
        assert!(step.has_starts());
    }

    #[test]
    fn unroutable_traversers_produce_no_messages() {
        let mut step = BranchStep::new(Selector::Identity);
        step.add_branch(PickToken::of(1i64), Traversal::start().identity());
        let mut step = integrated(step);

        step.inject(Traverser::new(Value::Int(42)));
        assert_eq!(step.next().expect("no failure"), None);
    }

    #[test]
    fn computer_mode_preserves_bulk() {
        let mut step = BranchStep::new(Selector::Identity);
        step.add_branch(PickToken::of(5i64), Traversal::start().identity());
        let mut step = integrated(step);

        step.inject(Traverser::new(Value::Int(5)).with_bulk(4));
        let message = step.next().expect("no failure").expect("one message");
        assert_eq!(message.bulk(), 4);
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn clone_shares_no_branch_state() {
        let mut original = BranchStep::new(Selector::Identity);
        original.add_branch(PickToken::of(1i64), tagged("one"));
        let mut ctx = IntegrationContext::new(ExecutionMode::Standard);
        original.integrate(&mut ctx);

        let mut clone = original.clone();

        // Run the clone to exhaustion.
        clone.inject(Traverser::new(Value::Int(1)));
        assert!(clone.next().expect("no failure").is_some());
        assert_eq!(clone.next().expect("no failure"), None);

        // The original saw none of that: same structure, fresh state.
        assert_eq!(original.display(), clone.display());
        assert!(!original.has_starts());
        original.inject(Traverser::new(Value::Int(1)));
        let out = original.next().expect("no failure").expect("one result");
        assert_eq!(out.value(), &Value::String("one".into()));
    }

    #[test]
    fn reset_reproduces_identical_output() {
        let mut t = Traversal::inject([1i64, 2, 3]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::predicate(Predicate::gt(1i64)), Traversal::start().count());
            b.add_branch(PickToken::none(), tagged("small"));
        });

        let first = t.to_values().expect("first run succeeds");
        t.reset();
        let second = t.to_values().expect("second run succeeds");
        assert_eq!(first, second);
    }

    #[test]
    fn reset_preserves_registered_branches() {
        let mut t = Traversal::inject([2i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(2i64), tagged("two"));
        });
        let _ = t.to_values().expect("first run succeeds");
        t.reset();
        // Structure survives: the same branch still routes.
        assert_eq!(t.to_values().expect("second run succeeds"), vec![Value::String("two".into())]);
    }

    #[test]
    fn display_enumerates_selector_and_branches() {
        let t = Traversal::inject([1i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), tagged("one"));
            b.add_branch(PickToken::none(), tagged("default"));
        });
        let rendered = t.to_string();
        assert!(rendered.contains("Branch(value"));
        assert!(rendered.contains("1 ->"));
        assert!(rendered.contains("none ->"));
    }
}

// ============================================================================
// Error propagation
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn selector_failures_surface_unmodified() {
        let selector = Selector::Traversal(Traversal::start().map(|t| {
            if t.value().is_null() {
                Err(CoreError::validation("value cannot be null"))
            } else {
                Ok(t.value().clone())
            }
        }));
        let mut t = Traversal::inject([Value::Null]).branch(selector, |b| {
            b.add_branch(PickToken::none(), tagged("default"));
        });

        let error = t.to_values().expect_err("selector failure propagates");
        assert!(matches!(error, TraversalError::Core(_)));
        assert_eq!(error.to_string(), "validation error: value cannot be null");
    }

    #[test]
    fn empty_selector_result_is_an_error() {
        // A selector that filters its input away maps the traverser to no
        // value at all.
        let selector = Selector::Traversal(Traversal::start().is(Predicate::gt(100i64)));
        let mut t = Traversal::inject([1i64]).branch(selector, |b| {
            b.add_branch(PickToken::none(), tagged("default"));
        });

        let error = t.to_values().expect_err("unmapped selector is an error");
        assert!(matches!(error, TraversalError::Selector(_)));
    }

    #[test]
    fn branch_body_failures_propagate() {
        let failing = Traversal::start().map(|_| Err(CoreError::validation("body failed")));
        let mut t = Traversal::inject([1i64]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), failing);
        });
        assert!(t.to_values().is_err());
    }
}

// ============================================================================
// Selector variants
// ============================================================================

mod selectors {
    use super::*;

    #[test]
    fn identity_selector_routes_on_the_value_itself() {
        let mut t = Traversal::inject([1i64, 2]).branch(Selector::Identity, |b| {
            b.add_branch(PickToken::of(1i64), tagged("one"));
            b.add_branch(PickToken::of(2i64), tagged("two"));
        });
        assert_eq!(
            t.to_values().expect("routing succeeds"),
            vec![Value::String("one".into()), Value::String("two".into())]
        );
    }

    #[test]
    fn traversal_selector_transforms_before_routing() {
        let mut t = Traversal::inject([4i64, 7]).branch(int_selector(|i| i % 2), |b| {
            b.add_branch(PickToken::of(0i64), tagged("even"));
            b.add_branch(PickToken::of(1i64), tagged("odd"));
        });
        assert_eq!(
            t.to_values().expect("routing succeeds"),
            vec![Value::String("even".into()), Value::String("odd".into())]
        );
    }

    #[test]
    fn selector_evaluation_does_not_consume_the_traverser() {
        // The branch body receives the original value, not the selector's.
        let mut t = Traversal::inject([4i64]).branch(int_selector(|i| i % 2), |b| {
            b.add_branch(PickToken::of(0i64), Traversal::start().identity());
        });
        assert_eq!(t.to_values().expect("routing succeeds"), vec![Value::Int(4)]);
    }
}
