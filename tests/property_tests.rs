//! Property-based tests for variants and machines.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tagstate::builder::create_machine;
use tagstate::machine::hooks::guard;
use tagstate::{
    transitions, ChangeHistory, Handlers, SendOutcome, StateFactory, VariantError, VariantFactory,
};

static TAGS: [&str; 4] = ["Idle", "Pending", "Resolved", "Rejected"];

fn factory() -> VariantFactory {
    TAGS.iter()
        .fold(VariantFactory::builder(), |builder, tag| {
            builder.variant(*tag, |args: &[Value]| json!({ "args": args }))
        })
        .build()
}

fn cycle() -> tagstate::Machine {
    let states = StateFactory::builder()
        .unit("Idle")
        .unit("Pending")
        .state("Resolved", |args| json!({ "value": args.first().cloned() }))
        .build();
    create_machine(
        states,
        transitions! {
            "Idle" => { "execute" => "Pending" },
            "Pending" => { "resolve" => "Resolved" },
            "Resolved" => { "reset" => "Idle" },
        },
        "Idle",
    )
    .unwrap()
}

prop_compose! {
    fn arbitrary_tag()(index in 0..TAGS.len()) -> &'static str {
        TAGS[index]
    }
}

prop_compose! {
    fn arbitrary_event()(index in 0..4usize) -> &'static str {
        ["execute", "resolve", "reset", "unknown"][index]
    }
}

proptest! {
    #[test]
    fn match_runs_exactly_the_handler_for_the_tag(tag in arbitrary_tag(), n in any::<i64>()) {
        let variant = factory().create(tag, &[json!(n)]).unwrap();
        let calls = Cell::new(0);

        let handlers = TAGS.iter().fold(Handlers::new(), |handlers, name| {
            let calls = &calls;
            handlers.on(*name, move |_: &Value| {
                calls.set(calls.get() + 1);
                *name
            })
        });

        prop_assert_eq!(variant.match_with(&handlers), Ok(tag));
        prop_assert_eq!(calls.get(), 1);
    }

    #[test]
    fn default_handler_covers_missing_tags(tag in arbitrary_tag()) {
        let variant = factory().create(tag, &[]).unwrap();
        let handlers = Handlers::new()
            .on("Idle", |_: &Value| "specific")
            .otherwise(|_: &Value| "default");

        let expected = if tag == "Idle" { "specific" } else { "default" };
        prop_assert_eq!(variant.match_with(&handlers), Ok(expected));
    }

    #[test]
    fn non_exhaustive_match_without_default_is_none(tag in arbitrary_tag()) {
        let variant = factory().create(tag, &[]).unwrap();
        let handlers = Handlers::new().on("Idle", |_: &Value| ());

        prop_assert_eq!(variant.try_match(&handlers).is_some(), tag == "Idle");
        if tag != "Idle" {
            prop_assert_eq!(
                variant.match_with(&handlers),
                Err(VariantError::Unhandled { tag: tag.to_string() })
            );
        }
    }

    #[test]
    fn cast_agrees_with_is(tag in arbitrary_tag(), other in arbitrary_tag()) {
        let variant = factory().create(tag, &[]).unwrap();

        prop_assert_eq!(variant.is(other), tag == other);
        prop_assert_eq!(variant.cast(other).is_ok(), tag == other);
    }

    #[test]
    fn construction_is_pure(tag in arbitrary_tag(), n in any::<i64>()) {
        let factory = factory();
        let first = factory.create(tag, &[json!(n)]).unwrap();
        let second = factory.create(tag, &[json!(n)]).unwrap();

        prop_assert_eq!(first.key(), second.key());
        prop_assert_eq!(first.data(), second.data());
    }

    #[test]
    fn vetoed_events_leave_state_untouched(events in prop::collection::vec(arbitrary_event(), 1..20)) {
        let machine = cycle();
        let _disposer = machine.setup(vec![guard(|_| false)]);
        let initial = machine.get_change();

        for event in events {
            let outcome = machine.send(event, vec![]).unwrap();
            prop_assert_ne!(outcome, SendOutcome::Transitioned);
        }

        prop_assert!(machine.get_state().is("Idle"));
        prop_assert_eq!(machine.get_change().timestamp, initial.timestamp);
    }

    #[test]
    fn subscribers_see_each_accepted_change_once_in_order(
        events in prop::collection::vec(arbitrary_event(), 0..30)
    ) {
        let machine = cycle();
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let _subscription = machine.subscribe({
            let seen = Rc::clone(&seen);
            move |change| {
                seen.borrow_mut().push(change.to.key().to_string());
                None
            }
        });

        let mut expected = Vec::new();
        for event in events {
            if machine.send(event, vec![json!(1)]).unwrap().is_transitioned() {
                expected.push(machine.get_state().key().to_string());
            }
        }

        prop_assert_eq!(&*seen.borrow(), &expected);
    }

    #[test]
    fn change_records_chain(events in prop::collection::vec(arbitrary_event(), 0..30)) {
        let machine = cycle();
        let mut history = ChangeHistory::new();

        for event in events {
            let before = machine.get_state();
            if machine.send(event, vec![]).unwrap().is_transitioned() {
                let change = machine.get_change();
                prop_assert_eq!(change.from.key(), before.key());
                prop_assert_eq!(change.event_type.as_str(), event);
                history = history.record(change);
            } else {
                let after = machine.get_state();
                prop_assert_eq!(after.key(), before.key());
            }
        }

        let path = history.get_path();
        for pair in path.windows(2) {
            let allowed = matches!(
                (pair[0], pair[1]),
                ("Idle", "Pending") | ("Pending", "Resolved") | ("Resolved", "Idle")
            );
            prop_assert!(allowed, "unexpected step {:?}", pair);
        }
    }
}
