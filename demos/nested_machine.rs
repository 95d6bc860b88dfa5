//! Nested Machine
//!
//! This example demonstrates hierarchical composition.
//!
//! Key concepts:
//! - Compound states embedding a child machine
//! - Routing events to the deepest machine that handles them
//! - Dotted addresses for the active path
//! - Disposing children that drop out of the active path
//!
//! Run with: cargo run --example nested_machine

use tagstate::builder::create_machine;
use tagstate::core::parse_key;
use tagstate::{transitions, ComposerOptions, HierarchicalMachine, Machine, StateFactory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn light() -> Machine {
    let states = StateFactory::builder()
        .unit("Red")
        .unit("Green")
        .unit("Yellow")
        .build();
    create_machine(
        states,
        transitions! {
            "Red" => { "tick" => "Green" },
            "Green" => { "tick" => "Yellow" },
            "Yellow" => { "tick" => "Red" },
        },
        "Red",
    )
    .unwrap()
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    println!("=== Nested Machine ===\n");

    let states = StateFactory::builder()
        .compound_with_id("Working", "light", light)
        .unit("Flashing")
        .build();
    let controller = create_machine(
        states,
        transitions! {
            "Working" => { "fault" => "Flashing" },
            "Flashing" => { "reset" => "Working" },
        },
        "Working",
    )
    .unwrap();

    let machine = HierarchicalMachine::with_options(
        controller,
        ComposerOptions {
            dispose_discarded_children: true,
        },
    );

    let _subscription = machine.subscribe(|change| {
        println!("  {} -> {} ('{}')", change.from.key(), change.to.key(), change.event_type);
        None
    });

    println!("Active: {}", machine.full_key());
    for event in ["tick", "tick", "fault", "tick", "reset", "tick"] {
        let outcome = machine.send(event, vec![]).unwrap();
        println!("send('{event}') -> {outcome:?}, active: {}", machine.full_key());
    }

    let address = parse_key(&machine.full_key());
    println!("\nRoot: {}, leaf: {}, depth: {}", address.parent, address.leaf(), address.depth());
    println!("Snapshot: {}", machine.root().snapshot().unwrap());

    println!("\n=== Example Complete ===");
}
