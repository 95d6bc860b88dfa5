//! Traffic Light State Machine
//!
//! This example demonstrates a simple cyclic state machine.
//!
//! Key concepts:
//! - Unit states declared through a factory
//! - A transition table written with `transitions!`
//! - Exhaustive matching on the current state
//! - Subscribers with cleanups
//!
//! Run with: cargo run --example traffic_light

use serde_json::Value;
use tagstate::builder::create_machine;
use tagstate::machine::Cleanup;
use tagstate::{transitions, Handlers, StateData, StateFactory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let states = StateFactory::builder()
        .unit("Red")
        .unit("Green")
        .unit("Yellow")
        .build();

    let light = create_machine(
        states,
        transitions! {
            "Red" => { "next" => "Green" },
            "Green" => { "next" => "Yellow" },
            "Yellow" => { "next" => "Red" },
        },
        "Red",
    )
    .unwrap();

    println!("Initial state: {}\n", light.get_state().key());

    let subscription = light.subscribe(|change| {
        println!("  {} -> {}", change.from.key(), change.to.key());
        let leaving = change.to.key().to_string();
        let cleanup: Cleanup = Box::new(move || println!("    (leaving {leaving})"));
        Some(cleanup)
    });

    let advice = Handlers::new()
        .on("Red", |_: &StateData| "Stop")
        .on("Green", |_: &StateData| "Go!")
        .on("Yellow", |_: &StateData| "Caution");

    println!("Transition sequence:");
    for _ in 0..4 {
        light.send("next", vec![]).unwrap();
        println!("    advice: {}", light.get_state().match_with(&advice).unwrap());
    }

    subscription.unsubscribe();

    println!("\nUnknown events are ignored:");
    let outcome = light.send("honk", vec![Value::Null]).unwrap();
    println!("  send(\"honk\") -> {outcome:?}, still {}", light.get_state().key());

    println!("\nKey Characteristics:");
    println!("- No final state (cycles indefinitely)");
    println!("- Every state handled by one match table");

    println!("\n=== Example Complete ===");
}
