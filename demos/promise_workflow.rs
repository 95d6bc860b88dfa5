//! Promise Workflow
//!
//! This example demonstrates a request lifecycle guarded by hooks.
//!
//! Key concepts:
//! - States carrying data built from event params
//! - Guards vetoing transitions without side effects
//! - Leave/enter/effect hooks in a fixed order
//! - `around` middleware rewriting events before the machine sees them
//! - Disposing installed hooks
//!
//! Run with: cargo run --example promise_workflow

use serde_json::{json, Value};
use tagstate::builder::MachineBuilder;
use tagstate::machine::hooks::{around, effect, enter_state, guard_event, leave_state, Event};
use tagstate::{transitions, Change, StateFactory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    println!("=== Promise Workflow ===\n");

    let states = StateFactory::builder()
        .unit("Idle")
        .state("Pending", |args| json!({ "attempt": args.first().cloned() }))
        .state("Resolved", |args| json!({ "value": args.first().cloned() }))
        .state("Rejected", |args| json!({ "error": args.first().cloned() }))
        .build();

    let machine = MachineBuilder::new()
        .states(states)
        .transitions(transitions! {
            "Idle" => { "execute" => "Pending" },
            "Pending" => { "resolve" => "Resolved", "reject" => "Rejected" },
            "Rejected" => { "retry" => "Pending" },
        })
        .initial("Idle")
        .with_history()
        .build()
        .unwrap();

    let disposer = machine.setup(vec![
        guard_event("execute", |change: &Change| {
            change.param(0).and_then(Value::as_i64).is_some_and(|n| n > 0)
        }),
        leave_state("Idle", |_| {
            println!("  leave: Idle");
            Ok(())
        }),
        enter_state("Pending", |change| {
            println!("  enter: Pending (attempt {})", change.to.data().get("attempt").unwrap_or(&Value::Null));
            Ok(())
        }),
        effect(|change| {
            println!("  effect: {} via '{}'", change.to.key(), change.event_type);
            Ok(())
        }),
        // Retries always restart at attempt 2 in this demo.
        around(|event: &Event, next| {
            if event.event_type == "retry" {
                next.run(&Event::new("retry", vec![json!(2)]))
            } else {
                next.run(event)
            }
        }),
    ]);

    println!("Execute with attempt -1 (vetoed):");
    let outcome = machine.send("execute", vec![json!(-1)]).unwrap();
    println!("  -> {outcome:?}, state {}\n", machine.get_state().key());

    println!("Execute with attempt 1:");
    machine.send("execute", vec![json!(1)]).unwrap();

    println!("\nReject with an error:");
    machine.send("reject", vec![json!("timeout")]).unwrap();
    println!("  error: {}", machine.get_state().data().get("error").unwrap_or(&Value::Null));

    println!("\nRetry (params rewritten by middleware):");
    machine.send("retry", vec![]).unwrap();

    disposer.dispose();

    println!("\nResolve after hooks were disposed:");
    machine.send("resolve", vec![json!({ "rows": 3 })]).unwrap();
    println!("  snapshot: {}", machine.snapshot().unwrap());

    if let Some(history) = machine.history() {
        println!("\nPath: {}", history.get_path().join(" -> "));
    }

    println!("\n=== Example Complete ===");
}
