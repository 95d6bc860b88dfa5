//! The machine engine.
//!
//! This module provides the imperative shell around the core values:
//! - **Transitions**: per-state tables from event type to target
//! - **Machine**: holds the current change and runs the hook pipeline
//! - **Hooks**: guard / leave / enter / effect / notify stages plus `around`
//!   middleware over `send`
//! - **Subscriptions**: listeners notified after every accepted transition

mod error;
pub mod hooks;
#[allow(clippy::module_inception)]
mod machine;
pub(crate) mod subscription;
mod surface;
mod transition;

pub use error::MachineError;
pub use hooks::{Disposer, Event, Hook, Next, Stage};
pub use machine::{Machine, SendOutcome};
pub use subscription::{Cleanup, Listener, Subscription};
pub use surface::StateMachine;
pub use transition::{
    Edge, ResolveContext, Resolution, Resolved, Resolver, TableError, Target, Transitions,
};
