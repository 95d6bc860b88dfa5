//! Tagstate: tagged-variant state machines with a hook pipeline
//!
//! Tagstate models application state as a closed set of tagged variants and
//! drives it with an explicit, declarative transition table. Pure values
//! (variants, change records, guards, history) live in [`core`]; the
//! imperative shell that holds the current state and runs lifecycle hooks
//! lives in [`machine`].
//!
//! # Core Concepts
//!
//! - **Variants**: `{ tag, data }` values produced by a [`VariantFactory`],
//!   matched exhaustively with [`Handlers`]
//! - **Machines**: a current [`Change`] plus a [`Transitions`] table; `send`
//!   runs guard → leave → enter → effect → notify, then subscribers
//! - **Middleware**: `setup` installs hooks and returns a disposer; `around`
//!   hooks wrap `send` onion style
//! - **Hierarchy**: compound states embed child machines; a
//!   [`HierarchicalMachine`] routes events to the deepest one that can
//!   handle them
//!
//! # Example
//!
//! ```rust
//! use tagstate::builder::create_machine;
//! use tagstate::{transitions, SendOutcome, StateFactory};
//!
//! let states = StateFactory::builder()
//!     .unit("Red")
//!     .unit("Green")
//!     .unit("Yellow")
//!     .build();
//!
//! let light = create_machine(
//!     states,
//!     transitions! {
//!         "Red" => { "next" => "Green" },
//!         "Green" => { "next" => "Yellow" },
//!         "Yellow" => { "next" => "Red" },
//!     },
//!     "Red",
//! )
//! .unwrap();
//!
//! assert_eq!(light.send("next", vec![]).unwrap(), SendOutcome::Transitioned);
//! assert!(light.get_state().is("Green"));
//! assert_eq!(light.get_change().from.key(), "Red");
//! ```

pub mod builder;
pub mod core;
pub mod hierarchy;
pub mod machine;

// Re-export commonly used types
pub use builder::{create_machine, BuildError, MachineBuilder};
pub use core::{
    Change, ChangeHistory, Guard, Handlers, State, StateData, StateFactory, Variant,
    VariantError, VariantFactory,
};
pub use hierarchy::{ComposerOptions, HierarchicalMachine};
pub use machine::{Machine, MachineError, SendOutcome, StateMachine, Subscription, Transitions};
