//! Routing events through nested machines.

use crate::core::{join_key, parse_key, Change, State, StateFactory};
use crate::machine::{
    Cleanup, Listener, Machine, MachineError, SendOutcome, StateMachine, Subscription,
    Transitions,
};
use crate::machine::subscription::SubscriberList;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Composer behavior switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposerOptions {
    /// Call [`Machine::dispose`] on every machine that drops out of the
    /// active path after an accepted transition. Off by default: discarded
    /// children get no teardown signal.
    pub dispose_discarded_children: bool,
}

/// A root machine whose states may embed child machines.
///
/// `get_state` and `get_change` report the root; subscribers receive the
/// change record of whichever level accepted a transition.
///
/// # Example
///
/// ```rust
/// use tagstate::builder::create_machine;
/// use tagstate::hierarchy::HierarchicalMachine;
/// use tagstate::{transitions, StateFactory};
///
/// fn light() -> tagstate::Machine {
///     let states = StateFactory::builder().unit("Red").unit("Green").build();
///     create_machine(states, transitions! { "Red" => { "tick" => "Green" } }, "Red").unwrap()
/// }
///
/// let states = StateFactory::builder().compound("Working", light).unit("Off").build();
/// let root = create_machine(states, transitions! { "Working" => { "stop" => "Off" } }, "Working").unwrap();
/// let machine = HierarchicalMachine::new(root);
///
/// assert_eq!(machine.full_key(), "Working.Red");
/// machine.send("tick", vec![]).unwrap();
/// assert_eq!(machine.full_key(), "Working.Green");
/// assert_eq!(machine.get_state().key(), "Working");
/// ```
pub struct HierarchicalMachine {
    root: Machine,
    options: ComposerOptions,
    subscribers: Rc<SubscriberList>,
}

impl HierarchicalMachine {
    pub fn new(root: Machine) -> Self {
        Self::with_options(root, ComposerOptions::default())
    }

    pub fn with_options(root: Machine, options: ComposerOptions) -> Self {
        Self {
            root,
            options,
            subscribers: Rc::new(SubscriberList::default()),
        }
    }

    pub fn root(&self) -> &Machine {
        &self.root
    }

    pub fn options(&self) -> ComposerOptions {
        self.options
    }

    /// Machines from the root to the deepest active child.
    pub fn active_path(&self) -> Vec<Machine> {
        self.current_path()
    }

    /// Current state key at every level of the active path.
    pub fn active_keys(&self) -> Vec<String> {
        keys_of(&self.current_path())
    }

    /// Dotted address of the active state chain, e.g. `"Working.Green"`.
    pub fn full_key(&self) -> String {
        join_key(self.active_keys())
    }

    /// The deepest active machine.
    pub fn leaf(&self) -> Machine {
        self.current_path()
            .pop()
            .unwrap_or_else(|| self.root.clone())
    }

    /// Resolve a dotted address against the active path.
    ///
    /// Returns the machine at the address's last level when every level
    /// matches the current keys, e.g. `"Working"` yields the root and
    /// `"Working.Green"` the child while it sits in `Green`.
    pub fn machine_at(&self, address: &str) -> Option<Machine> {
        let address = parse_key(address);
        let path = self.current_path();
        let keys = keys_of(&path);
        let depth = address.depth();
        if depth > keys.len() || keys[..depth] != address.parts[..] {
            return None;
        }
        path.into_iter().nth(depth - 1)
    }

    /// Route an event to the deepest machine in the active path whose table
    /// has an entry for it; ancestors only see events their descendants
    /// cannot handle.
    pub fn send(&self, event_type: &str, params: Vec<Value>) -> Result<SendOutcome, MachineError> {
        let before = self.current_path();
        let Some((depth, handler)) = before
            .iter()
            .enumerate()
            .rev()
            .find(|(_, machine)| machine.can_handle(event_type))
        else {
            trace!(address = %join_key(keys_of(&before)), event = event_type, "no machine handles event");
            return Ok(SendOutcome::Ignored);
        };

        debug!(
            depth,
            state = handler.get_state().key(),
            event = event_type,
            "routing event"
        );
        let handler = handler.clone();
        let result = handler.send(event_type, params);
        let after = self.current_path();
        let outcome = result?;

        if outcome.is_transitioned() {
            if self.options.dispose_discarded_children {
                for discarded in before
                    .iter()
                    .filter(|old| !after.iter().any(|new| new.ptr_eq(old)))
                {
                    debug!(state = discarded.get_state().key(), "disposing discarded child");
                    discarded.dispose();
                }
            }
            self.subscribers.notify(&handler.get_change());
        }

        Ok(outcome)
    }

    /// The root's current state.
    pub fn get_state(&self) -> State {
        self.root.get_state()
    }

    /// The root's current change.
    pub fn get_change(&self) -> Change {
        self.root.get_change()
    }

    /// Call `listener` with every change accepted through this composer, at
    /// any level.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Change) -> Option<Cleanup> + 'static,
    {
        let id = self.subscribers.add(listener);
        Subscription::new(&self.subscribers, id)
    }

    pub fn states(&self) -> &StateFactory {
        self.root.states()
    }

    pub fn transitions(&self) -> &Transitions {
        self.root.transitions()
    }

    fn current_path(&self) -> Vec<Machine> {
        walk(&self.root)
    }
}

impl StateMachine for HierarchicalMachine {
    fn send(&self, event_type: &str, params: Vec<Value>) -> Result<SendOutcome, MachineError> {
        HierarchicalMachine::send(self, event_type, params)
    }

    fn get_state(&self) -> State {
        HierarchicalMachine::get_state(self)
    }

    fn get_change(&self) -> Change {
        HierarchicalMachine::get_change(self)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        HierarchicalMachine::subscribe(self, move |change| listener(change))
    }

    fn states(&self) -> &StateFactory {
        HierarchicalMachine::states(self)
    }

    fn transitions(&self) -> &Transitions {
        HierarchicalMachine::transitions(self)
    }
}

impl fmt::Debug for HierarchicalMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = keys_of(&self.current_path());
        f.debug_struct("HierarchicalMachine")
            .field("active", &join_key(keys))
            .field("options", &self.options)
            .finish()
    }
}

fn walk(root: &Machine) -> Vec<Machine> {
    let mut path = vec![root.clone()];
    let mut state = root.get_state();
    while let Some(child) = state.child().cloned() {
        state = child.get_state();
        path.push(child);
    }
    path
}

fn keys_of(path: &[Machine]) -> Vec<String> {
    path.iter()
        .map(|machine| machine.get_state().key().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::create_machine;
    use crate::machine::hooks::leave_state;
    use crate::transitions;
    use std::cell::{Cell, RefCell};

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
                "Yellow" => { "tick" => "Red", "halt" => "Red" },
            },
            "Red",
        )
        .unwrap()
    }

    fn controller() -> Machine {
        let states = StateFactory::builder()
            .compound_with_id("Working", "light", light)
            .unit("Broken")
            .unit("Off")
            .build();
        create_machine(
            states,
            transitions! {
                "Working" => { "fail" => "Broken", "halt" => "Off" },
                "Broken" => { "repair" => "Working" },
                "Off" => { "start" => "Working" },
            },
            "Working",
        )
        .unwrap()
    }

    #[test]
    fn active_path_descends_through_compound_states() {
        let machine = HierarchicalMachine::new(controller());

        let path = machine.active_path();
        assert_eq!(path.len(), 2);
        assert!(path[0].ptr_eq(machine.root()));
        assert_eq!(machine.active_keys(), vec!["Working", "Red"]);
        assert_eq!(machine.full_key(), "Working.Red");
    }

    #[test]
    fn child_consumes_its_events() {
        let machine = HierarchicalMachine::new(controller());

        let outcome = machine.send("tick", vec![]).unwrap();

        assert_eq!(outcome, SendOutcome::Transitioned);
        assert_eq!(machine.get_state().key(), "Working");
        assert!(machine.get_change().is_initial());
        assert_eq!(machine.leaf().get_state().key(), "Green");
    }

    #[test]
    fn deepest_handler_wins_over_ancestors() {
        let machine = HierarchicalMachine::new(controller());
        machine.send("tick", vec![]).unwrap();
        machine.send("tick", vec![]).unwrap();
        assert_eq!(machine.full_key(), "Working.Yellow");

        // Both levels model "halt"; the child takes it.
        machine.send("halt", vec![]).unwrap();
        assert_eq!(machine.full_key(), "Working.Red");

        // Child cannot handle "halt" in Red, so it falls back to the root.
        machine.send("halt", vec![]).unwrap();
        assert_eq!(machine.full_key(), "Off");
        assert_eq!(machine.active_path().len(), 1);
    }

    #[test]
    fn unhandled_event_is_ignored_everywhere() {
        let machine = HierarchicalMachine::new(controller());

        let outcome = machine.send("repair", vec![]).unwrap();

        assert_eq!(outcome, SendOutcome::Ignored);
        assert_eq!(machine.full_key(), "Working.Red");
    }

    #[test]
    fn reentering_compound_state_spawns_fresh_child() {
        let machine = HierarchicalMachine::new(controller());
        machine.send("tick", vec![]).unwrap();
        let first_child = machine.leaf();

        machine.send("fail", vec![]).unwrap();
        machine.send("repair", vec![]).unwrap();

        assert_eq!(machine.full_key(), "Working.Red");
        assert!(!machine.leaf().ptr_eq(&first_child));
        assert_eq!(first_child.get_state().key(), "Green");
    }

    #[test]
    fn subscribers_see_changes_at_every_level() {
        let machine = HierarchicalMachine::new(controller());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _subscription = machine.subscribe({
            let seen = Rc::clone(&seen);
            move |change| {
                seen.borrow_mut()
                    .push(format!("{}->{}", change.from.key(), change.to.key()));
                None
            }
        });

        machine.send("tick", vec![]).unwrap();
        machine.send("fail", vec![]).unwrap();
        machine.send("tick", vec![]).unwrap();

        assert_eq!(*seen.borrow(), vec!["Red->Green", "Working->Broken"]);
    }

    #[test]
    fn discarded_child_is_not_disposed_by_default() {
        let machine = HierarchicalMachine::new(controller());
        let child = machine.leaf();
        let _disposer = child.setup(vec![leave_state("Red", |_| Ok(()))]);

        machine.send("fail", vec![]).unwrap();

        assert_eq!(child.hook_count(), 1);
    }

    #[test]
    fn discarded_child_is_disposed_when_configured() {
        let machine = HierarchicalMachine::with_options(
            controller(),
            ComposerOptions {
                dispose_discarded_children: true,
            },
        );
        let child = machine.leaf();
        let cleaned = Rc::new(Cell::new(false));
        let _subscription = child.subscribe({
            let cleaned = Rc::clone(&cleaned);
            move |_| {
                let cleaned = Rc::clone(&cleaned);
                let cleanup: Cleanup = Box::new(move || cleaned.set(true));
                Some(cleanup)
            }
        });
        machine.send("tick", vec![]).unwrap();
        assert!(!cleaned.get());

        machine.send("fail", vec![]).unwrap();

        assert!(cleaned.get());
        assert_eq!(child.subscriber_count(), 0);
    }

    #[test]
    fn composer_does_not_retain_discarded_children() {
        let machine = HierarchicalMachine::new(controller());
        let token = Rc::new(());
        let _subscription = machine.leaf().subscribe({
            let token = Rc::clone(&token);
            move |_| {
                let _ = &token;
                None
            }
        });
        assert_eq!(Rc::strong_count(&token), 2);

        // Drive the root directly so the composer never sees the change.
        machine.root().send("fail", vec![]).unwrap();
        machine.root().send("repair", vec![]).unwrap();

        assert_eq!(Rc::strong_count(&token), 1);
        assert_eq!(
            format!("{machine:?}"),
            "HierarchicalMachine { active: \"Working.Red\", options: ComposerOptions { dispose_discarded_children: false } }"
        );
    }

    #[test]
    fn machine_at_resolves_addresses() {
        let machine = HierarchicalMachine::new(controller());

        assert!(machine
            .machine_at("Working")
            .is_some_and(|m| m.ptr_eq(machine.root())));
        assert!(machine
            .machine_at("Working.Red")
            .is_some_and(|m| m.ptr_eq(&machine.leaf())));
        assert!(machine.machine_at("Working.Green").is_none());
        assert!(machine.machine_at("Working.Red.Deeper").is_none());
        assert!(machine.machine_at("Off").is_none());
    }

    #[test]
    fn composer_exposes_root_surface() {
        let machine = HierarchicalMachine::new(controller());

        assert!(machine.states().contains("Broken"));
        assert_eq!(machine.transitions().events_for("Working"), vec!["fail", "halt"]);
        assert_eq!(
            format!("{machine:?}"),
            "HierarchicalMachine { active: \"Working.Red\", options: ComposerOptions { dispose_discarded_children: false } }"
        );
    }
}
