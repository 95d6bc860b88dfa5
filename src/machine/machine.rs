//! Machine that applies a transition table to its current state.

use super::error::MachineError;
use super::hooks::{Disposer, Event, Hook, Interceptor, Next, Pipeline, Stage};
use super::subscription::{Cleanup, SubscriberList, Subscription};
use super::transition::{ResolveContext, Transitions};
use crate::core::{Change, ChangeHistory, State, StateFactory};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// What happened to one `send`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// A new change was committed and hooks/subscribers ran
    Transitioned,

    /// A guard rejected the transition; nothing changed
    Vetoed,

    /// The table has no entry for this event in the current state
    Ignored,
}

impl SendOutcome {
    pub fn is_transitioned(&self) -> bool {
        matches!(self, Self::Transitioned)
    }
}

struct Inner {
    states: StateFactory,
    transitions: Transitions,
    current: RefCell<Change>,
    pipeline: Rc<RefCell<Pipeline>>,
    subscribers: Rc<SubscriberList>,
    history: RefCell<Option<ChangeHistory>>,
}

/// A finite state machine over one [`StateFactory`].
///
/// `Machine` is a cheap handle: clones share the same current change, hooks
/// and subscribers. Execution is single-threaded and synchronous; no borrow
/// is held while resolvers, hooks or listeners run, so any of them may call
/// `send` again and that nested call completes before control returns.
///
/// # Example
///
/// ```rust
/// use tagstate::builder::create_machine;
/// use tagstate::{transitions, StateFactory};
///
/// let states = StateFactory::builder().unit("Red").unit("Green").unit("Yellow").build();
/// let light = create_machine(
///     states,
///     transitions! {
///         "Red" => { "next" => "Green" },
///         "Green" => { "next" => "Yellow" },
///         "Yellow" => { "next" => "Red" },
///     },
///     "Red",
/// )
/// .unwrap();
///
/// light.send("next", vec![]).unwrap();
/// assert_eq!(light.get_state().key(), "Green");
/// assert_eq!(light.get_change().from.key(), "Red");
/// ```
#[derive(Clone)]
pub struct Machine {
    inner: Rc<Inner>,
}

impl Machine {
    pub(crate) fn new(
        states: StateFactory,
        transitions: Transitions,
        initial: State,
        track_history: bool,
    ) -> Self {
        let history = track_history.then(ChangeHistory::new);
        Self {
            inner: Rc::new(Inner {
                states,
                transitions,
                current: RefCell::new(Change::initial(initial)),
                pipeline: Rc::new(RefCell::new(Pipeline::default())),
                subscribers: Rc::new(SubscriberList::default()),
                history: RefCell::new(history),
            }),
        }
    }

    /// Current state; always equals `get_change().to`.
    pub fn get_state(&self) -> State {
        self.inner.current.borrow().to.clone()
    }

    /// Most recent accepted change, or the initial one.
    pub fn get_change(&self) -> Change {
        self.inner.current.borrow().clone()
    }

    pub fn states(&self) -> &StateFactory {
        &self.inner.states
    }

    pub fn transitions(&self) -> &Transitions {
        &self.inner.transitions
    }

    /// Whether the table has an entry for `event_type` in the current state.
    pub fn can_handle(&self, event_type: &str) -> bool {
        let current = self.inner.current.borrow();
        self.inner.transitions.has(current.to.key(), event_type)
    }

    /// Event types the table offers in the current state.
    pub fn available_events(&self) -> Vec<String> {
        let current = self.inner.current.borrow();
        self.inner
            .transitions
            .events_for(current.to.key())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Send an event through `around` middleware and the hook pipeline.
    ///
    /// Errors returned by hooks propagate unchanged. State committed before
    /// the failing hook stays committed.
    pub fn send(&self, event_type: &str, params: Vec<Value>) -> Result<SendOutcome, MachineError> {
        let event = Event::new(event_type, params);
        let interceptors = self.inner.pipeline.borrow().interceptors();
        self.dispatch(&interceptors, &event)
    }

    fn dispatch(
        &self,
        interceptors: &[Interceptor],
        event: &Event,
    ) -> Result<SendOutcome, MachineError> {
        match interceptors.split_last() {
            None => self.transition(event),
            Some((outermost, rest)) => {
                let next = |event: &Event| self.dispatch(rest, event);
                outermost(event, Next::new(&next))
            }
        }
    }

    fn transition(&self, event: &Event) -> Result<SendOutcome, MachineError> {
        let from = self.get_state();
        let Some(target) = self.inner.transitions.get(from.key(), &event.event_type) else {
            trace!(state = from.key(), event = %event.event_type, "no transition, ignoring");
            return Ok(SendOutcome::Ignored);
        };

        let ctx = ResolveContext {
            event_type: &event.event_type,
            params: &event.params,
            from: &from,
        };
        let to = target.resolve(&ctx, &self.inner.states)?;
        let change = Change::new(event.event_type.clone(), event.params.clone(), from, to);

        let guards = self.inner.pipeline.borrow().guards();
        if let Some(vetoing) = guards.iter().find(|guard| !guard.check(&change)) {
            debug!(
                from = change.from.key(),
                to = change.to.key(),
                event = %change.event_type,
                guard = ?vetoing,
                "transition vetoed"
            );
            return Ok(SendOutcome::Vetoed);
        }

        self.run_stage(Stage::Leave, &change)?;
        self.commit(change.clone());
        debug!(
            from = change.from.key(),
            to = change.to.key(),
            event = %change.event_type,
            "transitioned"
        );
        self.run_stage(Stage::Enter, &change)?;
        self.run_stage(Stage::Effect, &change)?;
        self.run_stage(Stage::Notify, &change)?;
        self.inner.subscribers.notify(&change);

        Ok(SendOutcome::Transitioned)
    }

    fn run_stage(&self, stage: Stage, change: &Change) -> Result<(), MachineError> {
        let hooks = self.inner.pipeline.borrow().stage(stage);
        let key = match stage {
            Stage::Leave => change.from.key(),
            Stage::Enter | Stage::Effect | Stage::Notify => change.to.key(),
        };
        for hook in hooks.iter().filter(|hook| hook.applies_to(key)) {
            hook.run(change).inspect_err(|err| {
                debug!(%stage, event = %change.event_type, error = %err, "hook failed");
            })?;
        }
        Ok(())
    }

    fn commit(&self, change: Change) {
        if let Some(history) = self.inner.history.borrow_mut().as_mut() {
            history.push(change.clone());
        }
        *self.inner.current.borrow_mut() = change;
    }

    /// Install lifecycle middleware in order. The returned disposer removes
    /// all of them, most recently installed first.
    pub fn setup<I>(&self, hooks: I) -> Disposer
    where
        I: IntoIterator<Item = Hook>,
    {
        let ids = {
            let mut pipeline = self.inner.pipeline.borrow_mut();
            hooks.into_iter().map(|hook| pipeline.install(hook)).collect()
        };
        Disposer::new(&self.inner.pipeline, ids)
    }

    /// Call `listener` with every accepted change, in registration order.
    ///
    /// A listener may return a [`Cleanup`]; it runs right before the same
    /// listener is called for the next change, and on unsubscribe.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Change) -> Option<Cleanup> + 'static,
    {
        let id = self.inner.subscribers.add(listener);
        Subscription::new(&self.inner.subscribers, id)
    }

    /// Run every pending subscriber cleanup, drop all subscribers and
    /// uninstall all hooks. The current state is kept.
    pub fn dispose(&self) {
        debug!(
            state = self.get_state().key(),
            subscribers = self.inner.subscribers.len(),
            hooks = self.inner.pipeline.borrow().len(),
            "disposing machine"
        );
        self.inner.pipeline.borrow_mut().clear();
        self.inner.subscribers.clear();
    }

    /// Accepted changes so far, when history tracking is enabled.
    pub fn history(&self) -> Option<ChangeHistory> {
        self.inner.history.borrow().clone()
    }

    /// JSON rendering of the current state, including embedded children.
    pub fn snapshot(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.get_state())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn hook_count(&self) -> usize {
        self.inner.pipeline.borrow().len()
    }

    /// Whether both handles refer to the same machine.
    pub fn ptr_eq(&self, other: &Machine) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Machine");
        match self.inner.current.try_borrow() {
            Ok(current) => debug.field("state", &current.to.key()),
            Err(_) => debug.field("state", &"<committing>"),
        };
        debug.finish_non_exhaustive()
    }
}
