//! Lifecycle hooks and `send` middleware.
//!
//! Every accepted transition runs its hooks in the fixed order
//! guard → leave → enter → effect → notify. `around` hooks wrap `send`
//! itself, onion style: the most recently installed one is outermost.

use super::error::MachineError;
use super::machine::SendOutcome;
use crate::core::{Change, Guard};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// An event as it travels through `around` middleware.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub params: Vec<Value>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            event_type: event_type.into(),
            params,
        }
    }
}

/// Callback run at one stage of an accepted transition.
pub type StageFn = Rc<dyn Fn(&Change) -> Result<(), MachineError>>;

/// Middleware wrapping `send`.
pub type Interceptor = Rc<dyn Fn(&Event, Next<'_>) -> Result<SendOutcome, MachineError>>;

/// The rest of the `send` chain, handed to an `around` hook.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    inner: &'a dyn Fn(&Event) -> Result<SendOutcome, MachineError>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(inner: &'a dyn Fn(&Event) -> Result<SendOutcome, MachineError>) -> Self {
        Self { inner }
    }

    pub fn run(&self, event: &Event) -> Result<SendOutcome, MachineError> {
        (self.inner)(event)
    }
}

/// Stages after the guard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Leave,
    Enter,
    Effect,
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Leave => "leave",
            Self::Enter => "enter",
            Self::Effect => "effect",
            Self::Notify => "notify",
        };
        f.write_str(name)
    }
}

/// A stage callback, optionally bound to one state key.
#[derive(Clone)]
pub struct StageHook {
    state: Option<String>,
    run: StageFn,
}

impl StageHook {
    fn new<F>(state: Option<String>, run: F) -> Self
    where
        F: Fn(&Change) -> Result<(), MachineError> + 'static,
    {
        Self {
            state,
            run: Rc::new(run),
        }
    }

    pub(crate) fn applies_to(&self, key: &str) -> bool {
        self.state.as_deref().is_none_or(|state| state == key)
    }

    pub(crate) fn run(&self, change: &Change) -> Result<(), MachineError> {
        (self.run)(change)
    }
}

/// One installable piece of lifecycle middleware.
#[derive(Clone)]
pub enum Hook {
    Guard(Guard),
    Leave(StageHook),
    Enter(StageHook),
    Effect(StageHook),
    Notify(StageHook),
    Around(Interceptor),
}

impl Hook {
    fn stage(&self) -> Option<(Stage, &StageHook)> {
        match self {
            Self::Leave(hook) => Some((Stage::Leave, hook)),
            Self::Enter(hook) => Some((Stage::Enter, hook)),
            Self::Effect(hook) => Some((Stage::Effect, hook)),
            Self::Notify(hook) => Some((Stage::Notify, hook)),
            Self::Guard(_) | Self::Around(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Guard(_) => "guard",
            Self::Leave(_) => "leave",
            Self::Enter(_) => "enter",
            Self::Effect(_) => "effect",
            Self::Notify(_) => "notify",
            Self::Around(_) => "around",
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.kind()).finish()
    }
}

/// Veto any transition for which `predicate` returns `false`.
pub fn guard<F>(predicate: F) -> Hook
where
    F: Fn(&Change) -> bool + 'static,
{
    Hook::Guard(Guard::new(predicate))
}

/// Guard only transitions caused by `event`.
pub fn guard_event<F>(event: &str, predicate: F) -> Hook
where
    F: Fn(&Change) -> bool + 'static,
{
    Hook::Guard(Guard::for_event(event, predicate))
}

/// Run before the outgoing state is replaced.
pub fn leave<F>(run: F) -> Hook
where
    F: Fn(&Change) -> Result<(), MachineError> + 'static,
{
    Hook::Leave(StageHook::new(None, run))
}

/// Run when leaving the state `key`.
pub fn leave_state<F>(key: &str, run: F) -> Hook
where
    F: Fn(&Change) -> Result<(), MachineError> + 'static,
{
    Hook::Leave(StageHook::new(Some(key.to_string()), run))
}

/// Run after the incoming state is committed.
pub fn enter<F>(run: F) -> Hook
where
    F: Fn(&Change) -> Result<(), MachineError> + 'static,
{
    Hook::Enter(StageHook::new(None, run))
}

/// Run when entering the state `key`.
pub fn enter_state<F>(key: &str, run: F) -> Hook
where
    F: Fn(&Change) -> Result<(), MachineError> + 'static,
{
    Hook::Enter(StageHook::new(Some(key.to_string()), run))
}

/// Run after enter hooks, for every accepted transition.
pub fn effect<F>(run: F) -> Hook
where
    F: Fn(&Change) -> Result<(), MachineError> + 'static,
{
    Hook::Effect(StageHook::new(None, run))
}

/// Run right before subscribers are called.
pub fn notify<F>(run: F) -> Hook
where
    F: Fn(&Change) -> Result<(), MachineError> + 'static,
{
    Hook::Notify(StageHook::new(None, run))
}

/// Wrap `send`. The hook decides whether (and with which event) to call `next`.
///
/// # Example
///
/// ```rust
/// use tagstate::builder::create_machine;
/// use tagstate::machine::hooks::{around, Event};
/// use tagstate::machine::SendOutcome;
/// use tagstate::{transitions, StateFactory};
///
/// let states = StateFactory::builder().unit("Off").unit("On").build();
/// let machine = create_machine(states, transitions! { "Off" => { "toggle" => "On" } }, "Off").unwrap();
///
/// // Swallow every event while the hook is installed.
/// let disposer = machine.setup(vec![around(|_event: &Event, _next| Ok(SendOutcome::Ignored))]);
/// machine.send("toggle", vec![]).unwrap();
/// assert!(machine.get_state().is("Off"));
///
/// disposer.dispose();
/// machine.send("toggle", vec![]).unwrap();
/// assert!(machine.get_state().is("On"));
/// ```
pub fn around<F>(intercept: F) -> Hook
where
    F: Fn(&Event, Next<'_>) -> Result<SendOutcome, MachineError> + 'static,
{
    Hook::Around(Rc::new(intercept))
}

pub(crate) type HookId = u64;

/// Installed hooks in installation order.
#[derive(Default)]
pub(crate) struct Pipeline {
    next_id: HookId,
    entries: Vec<(HookId, Hook)>,
}

impl Pipeline {
    pub(crate) fn install(&mut self, hook: Hook) -> HookId {
        self.next_id += 1;
        let id = self.next_id;
        trace!(id, kind = hook.kind(), "installing hook");
        self.entries.push((id, hook));
        id
    }

    pub(crate) fn remove(&mut self, id: HookId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn guards(&self) -> Vec<Guard> {
        self.entries
            .iter()
            .filter_map(|(_, hook)| match hook {
                Hook::Guard(guard) => Some(guard.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn stage(&self, stage: Stage) -> Vec<StageHook> {
        self.entries
            .iter()
            .filter_map(|(_, hook)| match hook.stage() {
                Some((s, stage_hook)) if s == stage => Some(stage_hook.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn interceptors(&self) -> Vec<Interceptor> {
        self.entries
            .iter()
            .filter_map(|(_, hook)| match hook {
                Hook::Around(intercept) => Some(Rc::clone(intercept)),
                _ => None,
            })
            .collect()
    }
}

/// Removes the hooks installed by one `setup` call.
#[must_use = "hooks stay installed until dispose() is called"]
pub struct Disposer {
    pipeline: Weak<RefCell<Pipeline>>,
    ids: Vec<HookId>,
}

impl Disposer {
    pub(crate) fn new(pipeline: &Rc<RefCell<Pipeline>>, ids: Vec<HookId>) -> Self {
        Self {
            pipeline: Rc::downgrade(pipeline),
            ids,
        }
    }

    /// Uninstall, last installed first.
    pub fn dispose(self) {
        let Some(pipeline) = self.pipeline.upgrade() else {
            return;
        };
        let mut pipeline = pipeline.borrow_mut();
        for id in self.ids.iter().rev() {
            if pipeline.remove(*id) {
                trace!(id, "removed hook");
            }
        }
    }

    /// Number of hooks this disposer owns.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer").field("ids", &self.ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Change) -> Result<(), MachineError> {
        Ok(())
    }

    #[test]
    fn pipeline_keeps_installation_order_per_stage() {
        let mut pipeline = Pipeline::default();
        pipeline.install(enter(noop));
        pipeline.install(leave(noop));
        pipeline.install(enter_state("Green", noop));
        pipeline.install(guard(|_| true));

        let enters = pipeline.stage(Stage::Enter);
        assert_eq!(enters.len(), 2);
        assert!(enters[0].applies_to("Red"));
        assert!(!enters[1].applies_to("Red"));
        assert!(enters[1].applies_to("Green"));

        assert_eq!(pipeline.stage(Stage::Leave).len(), 1);
        assert_eq!(pipeline.stage(Stage::Effect).len(), 0);
        assert_eq!(pipeline.guards().len(), 1);
    }

    #[test]
    fn disposer_removes_only_its_hooks() {
        let pipeline = Rc::new(RefCell::new(Pipeline::default()));
        let keep = pipeline.borrow_mut().install(effect(noop));
        let notify_id = pipeline.borrow_mut().install(notify(noop));
        let around_id = pipeline
            .borrow_mut()
            .install(around(|event, next| next.run(event)));
        let ids = vec![notify_id, around_id];
        let disposer = Disposer::new(&pipeline, ids);
        assert_eq!(disposer.len(), 2);

        disposer.dispose();

        assert_eq!(pipeline.borrow().len(), 1);
        assert!(pipeline.borrow_mut().remove(keep));
    }

    #[test]
    fn disposer_outliving_pipeline_is_harmless() {
        let pipeline = Rc::new(RefCell::new(Pipeline::default()));
        let id = pipeline.borrow_mut().install(effect(noop));
        let disposer = Disposer::new(&pipeline, vec![id]);

        drop(pipeline);
        disposer.dispose();
    }

    #[test]
    fn stage_names_display() {
        assert_eq!(Stage::Leave.to_string(), "leave");
        assert_eq!(Stage::Notify.to_string(), "notify");
        assert_eq!(format!("{:?}", guard(|_| true)), "Hook(\"guard\")");
    }
}
