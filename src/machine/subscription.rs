//! Change listeners with enter/exit style cleanups.

use crate::core::Change;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Returned by a listener; runs right before the same listener sees the
/// next change, or when it unsubscribes.
pub type Cleanup = Box<dyn FnOnce()>;

/// Listener called with every accepted change.
pub type Listener = Rc<dyn Fn(&Change) -> Option<Cleanup>>;

struct Entry {
    id: u64,
    listener: Listener,
    cleanup: Rc<RefCell<Option<Cleanup>>>,
}

/// Ordered set of listeners.
#[derive(Default)]
pub(crate) struct SubscriberList {
    next_id: Cell<u64>,
    entries: RefCell<Vec<Entry>>,
}

impl SubscriberList {
    pub(crate) fn add<F>(&self, listener: F) -> u64
    where
        F: Fn(&Change) -> Option<Cleanup> + 'static,
    {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.entries.borrow_mut().push(Entry {
            id,
            listener: Rc::new(listener),
            cleanup: Rc::new(RefCell::new(None)),
        });
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let index = entries.iter().position(|entry| entry.id == id);
            index.map(|index| entries.remove(index))
        };
        match removed {
            Some(entry) => {
                run_cleanup(&entry.cleanup);
                true
            }
            None => false,
        }
    }

    /// Drop every listener, running pending cleanups in registration order.
    pub(crate) fn clear(&self) {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        for entry in &entries {
            run_cleanup(&entry.cleanup);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }

    /// Call every listener in registration order.
    ///
    /// Listeners removed by an earlier listener during this pass are skipped.
    /// No borrow is held while a listener runs, so listeners may send.
    pub(crate) fn notify(&self, change: &Change) {
        let snapshot: Vec<(u64, Listener, Rc<RefCell<Option<Cleanup>>>)> = self
            .entries
            .borrow()
            .iter()
            .map(|entry| (entry.id, Rc::clone(&entry.listener), Rc::clone(&entry.cleanup)))
            .collect();

        for (id, listener, cleanup) in snapshot {
            if !self.contains(id) {
                continue;
            }
            run_cleanup(&cleanup);
            let Some(next) = listener(change) else {
                continue;
            };
            if !self.contains(id) {
                // Unsubscribed during its own call; nothing will run it later.
                next();
                continue;
            }
            let mut slot = cleanup.borrow_mut();
            if slot.is_some() {
                // A nested send already stored the cleanup for a later change;
                // this one is stale.
                drop(slot);
                next();
            } else {
                *slot = Some(next);
            }
        }
    }
}

fn run_cleanup(slot: &RefCell<Option<Cleanup>>) {
    let pending = slot.borrow_mut().take();
    if let Some(cleanup) = pending {
        cleanup();
    }
}

/// Handle returned by `subscribe`.
#[must_use = "the listener stays registered until unsubscribe() is called"]
pub struct Subscription {
    list: Weak<SubscriberList>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(list: &Rc<SubscriberList>, id: u64) -> Self {
        Self {
            list: Rc::downgrade(list),
            id,
        }
    }

    /// Stop receiving changes; runs the listener's pending cleanup.
    pub fn unsubscribe(self) {
        if let Some(list) = self.list.upgrade() {
            list.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.list
            .upgrade()
            .is_some_and(|list| list.contains(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
