//! Change notification for store listeners.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<E> = Rc<dyn Fn(&E)>;

struct Listeners<E> {
    next_id: u64,
    entries: Vec<(u64, Listener<E>)>,
}

/// Fan-out of events of type `E` to registered listeners.
///
/// Listeners may subscribe or unsubscribe while an event is being delivered;
/// the change takes effect from the next event.
pub struct Emitter<E> {
    listeners: Rc<RefCell<Listeners<E>>>,
}

impl<E: 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Emitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Rc::new(listener)));
            id
        };

        let weak: Weak<RefCell<Listeners<E>>> = Rc::downgrade(&self.listeners);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners.borrow_mut().entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

/// Registration handle. Dropping it removes the listener.
#[must_use = "dropping a Subscription removes the listener immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
