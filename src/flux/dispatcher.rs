//! Single-threaded action dispatcher with explicit handler ordering.
//!
//! Every registered handler sees every action exactly once. A handler may
//! call [`DispatchCycle::wait_for`] to have other handlers run first for the
//! same action. Dispatching from inside a handler is refused, so one action
//! always completes before the next one starts.

use std::cell::{Cell, RefCell};
use std::fmt;

use thiserror::Error;

use crate::stores::InvariantViolation;

/// Handle returned by [`Dispatcher::register`], used with `wait_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchToken(usize);

impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failures that abort the current action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("cannot dispatch while another action is being dispatched")]
    Reentrant,

    #[error("handler '{name}' ({token}) is already waiting in this dispatch")]
    CyclicWait {
        token: DispatchToken,
        name: &'static str,
    },

    #[error("no handler registered for token {0}")]
    UnknownToken(DispatchToken),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

type Handler<A, C> = Box<dyn FnMut(&A, &mut DispatchCycle<'_, A, C>) -> Result<(), DispatchError>>;

struct Slot<A, C> {
    name: &'static str,
    /// `None` while the handler is running.
    handler: Option<Handler<A, C>>,
    pending: bool,
    handled: bool,
}

/// Routes actions of type `A` to handlers sharing a mutable context `C`.
pub struct Dispatcher<A, C> {
    slots: RefCell<Vec<Slot<A, C>>>,
    dispatching: Cell<bool>,
}

impl<A, C> Default for Dispatcher<A, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C> Dispatcher<A, C> {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            dispatching: Cell::new(false),
        }
    }

    /// Register a handler. Handlers run in registration order unless
    /// `wait_for` says otherwise.
    pub fn register<F>(&mut self, name: &'static str, handler: F) -> DispatchToken
    where
        F: FnMut(&A, &mut DispatchCycle<'_, A, C>) -> Result<(), DispatchError> + 'static,
    {
        let slots = self.slots.get_mut();
        slots.push(Slot {
            name,
            handler: Some(Box::new(handler)),
            pending: false,
            handled: false,
        });
        DispatchToken(slots.len() - 1)
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    /// Run every handler for `action`. The first handler error stops the
    /// dispatch and is returned; handlers that already ran are not undone.
    pub fn dispatch(&self, action: &A, ctx: &mut C) -> Result<(), DispatchError> {
        if self.dispatching.get() {
            return Err(DispatchError::Reentrant);
        }
        let mut slots = self
            .slots
            .try_borrow_mut()
            .map_err(|_| DispatchError::Reentrant)?;

        self.dispatching.set(true);
        let dispatching = &self.dispatching;
        scopeguard::defer! {
            dispatching.set(false);
        }

        for slot in slots.iter_mut() {
            slot.pending = false;
            slot.handled = false;
        }

        let mut cycle = DispatchCycle {
            slots: &mut *slots,
            action,
            ctx,
        };
        for index in 0..cycle.slots.len() {
            if cycle.slots[index].pending {
                continue;
            }
            cycle.invoke(index)?;
        }
        Ok(())
    }
}

/// State of one in-progress dispatch, handed to each handler.
pub struct DispatchCycle<'a, A, C> {
    slots: &'a mut Vec<Slot<A, C>>,
    action: &'a A,
    ctx: &'a mut C,
}

impl<'a, A, C> DispatchCycle<'a, A, C> {
    pub fn action(&self) -> &A {
        self.action
    }

    pub fn ctx(&mut self) -> &mut C {
        &mut *self.ctx
    }

    /// Run the handlers behind `tokens` now, unless they already ran for
    /// this action. Waiting on a handler that is itself still running is a
    /// cycle.
    pub fn wait_for(&mut self, tokens: &[DispatchToken]) -> Result<(), DispatchError> {
        for &token in tokens {
            let slot = self
                .slots
                .get(token.0)
                .ok_or(DispatchError::UnknownToken(token))?;
            if slot.pending {
                if !slot.handled {
                    return Err(DispatchError::CyclicWait {
                        token,
                        name: slot.name,
                    });
                }
                continue;
            }
            self.invoke(token.0)?;
        }
        Ok(())
    }

    fn invoke(&mut self, index: usize) -> Result<(), DispatchError> {
        let slot = &mut self.slots[index];
        slot.pending = true;
        let name = slot.name;
        let Some(mut handler) = slot.handler.take() else {
            return Err(DispatchError::CyclicWait {
                token: DispatchToken(index),
                name,
            });
        };

        let action = self.action;
        let result = handler(action, self);

        let slot = &mut self.slots[index];
        slot.handler = Some(handler);
        if result.is_ok() {
            slot.handled = true;
        } else {
            tracing::debug!(handler = name, "handler aborted dispatch");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    type Log = Vec<&'static str>;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut dispatcher: Dispatcher<u32, Log> = Dispatcher::new();
        dispatcher.register("first", |_, cycle| {
            cycle.ctx().push("first");
            Ok(())
        });
        dispatcher.register("second", |_, cycle| {
            cycle.ctx().push("second");
            Ok(())
        });

        let mut log = Vec::new();
        dispatcher.dispatch(&1, &mut log).unwrap();
        dispatcher.dispatch(&2, &mut log).unwrap();
        assert_eq!(log, vec!["first", "second", "first", "second"]);
    }

    #[test]
    fn test_wait_for_runs_dependency_first_and_only_once() {
        let mut dispatcher: Dispatcher<u32, Log> = Dispatcher::new();
        let upstream = Rc::new(Cell::new(None));

        let dep = upstream.clone();
        dispatcher.register("downstream", move |_, cycle| {
            let token = dep.get().unwrap();
            cycle.wait_for(&[token])?;
            cycle.ctx().push("downstream");
            Ok(())
        });
        let token = dispatcher.register("upstream", |_, cycle| {
            cycle.ctx().push("upstream");
            Ok(())
        });
        upstream.set(Some(token));

        let mut log = Vec::new();
        dispatcher.dispatch(&7, &mut log).unwrap();
        assert_eq!(log, vec!["upstream", "downstream"]);
    }

    #[test]
    fn test_cyclic_wait_is_detected() {
        let mut dispatcher: Dispatcher<u32, Log> = Dispatcher::new();
        let other = Rc::new(Cell::new(None));

        let waits_on = other.clone();
        let a = dispatcher.register("a", move |_, cycle| {
            cycle.wait_for(&[waits_on.get().unwrap()])
        });
        let b = dispatcher.register("b", move |_, cycle| cycle.wait_for(&[a]));
        other.set(Some(b));

        let mut log = Vec::new();
        let err = dispatcher.dispatch(&0, &mut log).unwrap_err();
        assert!(matches!(err, DispatchError::CyclicWait { name: "a", .. }));
        assert!(!dispatcher.is_dispatching());
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let mut dispatcher: Dispatcher<u32, Log> = Dispatcher::new();
        dispatcher.register("only", |_, cycle| cycle.wait_for(&[DispatchToken(9)]));

        let mut log = Vec::new();
        assert_eq!(
            dispatcher.dispatch(&0, &mut log),
            Err(DispatchError::UnknownToken(DispatchToken(9)))
        );
    }

    #[test]
    fn test_nested_dispatch_is_refused() {
        let dispatcher: Rc<Dispatcher<u32, Log>> = Rc::new_cyclic(|weak| {
            let weak = weak.clone();
            let mut dispatcher = Dispatcher::new();
            dispatcher.register("nested", move |action, cycle| {
                let this: Rc<Dispatcher<u32, Log>> = weak.upgrade().unwrap();
                if *action == 0 {
                    let nested = this.dispatch(&1, cycle.ctx());
                    assert_eq!(nested, Err(DispatchError::Reentrant));
                    cycle.ctx().push("refused");
                }
                Ok(())
            });
            dispatcher
        });

        let mut log = Vec::new();
        dispatcher.dispatch(&0, &mut log).unwrap();
        assert_eq!(log, vec!["refused"]);
        assert!(!dispatcher.is_dispatching());
    }

    #[test]
    fn test_failing_handler_stops_dispatch_and_stays_registered() {
        let mut dispatcher: Dispatcher<u32, Log> = Dispatcher::new();
        dispatcher.register("picky", |action, cycle| {
            cycle.ctx().push("picky");
            if *action == 0 {
                Err(DispatchError::Reentrant)
            } else {
                Ok(())
            }
        });
        dispatcher.register("after", |_, cycle| {
            cycle.ctx().push("after");
            Ok(())
        });

        let mut log = Vec::new();
        assert!(dispatcher.dispatch(&0, &mut log).is_err());
        assert_eq!(log, vec!["picky"]);

        log.clear();
        dispatcher.dispatch(&1, &mut log).unwrap();
        assert_eq!(log, vec!["picky", "after"]);
    }
}
