use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use crate::api::ResourceClient;
use crate::flux::Action;
use crate::stores::{Completion, StoreEvent};

/// A network call started by a store. It resolves to the completion that
/// will be handed back to the store that started it.
pub type PendingOp = Pin<Box<dyn Future<Output = Completion> + Send + 'static>>;

/// Side-effect sink shared by every handler during a dispatch turn.
///
/// Stores never perform I/O or notify listeners directly. They queue
/// requests, follow-up actions and events here, and the application drains
/// them once the turn is over.
pub struct Effects {
    client: ResourceClient,
    ops: Vec<PendingOp>,
    deferred: VecDeque<Action>,
    events: Vec<StoreEvent>,
}

impl Effects {
    pub fn new(client: ResourceClient) -> Self {
        Self {
            client,
            ops: Vec::new(),
            deferred: VecDeque::new(),
            events: Vec::new(),
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    /// Queue a network call.
    pub fn spawn<F>(&mut self, op: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.ops.push(Box::pin(op));
    }

    /// Queue an action to dispatch once the current one has finished.
    pub fn defer(&mut self, action: Action) {
        self.deferred.push_back(action);
    }

    pub fn emit(&mut self, event: impl Into<StoreEvent>) {
        self.events.push(event.into());
    }

    pub(crate) fn next_deferred(&mut self) -> Option<Action> {
        self.deferred.pop_front()
    }

    pub(crate) fn drop_deferred(&mut self) -> usize {
        let dropped = self.deferred.len();
        self.deferred.clear();
        dropped
    }

    pub(crate) fn into_parts(self) -> (Vec<PendingOp>, Vec<StoreEvent>) {
        (self.ops, self.events)
    }
}
