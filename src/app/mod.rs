//! Application context: owns the dispatcher, the stores and the queue of
//! network calls, and runs dispatch turns.
//!
//! A turn dispatches one action plus every action it defers, writes back
//! coalesced edits, then tells listeners what changed. Network calls run
//! when [`App::settle`] is awaited; each completion is applied to its store
//! as a turn of its own.

mod actions;

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use tokio::task::JoinSet;

use crate::api::ResourceClient;
use crate::flux::{Action, DispatchError, Dispatcher, Effects, Emitter, PendingOp};
use crate::stores::{
    AliasEvent, AliasStore, Completion, DiffEvent, DiffSlot, DiffWorkspace, FeatureSetEvent,
    FeatureSetStore, SelectionEvent, SelectionStore, StoreEvent, WorkflowEvent, WorkflowStore,
};

/// Per-store change notification.
#[derive(Default)]
pub struct StoreEmitters {
    pub selection: Emitter<SelectionEvent>,
    pub feature_set: Emitter<FeatureSetEvent>,
    pub aliases: Emitter<AliasEvent>,
    pub diff: Emitter<DiffEvent>,
    pub workflow: Emitter<WorkflowEvent>,
    /// Every event from every store, after the per-store emitter.
    pub all: Emitter<StoreEvent>,
}

pub struct App {
    client: ResourceClient,
    dispatcher: Dispatcher<Action, Effects>,
    selection: Rc<RefCell<SelectionStore>>,
    feature_set: Rc<RefCell<FeatureSetStore>>,
    aliases: Rc<RefCell<AliasStore>>,
    diff: Rc<RefCell<DiffWorkspace>>,
    workflow: Rc<RefCell<WorkflowStore>>,
    events: StoreEmitters,
    pending: RefCell<Vec<PendingOp>>,
    /// Bumped by [`App::reset`]; completions from an older epoch are dropped.
    epoch: Cell<u64>,
}

impl App {
    pub fn new(client: ResourceClient) -> Self {
        let selection = Rc::new(RefCell::new(SelectionStore::default()));
        let feature_set = Rc::new(RefCell::new(FeatureSetStore::default()));
        let aliases = Rc::new(RefCell::new(AliasStore::default()));
        let diff = Rc::new(RefCell::new(DiffWorkspace::default()));
        let workflow = Rc::new(RefCell::new(WorkflowStore::default()));

        let mut dispatcher: Dispatcher<Action, Effects> = Dispatcher::new();

        let store = selection.clone();
        let selection_token = dispatcher.register("selection", move |action, cycle| {
            store.borrow_mut().handle(action, cycle.ctx());
            Ok(())
        });

        let store = feature_set.clone();
        let upstream = selection.clone();
        dispatcher.register("feature_set", move |action, cycle| {
            if action.changes_selection() {
                cycle.wait_for(&[selection_token])?;
                let id = upstream.borrow().current_set_id();
                store.borrow_mut().invalidate(id, cycle.ctx());
            } else {
                store.borrow_mut().handle(action, cycle.ctx());
            }
            Ok(())
        });

        let store = aliases.clone();
        let upstream = selection.clone();
        dispatcher.register("aliases", move |action, cycle| {
            if action.changes_selection() {
                cycle.wait_for(&[selection_token])?;
                let id = upstream.borrow().current_set_id();
                store.borrow_mut().invalidate(id, cycle.ctx());
            } else {
                store.borrow_mut().handle(action, cycle.ctx());
            }
            Ok(())
        });

        let store = diff.clone();
        let upstream = selection.clone();
        dispatcher.register("diff", move |action, cycle| {
            if action.changes_selection() {
                cycle.wait_for(&[selection_token])?;
                let (channel, sets, current) = {
                    let selection = upstream.borrow();
                    (
                        selection.current_channel().map(str::to_string),
                        selection.feature_sets(),
                        selection.current_set().map(str::to_string),
                    )
                };
                store.borrow_mut().reset(channel, sets, current, cycle.ctx());
                Ok(())
            } else {
                store.borrow_mut().handle(action, cycle.ctx())?;
                Ok(())
            }
        });

        let store = workflow.clone();
        dispatcher.register("workflow", move |action, cycle| {
            store.borrow_mut().handle(action, cycle.ctx());
            Ok(())
        });

        Self {
            client,
            dispatcher,
            selection,
            feature_set,
            aliases,
            diff,
            workflow,
            events: StoreEmitters::default(),
            pending: RefCell::new(Vec::new()),
            epoch: Cell::new(0),
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn events(&self) -> &StoreEmitters {
        &self.events
    }

    pub fn selection(&self) -> Ref<'_, SelectionStore> {
        self.selection.borrow()
    }

    pub fn feature_set(&self) -> Ref<'_, FeatureSetStore> {
        self.feature_set.borrow()
    }

    pub fn aliases(&self) -> Ref<'_, AliasStore> {
        self.aliases.borrow()
    }

    pub fn diff(&self) -> Ref<'_, DiffWorkspace> {
        self.diff.borrow()
    }

    pub fn workflow(&self) -> Ref<'_, WorkflowStore> {
        self.workflow.borrow()
    }

    /// Network calls queued but not yet started by [`App::settle`].
    pub fn queued_operations(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Dispatch `action` and everything it defers.
    ///
    /// An error aborts the turn: effects already produced are kept, deferred
    /// actions that did not run yet are dropped.
    pub fn dispatch(&self, action: Action) -> Result<(), DispatchError> {
        let mut fx = Effects::new(self.client.clone());
        fx.defer(action);
        self.run_turn(fx)
    }

    /// Run queued network calls and apply their completions until nothing
    /// is left in flight. A failed turn does not stop the drain; the first
    /// error is returned once every call has completed.
    pub async fn settle(&self) -> Result<(), DispatchError> {
        let mut in_flight = JoinSet::new();
        let mut outcome = Ok(());
        loop {
            let epoch = self.epoch.get();
            for op in self.pending.borrow_mut().drain(..) {
                in_flight.spawn(async move { (epoch, op.await) });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((epoch, completion)) if epoch == self.epoch.get() => {
                    if let Err(err) = self.apply(completion) {
                        tracing::error!(
                            error = %err,
                            in_flight = in_flight.len(),
                            "completion turn failed"
                        );
                        if outcome.is_ok() {
                            outcome = Err(err);
                        }
                    }
                }
                Ok(_) => tracing::debug!("completion from before reset dropped"),
                Err(err) => tracing::error!(error = %err, "network task failed"),
            }
        }
        outcome
    }

    /// Return every store to its initial state. Calls still in flight are
    /// ignored when they complete.
    pub fn reset(&self) {
        self.epoch.set(self.epoch.get() + 1);
        self.pending.borrow_mut().clear();
        *self.selection.borrow_mut() = SelectionStore::default();
        *self.feature_set.borrow_mut() = FeatureSetStore::default();
        *self.aliases.borrow_mut() = AliasStore::default();
        *self.diff.borrow_mut() = DiffWorkspace::default();
        *self.workflow.borrow_mut() = WorkflowStore::default();
        tracing::info!(epoch = self.epoch.get(), "application state reset");

        self.publish(vec![
            SelectionEvent::ChannelChanged.into(),
            FeatureSetEvent::Changed.into(),
            AliasEvent::Changed.into(),
            DiffEvent::SlotChanged(DiffSlot::A).into(),
            DiffEvent::SlotChanged(DiffSlot::B).into(),
            WorkflowEvent::ConfirmationClosed.into(),
        ]);
    }

    fn apply(&self, completion: Completion) -> Result<(), DispatchError> {
        let mut fx = Effects::new(self.client.clone());
        match completion {
            Completion::Selection(c) => self.selection.borrow_mut().complete(c, &mut fx),
            Completion::FeatureSet(c) => self.feature_set.borrow_mut().complete(c, &mut fx),
            Completion::Alias(c) => self.aliases.borrow_mut().complete(c, &mut fx),
            Completion::Diff(c) => self.diff.borrow_mut().complete(c, &mut fx),
        }
        self.run_turn(fx)
    }

    fn run_turn(&self, mut fx: Effects) -> Result<(), DispatchError> {
        let mut outcome = Ok(());
        while let Some(action) = fx.next_deferred() {
            tracing::debug!(action = action.name(), "dispatch");
            if let Err(err) = self.dispatcher.dispatch(&action, &mut fx) {
                let dropped = fx.drop_deferred();
                tracing::error!(
                    action = action.name(),
                    error = %err,
                    dropped,
                    "dispatch aborted"
                );
                outcome = Err(err);
                break;
            }
        }

        self.feature_set.borrow_mut().commit(&mut fx);
        self.diff.borrow_mut().commit(&mut fx);

        let (ops, events) = fx.into_parts();
        self.pending.borrow_mut().extend(ops);
        self.publish(events);
        outcome
    }

    fn publish(&self, events: Vec<StoreEvent>) {
        for event in events {
            match &event {
                StoreEvent::Selection(e) => self.events.selection.emit(e),
                StoreEvent::FeatureSet(e) => self.events.feature_set.emit(e),
                StoreEvent::Alias(e) => self.events.aliases.emit(e),
                StoreEvent::Diff(e) => self.events.diff.emit(e),
                StoreEvent::Workflow(e) => self.events.workflow.emit(e),
            }
            self.events.all.emit(&event);
        }
    }
}
