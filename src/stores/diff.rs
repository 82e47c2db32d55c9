//! Side-by-side comparison of two feature-sets in the current channel and
//! migration of features between them.
//!
//! Slot A starts on the selected set and slot B on the first other set.
//! Set differences are always computed from the confirmed (last loaded or
//! saved) documents, never from edits that are still being written.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::api::{ApiError, VersionToken, Versioned};
use crate::flux::{Action, Effects};
use crate::model::{FeatureSetDoc, NameKind, SetId, ValidationError};
use crate::stores::write_buffer::WriteBuffer;
use crate::stores::{Completion, OUT_OF_DATE_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffSlot {
    A,
    B,
}

impl DiffSlot {
    pub fn other(self) -> Self {
        match self {
            DiffSlot::A => DiffSlot::B,
            DiffSlot::B => DiffSlot::A,
        }
    }
}

impl fmt::Display for DiffSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSlot::A => f.write_str("A"),
            DiffSlot::B => f.write_str("B"),
        }
    }
}

/// Movement of one feature between the two slots.
///
/// A move copies the feature (with its data) into the other slot; a removal
/// deletes it from one slot when both have it. Only the slot that changes is
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    MoveAToB,
    MoveBToA,
    RemoveFromA,
    RemoveFromB,
}

impl Migration {
    /// The slot that is modified and written.
    pub fn target(self) -> DiffSlot {
        match self {
            Migration::MoveAToB | Migration::RemoveFromB => DiffSlot::B,
            Migration::MoveBToA | Migration::RemoveFromA => DiffSlot::A,
        }
    }
}

/// A migration was requested for a feature in the wrong partition. This is
/// a programming error in the caller and aborts the dispatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("feature '{feature}' is not in set {slot}")]
    NotInSlot { slot: DiffSlot, feature: String },

    #[error("feature '{feature}' is already in set {slot}")]
    AlreadyInSlot { slot: DiffSlot, feature: String },

    #[error("set {slot} is not loaded")]
    SlotNotLoaded { slot: DiffSlot },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiffEvent {
    /// A slot was pointed at a different set.
    SlotChanged(DiffSlot),
    /// A slot's document was loaded, edited or saved.
    DataChanged(DiffSlot),
    Notify(String),
}

#[derive(Debug)]
pub enum DiffCompletion {
    Loaded {
        slot: DiffSlot,
        generation: u64,
        id: SetId,
        result: Result<Versioned<FeatureSetDoc>, ApiError>,
    },
    Saved {
        slot: DiffSlot,
        generation: u64,
        id: SetId,
        result: Result<Versioned<FeatureSetDoc>, ApiError>,
    },
}

#[derive(Debug, Default)]
struct SlotState {
    resource: Option<SetId>,
    /// Working copy, including edits not yet written.
    pending: Option<FeatureSetDoc>,
    /// Feature names of the last confirmed document.
    confirmed: BTreeSet<String>,
    /// Token the confirmed document was read or written with.
    version: Option<VersionToken>,
    generation: u64,
    writes: WriteBuffer,
}

impl SlotState {
    fn name(&self) -> Option<&str> {
        self.resource.as_ref().map(SetId::set)
    }

    fn confirm(&mut self, doc: Versioned<FeatureSetDoc>) {
        self.confirmed = doc.data.features.keys().cloned().collect();
        self.pending = Some(doc.data);
        self.version = doc.token;
    }
}

#[derive(Debug, Default)]
pub struct DiffWorkspace {
    channel: Option<String>,
    /// Sets of the channel, sorted.
    sets: Vec<String>,
    a: SlotState,
    b: SlotState,
}

impl DiffWorkspace {
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn slot_name(&self, slot: DiffSlot) -> Option<&str> {
        self.slot(slot).name()
    }

    pub fn slot_features(&self, slot: DiffSlot) -> Option<&FeatureSetDoc> {
        self.slot(slot).pending.as_ref()
    }

    /// Sets that may be chosen for `slot`: every set of the channel except
    /// the one shown in the other slot.
    pub fn choices(&self, slot: DiffSlot) -> Vec<&str> {
        let taken = self.slot(slot.other()).name();
        self.sets
            .iter()
            .map(String::as_str)
            .filter(|set| Some(*set) != taken)
            .collect()
    }

    pub fn a_choices(&self) -> Vec<&str> {
        self.choices(DiffSlot::A)
    }

    pub fn b_choices(&self) -> Vec<&str> {
        self.choices(DiffSlot::B)
    }

    pub fn is_loaded(&self) -> bool {
        self.a.pending.is_some() && self.b.pending.is_some()
    }

    pub fn a_minus_b(&self) -> BTreeSet<String> {
        self.a.confirmed.difference(&self.b.confirmed).cloned().collect()
    }

    pub fn a_intersect_b(&self) -> BTreeSet<String> {
        self.a.confirmed.intersection(&self.b.confirmed).cloned().collect()
    }

    pub fn b_minus_a(&self) -> BTreeSet<String> {
        self.b.confirmed.difference(&self.a.confirmed).cloned().collect()
    }

    /// Point the slots at a new selection: A on `current`, B on the first
    /// other set of the channel.
    pub fn reset(
        &mut self,
        channel: Option<String>,
        sets: Vec<String>,
        current: Option<String>,
        fx: &mut Effects,
    ) {
        let other = sets
            .iter()
            .find(|set| Some(set.as_str()) != current.as_deref())
            .cloned();
        self.channel = channel;
        self.sets = sets;
        self.bind(DiffSlot::A, current, fx);
        self.bind(DiffSlot::B, other, fx);
    }

    pub fn handle(&mut self, action: &Action, fx: &mut Effects) -> Result<(), InvariantViolation> {
        match action {
            Action::SelectDiffSet { slot, set } => {
                self.select(*slot, set, fx);
                Ok(())
            }
            Action::Migrate { name, migration } => self.migrate(name, *migration, fx),
            _ => Ok(()),
        }
    }

    /// Write edited slots that have no write in flight.
    pub fn commit(&mut self, fx: &mut Effects) {
        for slot in [DiffSlot::A, DiffSlot::B] {
            let state = self.slot_mut(slot);
            let (Some(id), Some(doc)) = (state.resource.clone(), state.pending.clone()) else {
                continue;
            };
            if state.writes.begin().is_none() {
                continue;
            }
            let version = state.version.clone();
            let generation = state.generation;
            let client = fx.client().clone();
            fx.spawn(async move {
                let result = client.update_feature_set(&id, &doc, version.as_ref()).await;
                Completion::Diff(DiffCompletion::Saved {
                    slot,
                    generation,
                    id,
                    result,
                })
            });
        }
    }

    pub fn complete(&mut self, completion: DiffCompletion, fx: &mut Effects) {
        match completion {
            DiffCompletion::Loaded {
                slot,
                generation,
                id,
                result,
            } => {
                let state = self.slot_mut(slot);
                if generation != state.generation {
                    tracing::debug!(slot = %slot, set_id = %id, "stale load ignored");
                    return;
                }
                match result {
                    Ok(loaded) => state.confirm(loaded),
                    Err(err) => {
                        tracing::error!(
                            slot = %slot,
                            set_id = %id,
                            error_type = err.error_type(),
                            error = %err,
                            "failed to load feature set"
                        );
                        notify(fx, format!("Failed to load {}", id.set()));
                    }
                }
                fx.emit(DiffEvent::DataChanged(slot));
            }
            DiffCompletion::Saved {
                slot,
                generation,
                id,
                result,
            } => {
                let state = self.slot_mut(slot);
                if generation != state.generation {
                    tracing::debug!(slot = %slot, set_id = %id, "stale save ignored");
                    return;
                }
                state.writes.finish();
                match result {
                    Ok(saved) => {
                        // Edits made during the write stay pending; only the
                        // confirmed names follow the saved document.
                        if state.writes.is_dirty() {
                            state.confirmed = saved.data.features.keys().cloned().collect();
                            state.version = saved.token;
                        } else {
                            state.confirm(saved);
                        }
                        fx.emit(DiffEvent::DataChanged(slot));
                    }
                    Err(err) if err.is_conflict() => {
                        tracing::warn!(slot = %slot, set_id = %id, "save conflicted, reloading");
                        notify(fx, OUT_OF_DATE_MESSAGE);
                        let name = id.set().to_string();
                        self.bind(slot, Some(name), fx);
                    }
                    Err(err) => {
                        tracing::error!(
                            slot = %slot,
                            set_id = %id,
                            error_type = err.error_type(),
                            status = ?err.status(),
                            error = %err,
                            "failed to save feature set"
                        );
                        notify(fx, format!("FAILED to save {}", id.set()));
                        fx.emit(DiffEvent::DataChanged(slot));
                    }
                }
            }
        }
    }

    fn slot(&self, slot: DiffSlot) -> &SlotState {
        match slot {
            DiffSlot::A => &self.a,
            DiffSlot::B => &self.b,
        }
    }

    fn slot_mut(&mut self, slot: DiffSlot) -> &mut SlotState {
        match slot {
            DiffSlot::A => &mut self.a,
            DiffSlot::B => &mut self.b,
        }
    }

    fn select(&mut self, slot: DiffSlot, set: &str, fx: &mut Effects) {
        if !self.sets.iter().any(|s| s == set) {
            reject(
                fx,
                ValidationError::Unknown {
                    kind: NameKind::FeatureSet,
                    name: set.to_string(),
                },
            );
            return;
        }
        if self.slot(slot.other()).name() == Some(set) {
            tracing::warn!(slot = %slot, set = %set, "set already shown in the other slot");
            notify(fx, format!("{} is already shown in {}", set, slot.other()));
            return;
        }
        self.bind(slot, Some(set.to_string()), fx);
    }

    /// Point `slot` at `set` and load it, dropping whatever it held.
    fn bind(&mut self, slot: DiffSlot, set: Option<String>, fx: &mut Effects) {
        let id = match (&self.channel, set) {
            (Some(channel), Some(set)) => Some(SetId::new(channel.as_str(), set)),
            _ => None,
        };
        let state = self.slot_mut(slot);
        state.generation += 1;
        state.pending = None;
        state.confirmed.clear();
        state.version = None;
        state.writes.reset();
        state.resource = id.clone();
        fx.emit(DiffEvent::SlotChanged(slot));

        let Some(id) = id else {
            fx.emit(DiffEvent::DataChanged(slot));
            return;
        };
        let generation = state.generation;
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.get_feature_set(&id).await;
            Completion::Diff(DiffCompletion::Loaded {
                slot,
                generation,
                id,
                result,
            })
        });
    }

    fn migrate(
        &mut self,
        name: &str,
        migration: Migration,
        fx: &mut Effects,
    ) -> Result<(), InvariantViolation> {
        let target = migration.target();
        self.require_loaded(DiffSlot::A)?;
        self.require_loaded(DiffSlot::B)?;
        match migration {
            Migration::MoveAToB | Migration::MoveBToA => {
                let source = target.other();
                self.require(source, name, true)?;
                self.require(target, name, false)?;
                let data = self
                    .slot(source)
                    .pending
                    .as_ref()
                    .and_then(|doc| doc.features.get(name))
                    .cloned()
                    .ok_or_else(|| InvariantViolation::NotInSlot {
                        slot: source,
                        feature: name.to_string(),
                    })?;
                let state = self.slot_mut(target);
                let doc = state
                    .pending
                    .as_mut()
                    .ok_or(InvariantViolation::SlotNotLoaded { slot: target })?;
                doc.features.insert(name.to_string(), data);
                state.writes.mark(None);
            }
            Migration::RemoveFromA | Migration::RemoveFromB => {
                self.require(DiffSlot::A, name, true)?;
                self.require(DiffSlot::B, name, true)?;
                let state = self.slot_mut(target);
                let doc = state
                    .pending
                    .as_mut()
                    .ok_or(InvariantViolation::SlotNotLoaded { slot: target })?;
                doc.features.remove(name);
                state.writes.mark(None);
            }
        }
        tracing::debug!(feature = %name, migration = ?migration, "migration staged");
        fx.emit(DiffEvent::DataChanged(target));
        Ok(())
    }

    /// Migrations need both slots bound and loaded.
    fn require_loaded(&self, slot: DiffSlot) -> Result<(), InvariantViolation> {
        match self.slot(slot).pending {
            Some(_) => Ok(()),
            None => Err(InvariantViolation::SlotNotLoaded { slot }),
        }
    }

    fn require(&self, slot: DiffSlot, name: &str, present: bool) -> Result<(), InvariantViolation> {
        let has = self.slot(slot).confirmed.contains(name);
        match (present, has) {
            (true, false) => Err(InvariantViolation::NotInSlot {
                slot,
                feature: name.to_string(),
            }),
            (false, true) => Err(InvariantViolation::AlreadyInSlot {
                slot,
                feature: name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn notify(fx: &mut Effects, text: impl Into<String>) {
    fx.emit(DiffEvent::Notify(text.into()));
}

fn reject(fx: &mut Effects, err: ValidationError) {
    tracing::warn!(error = %err, "rejected before sending");
    notify(fx, err.to_string());
}
