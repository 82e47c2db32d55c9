//! The selected feature-set document and edits to it.

use crate::api::{ApiError, VersionToken, Versioned};
use crate::flux::{Action, Effects};
use crate::model::{
    validate_feature_name, validate_pct_users, FeatureData, FeatureSetDoc, NameKind, SetId,
    ValidationError,
};
use crate::stores::write_buffer::WriteBuffer;
use crate::stores::{Completion, OUT_OF_DATE_MESSAGE};

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSetEvent {
    Changed,
    Notify(String),
}

#[derive(Debug)]
pub enum FeatureSetCompletion {
    Loaded {
        generation: u64,
        id: SetId,
        result: Result<Versioned<FeatureSetDoc>, ApiError>,
    },
    Saved {
        generation: u64,
        id: SetId,
        messages: Vec<String>,
        result: Result<Versioned<FeatureSetDoc>, ApiError>,
    },
}

/// Snapshot of the selected feature-set plus the token it was read or
/// written with.
///
/// Edits apply to the snapshot immediately and are written back at the end
/// of the dispatch turn, so several edits in one turn become one update.
#[derive(Debug, Default)]
pub struct FeatureSetStore {
    resource: Option<SetId>,
    snapshot: Option<FeatureSetDoc>,
    version: Option<VersionToken>,
    /// Bumped whenever the resource is (re)loaded; older completions are stale.
    generation: u64,
    writes: WriteBuffer,
}

impl FeatureSetStore {
    pub fn resource(&self) -> Option<&SetId> {
        self.resource.as_ref()
    }

    pub fn snapshot(&self) -> Option<&FeatureSetDoc> {
        self.snapshot.as_ref()
    }

    pub fn version(&self) -> Option<&VersionToken> {
        self.version.as_ref()
    }

    /// Whether edits are waiting to be written or being written.
    pub fn has_unsaved_changes(&self) -> bool {
        self.writes.is_dirty() || self.writes.in_flight()
    }

    pub fn handle(&mut self, action: &Action, fx: &mut Effects) {
        match action {
            Action::CreateFeature(name) => self.create_feature(name, fx),
            Action::DeleteFeature(name) => self.delete_feature(name, fx),
            Action::SaveFeatureChange { name, data } => self.save_feature_change(name, data, fx),
            _ => {}
        }
    }

    /// Drop the snapshot and load `id`. Unsaved edits are discarded.
    pub fn invalidate(&mut self, id: Option<SetId>, fx: &mut Effects) {
        self.generation += 1;
        self.snapshot = None;
        self.version = None;
        self.writes.reset();
        self.resource = id.clone();
        fx.emit(FeatureSetEvent::Changed);

        let Some(id) = id else {
            return;
        };
        let generation = self.generation;
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.get_feature_set(&id).await;
            Completion::FeatureSet(FeatureSetCompletion::Loaded {
                generation,
                id,
                result,
            })
        });
    }

    /// Send pending edits if no write is in flight.
    pub fn commit(&mut self, fx: &mut Effects) {
        let (Some(id), Some(doc)) = (self.resource.clone(), self.snapshot.clone()) else {
            return;
        };
        let Some(messages) = self.writes.begin() else {
            return;
        };
        tracing::debug!(set_id = %id, features = doc.features.len(), "saving feature set");

        let version = self.version.clone();
        let generation = self.generation;
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.update_feature_set(&id, &doc, version.as_ref()).await;
            Completion::FeatureSet(FeatureSetCompletion::Saved {
                generation,
                id,
                messages,
                result,
            })
        });
    }

    pub fn complete(&mut self, completion: FeatureSetCompletion, fx: &mut Effects) {
        match completion {
            FeatureSetCompletion::Loaded {
                generation,
                id,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(set_id = %id, "stale load ignored");
                    return;
                }
                match result {
                    Ok(loaded) => {
                        self.snapshot = Some(loaded.data);
                        self.version = loaded.token;
                    }
                    Err(err) => {
                        tracing::error!(
                            set_id = %id,
                            error_type = err.error_type(),
                            error = %err,
                            "failed to load feature set"
                        );
                        notify(fx, format!("Failed to load {}", id.set()));
                    }
                }
                fx.emit(FeatureSetEvent::Changed);
            }
            FeatureSetCompletion::Saved {
                generation,
                id,
                messages,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(set_id = %id, "stale save ignored");
                    return;
                }
                self.writes.finish();
                match result {
                    Ok(saved) => {
                        if let Some(token) = saved.token {
                            self.version = Some(token);
                        }
                        for message in messages {
                            notify(fx, message);
                        }
                        fx.emit(FeatureSetEvent::Changed);
                    }
                    Err(err) if err.is_conflict() => {
                        tracing::warn!(set_id = %id, "save conflicted, reloading");
                        notify(fx, OUT_OF_DATE_MESSAGE);
                        self.invalidate(Some(id), fx);
                    }
                    Err(err) => {
                        tracing::error!(
                            set_id = %id,
                            error_type = err.error_type(),
                            status = ?err.status(),
                            error = %err,
                            "failed to save feature set"
                        );
                        notify(fx, format!("FAILED to save {}", id.set()));
                        fx.emit(FeatureSetEvent::Changed);
                    }
                }
            }
        }
    }

    fn create_feature(&mut self, name: &str, fx: &mut Effects) {
        let Some(doc) = self.snapshot.as_mut() else {
            reject(fx, ValidationError::NothingSelected(NameKind::FeatureSet));
            return;
        };
        if let Err(err) = validate_feature_name(name, doc.features.keys()) {
            reject(fx, err);
            return;
        }
        doc.features.insert(name.to_string(), FeatureData::default());
        self.writes.mark(Some(format!("Created feature {}", name)));
        fx.emit(FeatureSetEvent::Changed);
    }

    fn delete_feature(&mut self, name: &str, fx: &mut Effects) {
        let Some(doc) = self.snapshot.as_mut() else {
            reject(fx, ValidationError::NothingSelected(NameKind::FeatureSet));
            return;
        };
        if doc.features.remove(name).is_none() {
            reject(fx, unknown_feature(name));
            return;
        }
        self.writes.mark(Some(format!("Deleted feature {}", name)));
        fx.emit(FeatureSetEvent::Changed);
    }

    fn save_feature_change(&mut self, name: &str, data: &FeatureData, fx: &mut Effects) {
        let Some(doc) = self.snapshot.as_mut() else {
            reject(fx, ValidationError::NothingSelected(NameKind::FeatureSet));
            return;
        };
        if let Err(err) = validate_pct_users(name, data.pct_users) {
            reject(fx, err);
            return;
        }
        let Some(feature) = doc.features.get_mut(name) else {
            reject(fx, unknown_feature(name));
            return;
        };
        if feature == data {
            return;
        }
        *feature = data.clone();
        self.writes.mark(None);
        fx.emit(FeatureSetEvent::Changed);
    }
}

fn unknown_feature(name: &str) -> ValidationError {
    ValidationError::Unknown {
        kind: NameKind::Feature,
        name: name.to_string(),
    }
}

fn notify(fx: &mut Effects, text: impl Into<String>) {
    fx.emit(FeatureSetEvent::Notify(text.into()));
}

fn reject(fx: &mut Effects, err: ValidationError) {
    tracing::warn!(error = %err, "rejected before sending");
    notify(fx, err.to_string());
}
