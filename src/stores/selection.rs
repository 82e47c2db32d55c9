//! Channel listing and the current channel/set selection.

use std::collections::BTreeMap;

use crate::api::{ApiError, Versioned};
use crate::flux::{Action, Effects};
use crate::model::{
    validate_channel_name, validate_set_name, NameKind, SetId, ValidationError, DEFAULT_SET,
};
use crate::stores::{Completion, OUT_OF_DATE_MESSAGE};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    /// The listing or the current channel changed.
    ChannelChanged,
    /// The current set changed.
    SetChanged,
    Notify(String),
}

#[derive(Debug)]
pub enum SelectionCompletion {
    Listed {
        generation: u64,
        result: Result<Vec<String>, ApiError>,
    },
    ChannelCreated {
        channel: String,
        result: Result<Versioned<()>, ApiError>,
    },
    SetCreated {
        id: SetId,
        result: Result<Versioned<()>, ApiError>,
    },
    SetDeleted {
        id: SetId,
        result: Result<(), ApiError>,
    },
}

/// Channels with their feature-sets, plus what is selected.
///
/// Sets are kept in listing order per channel; [`feature_sets`] returns them
/// sorted. The current set, when present, always belongs to the current
/// channel.
///
/// [`feature_sets`]: SelectionStore::feature_sets
#[derive(Debug, Default)]
pub struct SelectionStore {
    channels: BTreeMap<String, Vec<String>>,
    current_channel: Option<String>,
    current_set: Option<String>,
    /// Bumped on every fetch so late listings are ignored.
    generation: u64,
}

impl SelectionStore {
    pub fn channels(&self) -> &BTreeMap<String, Vec<String>> {
        &self.channels
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Sets of the current channel, sorted.
    pub fn feature_sets(&self) -> Vec<String> {
        let mut sets = self
            .current_channel
            .as_ref()
            .and_then(|channel| self.channels.get(channel))
            .cloned()
            .unwrap_or_default();
        sets.sort();
        sets
    }

    pub fn current_channel(&self) -> Option<&str> {
        self.current_channel.as_deref()
    }

    pub fn current_set(&self) -> Option<&str> {
        self.current_set.as_deref()
    }

    pub fn current_set_id(&self) -> Option<SetId> {
        match (&self.current_channel, &self.current_set) {
            (Some(channel), Some(set)) => Some(SetId::new(channel.as_str(), set.as_str())),
            _ => None,
        }
    }

    pub fn handle(&mut self, action: &Action, fx: &mut Effects) {
        match action {
            Action::FetchChannels => self.fetch_channels(fx),
            Action::SelectChannel(channel) => self.set_current_channel(channel, fx),
            Action::SelectSet(set) => self.set_current_set(set, fx),
            Action::ClearSelection => {
                if self.current_set.take().is_some() {
                    fx.emit(SelectionEvent::SetChanged);
                }
            }
            Action::CreateChannel(name) => self.create_channel(name, fx),
            Action::CreateFeatureSet(name) => self.create_feature_set(name, fx),
            Action::DeleteFeatureSet => self.delete_feature_set(fx),
            _ => {}
        }
    }

    pub fn complete(&mut self, completion: SelectionCompletion, fx: &mut Effects) {
        match completion {
            SelectionCompletion::Listed { generation, result } => {
                if generation != self.generation {
                    tracing::debug!(
                        generation,
                        current = self.generation,
                        "stale listing ignored"
                    );
                    return;
                }
                match result {
                    Ok(entries) => self.apply_listing(entries, fx),
                    Err(err) => {
                        tracing::error!(error = %err, "failed to list feature sets");
                        notify(fx, "Failed to load channels");
                    }
                }
            }
            SelectionCompletion::ChannelCreated { channel, result } => match result {
                Ok(_) => {
                    self.channels
                        .insert(channel.clone(), vec![DEFAULT_SET.to_string()]);
                    self.set_current_channel(&channel, fx);
                    notify(fx, format!("Created channel {}", channel));
                }
                Err(err) if err.is_conflict() => {
                    notify(fx, format!("Channel {} already exists", channel));
                }
                Err(err) => {
                    tracing::error!(channel = %channel, error = %err, "failed to create channel");
                    notify(fx, format!("Failed to create channel {}", channel));
                }
            },
            SelectionCompletion::SetCreated { id, result } => match result {
                Ok(_) => {
                    let sets = self.channels.entry(id.channel().to_string()).or_default();
                    if !sets.iter().any(|s| s == id.set()) {
                        sets.push(id.set().to_string());
                    }
                    if self.current_channel.as_deref() == Some(id.channel()) {
                        fx.emit(SelectionEvent::ChannelChanged);
                        fx.defer(Action::SelectSet(id.set().to_string()));
                    }
                    notify(fx, format!("Created feature set {}", id.set()));
                }
                Err(err) if err.is_conflict() => {
                    notify(fx, format!("Feature set {} already exists", id.set()));
                }
                Err(err) => {
                    tracing::error!(set_id = %id, error = %err, "failed to create feature set");
                    notify(fx, format!("Failed to create feature set {}", id.set()));
                }
            },
            SelectionCompletion::SetDeleted { id, result } => match result {
                Ok(()) => self.remove_set(&id, fx),
                Err(err) if err.is_conflict() => {
                    notify(fx, OUT_OF_DATE_MESSAGE);
                    if self.current_set_id().as_ref() == Some(&id) {
                        fx.defer(Action::SelectSet(id.set().to_string()));
                    }
                }
                Err(err) => {
                    tracing::error!(set_id = %id, error = %err, "failed to delete feature set");
                    notify(fx, format!("Failed to delete {}", id.set()));
                }
            },
        }
    }

    fn fetch_channels(&mut self, fx: &mut Effects) {
        self.generation += 1;
        let generation = self.generation;
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.list_feature_sets().await;
            Completion::Selection(SelectionCompletion::Listed { generation, result })
        });
    }

    fn apply_listing(&mut self, entries: Vec<String>, fx: &mut Effects) {
        let mut channels: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in entries {
            let Some(id) = SetId::parse(&entry) else {
                tracing::warn!(entry = %entry, "skipping malformed feature-set id");
                continue;
            };
            let sets = channels.entry(id.channel().to_string()).or_default();
            if !sets.iter().any(|s| s == id.set()) {
                sets.push(id.set().to_string());
            }
        }
        tracing::debug!(channels = channels.len(), "channel listing loaded");
        self.channels = channels;

        match self.channels.keys().next().cloned() {
            Some(first) => self.set_current_channel(&first, fx),
            None => {
                self.current_channel = None;
                self.current_set = None;
                fx.emit(SelectionEvent::ChannelChanged);
                fx.defer(Action::ClearSelection);
            }
        }
    }

    /// Select `channel` and its first set. The set selection itself goes out
    /// as a follow-up action so dependent stores load the new set.
    fn set_current_channel(&mut self, channel: &str, fx: &mut Effects) {
        let Some(sets) = self.channels.get(channel) else {
            tracing::warn!(channel = %channel, "ignoring selection of unknown channel");
            return;
        };
        let first = sets.first().cloned();
        self.current_channel = Some(channel.to_string());
        self.current_set = first.clone();
        fx.emit(SelectionEvent::ChannelChanged);

        match first {
            Some(set) => fx.defer(Action::SelectSet(set)),
            None => fx.defer(Action::ClearSelection),
        }
    }

    fn set_current_set(&mut self, set: &str, fx: &mut Effects) {
        let known = self
            .current_channel
            .as_ref()
            .and_then(|channel| self.channels.get(channel))
            .is_some_and(|sets| sets.iter().any(|s| s == set));
        if !known {
            tracing::warn!(set = %set, "ignoring selection of unknown feature set");
            return;
        }
        self.current_set = Some(set.to_string());
        fx.emit(SelectionEvent::SetChanged);
    }

    fn create_channel(&mut self, name: &str, fx: &mut Effects) {
        if let Err(err) = validate_channel_name(name, self.channels.keys()) {
            reject(fx, err);
            return;
        }
        let channel = name.to_string();
        let id = SetId::new(name, DEFAULT_SET);
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.create_feature_set(&id).await;
            Completion::Selection(SelectionCompletion::ChannelCreated { channel, result })
        });
    }

    fn create_feature_set(&mut self, name: &str, fx: &mut Effects) {
        let Some(channel) = self.current_channel.clone() else {
            reject(fx, ValidationError::NothingSelected(NameKind::Channel));
            return;
        };
        let existing = self.channels.get(&channel).cloned().unwrap_or_default();
        if let Err(err) = validate_set_name(name, &existing) {
            reject(fx, err);
            return;
        }
        let id = SetId::new(channel, name);
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.create_feature_set(&id).await;
            Completion::Selection(SelectionCompletion::SetCreated { id, result })
        });
    }

    fn delete_feature_set(&mut self, fx: &mut Effects) {
        let Some(id) = self.current_set_id() else {
            reject(fx, ValidationError::NothingSelected(NameKind::FeatureSet));
            return;
        };
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.delete_feature_set(&id).await;
            Completion::Selection(SelectionCompletion::SetDeleted { id, result })
        });
    }

    /// Drop a deleted set and move the selection to the first remaining set
    /// of the channel, or reload everything when none is left.
    fn remove_set(&mut self, id: &SetId, fx: &mut Effects) {
        if let Some(sets) = self.channels.get_mut(id.channel()) {
            sets.retain(|s| s != id.set());
        }
        notify(fx, format!("Deleted feature set {}", id.set()));

        if self.current_channel.as_deref() != Some(id.channel()) {
            fx.emit(SelectionEvent::ChannelChanged);
            return;
        }
        if self.current_set.as_deref() == Some(id.set()) {
            self.current_set = None;
        }
        fx.emit(SelectionEvent::ChannelChanged);

        match self.feature_sets().into_iter().next() {
            Some(next) => fx.defer(Action::SelectSet(next)),
            None => {
                fx.defer(Action::ClearSelection);
                fx.defer(Action::FetchChannels);
            }
        }
    }
}

fn notify(fx: &mut Effects, text: impl Into<String>) {
    fx.emit(SelectionEvent::Notify(text.into()));
}

fn reject(fx: &mut Effects, err: ValidationError) {
    tracing::warn!(error = %err, "rejected before sending");
    notify(fx, err.to_string());
}
