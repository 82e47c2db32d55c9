//! Aliases bound to the selected feature-set.

use std::collections::BTreeSet;

use crate::api::ApiError;
use crate::flux::{Action, Effects};
use crate::model::{validate_alias_name, NameKind, SetId, ValidationError};
use crate::stores::Completion;

#[derive(Debug, Clone, PartialEq)]
pub enum AliasEvent {
    Changed,
    Notify(String),
}

#[derive(Debug)]
pub enum AliasCompletion {
    Loaded {
        generation: u64,
        id: SetId,
        result: Result<Vec<String>, ApiError>,
    },
    Created {
        id: SetId,
        alias: String,
        result: Result<(), ApiError>,
    },
    Deleted {
        alias: String,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug, Default)]
pub struct AliasStore {
    resource: Option<SetId>,
    aliases: BTreeSet<String>,
    generation: u64,
}

impl AliasStore {
    pub fn resource(&self) -> Option<&SetId> {
        self.resource.as_ref()
    }

    /// Aliases in ascending order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.contains(alias)
    }

    pub fn handle(&mut self, action: &Action, fx: &mut Effects) {
        match action {
            Action::CreateAlias(alias) => self.create(alias, fx),
            Action::DeleteAlias(alias) => self.delete(alias, fx),
            _ => {}
        }
    }

    pub fn invalidate(&mut self, id: Option<SetId>, fx: &mut Effects) {
        self.generation += 1;
        self.aliases.clear();
        self.resource = id.clone();
        fx.emit(AliasEvent::Changed);

        let Some(id) = id else {
            return;
        };
        let generation = self.generation;
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.list_aliases(&id).await;
            Completion::Alias(AliasCompletion::Loaded {
                generation,
                id,
                result,
            })
        });
    }

    pub fn complete(&mut self, completion: AliasCompletion, fx: &mut Effects) {
        match completion {
            AliasCompletion::Loaded {
                generation,
                id,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(set_id = %id, "stale alias listing ignored");
                    return;
                }
                match result {
                    Ok(aliases) => self.aliases = aliases.into_iter().collect(),
                    Err(err) => {
                        tracing::error!(set_id = %id, error = %err, "failed to list aliases");
                        notify(fx, format!("Failed to load aliases for {}", id.set()));
                    }
                }
            }
            AliasCompletion::Created { id, alias, result } => match result {
                Ok(()) => {
                    if self.resource.as_ref() == Some(&id) {
                        self.aliases.insert(alias.clone());
                    }
                    notify(fx, format!("Created {}", alias));
                }
                Err(err) if err.is_conflict() => {
                    notify(fx, format!("Alias {} exists on another feature set", alias));
                }
                Err(err) => {
                    tracing::error!(alias = %alias, error = %err, "failed to create alias");
                    notify(fx, format!("Failed to create alias {}", alias));
                }
            },
            AliasCompletion::Deleted { alias, result } => match result {
                Ok(()) => {
                    self.aliases.remove(&alias);
                    notify(fx, format!("Deleted {}", alias));
                }
                Err(err) => {
                    tracing::error!(alias = %alias, error = %err, "failed to delete alias");
                    notify(fx, format!("Failed to delete alias {}", alias));
                }
            },
        }
        fx.emit(AliasEvent::Changed);
    }

    fn create(&mut self, alias: &str, fx: &mut Effects) {
        let Some(id) = self.resource.clone() else {
            reject(fx, ValidationError::NothingSelected(NameKind::FeatureSet));
            return;
        };
        if let Err(err) = validate_alias_name(alias, &self.aliases) {
            reject(fx, err);
            return;
        }
        let alias = alias.to_string();
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.create_alias(&id, &alias).await;
            Completion::Alias(AliasCompletion::Created { id, alias, result })
        });
    }

    fn delete(&mut self, alias: &str, fx: &mut Effects) {
        if !self.aliases.contains(alias) {
            reject(
                fx,
                ValidationError::Unknown {
                    kind: NameKind::Alias,
                    name: alias.to_string(),
                },
            );
            return;
        }
        let alias = alias.to_string();
        let client = fx.client().clone();
        fx.spawn(async move {
            let result = client.delete_alias(&alias).await;
            Completion::Alias(AliasCompletion::Deleted { alias, result })
        });
    }
}

fn notify(fx: &mut Effects, text: impl Into<String>) {
    fx.emit(AliasEvent::Notify(text.into()));
}

fn reject(fx: &mut Effects, err: ValidationError) {
    tracing::warn!(error = %err, "rejected before sending");
    notify(fx, err.to_string());
}
