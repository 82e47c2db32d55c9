//! Action creators: one method per user intent.

use crate::flux::{Action, DispatchError};
use crate::model::FeatureData;
use crate::stores::{DiffSlot, FormKind, Migration};

use super::App;

impl App {
    pub fn fetch_channels(&self) -> Result<(), DispatchError> {
        self.dispatch(Action::FetchChannels)
    }

    pub fn select_channel(&self, channel: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::SelectChannel(channel.to_string()))
    }

    pub fn select_set(&self, set: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::SelectSet(set.to_string()))
    }

    pub fn create_channel(&self, name: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::CreateChannel(name.to_string()))
    }

    pub fn create_feature_set(&self, name: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::CreateFeatureSet(name.to_string()))
    }

    /// Delete the selected feature-set.
    pub fn delete_feature_set(&self) -> Result<(), DispatchError> {
        self.dispatch(Action::DeleteFeatureSet)
    }

    pub fn create_feature(&self, name: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::CreateFeature(name.to_string()))
    }

    pub fn delete_feature(&self, name: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::DeleteFeature(name.to_string()))
    }

    pub fn save_feature_change(&self, name: &str, data: FeatureData) -> Result<(), DispatchError> {
        self.dispatch(Action::SaveFeatureChange {
            name: name.to_string(),
            data,
        })
    }

    pub fn create_alias(&self, alias: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::CreateAlias(alias.to_string()))
    }

    pub fn delete_alias(&self, alias: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::DeleteAlias(alias.to_string()))
    }

    pub fn select_diff_set(&self, slot: DiffSlot, set: &str) -> Result<(), DispatchError> {
        self.dispatch(Action::SelectDiffSet {
            slot,
            set: set.to_string(),
        })
    }

    pub fn migrate(&self, name: &str, migration: Migration) -> Result<(), DispatchError> {
        self.dispatch(Action::Migrate {
            name: name.to_string(),
            migration,
        })
    }

    pub fn move_a_to_b(&self, name: &str) -> Result<(), DispatchError> {
        self.migrate(name, Migration::MoveAToB)
    }

    pub fn move_b_to_a(&self, name: &str) -> Result<(), DispatchError> {
        self.migrate(name, Migration::MoveBToA)
    }

    pub fn remove_from_a(&self, name: &str) -> Result<(), DispatchError> {
        self.migrate(name, Migration::RemoveFromA)
    }

    pub fn remove_from_b(&self, name: &str) -> Result<(), DispatchError> {
        self.migrate(name, Migration::RemoveFromB)
    }

    /// Show `prompt`; `on_confirm` is dispatched if the user confirms.
    pub fn prompt_confirmation(
        &self,
        prompt: impl Into<String>,
        on_confirm: Action,
    ) -> Result<(), DispatchError> {
        self.dispatch(Action::PromptConfirmation {
            prompt: prompt.into(),
            on_confirm: Box::new(on_confirm),
        })
    }

    pub fn confirm(&self) -> Result<(), DispatchError> {
        self.dispatch(Action::Confirm)
    }

    pub fn cancel(&self) -> Result<(), DispatchError> {
        self.dispatch(Action::Cancel)
    }

    pub fn open_form(&self, kind: FormKind) -> Result<(), DispatchError> {
        self.dispatch(Action::OpenForm(kind))
    }
}
