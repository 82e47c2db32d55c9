use crate::model::FeatureData;
use crate::stores::{DiffSlot, FormKind, Migration};

/// Everything that can happen to the application state.
///
/// Actions are plain values: a confirmation prompt carries the action to run
/// on confirm rather than a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Reload the channel listing and select the first channel.
    FetchChannels,
    SelectChannel(String),
    SelectSet(String),
    /// No set can be selected: the listing is empty or the channel has none.
    ClearSelection,

    CreateChannel(String),
    /// Create a set in the current channel.
    CreateFeatureSet(String),
    /// Delete the currently selected set.
    DeleteFeatureSet,

    CreateFeature(String),
    DeleteFeature(String),
    SaveFeatureChange {
        name: String,
        data: FeatureData,
    },

    CreateAlias(String),
    DeleteAlias(String),

    SelectDiffSet {
        slot: DiffSlot,
        set: String,
    },
    Migrate {
        name: String,
        migration: Migration,
    },

    OpenForm(FormKind),
    PromptConfirmation {
        prompt: String,
        on_confirm: Box<Action>,
    },
    Confirm,
    Cancel,
}

impl Action {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::FetchChannels => "fetch_channels",
            Action::SelectChannel(_) => "select_channel",
            Action::SelectSet(_) => "select_set",
            Action::ClearSelection => "clear_selection",
            Action::CreateChannel(_) => "create_channel",
            Action::CreateFeatureSet(_) => "create_feature_set",
            Action::DeleteFeatureSet => "delete_feature_set",
            Action::CreateFeature(_) => "create_feature",
            Action::DeleteFeature(_) => "delete_feature",
            Action::SaveFeatureChange { .. } => "save_feature_change",
            Action::CreateAlias(_) => "create_alias",
            Action::DeleteAlias(_) => "delete_alias",
            Action::SelectDiffSet { .. } => "select_diff_set",
            Action::Migrate { .. } => "migrate",
            Action::OpenForm(_) => "open_form",
            Action::PromptConfirmation { .. } => "prompt_confirmation",
            Action::Confirm => "confirm",
            Action::Cancel => "cancel",
        }
    }

    /// Whether this action changes which feature-set is selected.
    pub fn changes_selection(&self) -> bool {
        matches!(self, Action::SelectSet(_) | Action::ClearSelection)
    }
}
