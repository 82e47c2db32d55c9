//! Feature-flag data model and name rules.

mod feature;
mod names;

pub use feature::{FeatureData, FeatureMap, FeatureSetDoc, SetId, DEFAULT_SET, DOCUMENT_VERSION};
pub use names::{
    is_partial_alias_name, is_partial_channel_name, is_partial_feature_name,
    is_partial_set_name, validate_alias_name, validate_channel_name, validate_feature_name,
    validate_pct_users, validate_set_name, NameKind, ValidationError, MAX_FEATURE_NAME_LEN,
};
