//! Name rules for channels, feature-sets, features and aliases.
//!
//! The full patterns gate submission. The partial patterns accept any prefix
//! of a name that could still become valid, so a form can flag input while the
//! user is typing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Longest accepted feature name.
pub const MAX_FEATURE_NAME_LEN: usize = 30;

// `<environment>-<service>`; the server applies the same pattern to `channel-set`.
static CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+-[A-Za-z][A-Za-z0-9_-]*$").unwrap());
// `-` is reserved to separate the channel from the set.
static SET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.]*$").unwrap());
static FEATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.]*$").unwrap());
static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

static PARTIAL_CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_]+?-?[A-Za-z]?[A-Za-z0-9_-]*)?$").unwrap());
static PARTIAL_SET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]?[A-Za-z0-9_.]*$").unwrap());
static PARTIAL_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Channel,
    FeatureSet,
    Feature,
    Alias,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NameKind::Channel => "channel",
            NameKind::FeatureSet => "feature set",
            NameKind::Feature => "feature",
            NameKind::Alias => "alias",
        };
        f.write_str(label)
    }
}

/// Local rejection raised before any request is issued.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: NameKind, name: String },

    #[error("{kind} name '{name}' is too long ({len} > {max} characters)")]
    TooLong {
        kind: NameKind,
        name: String,
        len: usize,
        max: usize,
    },

    #[error("{name} already exists")]
    Duplicate { kind: NameKind, name: String },

    #[error("pctUsers for '{feature}' must be between 0 and 1, got {value}")]
    PctUsersOutOfRange { feature: String, value: f64 },

    #[error("no {0} selected")]
    NothingSelected(NameKind),

    #[error("{kind} '{name}' not found")]
    Unknown { kind: NameKind, name: String },
}

fn check_pattern(re: &Regex, kind: NameKind, name: &str) -> Result<(), ValidationError> {
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

fn check_unique<I, S>(kind: NameKind, name: &str, existing: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if existing.into_iter().any(|n| n.as_ref() == name) {
        return Err(ValidationError::Duplicate {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_channel_name<I, S>(name: &str, existing: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    check_pattern(&CHANNEL_RE, NameKind::Channel, name)?;
    check_unique(NameKind::Channel, name, existing)
}

pub fn validate_set_name<I, S>(name: &str, existing: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    check_pattern(&SET_RE, NameKind::FeatureSet, name)?;
    check_unique(NameKind::FeatureSet, name, existing)
}

pub fn validate_feature_name<I, S>(name: &str, existing: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let len = name.chars().count();
    if len > MAX_FEATURE_NAME_LEN {
        return Err(ValidationError::TooLong {
            kind: NameKind::Feature,
            name: name.to_string(),
            len,
            max: MAX_FEATURE_NAME_LEN,
        });
    }
    check_pattern(&FEATURE_RE, NameKind::Feature, name)?;
    check_unique(NameKind::Feature, name, existing)
}

pub fn validate_alias_name<I, S>(name: &str, existing: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    check_pattern(&ALIAS_RE, NameKind::Alias, name)?;
    check_unique(NameKind::Alias, name, existing)
}

pub fn validate_pct_users(feature: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::PctUsersOutOfRange {
            feature: feature.to_string(),
            value,
        })
    }
}

/// True while `input` is still a prefix of some valid channel name.
pub fn is_partial_channel_name(input: &str) -> bool {
    PARTIAL_CHANNEL_RE.is_match(input)
}

pub fn is_partial_set_name(input: &str) -> bool {
    PARTIAL_SET_RE.is_match(input)
}

pub fn is_partial_feature_name(input: &str) -> bool {
    input.chars().count() <= MAX_FEATURE_NAME_LEN && PARTIAL_SET_RE.is_match(input)
}

pub fn is_partial_alias_name(input: &str) -> bool {
    PARTIAL_ALIAS_RE.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_channel_requires_environment_and_service() {
        assert!(validate_channel_name("prod-svc", NONE).is_ok());
        assert!(validate_channel_name("stage-my-svc", NONE).is_ok());
        assert!(matches!(
            validate_channel_name("prodsvc", NONE),
            Err(ValidationError::InvalidName { kind: NameKind::Channel, .. })
        ));
        assert!(validate_channel_name("prod-1svc", NONE).is_err());
        assert!(validate_channel_name("", NONE).is_err());
    }

    #[test]
    fn test_set_name_rejects_dash() {
        assert!(validate_set_name("beta.2", NONE).is_ok());
        assert!(validate_set_name("beta-2", NONE).is_err());
        assert!(validate_set_name("2beta", NONE).is_err());
    }

    #[test]
    fn test_feature_name_length_limit() {
        let thirty = "a".repeat(30);
        let thirty_one = "a".repeat(31);
        assert!(validate_feature_name(&thirty, NONE).is_ok());
        assert!(matches!(
            validate_feature_name(&thirty_one, NONE),
            Err(ValidationError::TooLong { len: 31, max: 30, .. })
        ));
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let err = validate_feature_name("checkout", ["checkout", "search"]).unwrap_err();
        assert_eq!(err.to_string(), "checkout already exists");
        assert!(validate_alias_name("abc123", ["xyz"]).is_ok());
        assert!(validate_alias_name("abc123", ["abc123"]).is_err());
    }

    #[test]
    fn test_alias_is_word_characters_only() {
        assert!(validate_alias_name("a.b", NONE).is_err());
        assert!(validate_alias_name("", NONE).is_err());
    }

    #[test]
    fn test_pct_users_range() {
        assert!(validate_pct_users("f", 0.0).is_ok());
        assert!(validate_pct_users("f", 1.0).is_ok());
        assert!(validate_pct_users("f", 1.01).is_err());
        assert!(validate_pct_users("f", -0.1).is_err());
        assert!(validate_pct_users("f", f64::NAN).is_err());
    }

    #[test]
    fn test_partial_inputs() {
        assert!(is_partial_channel_name(""));
        assert!(is_partial_channel_name("prod"));
        assert!(is_partial_channel_name("prod-"));
        assert!(is_partial_channel_name("prod-s"));
        assert!(!is_partial_channel_name("prod.svc"));
        assert!(is_partial_set_name(""));
        // A leading digit is accepted while typing and rejected on submit.
        assert!(is_partial_set_name("1"));
        assert!(validate_set_name("1", NONE).is_err());
        assert!(!is_partial_set_name("a-b"));
        assert!(!is_partial_feature_name(&"a".repeat(31)));
        assert!(is_partial_alias_name(""));
        assert!(!is_partial_alias_name("a-b"));
    }
}
