//! Study names.
//!
//! Items are grouped by their study name **exactly as stored** (case-sensitive),
//! while contacts are matched against a group **case-insensitively**. Both rules
//! live here so the asymmetry stays visible in one place.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Name of the research study an item or contact belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyName(String);

impl StudyName {
    /// Bucket used for items without a study.
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Group key for an item's raw `study` field.
    ///
    /// Absent or empty values fall into the [`StudyName::UNKNOWN`] bucket. Anything
    /// else is kept verbatim, so `"StudyA"` and `"studya"` are different groups.
    pub fn from_item_field(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.is_empty() => Self(s.to_string()),
            _ => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison used when resolving a contact for this study.
    pub fn matches_contact_name(&self, contact_name: &str) -> bool {
        self.0.to_lowercase() == contact_name.to_lowercase()
    }
}

impl ValueObject for StudyName {}

impl fmt::Display for StudyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudyName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_study_falls_into_unknown_bucket() {
        assert_eq!(StudyName::from_item_field(None), StudyName::unknown());
        assert_eq!(StudyName::from_item_field(Some("")), StudyName::unknown());
        assert!(StudyName::from_item_field(None).is_unknown());
    }

    #[test]
    fn grouping_key_is_case_sensitive() {
        let a = StudyName::from_item_field(Some("StudyA"));
        let b = StudyName::from_item_field(Some("studya"));
        assert_ne!(a, b);
    }

    #[test]
    fn contact_matching_ignores_case() {
        let study = StudyName::new("studya");
        assert!(study.matches_contact_name("StudyA"));
        assert!(study.matches_contact_name("STUDYA"));
        assert!(!study.matches_contact_name("StudyB"));
    }

    #[test]
    fn whitespace_is_not_trimmed() {
        let study = StudyName::from_item_field(Some(" StudyA"));
        assert!(!study.is_unknown());
        assert!(!study.matches_contact_name("StudyA"));
    }
}
