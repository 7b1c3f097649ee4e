use serde::{Deserialize, Serialize};

use kitwatch_core::StudyName;

/// Delivery contact for one study's alerts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl StudyContact {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    /// Whether this contact serves `study` (case-insensitive name match).
    ///
    /// A contact without a name or without an email never matches.
    pub fn serves(&self, study: &StudyName) -> bool {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) if !email.is_empty() => study.matches_contact_name(name),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_matching_study_regardless_of_case() {
        let contact = StudyContact::new("StudyA", "a@x.com");
        assert!(contact.serves(&StudyName::new("studya")));
        assert!(!contact.serves(&StudyName::new("StudyB")));
    }

    #[test]
    fn incomplete_contacts_never_match() {
        let no_email = StudyContact {
            name: Some("StudyA".to_string()),
            email: None,
        };
        let no_name = StudyContact {
            name: None,
            email: Some("a@x.com".to_string()),
        };
        assert!(!no_email.serves(&StudyName::new("StudyA")));
        assert!(!no_name.serves(&StudyName::new("StudyA")));
    }
}
