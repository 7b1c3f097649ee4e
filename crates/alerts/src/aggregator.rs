//! Grouping of alerts by study and recipient resolution.
//!
//! Groups are keyed by the study name exactly as stored on the item. Contacts
//! are matched against that key ignoring case. When several contacts match,
//! the last one in snapshot order wins and the group records how many matched
//! so callers can flag the ambiguity.

use indexmap::IndexMap;

use kitwatch_core::StudyName;
use kitwatch_inventory::StudyContact;

use crate::evaluator::Alert;

/// All of today's alerts for one study.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertGroup {
    pub study: StudyName,
    /// Scan order of the originating items.
    pub alerts: Vec<Alert>,
    pub recipient: Option<String>,
    /// Number of contacts whose name matched this study.
    pub matching_contacts: usize,
}

impl AlertGroup {
    fn new(study: StudyName) -> Self {
        Self {
            study,
            alerts: Vec::new(),
            recipient: None,
            matching_contacts: 0,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.matching_contacts > 1
    }
}

/// Resolve the recipient for `study`.
///
/// Returns the email of the last matching contact and the number of matches.
pub fn resolve_recipient(study: &StudyName, contacts: &[StudyContact]) -> (Option<String>, usize) {
    let mut recipient = None;
    let mut matches = 0;
    for contact in contacts.iter().filter(|c| c.serves(study)) {
        matches += 1;
        recipient = contact.email.clone();
    }
    (recipient, matches)
}

/// Group `(study, alert)` pairs and resolve each group's recipient.
///
/// Groups appear in the order their first alert was seen. Studies without any
/// alert never get a group.
pub fn aggregate<I>(alerts: I, contacts: &[StudyContact]) -> IndexMap<StudyName, AlertGroup>
where
    I: IntoIterator<Item = (StudyName, Alert)>,
{
    let mut groups: IndexMap<StudyName, AlertGroup> = IndexMap::new();
    for (study, alert) in alerts {
        groups
            .entry(study.clone())
            .or_insert_with(|| AlertGroup::new(study))
            .alerts
            .push(alert);
    }

    for group in groups.values_mut() {
        let (recipient, matches) = resolve_recipient(&group.study, contacts);
        group.recipient = recipient;
        group.matching_contacts = matches;
    }

    groups
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::evaluator::UrgencyLabel;

    fn alert(barcode: &str) -> Alert {
        Alert {
            barcode: barcode.to_string(),
            visit: "V1".to_string(),
            expiry: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            days_left: 30,
            label: UrgencyLabel::Warning,
        }
    }

    fn study(name: &str) -> StudyName {
        StudyName::new(name)
    }

    #[test]
    fn groups_preserve_first_seen_and_scan_order() {
        let groups = aggregate(
            vec![
                (study("StudyB"), alert("1")),
                (study("StudyA"), alert("2")),
                (study("StudyB"), alert("3")),
            ],
            &[],
        );

        let keys: Vec<&str> = groups.keys().map(StudyName::as_str).collect();
        assert_eq!(keys, vec!["StudyB", "StudyA"]);

        let b: Vec<&str> = groups[&study("StudyB")]
            .alerts
            .iter()
            .map(|a| a.barcode.as_str())
            .collect();
        assert_eq!(b, vec!["1", "3"]);
    }

    #[test]
    fn grouping_is_case_sensitive_but_resolution_is_not() {
        let contacts = vec![StudyContact::new("StudyA", "a@x.com")];
        let groups = aggregate(
            vec![(study("StudyA"), alert("1")), (study("studya"), alert("2"))],
            &contacts,
        );

        assert_eq!(groups.len(), 2);
        for group in groups.values() {
            assert_eq!(group.recipient.as_deref(), Some("a@x.com"));
            assert_eq!(group.alerts.len(), 1);
        }
    }

    #[test]
    fn unmatched_study_has_no_recipient() {
        let contacts = vec![StudyContact::new("StudyA", "a@x.com")];
        let groups = aggregate(vec![(study("StudyZ"), alert("1"))], &contacts);
        let group = &groups[&study("StudyZ")];
        assert_eq!(group.recipient, None);
        assert_eq!(group.matching_contacts, 0);
    }

    #[test]
    fn last_matching_contact_wins() {
        let contacts = vec![
            StudyContact::new("StudyA", "first@x.com"),
            StudyContact::new("STUDYA", "second@x.com"),
            StudyContact::new("StudyB", "other@x.com"),
        ];
        let (recipient, matches) = resolve_recipient(&study("studyA"), &contacts);
        assert_eq!(recipient.as_deref(), Some("second@x.com"));
        assert_eq!(matches, 2);

        let groups = aggregate(vec![(study("StudyA"), alert("1"))], &contacts);
        assert!(groups[&study("StudyA")].is_ambiguous());
    }

    #[test]
    fn unknown_bucket_resolves_like_any_other_study() {
        let contacts = vec![StudyContact::new("unknown", "triage@x.com")];
        let groups = aggregate(vec![(StudyName::unknown(), alert("1"))], &contacts);
        assert_eq!(
            groups[&StudyName::unknown()].recipient.as_deref(),
            Some("triage@x.com")
        );
    }
}
