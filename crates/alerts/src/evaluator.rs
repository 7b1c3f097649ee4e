use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use kitwatch_core::{DomainError, ValueObject};
use kitwatch_inventory::InventoryItem;

/// Days-remaining values that trigger a notification.
///
/// An item is reported only on the exact day it crosses one of these. An expired
/// kit is reported once (on `0`) and not again on the days after.
pub const MILESTONES: [i64; 4] = [30, 15, 5, 0];

/// Urgency classification shown next to each kit in the email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UrgencyLabel {
    Warning,
    Reminder,
    Urgent,
    Expired,
}

impl UrgencyLabel {
    /// Classify a days-remaining value. Later rules override earlier ones.
    pub fn classify(days_left: i64) -> Self {
        let mut label = UrgencyLabel::Warning;
        if days_left == 15 {
            label = UrgencyLabel::Reminder;
        }
        if days_left == 5 {
            label = UrgencyLabel::Urgent;
        }
        if days_left <= 0 {
            label = UrgencyLabel::Expired;
        }
        label
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLabel::Warning => "WARNING",
            UrgencyLabel::Reminder => "REMINDER",
            UrgencyLabel::Urgent => "URGENT",
            UrgencyLabel::Expired => "EXPIRED",
        }
    }
}

impl core::fmt::Display for UrgencyLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kit that warrants a notification today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub barcode: String,
    pub visit: String,
    pub expiry: NaiveDate,
    pub days_left: i64,
    pub label: UrgencyLabel,
}

impl ValueObject for Alert {}

/// Why an item produced no alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Status is anything but `Available`.
    NotAvailable,
    /// No expiry recorded.
    NoExpiry,
    /// An expiry is recorded but is not a date.
    BadExpiry(DomainError),
    /// Evaluated, but today is not a milestone day for this item.
    NotMilestone { days_left: i64 },
}

/// Whole days from `today` until `expiry` (negative once expired).
///
/// Both sides are calendar dates, so the difference is already integral and
/// there is no time-of-day drift to round away.
pub fn days_left(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

/// Whether `days_left` is one of the notification days (30, 15, 5, 0).
/// Overdue items (negative values) are never milestones.
pub fn is_milestone(days_left: i64) -> bool {
    MILESTONES.contains(&days_left)
}

/// Evaluate one item against `today`.
pub fn evaluate(item: &InventoryItem, today: NaiveDate) -> Option<Alert> {
    evaluate_detailed(item, today).ok()
}

/// Like [`evaluate`], but reports why an item was left out.
pub fn evaluate_detailed(item: &InventoryItem, today: NaiveDate) -> Result<Alert, Skip> {
    if !item.is_available() {
        return Err(Skip::NotAvailable);
    }

    let expiry = match item.expiry_date() {
        Ok(Some(date)) => date,
        Ok(None) => return Err(Skip::NoExpiry),
        Err(e) => return Err(Skip::BadExpiry(e)),
    };

    let days_left = days_left(expiry, today);
    if !is_milestone(days_left) {
        return Err(Skip::NotMilestone { days_left });
    }

    Ok(Alert {
        barcode: item.barcode().to_string(),
        visit: item.visit().to_string(),
        expiry,
        days_left,
        label: UrgencyLabel::classify(days_left),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitwatch_inventory::ItemStatus;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn available(expiry: NaiveDate) -> InventoryItem {
        InventoryItem {
            barcode: Some("KIT-001".to_string()),
            visit: Some("Screening".to_string()),
            study: Some("StudyX".to_string()),
            status: Some(ItemStatus::Available),
            expiry: Some(expiry.format("%Y-%m-%d").to_string()),
        }
    }

    fn in_days(n: i64) -> NaiveDate {
        today() + chrono::Duration::days(n)
    }

    #[test]
    fn milestone_days_are_labelled() {
        let cases = [
            (30, UrgencyLabel::Warning),
            (15, UrgencyLabel::Reminder),
            (5, UrgencyLabel::Urgent),
            (0, UrgencyLabel::Expired),
        ];
        for (days, label) in cases {
            let alert = evaluate(&available(in_days(days)), today()).unwrap();
            assert_eq!(alert.days_left, days);
            assert_eq!(alert.label, label, "days_left={days}");
        }
    }

    #[test]
    fn only_the_four_milestone_days_notify() {
        let hits: Vec<i64> = (-60..=60).filter(|d| is_milestone(*d)).collect();
        assert_eq!(hits, vec![0, 5, 15, 30]);
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(UrgencyLabel::classify(29), UrgencyLabel::Warning);
        assert_eq!(UrgencyLabel::classify(1), UrgencyLabel::Warning);
        assert_eq!(UrgencyLabel::classify(-3), UrgencyLabel::Expired);
    }

    #[test]
    fn expired_items_are_not_reported_every_day() {
        for days in [-1, -12, -30] {
            let skip = evaluate_detailed(&available(in_days(days)), today()).unwrap_err();
            assert_eq!(skip, Skip::NotMilestone { days_left: days });
        }
    }

    #[test]
    fn alert_copies_item_fields() {
        let alert = evaluate(&available(in_days(30)), today()).unwrap();
        assert_eq!(alert.barcode, "KIT-001");
        assert_eq!(alert.visit, "Screening");
        assert_eq!(alert.expiry, in_days(30));
    }

    #[test]
    fn status_and_expiry_gates() {
        let mut discarded = available(in_days(1));
        discarded.status = Some(ItemStatus::Discarded);
        assert_eq!(evaluate_detailed(&discarded, today()), Err(Skip::NotAvailable));

        let mut no_status = available(in_days(30));
        no_status.status = None;
        assert_eq!(evaluate_detailed(&no_status, today()), Err(Skip::NotAvailable));

        let mut no_expiry = available(in_days(30));
        no_expiry.expiry = None;
        assert_eq!(evaluate_detailed(&no_expiry, today()), Err(Skip::NoExpiry));

        let mut bad_expiry = available(in_days(30));
        bad_expiry.expiry = Some("31/01/2024".to_string());
        assert!(matches!(
            evaluate_detailed(&bad_expiry, today()),
            Err(Skip::BadExpiry(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: only exact milestone days ever produce an alert.
        #[test]
        fn non_milestone_days_never_alert(days in -400i64..400i64) {
            let result = evaluate(&available(in_days(days)), today());
            prop_assert_eq!(result.is_some(), MILESTONES.contains(&days));
        }

        /// Property: evaluation is a pure function of (item, today).
        #[test]
        fn evaluation_is_idempotent(days in -60i64..60i64, offset in 0i64..3650) {
            let today = today() + chrono::Duration::days(offset);
            let item = available(today + chrono::Duration::days(days));
            prop_assert_eq!(evaluate(&item, today), evaluate(&item, today));
        }

        /// Property: items that are not `Available` never alert.
        #[test]
        fn unavailable_items_never_alert(
            days in prop::sample::select(MILESTONES.to_vec()),
            status in prop::sample::select(vec![
                ItemStatus::Reserved,
                ItemStatus::Shipped,
                ItemStatus::Used,
                ItemStatus::Discarded,
                ItemStatus::Expired,
                ItemStatus::Other,
            ]),
        ) {
            let mut item = available(in_days(days));
            item.status = Some(status);
            prop_assert!(evaluate(&item, today()).is_none());
        }
    }
}
