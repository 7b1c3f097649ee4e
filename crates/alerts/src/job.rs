use chrono::NaiveDate;
use indexmap::IndexMap;

use kitwatch_core::{DomainError, StudyName};
use kitwatch_inventory::{ContactsSnapshot, InventorySnapshot};

use crate::aggregator::{AlertGroup, aggregate};
use crate::evaluator::{Skip, evaluate_detailed};

/// Deterministic expiry check over one pair of snapshots.
///
/// Model:
/// - Evaluate every inventory item against `today`.
/// - Group the resulting alerts by study, in scan order.
/// - Resolve each group to at most one recipient from the contacts snapshot.
#[derive(Debug, Clone)]
pub struct ExpiryCheck<'a> {
    today: NaiveDate,
    inventory: &'a InventorySnapshot,
    contacts: &'a ContactsSnapshot,
}

/// What the check found. Holds no I/O handles; the caller renders and sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryCheckOutcome {
    pub today: NaiveDate,
    pub items_scanned: usize,
    pub groups: IndexMap<StudyName, AlertGroup>,
    /// Available items whose expiry could not be read, as `(barcode, error)`.
    pub bad_expiries: Vec<(String, DomainError)>,
}

impl ExpiryCheckOutcome {
    pub fn alert_count(&self) -> usize {
        self.groups.values().map(|g| g.alerts.len()).sum()
    }

    pub fn resolved(&self) -> impl Iterator<Item = (&AlertGroup, &str)> {
        self.groups
            .values()
            .filter_map(|g| g.recipient.as_deref().map(|r| (g, r)))
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &AlertGroup> {
        self.groups.values().filter(|g| g.recipient.is_none())
    }
}

impl<'a> ExpiryCheck<'a> {
    pub fn new(
        today: NaiveDate,
        inventory: &'a InventorySnapshot,
        contacts: &'a ContactsSnapshot,
    ) -> Self {
        Self {
            today,
            inventory,
            contacts,
        }
    }

    pub fn run(&self) -> ExpiryCheckOutcome {
        let mut bad_expiries = Vec::new();
        let mut alerts = Vec::new();

        for item in &self.inventory.items {
            match evaluate_detailed(item, self.today) {
                Ok(alert) => alerts.push((item.study_name(), alert)),
                Err(Skip::BadExpiry(e)) => bad_expiries.push((item.barcode().to_string(), e)),
                Err(_) => {}
            }
        }

        ExpiryCheckOutcome {
            today: self.today,
            items_scanned: self.inventory.items.len(),
            groups: aggregate(alerts, &self.contacts.contacts),
            bad_expiries,
        }
    }
}
