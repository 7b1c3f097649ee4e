//! In-memory collaborators for tests, local runs and `--dry-run`.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use kitwatch_alerts::{DispatchError, NotificationDispatcher, OutgoingEmail, ReadError, SnapshotReader};
use kitwatch_inventory::{ContactsSnapshot, InventorySnapshot};

/// Serves fixed snapshots; either side can be made to fail.
#[derive(Debug, Default)]
pub struct InMemorySnapshotReader {
    inventory: InventorySnapshot,
    contacts: ContactsSnapshot,
    fail_inventory: Option<String>,
    fail_contacts: Option<String>,
}

impl InMemorySnapshotReader {
    pub fn new(inventory: InventorySnapshot, contacts: ContactsSnapshot) -> Self {
        Self {
            inventory,
            contacts,
            ..Default::default()
        }
    }

    pub fn failing_inventory(mut self, message: impl Into<String>) -> Self {
        self.fail_inventory = Some(message.into());
        self
    }

    pub fn failing_contacts(mut self, message: impl Into<String>) -> Self {
        self.fail_contacts = Some(message.into());
        self
    }
}

fn transport(path: &str, message: &str) -> ReadError {
    ReadError::Transport {
        path: path.to_string(),
        message: message.to_string(),
    }
}

#[async_trait::async_trait]
impl SnapshotReader for InMemorySnapshotReader {
    async fn inventory(&self) -> Result<InventorySnapshot, ReadError> {
        match &self.fail_inventory {
            Some(msg) => Err(transport("inventory", msg)),
            None => Ok(self.inventory.clone()),
        }
    }

    async fn contacts(&self) -> Result<ContactsSnapshot, ReadError> {
        match &self.fail_contacts {
            Some(msg) => Err(transport("contacts", msg)),
            None => Ok(self.contacts.clone()),
        }
    }
}

/// Records every email instead of sending it.
///
/// Recipients registered with [`RecordingDispatcher::reject`] get a
/// `Rejected` error and are not recorded.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<OutgoingEmail>>,
    rejected_recipients: HashSet<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(mut self, recipient: impl Into<String>) -> Self {
        self.rejected_recipients.insert(recipient.into());
        self
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
        if self.rejected_recipients.contains(&email.to) {
            return Err(DispatchError::Rejected {
                status: 400,
                body: format!("recipient {} rejected", email.to),
            });
        }

        info!(to = %email.to, from = %email.from, subject = %email.subject, "recorded email (not sent)");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(())
    }
}

/// Logs every email and keeps nothing. Used by `--dry-run`, where a long-lived
/// schedule would otherwise accumulate every rendered email.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunDispatcher;

#[async_trait::async_trait]
impl NotificationDispatcher for DryRunDispatcher {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
        info!(to = %email.to, from = %email.from, subject = %email.subject, "dry run: email not sent");
        debug!(html = %email.html, "dry run body");
        Ok(())
    }
}
