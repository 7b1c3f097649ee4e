//! Collaborator boundaries.
//!
//! The run pipeline receives already-constructed readers and dispatchers; how
//! they authenticate or pool connections is their own business.

use core::fmt;

use serde::{Deserialize, Serialize};

use kitwatch_core::{DomainError, DomainResult, ValueObject};
use kitwatch_inventory::{ContactsSnapshot, InventorySnapshot};

use crate::error::{DispatchError, ReadError};

/// Read-only, point-in-time access to the inventory store.
#[async_trait::async_trait]
pub trait SnapshotReader: Send + Sync {
    async fn inventory(&self) -> Result<InventorySnapshot, ReadError>;

    async fn contacts(&self) -> Result<ContactsSnapshot, ReadError>;
}

/// Outbound email delivery.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync + 'static {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError>;
}

/// Sender identity: a bare address or an address with a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Sender {
    /// Parse `addr@host` or `Display Name <addr@host>`.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        let (name, email) = match (raw.find('<'), raw.ends_with('>')) {
            (Some(open), true) => {
                let name = raw[..open].trim().trim_matches('"').trim();
                let email = raw[open + 1..raw.len() - 1].trim();
                ((!name.is_empty()).then(|| name.to_string()), email)
            }
            (None, false) => (None, raw),
            _ => return Err(DomainError::invalid_address(raw)),
        };

        if !looks_like_address(email) {
            return Err(DomainError::invalid_address(raw));
        }

        Ok(Self {
            email: email.to_string(),
            name,
        })
    }
}

impl ValueObject for Sender {}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

fn looks_like_address(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// A fully rendered message ready for the mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub from: Sender,
    pub subject: String,
    pub html: String,
}
