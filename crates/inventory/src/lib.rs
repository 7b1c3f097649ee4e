//! Inventory domain module.
//!
//! This crate contains the records read from the inventory store, implemented
//! purely as deterministic domain types (no IO, no HTTP, no storage).

pub mod contact;
pub mod item;
pub mod snapshot;

pub use contact::StudyContact;
pub use item::{InventoryItem, ItemStatus};
pub use snapshot::{ContactsSnapshot, InventorySnapshot, RejectedRecord};
