//! Point-in-time snapshots of the inventory and contacts nodes.
//!
//! The store hands back a keyed JSON object (opaque keys, one record per key),
//! `null` for an empty node, or an array when every key happens to be a small
//! integer. Records that fail to decode are set aside instead of failing the
//! whole snapshot.
//!
//! Scan order follows JavaScript object key order: integer-like keys first in
//! ascending numeric order, then every other key in response order. Grouping
//! order and "last matching contact wins" both depend on it.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::contact::StudyContact;
use crate::item::InventoryItem;

/// A record the snapshot could not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventorySnapshot {
    pub items: Vec<InventoryItem>,
    pub rejected: Vec<RejectedRecord>,
}

impl InventorySnapshot {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self {
            items,
            rejected: Vec::new(),
        }
    }

    pub fn from_json(value: JsonValue) -> Self {
        let (items, rejected) = decode_keyed(value);
        Self { items, rejected }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactsSnapshot {
    pub contacts: Vec<StudyContact>,
    pub rejected: Vec<RejectedRecord>,
}

impl ContactsSnapshot {
    pub fn new(contacts: Vec<StudyContact>) -> Self {
        Self {
            contacts,
            rejected: Vec::new(),
        }
    }

    pub fn from_json(value: JsonValue) -> Self {
        let (contacts, rejected) = decode_keyed(value);
        Self { contacts, rejected }
    }
}

/// Keys that JavaScript treats as array indices: canonical decimal `u32`
/// below `u32::MAX`.
fn index_key(key: &str) -> Option<u32> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|n| *n != u32::MAX)
}

fn scan_order(map: serde_json::Map<String, JsonValue>) -> Vec<(String, JsonValue)> {
    let (mut indexed, named): (Vec<_>, Vec<_>) = map
        .into_iter()
        .partition(|(key, _)| index_key(key).is_some());
    // Stable sort; `named` keeps response order.
    indexed.sort_by_key(|(key, _)| index_key(key));
    indexed.extend(named);
    indexed
}

fn decode_keyed<T: DeserializeOwned>(value: JsonValue) -> (Vec<T>, Vec<RejectedRecord>) {
    let entries: Vec<(String, JsonValue)> = match value {
        JsonValue::Null => Vec::new(),
        JsonValue::Object(map) => scan_order(map),
        // Sparse arrays come back with `null` holes for missing indices.
        JsonValue::Array(values) => values
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return (
                Vec::new(),
                vec![RejectedRecord {
                    key: String::new(),
                    reason: format!("expected an object of records, got {other}"),
                }],
            );
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut rejected = Vec::new();
    for (key, raw) in entries {
        match serde_json::from_value::<T>(raw) {
            Ok(record) => records.push(record),
            Err(e) => rejected.push(RejectedRecord {
                key,
                reason: e.to_string(),
            }),
        }
    }
    (records, rejected)
}
