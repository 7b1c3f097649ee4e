use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use kitwatch_core::{DomainError, StudyName};

/// Lifecycle tag of a physical kit.
///
/// Only [`ItemStatus::Available`] kits are candidates for expiry alerts. Tags are
/// matched exactly as stored; anything unrecognised becomes [`ItemStatus::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    Available,
    Reserved,
    Shipped,
    Used,
    Discarded,
    Expired,
    #[serde(other)]
    Other,
}

/// One inventory record (a single kit identified by its barcode).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub visit: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub study: Option<String>,
    #[serde(default)]
    pub status: Option<ItemStatus>,
    /// Raw expiry as stored (`YYYY-MM-DD`, sometimes a full timestamp).
    #[serde(default)]
    pub expiry: Option<String>,
}

impl InventoryItem {
    pub fn is_available(&self) -> bool {
        self.status == Some(ItemStatus::Available)
    }

    /// Group key for this item (`Unknown` when the study is absent or empty).
    pub fn study_name(&self) -> StudyName {
        StudyName::from_item_field(self.study.as_deref())
    }

    pub fn barcode(&self) -> &str {
        self.barcode.as_deref().unwrap_or_default()
    }

    pub fn visit(&self) -> &str {
        self.visit.as_deref().unwrap_or_default()
    }

    /// Parsed expiry date.
    ///
    /// - `Ok(None)`: no expiry recorded (absent or empty)
    /// - `Err(_)`: an expiry is recorded but is not a calendar date
    pub fn expiry_date(&self) -> Result<Option<NaiveDate>, DomainError> {
        match self.expiry.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_expiry(raw).map(Some),
        }
    }
}

/// Free-text fields are sometimes stored as bare numbers (numeric barcodes,
/// visit numbers). Those are read as their decimal text.
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        JsonValue::Number(n) => Ok(Some(n.to_string())),
        JsonValue::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected text or a number, got {other}"
        ))),
    }
}

/// Parse a stored expiry into a calendar date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (the date part is kept, the
/// time of day is dropped).
pub fn parse_expiry(raw: &str) -> Result<NaiveDate, DomainError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|_| DomainError::invalid_date(format!("unrecognised expiry '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(status: Option<ItemStatus>, expiry: Option<&str>) -> InventoryItem {
        InventoryItem {
            barcode: Some("KIT-001".to_string()),
            visit: Some("V1".to_string()),
            study: Some("StudyX".to_string()),
            status,
            expiry: expiry.map(str::to_string),
        }
    }

    #[test]
    fn decodes_known_and_unknown_status_tags() {
        let raw = serde_json::json!({
            "barcode": "KIT-001",
            "status": "Available",
            "expiry": "2024-01-31"
        });
        let parsed: InventoryItem = serde_json::from_value(raw).unwrap();
        assert!(parsed.is_available());

        let raw = serde_json::json!({ "status": "Quarantined" });
        let parsed: InventoryItem = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.status, Some(ItemStatus::Other));
        assert!(!parsed.is_available());
    }

    #[test]
    fn status_match_is_exact() {
        let raw = serde_json::json!({ "status": "available" });
        let parsed: InventoryItem = serde_json::from_value(raw).unwrap();
        assert!(!parsed.is_available());
    }

    #[test]
    fn expiry_accepts_date_and_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            item(None, Some("2024-01-31")).expiry_date().unwrap(),
            Some(expected)
        );
        assert_eq!(
            item(None, Some("2024-01-31T00:00:00Z")).expiry_date().unwrap(),
            Some(expected)
        );
    }

    #[test]
    fn missing_expiry_is_none_and_garbage_is_an_error() {
        assert_eq!(item(None, None).expiry_date().unwrap(), None);
        assert_eq!(item(None, Some("")).expiry_date().unwrap(), None);
        assert!(matches!(
            item(None, Some("next tuesday")).expiry_date(),
            Err(DomainError::InvalidDate(_))
        ));
    }

    #[test]
    fn numeric_text_fields_decode_as_text() {
        let raw = serde_json::json!({
            "barcode": 100234,
            "visit": 3,
            "study": "StudyX",
            "status": "Available",
            "expiry": "2024-01-31"
        });
        let parsed: InventoryItem = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.barcode(), "100234");
        assert_eq!(parsed.visit(), "3");
        assert!(parsed.is_available());

        let parsed: InventoryItem =
            serde_json::from_value(serde_json::json!({ "study": 42, "visit": null })).unwrap();
        assert_eq!(parsed.study_name().as_str(), "42");
        assert_eq!(parsed.visit, None);

        let nested = serde_json::json!({ "barcode": { "id": 1 } });
        assert!(serde_json::from_value::<InventoryItem>(nested).is_err());
    }

    #[test]
    fn missing_text_fields_render_empty() {
        let bare = InventoryItem::default();
        assert_eq!(bare.barcode(), "");
        assert_eq!(bare.visit(), "");
        assert!(bare.study_name().is_unknown());
    }
}
