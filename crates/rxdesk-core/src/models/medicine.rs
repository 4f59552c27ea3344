//! Medicine catalog and stock level models.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default dispensing unit for new medicines.
const DEFAULT_UNIT: &str = "strip";

/// A catalog entry as returned by the inventory API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    pub category: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub salt_composition: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Medicine {
    /// Case-insensitive substring match of `query` against the name.
    /// The generic name is not searched, matching the server.
    pub fn matches_search(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn price_display(&self) -> String {
        format!("{:.2} / {}", self.price, self.unit)
    }
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

/// Create/update payload for a medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewMedicine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    pub price: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewMedicine {
    pub fn new(name: impl Into<String>, category: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            generic_name: None,
            category: category.into(),
            manufacturer: None,
            dosage: None,
            price,
            unit: default_unit(),
            description: None,
        }
    }

    /// Check the required fields, collecting every failure.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Medicine name is required"));
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError::new("category", "Category is required"));
        }
        if !(self.price > 0.0) {
            errors.push(FieldError::new("price", "Valid price is required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Build the catalog entry a backend would store for this payload.
    pub fn into_medicine(self, id: i64, timestamp: String) -> Medicine {
        Medicine {
            id,
            name: self.name,
            generic_name: self.generic_name,
            category: self.category,
            manufacturer: self.manufacturer,
            dosage: self.dosage,
            salt_composition: None,
            description: self.description,
            price: self.price,
            unit: self.unit,
            created_at: Some(timestamp.clone()),
            updated_at: Some(timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// All required-field failures of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }
}

/// Filters for listing medicines.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MedicineQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl MedicineQuery {
    pub fn matches(&self, medicine: &Medicine) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map(|c| medicine.category == c)
            .unwrap_or(true);
        let search_ok = self
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| medicine.matches_search(s))
            .unwrap_or(true);
        category_ok && search_ok
    }
}

/// Filters for listing stock. `low_stock` wins over `expiring_days`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InventoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiring_days: Option<i64>,
}

/// A stock batch of one medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct InventoryItem {
    pub id: i64,
    pub medicine_id: i64,
    #[serde(default)]
    pub medicine_name: Option<String>,
    pub quantity: i64,
    pub reorder_level: i64,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub shelf_location: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.reorder_level
    }

    /// Whether the batch expires on or before `today + days`.
    /// Batches with a missing or unparseable expiry date never match. A window
    /// beyond the calendar's range matches every dated batch when positive and
    /// none when negative.
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        let Some(expiry) = self.expiry_date.as_deref().and_then(parse_date) else {
            return false;
        };
        match Duration::try_days(days).and_then(|d| today.checked_add_signed(d)) {
            Some(cutoff) => expiry <= cutoff,
            None => days > 0,
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // Accept both "2025-03-01" and full timestamps
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total_medicines: i64,
    pub total_inventory_items: i64,
    pub total_value: f64,
    pub low_stock_count: i64,
    #[serde(default)]
    pub expiring_soon_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, reorder_level: i64, expiry: Option<&str>) -> InventoryItem {
        InventoryItem {
            id: 1,
            medicine_id: 1,
            medicine_name: None,
            quantity,
            reorder_level,
            batch_number: None,
            expiry_date: expiry.map(str::to_string),
            shelf_location: None,
            supplier_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let form = NewMedicine::new("  ", "", 0.0);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.0.len(), 3);
        assert_eq!(errors.message_for("name"), Some("Medicine name is required"));
        assert_eq!(errors.message_for("category"), Some("Category is required"));
        assert_eq!(errors.message_for("price"), Some("Valid price is required"));
    }

    #[test]
    fn test_validate_rejects_nan_price() {
        let form = NewMedicine::new("Paracetamol", "Analgesic", f64::NAN);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert!(NewMedicine::new("Paracetamol", "Analgesic", 12.5).validate().is_ok());
    }

    #[test]
    fn test_new_medicine_defaults_unit() {
        let parsed: NewMedicine =
            serde_json::from_str(r#"{"name":"Cetirizine","category":"Antihistamine","price":3.0}"#)
                .unwrap();
        assert_eq!(parsed.unit, "strip");
        let json = serde_json::to_value(&parsed).unwrap();
        assert!(json.get("generic_name").is_none());
    }

    #[test]
    fn test_query_matches_name_only() {
        let med = NewMedicine {
            generic_name: Some("Acetaminophen".to_string()),
            ..NewMedicine::new("Crocin", "Analgesic", 20.0)
        }
        .into_medicine(1, "2025-01-01T00:00:00Z".to_string());

        let by_name = MedicineQuery {
            category: None,
            search: Some("CROC".to_string()),
        };
        assert!(by_name.matches(&med));

        let by_generic = MedicineQuery {
            category: None,
            search: Some("acetamin".to_string()),
        };
        assert!(!by_generic.matches(&med));

        let wrong_category = MedicineQuery {
            category: Some("analgesic".to_string()),
            search: None,
        };
        assert!(!wrong_category.matches(&med));
    }

    #[test]
    fn test_low_stock_is_strictly_below_reorder_level() {
        assert!(item(4, 5, None).is_low_stock());
        assert!(!item(5, 5, None).is_low_stock());
    }

    #[test]
    fn test_expires_within() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(item(1, 1, Some("2025-03-31")).expires_within(today, 30));
        assert!(!item(1, 1, Some("2025-04-01")).expires_within(today, 30));
        assert!(item(1, 1, Some("2025-02-01T00:00:00")).expires_within(today, 0));
        assert!(!item(1, 1, None).expires_within(today, 365));
        assert!(!item(1, 1, Some("soon")).expires_within(today, 365));
    }

    #[test]
    fn test_expires_within_out_of_range_windows() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let batch = item(1, 1, Some("2199-12-31"));
        assert!(batch.expires_within(today, i64::MAX / 1000));
        assert!(batch.expires_within(today, i64::MAX));
        assert!(!batch.expires_within(today, i64::MIN));
        assert!(!item(1, 1, None).expires_within(today, i64::MAX));

        // Negative windows only match batches already past the cutoff
        assert!(item(1, 1, Some("2025-02-01")).expires_within(today, -10));
        assert!(!item(1, 1, Some("2025-02-25")).expires_within(today, -10));
    }
}
