//! Medicine catalog and stock operations.
//!
//! `InventoryBackend` is implemented by `ApiClient` against the REST API and
//! by `SimulatedInventory`, an in-memory stand-in with the same filtering
//! rules, for demos and tests.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, Utc};
use reqwest::Method;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::client::NO_QUERY;
use super::{ApiClient, ApiError};
use crate::models::{
    CategoryList, InventoryItem, InventoryQuery, InventoryStats, Medicine, MedicineQuery,
    NewMedicine,
};

/// Default window for "expiring soon" lookups, in days.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: Vec<Medicine>,
    /// Zero-based row index and the reason the row was skipped.
    pub rejected: Vec<(usize, String)>,
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[async_trait]
pub trait InventoryBackend: Send + Sync {
    async fn list_medicines(&self, query: &MedicineQuery) -> Result<Vec<Medicine>>;

    async fn get_medicine(&self, id: i64) -> Result<Medicine>;

    async fn add_medicine(&self, medicine: &NewMedicine) -> Result<Medicine>;

    async fn update_medicine(&self, id: i64, medicine: &NewMedicine) -> Result<Medicine>;

    async fn delete_medicine(&self, id: i64) -> Result<()>;

    async fn list_inventory(&self, query: &InventoryQuery) -> Result<Vec<InventoryItem>>;

    async fn low_stock(&self) -> Result<Vec<InventoryItem>>;

    async fn expiring_soon(&self, days: i64) -> Result<Vec<InventoryItem>>;

    async fn categories(&self) -> Result<CategoryList>;

    async fn stats(&self) -> Result<InventoryStats>;

    /// Validate and add each row in order. A failing row is recorded and the
    /// import carries on with the next one.
    async fn import_medicines(&self, rows: &[NewMedicine]) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        for (index, row) in rows.iter().enumerate() {
            if let Err(errors) = row.validate() {
                summary.rejected.push((index, errors.to_string()));
                continue;
            }
            match self.add_medicine(row).await {
                Ok(medicine) => summary.imported.push(medicine),
                Err(e) => {
                    warn!(row = index, error = %e, "Import row failed");
                    summary.rejected.push((index, format!("{:#}", e)));
                }
            }
        }
        info!(
            imported = summary.imported.len(),
            rejected = summary.rejected.len(),
            "Import finished"
        );
        Ok(summary)
    }
}

#[async_trait]
impl InventoryBackend for ApiClient {
    async fn list_medicines(&self, query: &MedicineQuery) -> Result<Vec<Medicine>> {
        self.get("/inventory/medicines", query).await
    }

    async fn get_medicine(&self, id: i64) -> Result<Medicine> {
        self.get(&format!("/inventory/medicines/{}", id), NO_QUERY)
            .await
    }

    async fn add_medicine(&self, medicine: &NewMedicine) -> Result<Medicine> {
        self.send_json(Method::POST, "/inventory/medicines", Some(medicine))
            .await
    }

    async fn update_medicine(&self, id: i64, medicine: &NewMedicine) -> Result<Medicine> {
        self.send_json(
            Method::PUT,
            &format!("/inventory/medicines/{}", id),
            Some(medicine),
        )
        .await
    }

    async fn delete_medicine(&self, id: i64) -> Result<()> {
        self.send_empty(Method::DELETE, &format!("/inventory/medicines/{}", id))
            .await
    }

    async fn list_inventory(&self, query: &InventoryQuery) -> Result<Vec<InventoryItem>> {
        self.get("/inventory/inventory", query).await
    }

    async fn low_stock(&self) -> Result<Vec<InventoryItem>> {
        self.get("/inventory/low-stock", NO_QUERY).await
    }

    async fn expiring_soon(&self, days: i64) -> Result<Vec<InventoryItem>> {
        self.get("/inventory/expiring-soon", &[("days", days)])
            .await
    }

    async fn categories(&self) -> Result<CategoryList> {
        self.get("/inventory/categories", NO_QUERY).await
    }

    async fn stats(&self) -> Result<InventoryStats> {
        self.get("/inventory/stats", NO_QUERY).await
    }
}

struct Catalog {
    medicines: Vec<Medicine>,
    inventory: Vec<InventoryItem>,
    next_id: i64,
}

/// In-memory inventory that answers after an artificial delay.
pub struct SimulatedInventory {
    catalog: Mutex<Catalog>,
    latency: Duration,
}

impl SimulatedInventory {
    pub fn new(medicines: Vec<Medicine>, inventory: Vec<InventoryItem>) -> Self {
        let next_id = medicines.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        Self {
            catalog: Mutex::new(Catalog {
                medicines,
                inventory,
                next_id,
            }),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn not_found(id: i64) -> anyhow::Error {
        ApiError::NotFound(format!("Medicine {} not found", id)).into()
    }
}

impl Default for SimulatedInventory {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[async_trait]
impl InventoryBackend for SimulatedInventory {
    async fn list_medicines(&self, query: &MedicineQuery) -> Result<Vec<Medicine>> {
        self.wait().await;
        let catalog = self.catalog.lock().await;
        Ok(catalog
            .medicines
            .iter()
            .filter(|m| query.matches(m))
            .cloned()
            .collect())
    }

    async fn get_medicine(&self, id: i64) -> Result<Medicine> {
        self.wait().await;
        let catalog = self.catalog.lock().await;
        catalog
            .medicines
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn add_medicine(&self, medicine: &NewMedicine) -> Result<Medicine> {
        medicine
            .validate()
            .map_err(|e| ApiError::Rejected(e.to_string()))?;
        self.wait().await;

        let mut catalog = self.catalog.lock().await;
        let id = catalog.next_id;
        catalog.next_id += 1;
        let created = medicine.clone().into_medicine(id, Utc::now().to_rfc3339());
        catalog.medicines.push(created.clone());
        debug!(id, name = %created.name, "Simulated medicine added");
        Ok(created)
    }

    async fn update_medicine(&self, id: i64, medicine: &NewMedicine) -> Result<Medicine> {
        medicine
            .validate()
            .map_err(|e| ApiError::Rejected(e.to_string()))?;
        self.wait().await;

        let mut catalog = self.catalog.lock().await;
        let existing = catalog
            .medicines
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Self::not_found(id))?;

        let created_at = existing.created_at.clone();
        let salt_composition = existing.salt_composition.take();
        *existing = medicine.clone().into_medicine(id, Utc::now().to_rfc3339());
        existing.created_at = created_at;
        existing.salt_composition = salt_composition;
        Ok(existing.clone())
    }

    async fn delete_medicine(&self, id: i64) -> Result<()> {
        self.wait().await;
        let mut catalog = self.catalog.lock().await;
        let before = catalog.medicines.len();
        catalog.medicines.retain(|m| m.id != id);
        if catalog.medicines.len() == before {
            return Err(Self::not_found(id));
        }
        catalog.inventory.retain(|i| i.medicine_id != id);
        Ok(())
    }

    async fn list_inventory(&self, query: &InventoryQuery) -> Result<Vec<InventoryItem>> {
        if query.low_stock == Some(true) {
            return self.low_stock().await;
        }
        if let Some(days) = query.expiring_days.filter(|d| *d > 0) {
            return self.expiring_soon(days).await;
        }
        self.wait().await;
        Ok(self.catalog.lock().await.inventory.clone())
    }

    async fn low_stock(&self) -> Result<Vec<InventoryItem>> {
        self.wait().await;
        let catalog = self.catalog.lock().await;
        Ok(catalog
            .inventory
            .iter()
            .filter(|i| i.is_low_stock())
            .cloned()
            .collect())
    }

    async fn expiring_soon(&self, days: i64) -> Result<Vec<InventoryItem>> {
        self.wait().await;
        let today = Local::now().date_naive();
        let catalog = self.catalog.lock().await;
        Ok(catalog
            .inventory
            .iter()
            .filter(|i| i.expires_within(today, days))
            .cloned()
            .collect())
    }

    async fn categories(&self) -> Result<CategoryList> {
        self.wait().await;
        let catalog = self.catalog.lock().await;
        let mut categories: Vec<String> =
            catalog.medicines.iter().map(|m| m.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(CategoryList {
            count: categories.len(),
            categories,
        })
    }

    async fn stats(&self) -> Result<InventoryStats> {
        self.wait().await;
        let today = Local::now().date_naive();
        let catalog = self.catalog.lock().await;

        let total_value: f64 = catalog
            .inventory
            .iter()
            .filter_map(|inv| {
                catalog
                    .medicines
                    .iter()
                    .find(|m| m.id == inv.medicine_id)
                    .map(|m| inv.quantity as f64 * m.price)
            })
            .sum();

        Ok(InventoryStats {
            total_medicines: catalog.medicines.len() as i64,
            total_inventory_items: catalog.inventory.len() as i64,
            total_value: (total_value * 100.0).round() / 100.0,
            low_stock_count: catalog.inventory.iter().filter(|i| i.is_low_stock()).count() as i64,
            expiring_soon_count: catalog
                .inventory
                .iter()
                .filter(|i| i.expires_within(today, DEFAULT_EXPIRY_WINDOW_DAYS))
                .count() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn medicine(
        id: i64,
        name: &str,
        generic: Option<&str>,
        category: &str,
        price: f64,
    ) -> Medicine {
        NewMedicine {
            generic_name: generic.map(str::to_string),
            ..NewMedicine::new(name, category, price)
        }
        .into_medicine(id, "2025-01-01T00:00:00Z".to_string())
    }

    fn stock(
        id: i64,
        medicine_id: i64,
        quantity: i64,
        reorder_level: i64,
        expires_in: i64,
    ) -> InventoryItem {
        let expiry = Local::now().date_naive() + ChronoDuration::days(expires_in);
        InventoryItem {
            id,
            medicine_id,
            medicine_name: None,
            quantity,
            reorder_level,
            batch_number: Some(format!("B-{}", id)),
            expiry_date: Some(expiry.format("%Y-%m-%d").to_string()),
            shelf_location: None,
            supplier_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn seeded() -> SimulatedInventory {
        SimulatedInventory::new(
            vec![
                medicine(1, "Crocin", Some("Paracetamol"), "Analgesic", 20.0),
                medicine(2, "Augmentin", Some("Amoxicillin"), "Antibiotic", 110.0),
                medicine(3, "Dolo 650", Some("Paracetamol"), "Analgesic", 30.5),
            ],
            vec![
                stock(1, 1, 4, 10, 200),
                stock(2, 2, 50, 10, 12),
                stock(3, 3, 10, 10, 90),
            ],
        )
    }

    #[tokio::test]
    async fn test_simulated_search_and_category() {
        let inv = seeded();
        let by_name = inv
            .list_medicines(&MedicineQuery {
                search: Some("DOLO".to_string()),
                category: None,
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 3);

        // Generic names are not searched
        let by_generic = inv
            .list_medicines(&MedicineQuery {
                search: Some("paracet".to_string()),
                category: None,
            })
            .await
            .unwrap();
        assert!(by_generic.is_empty());

        let antibiotics = inv
            .list_medicines(&MedicineQuery {
                search: None,
                category: Some("Antibiotic".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(antibiotics.len(), 1);
        assert_eq!(antibiotics[0].name, "Augmentin");
    }

    #[tokio::test]
    async fn test_simulated_add_update_delete() {
        let inv = seeded();
        let added = inv
            .add_medicine(&NewMedicine::new("Cetzine", "Antihistamine", 15.0))
            .await
            .unwrap();
        assert_eq!(added.id, 4);

        let updated = inv
            .update_medicine(4, &NewMedicine::new("Cetzine 10", "Antihistamine", 16.0))
            .await
            .unwrap();
        assert_eq!(updated.name, "Cetzine 10");
        assert_eq!(updated.created_at, added.created_at);

        inv.delete_medicine(2).await.unwrap();
        assert!(inv.get_medicine(2).await.is_err());
        assert_eq!(inv.list_inventory(&InventoryQuery::default()).await.unwrap().len(), 2);

        let err = inv.delete_medicine(99).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_simulated_rejects_invalid_medicine() {
        let inv = seeded();
        let err = inv
            .add_medicine(&NewMedicine::new("", "Analgesic", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_simulated_stock_views() {
        let inv = seeded();
        let low = inv.low_stock().await.unwrap();
        assert_eq!(low.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1]);

        let expiring = inv.expiring_soon(30).await.unwrap();
        assert_eq!(expiring.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2]);

        let via_query = inv
            .list_inventory(&InventoryQuery {
                low_stock: Some(true),
                expiring_days: Some(30),
            })
            .await
            .unwrap();
        assert_eq!(via_query, low);
    }

    #[tokio::test]
    async fn test_simulated_huge_expiry_window_lists_every_batch() {
        let inv = seeded();
        let all = inv
            .list_inventory(&InventoryQuery {
                low_stock: None,
                expiring_days: Some(i64::MAX / 1000),
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        assert!(inv.expiring_soon(-400).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_simulated_categories_and_stats() {
        let inv = seeded();
        let categories = inv.categories().await.unwrap();
        assert_eq!(categories.categories, vec!["Analgesic", "Antibiotic"]);
        assert_eq!(categories.count, 2);

        let stats = inv.stats().await.unwrap();
        assert_eq!(stats.total_medicines, 3);
        assert_eq!(stats.total_inventory_items, 3);
        assert_eq!(stats.total_value, 4.0 * 20.0 + 50.0 * 110.0 + 10.0 * 30.5);
        assert_eq!(stats.low_stock_count, 1);
        assert_eq!(stats.expiring_soon_count, 1);
    }

    #[tokio::test]
    async fn test_import_collects_rejections() {
        let inv = SimulatedInventory::default();
        let rows = vec![
            NewMedicine::new("Pan 40", "Antacid", 9.0),
            NewMedicine::new("", "Antacid", 9.0),
            NewMedicine::new("Zinc", "Supplement", -1.0),
            NewMedicine::new("Limcee", "Supplement", 2.0),
        ];
        let summary = inv.import_medicines(&rows).await.unwrap();
        assert_eq!(summary.imported.len(), 2);
        assert_eq!(summary.rejected.len(), 2);
        assert_eq!(summary.rejected[0], (1, "Medicine name is required".to_string()));
        assert_eq!(summary.rejected[1].0, 2);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_http_backend_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventory/medicines"))
            .and(query_param("category", "Analgesic"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 1, "name": "Crocin", "category": "Analgesic", "price": 20.0
            }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/inventory/medicines"))
            .and(body_json(json!({
                "name": "Cetzine", "category": "Antihistamine", "price": 15.0, "unit": "strip"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 5,
                "name": "Cetzine",
                "category": "Antihistamine",
                "price": 15.0,
                "unit": "strip"
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/inventory/medicines/5"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/inventory/expiring-soon"))
            .and(query_param("days", "45"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), std::time::Duration::from_secs(5)).unwrap();
        let meds = client
            .list_medicines(&MedicineQuery {
                category: Some("Analgesic".to_string()),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(meds[0].unit, "strip");

        let created = client
            .add_medicine(&NewMedicine::new("Cetzine", "Antihistamine", 15.0))
            .await
            .unwrap();
        assert_eq!(created.id, 5);

        client.delete_medicine(5).await.unwrap();
        assert!(client.expiring_soon(45).await.unwrap().is_empty());
    }
}
