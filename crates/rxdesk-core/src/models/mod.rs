//! Data models for pharmacy entities.
//!
//! This module contains the data structures exchanged with the pharmacy
//! REST API:
//!
//! - `User`, `Role`: The signed-in identity held by the auth context
//! - `Medicine`, `NewMedicine`, `InventoryItem`: Catalog and stock levels
//! - `Alert` and friends: Stock, expiry and anomaly notifications
//! - Analytics types: `DashboardStats`, `SalesTrend`, `CategoryDistribution`
//! - `SafetyCheckRequest`: Input for the drug safety endpoint

pub mod alert;
pub mod analytics;
pub mod medicine;
pub mod safety;
pub mod user;

pub use alert::UnreadCount;
pub use alert::{Alert, AlertFilter, AlertPriority, AlertStats, AlertStatus, AlertType};
pub use analytics::{CategoryDistribution, DashboardStats, SalesTrend, Supplier};
pub use medicine::{
    CategoryList, FieldError, InventoryItem, InventoryQuery, InventoryStats, Medicine,
    MedicineQuery, NewMedicine, ValidationErrors,
};
pub use safety::SafetyCheckRequest;
pub use user::{Role, User};
