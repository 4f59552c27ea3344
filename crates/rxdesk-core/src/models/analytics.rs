use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardStats {
    pub total_medicines: i64,
    pub total_inventory_value: f64,
    pub low_stock_items: i64,
    pub expiring_soon: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SalesTrend {
    pub date: String,
    pub sales: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryDistribution {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_orders: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Share of orders delivered on time, as a percentage.
    #[serde(default)]
    pub on_time_delivery: Option<f64>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub avg_delivery_days: Option<f64>,
}

fn default_active() -> bool {
    true
}

/// Envelope returned by the supplier-performance endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct SupplierPerformance {
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub total_suppliers: i64,
}

impl SalesTrend {
    /// Average revenue per sale, zero when nothing sold.
    pub fn average_ticket(&self) -> f64 {
        if self.sales == 0 {
            0.0
        } else {
            self.revenue / self.sales as f64
        }
    }
}
