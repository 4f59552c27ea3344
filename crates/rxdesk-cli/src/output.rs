//! Plain-text rendering of command results.

use rxdesk_core::models::{
    Alert, AlertStats, CategoryDistribution, DashboardStats, InventoryItem, InventoryStats,
    Medicine, SalesTrend, Supplier,
};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub fn medicine_table(medicines: &[Medicine]) -> String {
    if medicines.is_empty() {
        return "No medicines found.".to_string();
    }
    let mut out = format!(
        "{:>5}  {:<28}  {:<22}  {:<16}  {:>14}\n",
        "ID", "NAME", "GENERIC", "CATEGORY", "PRICE"
    );
    for m in medicines {
        out.push_str(&format!(
            "{:>5}  {:<28}  {:<22}  {:<16}  {:>14}\n",
            m.id,
            truncate_string(&m.name, 28),
            truncate_string(or_dash(m.generic_name.as_deref()), 22),
            truncate_string(&m.category, 16),
            m.price_display(),
        ));
    }
    out.push_str(&format!("{} medicine(s)", medicines.len()));
    out
}

pub fn medicine_detail(m: &Medicine) -> String {
    let mut out = format!("{} (#{})\n", m.name, m.id);
    let rows = [
        ("Generic", m.generic_name.as_deref()),
        ("Category", Some(m.category.as_str())),
        ("Manufacturer", m.manufacturer.as_deref()),
        ("Dosage", m.dosage.as_deref()),
        ("Composition", m.salt_composition.as_deref()),
        ("Description", m.description.as_deref()),
    ];
    for (label, value) in rows {
        out.push_str(&format!("  {:<13} {}\n", label, or_dash(value)));
    }
    out.push_str(&format!("  {:<13} {}", "Price", m.price_display()));
    out
}

pub fn inventory_table(items: &[InventoryItem]) -> String {
    if items.is_empty() {
        return "No stock batches found.".to_string();
    }
    let mut out = format!(
        "{:>5}  {:<26}  {:>8}  {:>8}  {:<12}  {:<12}  {}\n",
        "ID", "MEDICINE", "QTY", "REORDER", "BATCH", "EXPIRES", ""
    );
    for item in items {
        let name = item
            .medicine_name
            .clone()
            .unwrap_or_else(|| format!("#{}", item.medicine_id));
        out.push_str(&format!(
            "{:>5}  {:<26}  {:>8}  {:>8}  {:<12}  {:<12}  {}\n",
            item.id,
            truncate_string(&name, 26),
            item.quantity,
            item.reorder_level,
            truncate_string(or_dash(item.batch_number.as_deref()), 12),
            item.expiry_date.as_deref().map(format_date).unwrap_or_else(|| "-".to_string()),
            if item.is_low_stock() { "LOW" } else { "" },
        ));
    }
    out.push_str(&format!("{} batch(es)", items.len()));
    out
}

pub fn inventory_stats(stats: &InventoryStats) -> String {
    format!(
        "Medicines:       {}\n\
         Stock batches:   {}\n\
         Stock value:     {:.2}\n\
         Low stock:       {}\n\
         Expiring soon:   {}",
        stats.total_medicines,
        stats.total_inventory_items,
        stats.total_value,
        stats.low_stock_count,
        stats.expiring_soon_count,
    )
}

pub fn alert_table(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No alerts.".to_string();
    }
    let mut out = format!(
        "{:>5}  {:<9}  {:<12}  {:<10}  {:<36}  {}\n",
        "ID", "PRIORITY", "STATUS", "TYPE", "TITLE", "CREATED"
    );
    for alert in alerts {
        out.push_str(&format!(
            "{:>5}  {:<9}  {:<12}  {:<10}  {:<36}  {}\n",
            alert.id,
            alert.priority.as_str(),
            alert.status.as_str(),
            alert.alert_type.as_str(),
            truncate_string(&alert.title, 36),
            format_date(&alert.created_at),
        ));
    }
    let open = alerts.iter().filter(|a| a.is_open()).count();
    out.push_str(&format!("{} alert(s), {} open", alerts.len(), open));
    out
}

/// One-line summary shown above the alert list.
pub fn alert_stats(stats: &AlertStats) -> String {
    format!(
        "{} total, {} unread (critical {}, high {}, medium {}, low {})",
        stats.total, stats.unread, stats.critical, stats.high, stats.medium, stats.low
    )
}

fn percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:.0}%", v)).unwrap_or_else(|| "-".to_string())
}

pub fn supplier_table(suppliers: &[Supplier]) -> String {
    if suppliers.is_empty() {
        return "No suppliers.".to_string();
    }
    let mut out = format!(
        "{:>5}  {:<28}  {:>6}  {:>7}  {:>8}  {:>8}  {:>9}\n",
        "ID", "NAME", "RATING", "ORDERS", "ON TIME", "QUALITY", "AVG DAYS"
    );
    for s in suppliers {
        out.push_str(&format!(
            "{:>5}  {:<28}  {:>6.1}  {:>7}  {:>8}  {:>8}  {:>9}\n",
            s.id,
            truncate_string(&s.name, 28),
            s.rating,
            s.total_orders,
            percent(s.on_time_delivery),
            percent(s.quality_score),
            s.avg_delivery_days
                .map(|d| format!("{:.1}", d))
                .unwrap_or_else(|| "-".to_string()),
        ));
    }
    let active = suppliers.iter().filter(|s| s.is_active).count();
    out.push_str(&format!("{} supplier(s), {} active", suppliers.len(), active));
    out
}

pub fn alert_detail(alert: &Alert) -> String {
    let mut out = format!(
        "{} (#{})\n  {:<13} {}\n  {:<13} {}\n  {:<13} {}\n  {:<13} {}\n",
        alert.title,
        alert.id,
        "Priority",
        alert.priority.as_str(),
        "Status",
        alert.status.as_str(),
        "Type",
        alert.alert_type.as_str(),
        "Raised",
        format_date(&alert.created_at),
    );
    if let Some(at) = &alert.acknowledged_at {
        out.push_str(&format!("  {:<13} {}\n", "Acknowledged", format_date(at)));
    }
    if let Some(at) = &alert.resolved_at {
        out.push_str(&format!("  {:<13} {}\n", "Resolved", format_date(at)));
    }
    out.push_str(&format!("\n{}", alert.message));
    out
}

pub fn dashboard(
    stats: &DashboardStats,
    trends: &[SalesTrend],
    categories: &[CategoryDistribution],
) -> String {
    let mut out = format!(
        "Medicines:        {}\n\
         Inventory value:  {:.2}\n\
         Low stock items:  {}\n\
         Expiring soon:    {}\n",
        stats.total_medicines,
        stats.total_inventory_value,
        stats.low_stock_items,
        stats.expiring_soon,
    );

    if !trends.is_empty() {
        let sales: i64 = trends.iter().map(|t| t.sales).sum();
        let revenue: f64 = trends.iter().map(|t| t.revenue).sum();
        out.push_str(&format!(
            "\nSales ({} days): {} sales, {:.2} revenue\n",
            trends.len(),
            sales,
            revenue
        ));
        for trend in trends.iter().rev().take(7).rev() {
            out.push_str(&format!(
                "  {:<12} {:>6} {:>12.2}  avg {:.2}\n",
                format_date(&trend.date),
                trend.sales,
                trend.revenue,
                trend.average_ticket(),
            ));
        }
    }

    if !categories.is_empty() {
        out.push_str("\nCategories:\n");
        for c in categories {
            out.push_str(&format!("  {:<24} {}\n", truncate_string(&c.category, 24), c.count));
        }
    }

    out.trim_end().to_string()
}
