use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Alert, DashboardStats, InventoryItem, Medicine};

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 1440;

const MEDICINES: &str = "medicines";
const INVENTORY: &str = "inventory";
const ALERTS: &str = "alerts";
const DASHBOARD: &str = "dashboard";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    /// Short relative age such as "5m ago", "2h ago", "3d ago".
    /// Hours and days round half up; future timestamps read as "just now".
    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < MINUTES_PER_HOUR {
            format!("{}m ago", minutes)
        } else if minutes < MINUTES_PER_DAY {
            format!("{}h ago", round_half_up(minutes, MINUTES_PER_HOUR))
        } else {
            format!("{}d ago", round_half_up(minutes, MINUTES_PER_DAY))
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

fn round_half_up(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;
        let cached = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;
        Ok(Some(cached))
    }

    fn save<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        debug!(cache = name, "Cache updated");
        Ok(())
    }

    pub fn load_medicines(&self) -> Result<Option<CachedData<Vec<Medicine>>>> {
        self.load(MEDICINES)
    }

    pub fn save_medicines(&self, medicines: &[Medicine]) -> Result<()> {
        self.save(MEDICINES, medicines)
    }

    pub fn load_inventory(&self) -> Result<Option<CachedData<Vec<InventoryItem>>>> {
        self.load(INVENTORY)
    }

    pub fn save_inventory(&self, items: &[InventoryItem]) -> Result<()> {
        self.save(INVENTORY, items)
    }

    pub fn load_alerts(&self) -> Result<Option<CachedData<Vec<Alert>>>> {
        self.load(ALERTS)
    }

    pub fn save_alerts(&self, alerts: &[Alert]) -> Result<()> {
        self.save(ALERTS, alerts)
    }

    pub fn load_dashboard(&self) -> Result<Option<CachedData<DashboardStats>>> {
        self.load(DASHBOARD)
    }

    pub fn save_dashboard(&self, stats: &DashboardStats) -> Result<()> {
        self.save(DASHBOARD, stats)
    }

    /// Remove every snapshot. Called on logout so the next user starts clean.
    pub fn clear(&self) -> Result<()> {
        for name in [MEDICINES, INVENTORY, ALERTS, DASHBOARD] {
            let path = self.cache_path(name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {}", name))?;
            }
        }
        Ok(())
    }

    fn age_of<T>(&self, name: &str, loaded: Result<Option<CachedData<T>>>) -> Option<String> {
        match loaded {
            Ok(cached) => cached.map(|c| c.age_display()),
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            medicines: self.age_of(MEDICINES, self.load_medicines()),
            inventory: self.age_of(INVENTORY, self.load_inventory()),
            alerts: self.age_of(ALERTS, self.load_alerts()),
            dashboard: self.age_of(DASHBOARD, self.load_dashboard()),
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub medicines: Option<String>,
    pub inventory: Option<String>,
    pub alerts: Option<String>,
    pub dashboard: Option<String>,
}

impl CacheAges {
    pub fn display(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("never")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn aged(minutes: i64) -> CachedData<Vec<i32>> {
        let mut cached = CachedData::new(vec![1]);
        cached.cached_at = Utc::now() - Duration::minutes(minutes);
        cached
    }

    #[test]
    fn test_age_display() {
        assert_eq!(CachedData::new(vec![1]).age_display(), "just now");
        assert_eq!(aged(-5).age_display(), "just now");
        assert_eq!(aged(5).age_display(), "5m ago");
        assert_eq!(aged(89).age_display(), "1h ago");
        assert_eq!(aged(90).age_display(), "2h ago");
        assert_eq!(aged(1440 + 719).age_display(), "1d ago");
        assert_eq!(aged(1440 + 720).age_display(), "2d ago");
    }

    #[test]
    fn test_is_stale() {
        assert!(!CachedData::new(vec![1]).is_stale());
        assert!(aged(61).is_stale());
    }

    #[test]
    fn test_save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().join("cache")).unwrap();
        assert!(cache.load_dashboard().unwrap().is_none());
        assert_eq!(CacheAges::display(&cache.get_cache_ages().dashboard), "never");

        let stats = DashboardStats {
            total_medicines: 3,
            total_inventory_value: 10.0,
            low_stock_items: 1,
            expiring_soon: 0,
        };
        cache.save_dashboard(&stats).unwrap();
        let loaded = cache.load_dashboard().unwrap().unwrap();
        assert_eq!(loaded.data, stats);
        assert_eq!(cache.get_cache_ages().dashboard.as_deref(), Some("just now"));

        cache.clear().unwrap();
        assert!(cache.load_dashboard().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("alerts.json"), "[").unwrap();
        assert!(cache.load_alerts().is_err());
        assert!(cache.get_cache_ages().alerts.is_none());
    }
}
