//! Local snapshots of fetched data for offline reads.
//!
//! `CacheManager` keeps one JSON file per dataset (medicines, stock,
//! alerts, dashboard figures). Snapshots are considered stale after 60
//! minutes.

pub mod manager;

pub use manager::{CacheAges, CacheManager, CachedData};
