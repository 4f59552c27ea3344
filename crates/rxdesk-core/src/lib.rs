//! rxdesk core - session lifecycle and API client for the pharmacy
//! inventory dashboard.
//!
//! This crate provides:
//! - `auth`: Session store, token expiry checks, auth state machine, route guard
//! - `api`: REST client and the inventory backend seam
//! - `models`: Users, medicines, stock, alerts, analytics
//! - `cache`: Offline snapshots of fetched data
//! - `config`: Persistent application configuration

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, InventoryBackend, SimulatedInventory};
pub use auth::{AuthContext, AuthError, AuthProvider, AuthState};
pub use auth::{GuardDecision, Route, SessionStore};
pub use cache::CacheManager;
pub use config::Config;
