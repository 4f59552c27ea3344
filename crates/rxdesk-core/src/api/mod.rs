//! REST API client module for the pharmacy backend.
//!
//! This module provides the `ApiClient` for the inventory, analytics,
//! alerts, safety and auth endpoints, and the `InventoryBackend` seam that
//! lets a simulated in-memory backend stand in for the server.
//!
//! Authenticated requests carry the session's bearer token.

pub mod client;
pub mod error;
pub mod inventory;

pub use client::ApiClient;
pub use error::ApiError;
pub use inventory::{ImportSummary, InventoryBackend, SimulatedInventory};
