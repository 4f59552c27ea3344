//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `SessionStore`: Durable token/user persistence over a `Storage` backend
//! - `token`: Unverified, fail-closed expiry checks on bearer tokens
//! - `AuthContext`: The loading/unauthenticated/authenticated state machine
//! - `RouteGuard`: Allow/redirect decisions for protected routes
//! - `AuthProvider`: The external token issuer, real or simulated

pub mod context;
pub mod guard;
pub mod provider;
pub mod store;
pub mod token;

pub use context::{AuthContext, AuthError, AuthState};
pub use guard::{GuardDecision, Route, RouteGuard};
pub use provider::{AuthGrant, AuthProvider, SimulatedAuthProvider};
pub use store::{FileStorage, KeyringStorage, MemoryStorage, SessionStore, Storage};
pub use token::{decode_token, is_token_expired, is_token_expired_at, Claims};
