//! The external authority that issues tokens.
//!
//! `AuthProvider` is implemented by `ApiClient` for a real server and by
//! `SimulatedAuthProvider` for running without one.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use super::token::encode_unsigned;
use crate::models::{Role, User};

/// Default artificial latency of the simulated provider.
const SIMULATED_LATENCY_MS: u64 = 1000;

/// Lifetime of tokens issued by the simulated provider.
const SIMULATED_TOKEN_TTL_HOURS: i64 = 24;

/// A token together with the identity it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant>;

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthGrant>;
}

#[async_trait]
impl<T: AuthProvider + ?Sized> AuthProvider for Box<T> {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        (**self).login(email, password).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthGrant> {
        (**self).register(name, email, password).await
    }
}

/// Accepts any credentials after a short delay.
///
/// Login signs in as an admin named after the email's local part; register
/// creates a staff user. Tokens are unsigned but carry a real `exp`.
#[derive(Debug, Clone)]
pub struct SimulatedAuthProvider {
    latency: Duration,
    token_ttl: chrono::Duration,
}

impl SimulatedAuthProvider {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(SIMULATED_LATENCY_MS),
            token_ttl: chrono::Duration::hours(SIMULATED_TOKEN_TTL_HOURS),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    fn issue_token(&self, email: &str) -> String {
        let now = Utc::now();
        encode_unsigned(&json!({
            "sub": email,
            "iat": now.timestamp(),
            "exp": (now + self.token_ttl).timestamp(),
        }))
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for SimulatedAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for SimulatedAuthProvider {
    async fn login(&self, email: &str, _password: &str) -> Result<AuthGrant> {
        self.wait().await;

        let name = email.split('@').next().unwrap_or(email).to_string();
        let user = User {
            id: 1,
            email: email.to_string(),
            name,
            role: Role::Admin,
        };
        debug!(email, "Simulated login");

        Ok(AuthGrant {
            token: self.issue_token(email),
            user,
        })
    }

    async fn register(&self, name: &str, email: &str, _password: &str) -> Result<AuthGrant> {
        self.wait().await;

        let user = User {
            id: Utc::now().timestamp_millis(),
            email: email.to_string(),
            name: name.to_string(),
            role: Role::default(),
        };
        debug!(email, "Simulated registration");

        Ok(AuthGrant {
            token: self.issue_token(email),
            user,
        })
    }
}
