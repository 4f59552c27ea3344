//! The auth state machine.
//!
//! `AuthContext` owns the session store and an `AuthProvider`. It starts in
//! `Loading`, settles into `Authenticated` or `Unauthenticated` on `init`,
//! and moves between the two on login, register and logout.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::guard::{GuardDecision, Route, RouteGuard};
use super::provider::{AuthGrant, AuthProvider};
use super::store::SessionStore;
use super::token::is_token_expired;
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Unauthenticated,
    Authenticated(User),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Name, email and password are required")]
    MissingRegistrationFields,

    #[error("Login failed. Please check your credentials.")]
    LoginFailed { reason: String },

    #[error("Registration failed. Please try again.")]
    RegistrationFailed { reason: String },
}

impl AuthError {
    /// Underlying cause, for logs.
    pub fn reason(&self) -> Option<&str> {
        match self {
            AuthError::LoginFailed { reason } | AuthError::RegistrationFailed { reason } => {
                Some(reason)
            }
            _ => None,
        }
    }
}

pub struct AuthContext<P> {
    store: SessionStore,
    provider: P,
    state: AuthState,
}

impl<P: AuthProvider> AuthContext<P> {
    pub fn new(store: SessionStore, provider: P) -> Self {
        Self {
            store,
            provider,
            state: AuthState::Loading,
        }
    }

    /// Restore the session from the store. Never contacts the provider.
    pub fn init(&mut self) -> &AuthState {
        let token = self.store.get_token();
        let saved_user = self.store.get_user();

        self.state = match (token, saved_user) {
            (Some(token), Some(user)) if !is_token_expired(&token) => {
                debug!(user_id = user.id, "Restored session");
                AuthState::Authenticated(user)
            }
            (token, _) => {
                if token.is_some() {
                    info!("Stored session is stale, discarding");
                }
                self.store.clear();
                AuthState::Unauthenticated
            }
        };
        &self.state
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Route, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        match self.provider.login(email.trim(), password).await {
            Ok(grant) => {
                self.accept(grant);
                info!("Login successful");
                Ok(Route::Dashboard)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                Err(AuthError::LoginFailed {
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Route, AuthError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingRegistrationFields);
        }

        match self.provider.register(name.trim(), email.trim(), password).await {
            Ok(grant) => {
                self.accept(grant);
                info!("Registration successful");
                Ok(Route::Dashboard)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                Err(AuthError::RegistrationFailed {
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    /// End the session. Returns where to navigate next.
    pub fn logout(&mut self) -> Route {
        self.store.clear();
        self.state = AuthState::Unauthenticated;
        info!("Logged out");
        Route::Login
    }

    /// Drop the user if its backing token has disappeared or expired.
    pub fn revalidate(&mut self) -> &AuthState {
        if let AuthState::Authenticated(_) = self.state {
            let fresh = self
                .store
                .get_token()
                .map(|t| !is_token_expired(&t))
                .unwrap_or(false);
            if !fresh {
                info!("Session token expired");
                self.logout();
            }
        }
        &self.state
    }

    /// Revalidate, then run the route guard for `route`.
    pub fn navigate(&mut self, route: Route) -> GuardDecision {
        self.revalidate();
        RouteGuard::check(&self.state, route)
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Loading
    }

    /// Bearer token for API calls, only while authenticated.
    pub fn token(&self) -> Option<String> {
        self.user()?;
        self.store.get_token()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn accept(&mut self, grant: AuthGrant) {
        self.store.set_token(&grant.token);
        self.store.set_user(&grant.user);
        self.state = AuthState::Authenticated(grant.user);
    }
}
