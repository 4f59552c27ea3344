//! Navigation targets and the guard that gates them on auth state.

use super::context::AuthState;

/// A destination in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Register,
    Dashboard,
    Inventory,
    Alerts,
    Analytics,
    Safety,
    Settings,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Inventory => "/dashboard/inventory",
            Route::Alerts => "/dashboard/alerts",
            Route::Analytics => "/dashboard/analytics",
            Route::Safety => "/dashboard/safety",
            Route::Settings => "/dashboard/settings",
        }
    }

    /// Requires a signed-in user.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Landing | Route::Login | Route::Register)
    }

    /// Only meaningful for signed-out visitors.
    pub fn is_guest_only(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session restore has not finished; show a placeholder.
    Pending,
    Redirect(Route),
    Allow,
}

pub struct RouteGuard;

impl RouteGuard {
    /// Decide whether `route` may render under `state`. One check per navigation.
    pub fn check(state: &AuthState, route: Route) -> GuardDecision {
        match state {
            AuthState::Loading => GuardDecision::Pending,
            AuthState::Unauthenticated if route.is_protected() => {
                GuardDecision::Redirect(Route::Login)
            }
            AuthState::Authenticated(_) if route.is_guest_only() => {
                GuardDecision::Redirect(Route::Dashboard)
            }
            _ => GuardDecision::Allow,
        }
    }
}
