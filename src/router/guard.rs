//! Pre-navigation guard.
//!
//! Evaluated strictly in order for one navigation: session check first,
//! admin check only when the session check passed and the route asks for it.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use super::{Route, RouteName};
use crate::services::roles::RoleService;

/// Checks the guard needs from the auth layer.
#[async_trait::async_trait]
pub trait AccessChecks: Send + Sync {
    async fn check_auth(&self) -> bool;
    async fn check_admin_access(&self) -> bool;
}

#[async_trait::async_trait]
impl AccessChecks for RoleService {
    async fn check_auth(&self) -> bool {
        self.auth().check_auth().await
    }

    async fn check_admin_access(&self) -> bool {
        RoleService::check_admin_access(self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(RouteName),
}

/// Decide whether navigation to `route` may proceed.
pub async fn evaluate_guard<C: AccessChecks + ?Sized>(checks: &C, route: &Route) -> GuardDecision {
    if !route.meta.requires_auth {
        return GuardDecision::Proceed;
    }
    if !checks.check_auth().await {
        tracing::debug!(route = %route.name, "unauthenticated, redirecting to auth");
        return GuardDecision::Redirect(RouteName::Auth);
    }
    if route.meta.requires_admin && !checks.check_admin_access().await {
        tracing::debug!(route = %route.name, "admin access denied, redirecting home");
        return GuardDecision::Redirect(RouteName::Home);
    }
    GuardDecision::Proceed
}
