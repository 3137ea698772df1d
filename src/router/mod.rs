//! Client-side routes and the pre-navigation guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! A navigation resolves a path against the route table, runs the guard,
//! and commits either the target or a redirect to [`History`]. Views mount
//! only for committed locations, so a guarded target that is redirected
//! away never appears in history.

pub mod guard;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};

pub use guard::{AccessChecks, GuardDecision, evaluate_guard};

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Home,
    Auth,
    Logout,
    Chat,
    Users,
    InviteCodes,
}

impl RouteName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Auth => "auth",
            Self::Logout => "logout",
            Self::Chat => "chat",
            Self::Users => "users",
            Self::InviteCodes => "invite-codes",
        }
    }
}

impl std::fmt::Display for RouteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    /// Only consulted when `requires_auth` is also set.
    pub requires_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub name: RouteName,
    pub path: &'static str,
    pub meta: RouteMeta,
}

const PUBLIC: RouteMeta = RouteMeta { requires_auth: false, requires_admin: false };
const AUTHENTICATED: RouteMeta = RouteMeta { requires_auth: true, requires_admin: false };
const ADMIN: RouteMeta = RouteMeta { requires_auth: true, requires_admin: true };

pub static ROUTES: [Route; 6] = [
    Route { name: RouteName::Home, path: "/", meta: PUBLIC },
    Route { name: RouteName::Auth, path: "/auth", meta: PUBLIC },
    Route { name: RouteName::Logout, path: "/logout", meta: AUTHENTICATED },
    Route { name: RouteName::Chat, path: "/chat/:chatId?", meta: AUTHENTICATED },
    Route { name: RouteName::Users, path: "/users", meta: ADMIN },
    Route { name: RouteName::InviteCodes, path: "/invite-codes", meta: ADMIN },
];

/// Route table entry for `name`.
#[must_use]
pub fn route(name: RouteName) -> &'static Route {
    ROUTES.iter().find(|r| r.name == name).unwrap_or(&ROUTES[0])
}

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: RouteName,
    /// `chatId` segment of `/chat/:chatId?`.
    pub chat_id: Option<String>,
}

impl Location {
    #[must_use]
    pub fn named(name: RouteName) -> Self {
        Self { name, chat_id: None }
    }

    #[must_use]
    pub fn route(&self) -> &'static Route {
        route(self.name)
    }
}

/// Match a path against the route table. Query string, fragment and a
/// trailing slash are ignored.
#[must_use]
pub fn resolve(path: &str) -> Option<Location> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => Some(Location::named(RouteName::Home)),
        ["auth"] => Some(Location::named(RouteName::Auth)),
        ["logout"] => Some(Location::named(RouteName::Logout)),
        ["chat"] => Some(Location::named(RouteName::Chat)),
        ["chat", id] => Some(Location { name: RouteName::Chat, chat_id: Some((*id).to_owned()) }),
        ["users"] => Some(Location::named(RouteName::Users)),
        ["invite-codes"] => Some(Location::named(RouteName::InviteCodes)),
        _ => None,
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Sink for programmatic navigation requested outside the router.
pub trait Navigator: Send + Sync {
    fn push(&self, name: RouteName);
}

/// Committed locations, oldest first. Clones share one history.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Arc<Mutex<Vec<Location>>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&self, location: Location) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).push(location);
    }

    #[must_use]
    pub fn current(&self) -> Option<Location> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Location> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for History {
    fn push(&self, name: RouteName) {
        tracing::debug!(route = %name, "programmatic navigation");
        self.commit(Location::named(name));
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("no route matches '{0}'")]
    NotFound(String),
}

/// Guarded navigation over the route table.
#[derive(Clone)]
pub struct Router {
    checks: Arc<dyn AccessChecks>,
    history: History,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").field("history", &self.history).finish_non_exhaustive()
    }
}

impl Router {
    #[must_use]
    pub fn new(checks: Arc<dyn AccessChecks>, history: History) -> Self {
        Self { checks, history }
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Navigate to `path`, returning the location that was actually committed.
    ///
    /// Redirect targets (`home`, `auth`) are public, so they are committed
    /// without a second guard pass.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NotFound`] if no route matches `path`.
    pub async fn navigate(&self, path: &str) -> Result<Location, RouterError> {
        let target = resolve(path).ok_or_else(|| RouterError::NotFound(path.to_owned()))?;
        let location = match evaluate_guard(self.checks.as_ref(), target.route()).await {
            GuardDecision::Proceed => target,
            GuardDecision::Redirect(name) => {
                tracing::info!(from = %target.name, to = %name, "navigation redirected");
                Location::named(name)
            }
        };
        self.history.commit(location.clone());
        Ok(location)
    }
}
