//! Role service: current user's roles and the admin access check.
//!
//! DESIGN
//! ======
//! Admin screens fail closed: a user without the `Admin` role who reaches an
//! admin check is logged out and sent to the auth screen rather than shown a
//! softer redirect. Role lookups (`has_role`, `is_admin`) read the last
//! fetched set and never touch the network.

use std::sync::Arc;

use tokio::sync::watch;

use super::auth::AuthService;
use crate::http::ApiClient;
use crate::router::{Navigator, RouteName};
use crate::state::RoleState;
use crate::types::UserInfo;

pub const ADMIN_ROLE: &str = "Admin";

#[derive(Clone)]
pub struct RoleService {
    api: ApiClient,
    auth: AuthService,
    navigator: Arc<dyn Navigator>,
    state: Arc<watch::Sender<RoleState>>,
}

impl std::fmt::Debug for RoleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleService").field("state", &*self.state.borrow()).finish_non_exhaustive()
    }
}

impl RoleService {
    #[must_use]
    pub fn new(api: ApiClient, auth: AuthService, navigator: Arc<dyn Navigator>) -> Self {
        Self { api, auth, navigator, state: Arc::new(watch::Sender::new(RoleState::default())) }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Pre-populate the role set. Await before trusting [`RoleService::is_admin`].
    pub async fn initialize(&self) {
        if let Some(info) = self.fetch_user_info().await {
            self.set_roles(info.roles.into_iter().collect());
        }
    }

    /// Fetch the current user, or `None` if the backend does not answer with one.
    pub async fn fetch_user_info(&self) -> Option<UserInfo> {
        match self.api.send_json::<UserInfo>(self.api.get("/api/Auth/me")).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(error = %e, "error fetching user info");
                None
            }
        }
    }

    /// Confirm the current user is an admin.
    ///
    /// Anything short of a fetched user holding the `Admin` role logs the
    /// session out and navigates to the auth screen.
    pub async fn check_admin_access(&self) -> bool {
        self.state.send_modify(|s| s.loading = true);
        let granted = match self.fetch_user_info().await {
            Some(info) if info.has_role(ADMIN_ROLE) => {
                self.set_roles(info.roles.into_iter().collect());
                true
            }
            Some(info) => {
                tracing::warn!(user = %info.email, "admin access denied");
                false
            }
            None => false,
        };
        if !granted {
            self.set_roles(Vec::new());
            self.auth.logout().await;
            self.navigator.push(RouteName::Auth);
        }
        self.state.send_modify(|s| s.loading = false);
        granted
    }

    /// Screen-level admin gate: run the check and publish the result as
    /// [`RoleState::has_access`] for admin views to render from.
    pub async fn admin_access(&self) -> bool {
        let granted = self.check_admin_access().await;
        self.state.send_modify(|s| s.has_access = granted);
        granted
    }

    #[must_use]
    pub fn has_access(&self) -> bool {
        self.state.borrow().has_access
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.state.borrow().roles.iter().any(|r| r == role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.state.borrow().roles.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RoleState> {
        self.state.subscribe()
    }

    fn set_roles(&self, roles: Vec<String>) {
        self.state.send_modify(|s| s.roles = roles);
    }
}

#[cfg(test)]
#[path = "roles_test.rs"]
mod tests;
