//! Assembled client: one HTTP client, one session, every service.
//!
//! DESIGN
//! ======
//! `MathLlm::new` wires services around a single [`ApiClient`] and
//! [`SessionState`]. Nothing touches the network until
//! [`MathLlm::initialize`] is awaited; until then the session reads as
//! logged out.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::router::{History, Router};
use crate::services::admin_users::AdminUsersService;
use crate::services::auth::AuthService;
use crate::services::chat::ChatService;
use crate::services::invite_codes::InviteCodesService;
use crate::services::roles::RoleService;
use crate::state::SessionState;

#[derive(Clone, Debug)]
pub struct MathLlm {
    pub api: ApiClient,
    pub session: SessionState,
    pub auth: AuthService,
    pub roles: RoleService,
    pub chat: ChatService,
    pub admin_users: AdminUsersService,
    pub invite_codes: InviteCodesService,
    pub router: Router,
}

impl MathLlm {
    /// Build every service against the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(config)?;
        let session = SessionState::new();
        let history = History::new();
        let auth = AuthService::new(api.clone(), session.clone());
        let roles = RoleService::new(api.clone(), auth.clone(), Arc::new(history.clone()));
        let router = Router::new(Arc::new(roles.clone()), history);
        Ok(Self {
            chat: ChatService::new(api.clone()),
            admin_users: AdminUsersService::new(api.clone()),
            invite_codes: InviteCodesService::new(api.clone()),
            api,
            session,
            auth,
            roles,
            router,
        })
    }

    /// Resolve the initial session and role state.
    ///
    /// Returns whether the backend recognises the current session.
    pub async fn initialize(&self) -> bool {
        let authenticated = self.auth.initialize().await;
        if authenticated {
            self.roles.initialize().await;
        }
        tracing::info!(authenticated, backend = %self.api.base_url(), "client initialized");
        authenticated
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
