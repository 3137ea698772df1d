//! Admin user list and promotion.

use tokio::sync::watch;
use uuid::Uuid;

use crate::http::ApiClient;
use crate::state::{ListState, ListStore};
use crate::types::AdminUser;

#[derive(Clone, Debug)]
pub struct AdminUsersService {
    api: ApiClient,
    users: ListStore<AdminUser>,
}

impl AdminUsersService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api, users: ListStore::new() }
    }

    #[must_use]
    pub fn users(&self) -> ListState<AdminUser> {
        self.users.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListState<AdminUser>> {
        self.users.subscribe()
    }

    /// Refresh the user list. Failures land in the list's `error` slot.
    pub async fn fetch_users(&self) {
        self.users.begin();
        match self.api.send_json::<Vec<AdminUser>>(self.api.get("/api/admin/users")).await {
            Ok(users) => self.users.replace_items(users),
            Err(e) => {
                tracing::warn!(error = %e, "error fetching users");
                self.users.fail(e.user_message_or_error("Failed to fetch users"));
            }
        }
        self.users.finish();
    }

    /// Grant the admin role to `user_id`, then refresh the list.
    pub async fn promote_to_admin(&self, user_id: Uuid) -> bool {
        let request = self
            .api
            .post("/api/admin/users/promote")
            .query(&[("userId", user_id.to_string())])
            .json(&serde_json::json!({}));
        match self.api.send_empty(request).await {
            Ok(()) => {
                tracing::info!(%user_id, "user promoted to admin");
                self.fetch_users().await;
                true
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "error promoting user");
                self.users.fail(e.user_message_or_error("Failed to promote user"));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "admin_users_test.rs"]
mod tests;
