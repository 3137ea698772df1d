//! Admin invite-code management.
//!
//! Mutations never patch the local list: a successful create or delete is
//! followed by a full refetch so the list always mirrors the backend.

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::state::{ListState, ListStore};
use crate::types::{CreateInviteCode, InviteCode};

#[derive(Clone, Debug)]
pub struct InviteCodesService {
    api: ApiClient,
    codes: ListStore<InviteCode>,
}

impl InviteCodesService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api, codes: ListStore::new() }
    }

    #[must_use]
    pub fn invite_codes(&self) -> ListState<InviteCode> {
        self.codes.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListState<InviteCode>> {
        self.codes.subscribe()
    }

    pub async fn fetch_invite_codes(&self) {
        self.codes.begin();
        match self.api.send_json::<Vec<InviteCode>>(self.api.get("/api/admin/invite-codes")).await {
            Ok(codes) => self.codes.replace_items(codes),
            Err(e) => self.record_failure(&e, "Failed to fetch invite codes"),
        }
        self.codes.finish();
    }

    pub async fn create_invite_code(&self, request: &CreateInviteCode) -> bool {
        self.codes.begin();
        let result = self.api.send_empty(self.api.post("/api/admin/invite-codes").json(request)).await;
        self.finish_mutation(result, "Failed to create invite code").await
    }

    pub async fn delete_invite_code(&self, id: Uuid) -> bool {
        self.codes.begin();
        let path = format!("/api/admin/invite-codes/{id}");
        let result = self.api.send_empty(self.api.delete(&path)).await;
        self.finish_mutation(result, "Failed to delete invite code").await
    }

    async fn finish_mutation(&self, result: Result<(), ApiError>, fallback: &str) -> bool {
        let ok = match result {
            Ok(()) => {
                self.fetch_invite_codes().await;
                true
            }
            Err(e) => {
                self.record_failure(&e, fallback);
                false
            }
        };
        self.codes.finish();
        ok
    }

    fn record_failure(&self, err: &ApiError, fallback: &str) {
        tracing::warn!(error = %err, "{fallback}");
        self.codes.fail(err.user_message(fallback));
    }
}

#[cfg(test)]
#[path = "invite_codes_test.rs"]
mod tests;
