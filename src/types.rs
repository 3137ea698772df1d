//! Wire and domain types for the backend REST API.
//!
//! DESIGN
//! ======
//! DTOs mirror the backend's camelCase JSON. Where the client-side shape
//! differs (chat messages), the DTO stays private to its service and a
//! domain type is exposed instead.

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub invite_code: &'a str,
}

/// Current user as reported by `GET /api/Auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl UserInfo {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Minimal user reference embedded in admin payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReference {
    pub id: Uuid,
    pub email: String,
}

// =============================================================================
// CHAT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChat {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub chat_id: Uuid,
    pub text: &'a str,
}

/// Who authored a chat message, from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Bot,
    User,
}

impl MessageSender {
    /// Map the backend role name: `Assistant` is the bot, anything else the user.
    #[must_use]
    pub fn from_backend_role(role: &str) -> Self {
        if role == "Assistant" { Self::Bot } else { Self::User }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub time: String,
    pub text: String,
    #[serde(rename = "type")]
    pub sender: MessageSender,
}

/// One page of `GET /api/Tasks/problems`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemsPage {
    #[serde(default)]
    pub items: Vec<ProblemSummary>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Backend-specific fields passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// =============================================================================
// ADMIN
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub max_usages: u32,
    pub current_usages: u32,
    pub created_at: String,
    pub created_by: UserReference,
    #[serde(default)]
    pub used_by: Vec<UserReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteCode {
    pub code: String,
    pub max_usages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed: bool,
    pub lockout_enabled: bool,
    pub lockout_end: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub used_invite_code: Option<UsedInviteCode>,
}

/// Invite code a user registered with, as embedded in [`AdminUser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedInviteCode {
    pub id: Uuid,
    pub code: String,
    pub created_at: String,
    pub created_by: UserReference,
}
