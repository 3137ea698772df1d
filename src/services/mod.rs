//! Backend-facing services.
//!
//! ARCHITECTURE
//! ============
//! Each service wraps one group of endpoints. `auth` and `roles` own the
//! shared session and role state; `chat`, `admin_users` and `invite_codes`
//! only translate requests and responses, the admin ones exposing their
//! list through an observable store.

pub mod admin_users;
pub mod auth;
pub mod chat;
pub mod invite_codes;
pub mod roles;
