//! Client library for the MathLLM chat/assistant backend.
//!
//! ARCHITECTURE
//! ============
//! `http` builds the cookie-carrying request client, `state` holds the
//! observable session/list state, `services` wrap the REST endpoints,
//! `stream` decodes streamed assistant replies, and `router` evaluates
//! route guards before a view mounts. `client` wires them together.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod router;
pub mod services;
pub mod state;
pub mod stream;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::MathLlm;
pub use config::ClientConfig;
pub use error::{ApiError, Outcome, ProblemDetails};
