//! Auth service: session check, login, registration, logout.
//!
//! DESIGN
//! ======
//! Owns every transition of [`SessionState`]. `check_auth` and `logout`
//! never fail from the caller's point of view: the first folds errors into
//! `false`, the second always ends with the session cleared locally even
//! when the backend call fails.

use crate::error::{ApiError, Outcome};
use crate::http::ApiClient;
use crate::state::SessionState;
use crate::types::{LoginRequest, RegisterRequest};

#[derive(Clone, Debug)]
pub struct AuthService {
    api: ApiClient,
    session: SessionState,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient, session: SessionState) -> Self {
        Self { api, session }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Establish the initial session state. Await before trusting
    /// [`AuthService::is_authenticated`].
    pub async fn initialize(&self) -> bool {
        self.check_auth().await
    }

    /// Ask the backend whether the session cookie is still valid.
    pub async fn check_auth(&self) -> bool {
        match self.api.send_empty(self.api.get("/api/Auth/me")).await {
            Ok(()) => {
                self.session.set_authenticated(true);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "session check failed");
                self.session.set_authenticated(false);
                false
            }
        }
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns the underlying request error; the session state is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = LoginRequest { email, password };
        self.api.send_empty(self.api.post("/api/auth/login").json(&body)).await?;
        self.session.set_authenticated(true);
        tracing::info!(%email, "logged in");
        Ok(())
    }

    /// Create an account and log straight into it.
    ///
    /// A failed response carrying a body (from either the registration or the
    /// follow-up login) is returned as [`Outcome::Rejected`]; anything else
    /// as [`Outcome::Fault`].
    pub async fn register(&self, email: &str, password: &str, invite_code: &str) -> Outcome<()> {
        let body = RegisterRequest { email, password, invite_code };
        let result = match self.api.send_empty(self.api.post("/api/auth/register").json(&body)).await {
            Ok(()) => self.login(email, password).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => Outcome::Ok(()),
            Err(e) => {
                let outcome = Outcome::from(e);
                if let Outcome::Rejected(problem) = &outcome {
                    tracing::info!(%email, title = ?problem.title, "registration rejected");
                }
                outcome
            }
        }
    }

    /// End the session. Always leaves the client logged out.
    pub async fn logout(&self) {
        if let Err(e) = self.api.send_empty(self.api.post("/api/Auth/logout").json(&serde_json::json!({}))).await {
            tracing::error!(error = %e, "error during logout");
        }
        self.api.remove_session_cookie();
        self.session.set_authenticated(false);
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
