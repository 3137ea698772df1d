//! Client error taxonomy.
//!
//! DESIGN
//! ======
//! Every backend call returns `Result<T, ApiError>`. Non-2xx responses keep
//! the status and a classified body so callers can pick between the server's
//! own text, the error message, and a static fallback when rendering.
//! Registration is the one operation with an expected failure payload; it
//! returns [`Outcome`] instead of folding validation errors into `Err`.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A configuration value is missing or could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (connect, TLS, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("request failed with status {status}")]
    Status { status: u16, body: ResponseBody },

    /// A success response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// A streamed response carried bytes that are not valid UTF-8.
    #[error("stream decode failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Human-readable message for UI error slots.
    ///
    /// Prefers a string-valued response body, then the error's own message
    /// for failures that never reached a status line, then `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status { body: ResponseBody::Text(text), .. } => text.clone(),
            Self::Status { .. } => fallback.to_owned(),
            other => {
                let message = other.to_string();
                if message.is_empty() { fallback.to_owned() } else { message }
            }
        }
    }

    /// Like [`ApiError::user_message`], but a status error without a string
    /// body reports its own message; `fallback` is only used when that is empty.
    #[must_use]
    pub fn user_message_or_error(&self, fallback: &str) -> String {
        if let Self::Status { body: ResponseBody::Text(text), .. } = self {
            return text.clone();
        }
        let message = self.to_string();
        if message.is_empty() { fallback.to_owned() } else { message }
    }
}

// =============================================================================
// RESPONSE BODY
// =============================================================================

/// Body of a failed response, classified the way a browser client sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    /// Non-JSON text, or a JSON document that is a bare string.
    Text(String),
    Json(serde_json::Value),
}

impl ResponseBody {
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::String(s)) => Self::Text(s),
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text.to_owned()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

// =============================================================================
// VALIDATION PAYLOAD
// =============================================================================

/// RFC 7807 problem document returned by the backend on rejected input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Field name -> validation messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProblemDetails {
    /// Build a problem document from a failed response body.
    ///
    /// Returns `None` for an empty body: there is nothing structured to show.
    #[must_use]
    pub fn from_body(status: u16, body: &ResponseBody) -> Option<Self> {
        match body {
            ResponseBody::Empty => None,
            ResponseBody::Text(text) => Some(Self {
                status: Some(status),
                detail: Some(text.clone()),
                ..Self::default()
            }),
            ResponseBody::Json(value) => {
                let problem = serde_json::from_value::<Self>(value.clone()).unwrap_or_else(|_| {
                    let mut extra = serde_json::Map::new();
                    extra.insert("body".to_owned(), value.clone());
                    Self { status: Some(status), extra, ..Self::default() }
                });
                Some(problem)
            }
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of an operation whose expected failure carries a payload.
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    /// The backend rejected the input with a structured explanation.
    Rejected(ProblemDetails),
    /// Anything else: transport failure, unexpected status, parse error.
    Fault(ApiError),
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    #[must_use]
    pub fn problem(&self) -> Option<&ProblemDetails> {
        match self {
            Self::Rejected(problem) => Some(problem),
            _ => None,
        }
    }

    /// Collapse into a `Result`, treating rejection as success-with-payload.
    ///
    /// # Errors
    ///
    /// Returns the fault for [`Outcome::Fault`].
    pub fn into_result(self) -> Result<Result<T, ProblemDetails>, ApiError> {
        match self {
            Self::Ok(value) => Ok(Ok(value)),
            Self::Rejected(problem) => Ok(Err(problem)),
            Self::Fault(err) => Err(err),
        }
    }
}

impl<T> From<ApiError> for Outcome<T> {
    /// Failed responses with a body become rejections; the rest are faults.
    fn from(err: ApiError) -> Self {
        if let ApiError::Status { status, body } = &err {
            if let Some(problem) = ProblemDetails::from_body(*status, body) {
                return Self::Rejected(problem);
            }
        }
        Self::Fault(err)
    }
}
