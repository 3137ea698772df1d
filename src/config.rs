//! Client configuration parsed from environment variables.

use reqwest::Url;

use crate::error::ApiError;

pub const BACKEND_ADDRESS_VAR: &str = "MATHLLM_BACKEND_ADDRESS";
pub const CONNECT_TIMEOUT_VAR: &str = "MATHLLM_CONNECT_TIMEOUT_SECS";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base address without a trailing slash.
    pub base_url: String,
    pub connect_timeout_secs: u64,
}

impl ClientConfig {
    /// Config for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self { base_url: parse_base_url(base_url)?, connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS })
    }

    /// Build typed config from process environment variables.
    ///
    /// Required:
    /// - `MATHLLM_BACKEND_ADDRESS`: backend base address
    ///
    /// Optional:
    /// - `MATHLLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the address is missing or malformed.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the address is missing or malformed.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(BACKEND_ADDRESS_VAR).ok_or_else(|| ApiError::Config(format!("{BACKEND_ADDRESS_VAR} not set")))?;
        let base_url = parse_base_url(&raw)?;
        let connect_timeout_secs = lookup(CONNECT_TIMEOUT_VAR)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        Ok(Self { base_url, connect_timeout_secs })
    }

    /// Parsed form of [`ClientConfig::base_url`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the stored address no longer parses.
    pub fn url(&self) -> Result<Url, ApiError> {
        Url::parse(&self.base_url).map_err(|e| ApiError::Config(format!("invalid backend address: {e}")))
    }
}

fn parse_base_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| ApiError::Config(format!("invalid backend address '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_owned()),
        other => Err(ApiError::Config(format!("unsupported backend scheme '{other}' (expected http or https)"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
