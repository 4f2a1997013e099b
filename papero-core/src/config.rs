//! Client configuration read from the environment

use crate::error::PaperoError;
use std::time::Duration;

/// Base URL used when `PAPERO_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Transport timeout used when `PAPERO_HTTP_TIMEOUT_SECS` is not set
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for [`HttpReadingService`](crate::service::HttpReadingService)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root of the library service, without the `/api/v1` suffix
    pub base_url: String,

    /// Per-request transport timeout
    pub timeout: Duration,

    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("papero/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load from `PAPERO_API_URL` and `PAPERO_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, PaperoError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PaperoError> {
        let mut config = Self::default();

        if let Some(url) = lookup("PAPERO_API_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("PAPERO_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                PaperoError::Config(format!("PAPERO_HTTP_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            if secs == 0 {
                return Err(PaperoError::Config(
                    "PAPERO_HTTP_TIMEOUT_SECS must be at least 1".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
