//! Client configuration

use crate::RetryPolicy;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://b2bapi.snelstart.nl/v2";

/// Client configuration for connecting to the SnelStart API
#[derive(Debug, Clone)]
pub struct SnelStartConfig {
    /// API base URL (e.g., "https://b2bapi.snelstart.nl/v2")
    pub base_url: String,

    /// APIM subscription key (`Ocp-Apim-Subscription-Key` header)
    pub subscription_key: String,

    /// Bearer access token
    pub access_token: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Internal retry policy for transient failures
    pub retry: RetryPolicy,
}

impl SnelStartConfig {
    /// Create a new configuration with default timeout and retry policy
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            subscription_key: String::new(),
            access_token: String::new(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the subscription key
    pub fn with_subscription_key(mut self, key: impl Into<String>) -> Self {
        self.subscription_key = key.into();
        self
    }

    /// Set the access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a URL for a resource path
    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for SnelStartConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
