use crate::orders::SyncSettings;
use snelstart_client::{RetryPolicy, SnelStartConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// Server configuration
///
/// # Environment
///
/// Every field can be overridden by an environment variable (a `.env` file
/// is loaded first by `main`):
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | database and log directory |
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | log level (`RUST_LOG` wins when set) |
/// | LOG_JSON | false | JSON log lines |
/// | SNELSTART_BASE_URL | https://b2bapi.snelstart.nl/v2 | ERP API base |
/// | SNELSTART_SUBSCRIPTION_KEY | (empty) | APIM subscription key |
/// | SNELSTART_ACCESS_TOKEN | (empty) | bearer token |
/// | GATEWAY_TIMEOUT_MS | 30000 | per-call ERP timeout |
/// | GATEWAY_MAX_RETRIES | 3 | client-internal retries |
/// | SYNC_MAX_ATTEMPTS | 5 | background attempt ceiling |
/// | SYNC_BASE_DELAY_MS | 2000 | exponential backoff base |
/// | SYNC_MAX_DELAY_MS | 300000 | backoff cap |
/// | SYNC_JITTER | 0.2 | ± jitter fraction |
/// | SYNC_CONCURRENCY | 5 | concurrent sync jobs |
/// | SYNC_SCAN_INTERVAL_MS | 1000 | queue scan interval |
/// | SYNC_FAIL_FAST_ON_PERMANENT | false | FAILED on first 4xx rejection |
/// | PRICE_CACHE_TTL_SECS | 60 | price cache TTL (0 disables) |
/// | AUDIT_BUFFER_SIZE | 1024 | audit channel capacity |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | graceful shutdown bound |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 SNELSTART_SUBSCRIPTION_KEY=... cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Database and logs live here
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,

    // === ERP ===
    pub snelstart_base_url: String,
    pub snelstart_subscription_key: String,
    pub snelstart_access_token: String,
    pub gateway_timeout_ms: u64,
    pub gateway_max_retries: u32,

    // === Background sync ===
    pub sync_max_attempts: u32,
    pub sync_base_delay_ms: u64,
    pub sync_max_delay_ms: u64,
    pub sync_jitter: f64,
    pub sync_concurrency: usize,
    pub sync_scan_interval_ms: u64,
    pub sync_fail_fast_on_permanent: bool,

    pub price_cache_ttl_secs: u64,
    pub audit_buffer_size: usize,
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load from environment variables, defaulting anything unset
    pub fn from_env() -> Self {
        Self {
            work_dir: env_string("WORK_DIR", "./data"),
            http_port: env_or("HTTP_PORT", 3000),
            environment: env_string("ENVIRONMENT", "development"),
            log_level: env_string("LOG_LEVEL", "info"),
            log_json: env_or("LOG_JSON", false),

            snelstart_base_url: env_string("SNELSTART_BASE_URL", snelstart_client::config::DEFAULT_BASE_URL),
            snelstart_subscription_key: env_string("SNELSTART_SUBSCRIPTION_KEY", ""),
            snelstart_access_token: env_string("SNELSTART_ACCESS_TOKEN", ""),
            gateway_timeout_ms: env_or("GATEWAY_TIMEOUT_MS", 30_000),
            gateway_max_retries: env_or("GATEWAY_MAX_RETRIES", 3),

            sync_max_attempts: env_or("SYNC_MAX_ATTEMPTS", 5),
            sync_base_delay_ms: env_or("SYNC_BASE_DELAY_MS", 2_000),
            sync_max_delay_ms: env_or("SYNC_MAX_DELAY_MS", 300_000),
            sync_jitter: env_or("SYNC_JITTER", 0.2),
            sync_concurrency: env_or("SYNC_CONCURRENCY", 5),
            sync_scan_interval_ms: env_or("SYNC_SCAN_INTERVAL_MS", 1_000),
            sync_fail_fast_on_permanent: env_or("SYNC_FAIL_FAST_ON_PERMANENT", false),

            price_cache_ttl_secs: env_or("PRICE_CACHE_TTL_SECS", 60),
            audit_buffer_size: env_or("AUDIT_BUFFER_SIZE", 1024),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10_000),
        }
    }

    /// Override part of the configuration
    ///
    /// Used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(crate::db::DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn snelstart_config(&self) -> SnelStartConfig {
        let retry = RetryPolicy {
            max_retries: self.gateway_max_retries,
            ..RetryPolicy::default()
        };
        SnelStartConfig::new(&self.snelstart_base_url)
            .with_subscription_key(&self.snelstart_subscription_key)
            .with_access_token(&self.snelstart_access_token)
            .with_timeout(self.gateway_timeout())
            .with_retry(retry)
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            max_attempts: self.sync_max_attempts.max(1),
            base_delay_ms: self.sync_base_delay_ms,
            max_delay_ms: self.sync_max_delay_ms.max(self.sync_base_delay_ms),
            jitter: self.sync_jitter.clamp(0.0, 1.0),
            fail_fast_on_permanent: self.sync_fail_fast_on_permanent,
        }
    }

    pub fn price_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.price_cache_ttl_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_settings() {
        let mut config = Config::with_overrides("/tmp/orders", 0);
        config.sync_jitter = 3.0;
        config.sync_max_attempts = 0;
        config.gateway_timeout_ms = 1_500;

        let sync = config.sync_settings();
        assert_eq!(sync.jitter, 1.0);
        assert_eq!(sync.max_attempts, 1);
        assert_eq!(config.gateway_timeout(), Duration::from_millis(1_500));
        assert!(config.db_path().ends_with("orders.redb"));
        assert!(config.log_dir().starts_with("/tmp/orders"));
    }

    #[test]
    fn test_snelstart_config() {
        let mut config = Config::with_overrides("/tmp/orders", 0);
        config.snelstart_subscription_key = "key".into();
        config.gateway_max_retries = 1;
        let sc = config.snelstart_config();
        assert_eq!(sc.subscription_key, "key");
        assert_eq!(sc.retry.max_retries, 1);
    }
}
