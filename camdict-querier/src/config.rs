use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_HOST: &str = "dictionary.cambridge.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_ERROR_TTL_SECS: u64 = 24 * 60 * 60;
/// Upper bound for configured cache lifetimes (ten years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * DEFAULT_ERROR_TTL_SECS;
/// Upper bound for configured parse workers.
pub const MAX_WORKERS: usize = 1024;

/// The site rejects obvious bots on some endpoints.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Where and how the remote querier talks to the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub scheme: String,
    pub host: String,
    /// Added to every request.
    pub extra_headers: BTreeMap<String, String>,
    pub timeout_secs: Option<u64>,
    /// Parse workers; 0 means one per available CPU.
    pub max_workers: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            extra_headers: BTreeMap::from([(
                "User-Agent".to_string(),
                DEFAULT_USER_AGENT.to_string(),
            )]),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            max_workers: 0,
        }
    }
}

impl RemoteConfig {
    /// `scheme://host`, with blank parts replaced by the defaults.
    pub fn base_url(&self) -> String {
        let scheme = non_blank(&self.scheme, DEFAULT_SCHEME);
        let host = non_blank(&self.host, DEFAULT_HOST);
        format!("{scheme}://{host}")
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn non_blank<'a>(value: &'a str, default: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() { default } else { value }
}

/// Result caching in front of the remote querier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// How long a recorded failure is replayed before the site is asked again.
    pub error_ttl_secs: u64,
    /// Lifetime of successful results; none keeps them until restart.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            error_ttl_secs: DEFAULT_ERROR_TTL_SECS,
            ttl_secs: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    pub fn error_ttl(&self) -> Duration {
        Duration::from_secs(self.error_ttl_secs)
    }
}
