use serde::Deserialize;
use std::time::Duration;

/// Configuration for outbound product page requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Whole-request deadline in seconds (default: 10)
    pub timeout_secs: u64,

    /// Largest accepted response body in bytes (default: 5 MiB)
    pub max_body_bytes: usize,

    /// Redirect hops followed before failing (default: 10)
    pub max_redirects: usize,

    /// User agent identifying the scraper
    pub user_agent: String,

    /// Accept-Language sent with every request
    pub accept_language: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_body_bytes: 5 * 1024 * 1024,
            max_redirects: 10,
            user_agent: "vitrine/0.1 (+gift registry link preview)".to_string(),
            accept_language: "pt-BR,pt;q=0.9,en;q=0.8".to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
