//! HTTP client configuration module
//!
//! Centralizes timeouts and connection settings for the schedule API client.
//! Fetches are single-shot: there is no retry policy to configure.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Default bound on a whole schedule request, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(100);

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Total request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(45),
            user_agent: format!("confschedule/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for the schedule table endpoint
    pub fn schedule_api(timeout: Duration) -> Self {
        Self {
            // Never let the connect phase outlive the whole request
            connect_timeout: std::cmp::min(Duration::from_secs(15), timeout),
            timeout,
            ..Self::default()
        }
    }

    /// Build a reqwest client with this configuration
    pub fn build_client(&self) -> Result<Client, reqwest::Error> {
        ClientBuilder::new()
            .user_agent(self.user_agent.clone())
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .build()
    }
}
