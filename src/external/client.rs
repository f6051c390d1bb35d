use std::time::Duration;

use crate::error::{AppError, AppResult};

/// User-Agent sent on every outbound request
pub const USER_AGENT: &str = concat!("loyalty-rs/", env!("CARGO_PKG_VERSION"));

/// Builds the shared outbound HTTP client.
///
/// One client is built at startup and cloned into every component that talks
/// to the user-service or the identity provider, so they share a connection pool.
///
/// # Features
/// - **Timeouts**: per-request timeout from configuration, 10s connect timeout
/// - **Compression**: gzip, deflate, brotli and zstd
/// - **HTTP/2**: adaptive window sizing and keep-alive
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Duration::from_secs(10))
        .http2_keep_alive_timeout(Duration::from_secs(20))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Configuration {
            key: "http_client".to_string(),
            source: e.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_user_agent_names_the_service() {
        assert!(USER_AGENT.starts_with("loyalty-rs/"));
    }
}
