use std::time::Duration;

use reqwest::Client;

use crate::domain::{
    DomainError,
    DomainResult,
};

const DEFAULT_POOL_SIZE: usize = 10;

/// Builds and holds the single HTTP client shared by every AWS client
pub struct HttpClientManager {
    client: Client,
}

impl HttpClientManager {
    pub fn new() -> DomainResult<Self> {
        Ok(Self {
            client: Self::create_optimized_client()?,
        })
    }

    /// `reqwest::Client` is reference counted internally, clones share the pool
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn create_optimized_client() -> DomainResult<Client> {
        let pool_size = std::env::var("DORA_METRICS_HTTP_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);

        Client::builder()
            .pool_max_idle_per_host(pool_size)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DomainError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))
    }
}
