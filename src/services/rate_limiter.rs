//! Rate-limited HTTP client shared by the provider and translation clients
//!
//! Each upstream API gets its own client with a request quota and a
//! per-request timeout. There is no retry: a failed or timed-out request is
//! reported once and the caller decides what to do.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::providers::ProviderError;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request quota for one upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    /// Requests allowed back to back before the rate applies
    pub burst_size: u32,
}

impl RateLimitConfig {
    pub const IMDB: Self = Self::new(5, 10);
    /// TMDB tolerates about 40 requests per 10 seconds
    pub const TMDB: Self = Self::new(4, 10);
    pub const TRANSLATION: Self = Self::new(5, 10);

    pub const fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Zero values are raised to one
    fn quota(&self) -> Quota {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        Quota::per_second(rate).allow_burst(burst)
    }
}

/// HTTP client that waits for its quota before every request
pub struct RateLimitedClient {
    http: Client,
    limiter: DirectLimiter,
    name: String,
}

impl RateLimitedClient {
    pub fn new(name: &str, config: RateLimitConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            http,
            limiter: RateLimiter::direct(config.quota()),
            name: name.to_string(),
        })
    }

    pub fn for_imdb(timeout: Duration) -> Result<Self, ProviderError> {
        Self::new("imdb", RateLimitConfig::IMDB, timeout)
    }

    pub fn for_tmdb(timeout: Duration) -> Result<Self, ProviderError> {
        Self::new("tmdb", RateLimitConfig::TMDB, timeout)
    }

    pub fn for_translation(timeout: Duration) -> Result<Self, ProviderError> {
        Self::new("translate", RateLimitConfig::TRANSLATION, timeout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// GET with query parameters once the quota allows it
    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
    ) -> Result<Response, ProviderError> {
        self.limiter.until_ready().await;
        debug!(client = %self.name, url = %url, "Sending GET request");

        Ok(self.http.get(url).query(query).send().await?)
    }

    /// GET and decode a JSON body, mapping HTTP failures to [`ProviderError`]
    pub async fn get_json<R, Q>(&self, url: &str, query: &Q) -> Result<R, ProviderError>
    where
        R: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.get_with_query(url, query).await?;
        check_status(&self.name, url, response.status())?;

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

fn check_status(client: &str, url: &str, status: StatusCode) -> Result<(), ProviderError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
        StatusCode::UNAUTHORIZED => Err(ProviderError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(client = %client, url = %url, "Upstream rate limit hit");
            Err(ProviderError::RateLimited)
        }
        s => Err(ProviderError::Status(s.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_provider_quotas() {
        assert_eq!(RateLimitConfig::TMDB, RateLimitConfig::new(4, 10));
        assert_eq!(RateLimitConfig::IMDB.burst_size, 10);
    }

    #[test]
    fn test_zero_quota_is_clamped() {
        let client =
            RateLimitedClient::new("test", RateLimitConfig::new(0, 0), Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.name(), "test");
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status("t", "u", StatusCode::OK).is_ok());
        assert_matches!(
            check_status("t", "u", StatusCode::NOT_FOUND),
            Err(ProviderError::NotFound)
        );
        assert_matches!(
            check_status("t", "u", StatusCode::TOO_MANY_REQUESTS),
            Err(ProviderError::RateLimited)
        );
        assert_matches!(
            check_status("t", "u", StatusCode::BAD_GATEWAY),
            Err(ProviderError::Status(502))
        );
    }
}
