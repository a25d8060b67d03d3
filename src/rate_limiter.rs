use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::config::Config;

pub const AD_CREATE_PATH: &str = "/open_api/v1.3/ad/create/";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token buckets keyed by endpoint path.
///
/// Endpoints without a dedicated bucket share the default one. Acquisition
/// suspends the caller until a token is available.
pub struct EndpointRateLimiter {
    buckets: HashMap<String, DirectLimiter>,
    default: DirectLimiter,
}

impl EndpointRateLimiter {
    pub fn new(default_per_sec: u32) -> Self {
        Self {
            buckets: HashMap::new(),
            default: RateLimiter::direct(per_second(default_per_sec)),
        }
    }

    /// Buckets used against the platform: ad creation gets its own.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_rate_per_sec)
            .with_endpoint(AD_CREATE_PATH, config.ad_create_rate_per_sec)
    }

    pub fn with_endpoint(mut self, path: &str, per_sec: u32) -> Self {
        self.buckets
            .insert(path.to_string(), RateLimiter::direct(per_second(per_sec)));
        self
    }

    pub fn has_dedicated_bucket(&self, path: &str) -> bool {
        self.buckets.contains_key(path)
    }

    /// Wait for one token from the bucket serving `path`.
    pub async fn acquire(&self, path: &str) {
        let limiter = self.buckets.get(path).unwrap_or(&self.default);
        if limiter.check().is_err() {
            tracing::debug!("Rate limiting: waiting for a token on {}", path);
            limiter.until_ready().await;
        }
    }
}

fn per_second(n: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}
