use crate::config::RateLimitConfig;
use crate::error::LaunchpadError;
use crate::server::router::LaunchpadState;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

const UNKNOWN_CLIENT: &str = "unknown";

/// In-memory GCRA limiter keyed by client identity. Reset on restart.
#[derive(Clone)]
pub struct ClientRateLimiter {
    inner: Arc<DefaultKeyedRateLimiter<String>>,
}

impl ClientRateLimiter {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(cfg.per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(cfg.burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute).allow_burst(burst);
        Self {
            inner: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    pub fn check(&self, key: &str) -> Result<(), LaunchpadError> {
        self.inner.check_key(&key.to_string()).map_err(|_| {
            warn!(client = %key, "Rate limit exceeded");
            LaunchpadError::RateLimited
        })
    }

    /// Drop keys whose state has fully replenished.
    pub fn prune(&self) {
        self.inner.retain_recent();
        self.inner.shrink_to_fit();
        debug!(tracked = self.inner.len(), "Rate limiter pruned");
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map_or_else(|| UNKNOWN_CLIENT.to_string(), |addr| addr.ip().to_string())
}

/// Extractor that spends one unit of the caller's quota and exposes the client identity.
#[derive(Debug, Clone)]
pub struct RateLimit {
    pub client: String,
}

impl FromRequestParts<LaunchpadState> for RateLimit {
    type Rejection = LaunchpadError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &LaunchpadState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let client = client_key(&parts.headers, peer);
        state.limiter.check(&client)?;
        Ok(RateLimit { client })
    }
}
