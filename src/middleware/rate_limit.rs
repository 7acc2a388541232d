use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

// Smallest map size that triggers a sweep of refilled buckets
const MIN_SWEEP_AT: usize = 10_000;

#[derive(Debug)]
struct Buckets {
    map: HashMap<String, Bucket>,
    // Grows with the live set so sweeps stay amortized O(1) per request
    sweep_at: usize,
}

/// Per-client token bucket: `capacity` requests, refilled evenly over `window`.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<Buckets>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = f64::from(capacity.max(1));
        let window = window.as_secs_f64().max(f64::EPSILON);
        Self {
            buckets: Mutex::new(Buckets {
                map: HashMap::new(),
                sweep_at: MIN_SWEEP_AT,
            }),
            capacity,
            refill_per_sec: capacity / window,
        }
    }

    pub fn from_config(api: &ApiConfig) -> Self {
        Self::new(
            api.rate_limit_requests,
            Duration::from_secs(api.rate_limit_window_secs),
        )
    }

    pub async fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now()).await
    }

    async fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut lock = self.buckets.lock().await;
        let buckets = &mut *lock;

        // Full buckets carry no information; drop them so the map stays bounded
        if buckets.map.len() >= buckets.sweep_at {
            let (capacity, refill) = (self.capacity, self.refill_per_sec);
            buckets.map.retain(|_, b| {
                let elapsed = now.saturating_duration_since(b.last_refill).as_secs_f64();
                b.tokens + elapsed * refill < capacity
            });
            buckets.sweep_at = (buckets.map.len() * 2).max(MIN_SWEEP_AT);
        }

        let bucket = buckets.map.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rejects clients that exhausted their budget with 429.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.api.enable_rate_limiting {
        return next.run(request).await;
    }

    let key = client_key(
        request.headers(),
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
        state.config.api.trust_proxy,
    );
    if !state.limiter.allow(&key).await {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return ApiError::too_many_requests("Too many requests, try again later").into_response();
    }

    next.run(request).await
}

/// The socket peer address. Behind a trusted proxy, the first `x-forwarded-for`
/// hop instead, since the peer is always the proxy there.
fn client_key(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> String {
    if trust_proxy {
        if let Some(forwarded) = forwarded_for(headers) {
            return forwarded;
        }
    }
    peer.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    if first
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b':' || b == b'-')
    {
        Some(first.to_string())
    } else {
        None
    }
}
