//! Shared request gate: a token bucket for rate plus a semaphore for
//! in-flight requests.
//!
//! One gate is built per batch run and cloned into every client that talks
//! to an upstream service, including the graph writer.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ThrottleConfig;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Invalid throttle configuration: {0}")]
    InvalidConfig(String),
    #[error("Request gate closed")]
    Closed,
}

/// Rate and concurrency limit shared by every request of a run
#[derive(Clone)]
pub struct RequestGate {
    limiter: Option<Arc<DirectLimiter>>,
    permits: Arc<Semaphore>,
}

/// Held for the duration of one request
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl RequestGate {
    pub fn from_config(config: &ThrottleConfig) -> Result<Self, GateError> {
        let rate = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            GateError::InvalidConfig("requests_per_second must be positive".to_string())
        })?;
        let burst = NonZeroU32::new(config.burst)
            .ok_or_else(|| GateError::InvalidConfig("burst must be positive".to_string()))?;
        if config.max_concurrent_requests == 0 {
            return Err(GateError::InvalidConfig(
                "max_concurrent_requests must be positive".to_string(),
            ));
        }

        let quota = Quota::per_second(rate).allow_burst(burst);
        Ok(Self {
            limiter: Some(Arc::new(RateLimiter::direct(quota))),
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests as usize)),
        })
    }

    /// A gate that never waits
    pub fn unthrottled() -> Self {
        Self {
            limiter: None,
            permits: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
        }
    }

    /// Wait for a concurrency slot, then for a rate token
    pub async fn acquire(&self) -> Result<GatePermit, GateError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GateError::Closed)?;

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        Ok(GatePermit { _permit: permit })
    }

    /// Requests that could start right now without waiting for a slot
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

impl std::fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGate")
            .field("rate_limited", &self.limiter.is_some())
            .field("available_slots", &self.available_slots())
            .finish()
    }
}
