//! Request pacing policies.
//!
//! A worker awaits [`Throttle::pace`] after each delivered outcome and before
//! pulling its next candidate. Delay sampling and token accounting are plain
//! functions so they can be checked without a runtime.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;

use crate::error::{Result, SniperError};

/// Pacing policy shared by all scheduler workers
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until the calling worker may issue its next probe
    async fn pace(&self);

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// No pacing at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn pace(&self) {}

    fn describe(&self) -> String {
        "no delay".to_string()
    }
}

/// The same pause after every probe
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Throttle for FixedDelay {
    async fn pace(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }

    fn describe(&self) -> String {
        format!("fixed {}ms delay", self.0.as_millis())
    }
}

/// A uniformly random pause in `[min, max]` after every probe
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    min: Duration,
    max: Duration,
}

impl RandomDelay {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(SniperError::config(format!(
                "Minimum delay {}ms exceeds maximum delay {}ms",
                min.as_millis(),
                max.as_millis()
            )));
        }
        Ok(Self { min, max })
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self> {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let lo = self.min.as_micros() as u64;
        let hi = self.max.as_micros() as u64;
        Duration::from_micros(rand::thread_rng().gen_range(lo..=hi))
    }
}

#[async_trait]
impl Throttle for RandomDelay {
    async fn pace(&self) {
        let delay = self.sample();
        tracing::debug!(delay_ms = %delay.as_millis(), "Throttle delay");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn describe(&self) -> String {
        format!(
            "random {}-{}ms delay",
            self.min.as_millis(),
            self.max.as_millis()
        )
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Global rate limit shared across workers.
///
/// Tokens refill continuously at `rate` per second up to `burst`. A caller
/// that finds the bucket empty reserves a future token (the balance goes
/// negative) and sleeps until it is due, so waiters are served in order.
///
/// The bucket starts empty: each worker's first probe goes out before its
/// first `pace()`, so those probes already spend the initial burst.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(rate_per_sec: f64, burst: u32) -> Result<Self> {
        Self::starting_at(rate_per_sec, burst, Instant::now())
    }

    pub(crate) fn starting_at(rate_per_sec: f64, burst: u32, now: Instant) -> Result<Self> {
        if !rate_per_sec.is_finite() || rate_per_sec <= 0.0 {
            return Err(SniperError::config(format!(
                "Rate must be a positive number of probes per second, got {}",
                rate_per_sec
            )));
        }

        let burst = f64::from(burst.max(1));
        Ok(Self {
            rate: rate_per_sec,
            burst,
            state: Mutex::new(BucketState {
                tokens: 0.0,
                last_refill: now,
            }),
        })
    }

    /// Take one token at `now`, returning how long the caller must wait for it
    pub fn reserve_at(&self, now: Instant) -> Duration {
        let mut state = self.state.lock();

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
        if now > state.last_refill {
            state.last_refill = now;
        }

        state.tokens -= 1.0;
        if state.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-state.tokens / self.rate)
        }
    }
}

#[async_trait]
impl Throttle for TokenBucket {
    async fn pace(&self) {
        let wait = self.reserve_at(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(wait_ms = %wait.as_millis(), "Waiting for rate limit token");
            tokio::time::sleep(wait).await;
        }
    }

    fn describe(&self) -> String {
        format!("token bucket {:.2}/s (burst {})", self.rate, self.burst)
    }
}
