//! Token-bucket rate limiter.
//!
//! One limiter is shared by every worker of a scan and caps the aggregate
//! request rate regardless of concurrency.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Token-bucket rate limiter for controlling request rate.
///
/// # Behavior
///
/// - Tokens refill continuously from elapsed time, not on a fixed tick
/// - Capacity is one second's worth of tokens (never less than one token)
/// - The bucket starts with a single token, so a fresh scan ramps up at the
///   configured rate instead of bursting
/// - Waiters queue on a fair mutex and are served in arrival order
/// - `acquire()` never fails, it only delays
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, rate: f64, capacity: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Creates a limiter allowing `rps` requests per second.
    ///
    /// `rps` must be finite and positive; callers validate it beforehand.
    pub fn new(rps: f64) -> Self {
        let capacity = rps.max(1.0);
        Self {
            rate: rps,
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: 1.0,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until a token is available, then consumes it.
    ///
    /// The bucket lock is held while sleeping for the deficit, so the next
    /// caller in line starts its own wait only after this one is served.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(self.rate, self.capacity);

        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            sleep(Duration::from_secs_f64(deficit / self.rate)).await;
            bucket.refill(self.rate, self.capacity);
        }

        // Sub-nanosecond rounding of the sleep can leave the bucket a hair short
        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
    }

    /// Configured rate in requests per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

/// Initializes a shared token-bucket rate limiter.
pub fn init_rate_limiter(rps: f64) -> std::sync::Arc<RateLimiter> {
    std::sync::Arc::new(RateLimiter::new(rps))
}
