use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket shared by every task that talks to the data provider.
///
/// One token is refilled every `min_spacing`, up to `burst` tokens. With
/// `burst = 1` calls are spaced at least `min_spacing` apart regardless of
/// how many workers are calling. A zero spacing disables the gate.
#[derive(Clone, Debug)]
pub struct RateGate {
    inner: Option<Arc<Mutex<Bucket>>>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    capacity: u32,
    refill_every: Duration,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        if self.tokens >= self.capacity {
            self.last_refill = now;
            return;
        }
        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = elapsed.as_nanos() / self.refill_every.as_nanos();
        if earned == 0 {
            return;
        }
        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(earned).min(self.capacity);
        if self.tokens >= self.capacity {
            self.last_refill = now;
        } else {
            self.last_refill += self.refill_every * earned;
        }
    }
}

impl RateGate {
    pub fn new(min_spacing: Duration, burst: u32) -> Self {
        if min_spacing.is_zero() {
            return Self::unlimited();
        }
        let capacity = burst.max(1);
        Self {
            inner: Some(Arc::new(Mutex::new(Bucket {
                tokens: capacity,
                capacity,
                refill_every: min_spacing,
                last_refill: Instant::now(),
            }))),
        }
    }

    pub fn unlimited() -> Self {
        Self { inner: None }
    }

    /// Waits until a token is available and takes it.
    pub async fn acquire(&self) {
        let Some(inner) = &self.inner else {
            return;
        };
        loop {
            let wait = {
                let mut bucket = inner.lock().await;
                let now = Instant::now();
                bucket.refill(now);

                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return;
                }

                let since = now.saturating_duration_since(bucket.last_refill);
                bucket.refill_every.saturating_sub(since)
            };

            tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate gate saturated, waiting.");
            tokio::time::sleep(wait).await;
        }
    }
}
