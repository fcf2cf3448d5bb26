use std::time::{Duration, Instant};

const DEFAULT_CAPACITY: u32 = 8;
const DEFAULT_REFILL: u32 = 4;
const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Per-session token bucket: a burst of `capacity` messages, then a steady
/// `refill` per `interval`. Refill is lazy and counted in whole intervals;
/// `last_refill` advances by the credited intervals rather than jumping to
/// now, so partial intervals are never lost.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: u32,
    capacity: u32,
    refill: u32,
    interval: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill: u32, interval: Duration) -> Self {
        Self::anchored(capacity, refill, interval, Instant::now())
    }

    /// Bucket anchored at an explicit start instant, for callers that drive
    /// the clock themselves.
    pub fn anchored(capacity: u32, refill: u32, interval: Duration, start: Instant) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill,
            interval,
            last_refill: start,
        }
    }

    pub fn consume(&mut self, n: u32) -> bool {
        self.consume_at(n, Instant::now())
    }

    pub fn consume_at(&mut self, n: u32, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let intervals = (elapsed.as_millis() / self.interval.as_millis()).min(u128::from(u32::MAX)) as u32;
        if intervals > 0 {
            let credit = intervals.saturating_mul(self.refill);
            self.tokens = self.tokens.saturating_add(credit).min(self.capacity);
            self.last_refill += self.interval * intervals;
        }
        if self.tokens >= n {
            self.tokens -= n;
            true
        } else {
            false
        }
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_REFILL, DEFAULT_INTERVAL)
    }
}
