use std::time::{Duration, Instant};

/// Token bucket applied to the frames of a single connection.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration, // one token per period
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens();

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self) {
        if self.refill_rate.is_zero() {
            self.tokens = self.max_tokens;
            return;
        }

        let elapsed = self.last_refill.elapsed();
        let periods = (elapsed.as_millis() / self.refill_rate.as_millis().max(1)) as u32;
        if periods > 0 {
            self.tokens = self.tokens.saturating_add(periods).min(self.max_tokens);
            self.last_refill += self.refill_rate * periods;
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill_tokens();
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(30, Duration::from_secs(2))
    }
}
