//! Exponential backoff with full jitter, shared by every attempt in the
//! ladder (§4.8). The webhook dispatcher uses a separately configured fixed
//! schedule, but follows the same `attempts/base/cap` policy shape (§9:
//! "encapsulate as a single reusable policy").

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Full-jitter delay for `attempt` (0-indexed): `random(0, min(cap, base * 2^attempt))`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let bound = exp.min(self.cap);
        if bound.is_zero() {
            return Duration::ZERO;
        }
        let millis = bound.as_millis().min(u64::MAX as u128) as u64;
        let jittered = rand::thread_rng().gen_range(0..=millis);
        Duration::from_millis(jittered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_never_exceeds_cap() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(8));
        for attempt in 0..8 {
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay <= Duration::from_secs(8));
        }
    }

    #[test]
    fn first_attempt_bounded_by_base() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(8));
        let delay = policy.delay_for_attempt(0);
        assert!(delay <= Duration::from_secs(1));
    }
}
