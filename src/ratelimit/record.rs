//! Per-key attempt records and check outcomes.

/// Attempts registered for one key within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Attempts registered since the window started
    pub count: u32,
    /// Epoch milliseconds at which the window expires
    pub reset_at_ms: u64,
}

impl RateLimitRecord {
    /// Open a fresh window with the current attempt already counted.
    pub fn start(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_at_ms: now_ms.saturating_add(window_ms),
        }
    }

    /// A window is expired only once `now` is strictly past its reset time.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.reset_at_ms
    }

    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at_ms.saturating_sub(now_ms).div_ceil(1000)
    }
}

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the attempt may proceed
    pub allowed: bool,
    /// Attempts left in the current window
    pub remaining: u32,
    /// Seconds until the caller may try again. Only set on denial.
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    pub fn allow(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after_secs: None,
        }
    }

    pub fn deny(retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            retry_after_secs: Some(retry_after_secs),
        }
    }
}
