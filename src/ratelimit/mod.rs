//! Attempt throttling logic and state management.

mod backend;
mod clock;
mod key;
mod limiter;
mod policy;
mod record;
mod throttle;

pub use backend::ThrottleBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{client_ip, ThrottleKey, UNKNOWN_CLIENT};
pub use limiter::{
    RateLimiter, SweeperHandle, DEFAULT_MAX_ATTEMPTS, DEFAULT_SWEEP_INTERVAL, DEFAULT_WINDOW_MS,
};
pub use policy::{Policy, PolicySet};
pub use record::{RateLimitDecision, RateLimitRecord};
pub use throttle::{Throttle, Verdict};
