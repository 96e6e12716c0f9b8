//! Policy-aware throttling on top of the raw rate limiter.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::backend::ThrottleBackend;
use super::clock::{Clock, SystemClock};
use super::key::ThrottleKey;
use super::limiter::RateLimiter;
use super::policy::{Policy, PolicySet};
use super::record::RateLimitDecision;
use crate::error::{GuardError, Result};

/// Result of a throttled attempt, ready to surface to the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: RateLimitDecision,
    /// Rendered denial message. `None` when the attempt is allowed.
    pub message: Option<String>,
}

/// Applies named policies to callers using a shared [`RateLimiter`].
pub struct Throttle<C: Clock = SystemClock> {
    limiter: Arc<RateLimiter<C>>,
    policies: RwLock<PolicySet>,
}

impl<C: Clock> Throttle<C> {
    pub fn new(limiter: Arc<RateLimiter<C>>, policies: PolicySet) -> Self {
        Self {
            limiter,
            policies: RwLock::new(policies),
        }
    }

    /// Replace the active policy set.
    ///
    /// Existing records are kept; they pick up the new cap on their next check
    /// and the new window once the current one expires.
    pub fn set_policies(&self, policies: PolicySet) {
        let count = policies.len();
        *self.policies.write() = policies;
        info!(policies = count, "Throttling policies updated");
    }

    /// Get a copy of the active policy set.
    pub fn policies(&self) -> PolicySet {
        self.policies.read().clone()
    }

    pub fn limiter(&self) -> &Arc<RateLimiter<C>> {
        &self.limiter
    }

    fn policy(&self, name: &str) -> Result<Policy> {
        self.policies
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| GuardError::UnknownPolicy(name.to_string()))
    }

    /// Register one attempt from `client` under the named policy.
    pub fn check(&self, policy_name: &str, client: &str) -> Result<Verdict> {
        let policy = self.policy(policy_name)?;
        let key = ThrottleKey::new(&policy.namespace, client);

        let decision = self
            .limiter
            .check(&key.to_string(), policy.max_attempts, policy.window_ms);

        let message = match decision.retry_after_secs {
            Some(retry_after) if !decision.allowed => {
                warn!(
                    policy = %policy_name,
                    key = %key,
                    retry_after_secs = retry_after,
                    "Attempt throttled"
                );
                Some(policy.render_message(retry_after))
            }
            _ => None,
        };

        Ok(Verdict { decision, message })
    }

    /// Clear the attempt record for `client` under the named policy.
    pub fn reset(&self, policy_name: &str, client: &str) -> Result<()> {
        let policy = self.policy(policy_name)?;
        let key = ThrottleKey::new(&policy.namespace, client);
        self.limiter.reset(&key.to_string());
        debug!(policy = %policy_name, key = %key, "Attempts reset");
        Ok(())
    }
}

#[async_trait]
impl<C: Clock + 'static> ThrottleBackend for Throttle<C> {
    async fn check(&self, policy: &str, client: &str) -> Result<Verdict> {
        Throttle::check(self, policy, client)
    }

    async fn reset(&self, policy: &str, client: &str) -> Result<()> {
        Throttle::reset(self, policy, client)
    }
}
