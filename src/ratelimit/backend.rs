//! Throttle backend trait for abstracting where attempt state lives.

use async_trait::async_trait;

use super::throttle::Verdict;
use crate::error::Result;

/// Trait for throttle implementations.
///
/// The gRPC service only talks to this trait. [`super::Throttle`] keeps its
/// records in process memory; a store shared between replicas would be a
/// second implementation.
#[async_trait]
pub trait ThrottleBackend: Send + Sync {
    /// Register one attempt from `client` under the named policy.
    async fn check(&self, policy: &str, client: &str) -> Result<Verdict>;

    /// Clear the attempt record for `client` under the named policy.
    async fn reset(&self, policy: &str, client: &str) -> Result<()>;
}
