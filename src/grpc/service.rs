//! Throttle service implementation.

use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, instrument, warn};

use super::proto::authguard::throttle::v1::{
    check_response::Code, throttle_service_server::ThrottleService, CheckRequest, CheckResponse,
    ResetRequest, ResetResponse,
};

use crate::error::GuardError;
use crate::ratelimit::{client_ip, ThrottleBackend};

/// Implementation of the ThrottleService gRPC interface.
pub struct ThrottleServiceImpl<B: ThrottleBackend> {
    backend: Arc<B>,
}

impl<B: ThrottleBackend> ThrottleServiceImpl<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

/// Pick the caller identity: an explicit key wins, otherwise the client IP
/// is taken from the forwarded headers.
fn resolve_client(key: &str, forwarded_for: &str, real_ip: &str) -> String {
    let key = key.trim();
    if !key.is_empty() {
        return key.to_string();
    }
    // Proto3 strings default to empty, which client_ip treats as absent.
    client_ip(Some(forwarded_for), Some(real_ip))
}

fn validate_policy(policy: &str) -> Result<(), Status> {
    if policy.is_empty() {
        warn!("Received throttle request with empty policy");
        return Err(Status::invalid_argument("policy is required"));
    }
    Ok(())
}

fn to_status(err: GuardError) -> Status {
    match err {
        GuardError::UnknownPolicy(name) => Status::not_found(format!("unknown policy: {}", name)),
        other => Status::internal(other.to_string()),
    }
}

#[tonic::async_trait]
impl<B: ThrottleBackend + 'static> ThrottleService for ThrottleServiceImpl<B> {
    /// Register an attempt and report whether it may proceed.
    #[instrument(skip(self, request), fields(policy = %request.get_ref().policy))]
    async fn check(
        &self,
        request: Request<CheckRequest>,
    ) -> Result<Response<CheckResponse>, Status> {
        let req = request.into_inner();
        validate_policy(&req.policy)?;

        let client = resolve_client(&req.key, &req.forwarded_for, &req.real_ip);
        debug!(client = %client, "Processing check request");

        let verdict = self
            .backend
            .check(&req.policy, &client)
            .await
            .map_err(to_status)?;

        let code = if verdict.decision.allowed {
            Code::Ok
        } else {
            Code::OverLimit
        };

        Ok(Response::new(CheckResponse {
            code: code.into(),
            remaining: verdict.decision.remaining,
            retry_after_seconds: verdict.decision.retry_after_secs,
            message: verdict.message.unwrap_or_default(),
        }))
    }

    /// Clear the caller's attempts after a successful authentication.
    #[instrument(skip(self, request), fields(policy = %request.get_ref().policy))]
    async fn reset(
        &self,
        request: Request<ResetRequest>,
    ) -> Result<Response<ResetResponse>, Status> {
        let req = request.into_inner();
        validate_policy(&req.policy)?;

        let client = resolve_client(&req.key, &req.forwarded_for, &req.real_ip);
        debug!(client = %client, "Processing reset request");

        self.backend
            .reset(&req.policy, &client)
            .await
            .map_err(to_status)?;

        Ok(Response::new(ResetResponse {}))
    }
}
