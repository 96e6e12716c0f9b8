//! gRPC server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::{error, info};

use super::proto::authguard::throttle::v1::throttle_service_server::ThrottleServiceServer;
use super::service::ThrottleServiceImpl;
use crate::error::{GuardError, Result};
use crate::ratelimit::ThrottleBackend;

/// gRPC server for the throttle service.
pub struct GrpcServer<B: ThrottleBackend + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The throttle backing the service
    backend: Arc<B>,
}

impl<B: ThrottleBackend + 'static> GrpcServer<B> {
    pub fn new(addr: SocketAddr, backend: Arc<B>) -> Self {
        Self { addr, backend }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the gRPC server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let service = ThrottleServiceImpl::new(self.backend);

        info!(addr = %self.addr, "Starting gRPC server for ThrottleService");

        Server::builder()
            .add_service(ThrottleServiceServer::new(service))
            .serve_with_shutdown(self.addr, signal)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                GuardError::Grpc(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{PolicySet, RateLimiter, Throttle};

    fn throttle() -> Arc<Throttle> {
        Arc::new(Throttle::new(
            Arc::new(RateLimiter::new()),
            PolicySet::default(),
        ))
    }

    #[test]
    fn test_server_creation() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let server = GrpcServer::new(addr, throttle());
        assert_eq!(server.addr(), addr);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown_signal() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = GrpcServer::new(addr, throttle());

        let result = server.serve_with_shutdown(async {}).await;
        assert!(result.is_ok());
    }
}
