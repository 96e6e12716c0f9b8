//! gRPC server module for the throttle service.

mod server;
mod service;

pub use server::GrpcServer;
pub use service::ThrottleServiceImpl;

// Include the generated protobuf code
pub mod proto {
    pub mod authguard {
        pub mod throttle {
            pub mod v1 {
                tonic::include_proto!("authguard.throttle.v1");
            }
        }
    }
}

// Re-export commonly used types
pub use proto::authguard::throttle::v1::{
    check_response::Code, throttle_service_server::ThrottleServiceServer, CheckRequest,
    CheckResponse, ResetRequest, ResetResponse,
};
