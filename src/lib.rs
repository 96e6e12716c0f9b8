//! Authguard - Authentication Attempt Throttling
//!
//! This crate bounds how many authentication attempts a caller (usually a
//! client IP) may make within a fixed window. Attempts are counted in process
//! memory, expired records are swept in the background, and a small gRPC
//! service lets login handlers check and reset attempts.

pub mod config;
pub mod error;
pub mod grpc;
pub mod ratelimit;
pub mod reload;
