//! gRPC service implementation.
//!
//! This module contains the client-facing side of the server: it implements
//! the generated `TimestampService` trait, hands streaming calls to their own
//! emitter task and coordinates cancellation at shutdown.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`TimestampHandler`).

pub mod handler;
