//! Error types for the timestamp service.
//!
//! Callers of the service almost never observe these: request fields are
//! normalized rather than rejected, and streams end with `OK` whatever the
//! reason. The variants exist so the server can classify why a stream ended
//! and report it, and so the few real rejections map to a proper
//! `tonic::Status`.
//!
//! ## Error Cases
//! - `ChannelError`: The response channel to the client is gone.
//! - `RequestCancelled`: The client cancelled or disconnected mid-stream.
//! - `ServiceShutdown`: The service is shutting down.
//! - `InvalidConfig`: Server configuration failed validation.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the timestamp service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Internal channel send/receive failure (e.g. the receiver was dropped).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The client aborted the request.
    #[error("Request cancelled by client")]
    RequestCancelled,

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// A configuration value was out of range.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
            Error::RequestCancelled => Status::cancelled("Request was cancelled"),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
            Error::InvalidConfig { reason } => Status::invalid_argument(reason),
        }
    }
}
