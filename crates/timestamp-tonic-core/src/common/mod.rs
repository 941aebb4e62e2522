//! Shared protocol types, timestamp formatting and errors.
//!
//! - [`proto`] - Generated gRPC messages, client and server trait.
//! - [`format`] - Builds [`TimestampRecord`](proto::TimestampRecord)s.
//! - [`precision`] - Precision resolution and nanosecond truncation.
//! - [`error`] - Service error type and its `tonic::Status` mapping.

pub mod error;
pub mod format;
pub mod precision;

pub use error::{Error, Result};

pub mod proto {
    tonic::include_proto!("timestamp.v1");

    /// Encoded descriptor set for `timestamp.proto`, served through gRPC
    /// reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("timestamp_descriptor");
}
