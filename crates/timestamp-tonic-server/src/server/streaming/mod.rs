//! Per-call machinery for `StreamTimestamps`.
//!
//! - [`request`] - Normalizes a request into a [`request::StreamPlan`].
//! - [`processor`] - The emission loop run on a dedicated task per call.
//! - [`stream`] - Response stream that cancels the loop when tonic drops it.

pub mod processor;
pub mod request;
pub mod stream;
