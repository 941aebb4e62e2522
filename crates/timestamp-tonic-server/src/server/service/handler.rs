//! gRPC service implementation for wall-clock timestamps.
//!
//! This module defines [`TimestampHandler`], the concrete implementation of
//! the [`TimestampService`] gRPC service defined in the protobuf schema.
//!
//! ## Responsibilities
//!
//! - Answer `GetCurrentTimestamp` with one record and the time spent on it.
//! - Spawn one emitter task per `StreamTimestamps` call via
//!   [`emit_timestamps`].
//! - Cancel every running stream on shutdown.
//!
//! Requests are never rejected for their content: precision, interval and
//! count are normalized, and the requested timezone is recorded in the span
//! but not applied.

use crate::server::{
    config::ServerConfig,
    streaming::{processor::emit_timestamps, request::StreamPlan, stream::CancelOnDrop},
    telemetry::{
        decrement_streams_inflight, increment_requests, increment_stream_terminations,
        increment_streams_inflight, record_processing_time, record_stream_duration,
    },
};
use core::pin::Pin;
use std::time::Instant;
use timestamp_tonic_core::{
    Error,
    format::{UTC, record_now},
    proto::{
        GetCurrentTimestampRequest, GetCurrentTimestampResponse, StreamTimestampsRequest,
        TimestampPrecision, TimestampRecord, timestamp_service_server::TimestampService,
    },
};
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::Instrument;

/// Message attached to every `GetCurrentTimestamp` record.
pub const CURRENT_TIMESTAMP_MESSAGE: &str = "Current timestamp response";

/// gRPC service for single-shot and streaming timestamps.
///
/// Cloning is cheap: clones share the same shutdown token, so shutting down
/// any clone stops the streams started through all of them.
#[derive(Clone)]
pub struct TimestampHandler {
    config: ServerConfig,
    shutdown: CancellationToken,
}

impl TimestampHandler {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancels every in-flight stream and rejects new ones.
    ///
    /// Idempotent. Streams end with `OK`; tonic's graceful shutdown can then
    /// drain them instead of waiting on unbounded emitters.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!("Cancelling in-flight timestamp streams");
        }
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

fn requested_timezone(timezone: &str) -> &str {
    if timezone.is_empty() { UTC } else { timezone }
}

#[tonic::async_trait]
impl TimestampService for TimestampHandler {
    type StreamTimestampsStream =
        Pin<Box<dyn Stream<Item = Result<TimestampRecord, Status>> + Send>>;

    /// Returns the current time at the requested precision.
    ///
    /// `processing_time_ns` covers the work done inside this handler, measured
    /// with a monotonic clock. This call always succeeds.
    #[tracing::instrument(
        skip_all,
        fields(
            source = %req.get_ref().source,
            timezone = requested_timezone(&req.get_ref().timezone),
        )
    )]
    async fn get_current_timestamp(
        &self,
        req: Request<GetCurrentTimestampRequest>,
    ) -> Result<Response<GetCurrentTimestampResponse>, Status> {
        let start = Instant::now();
        increment_requests("GetCurrentTimestamp");

        let req = req.into_inner();
        let precision = TimestampPrecision::from_wire(req.precision);
        let record = record_now(req.source, CURRENT_TIMESTAMP_MESSAGE, precision);

        let processing_time_ns = i64::try_from(start.elapsed().as_nanos()).unwrap_or(i64::MAX);
        record_processing_time(processing_time_ns);

        Ok(Response::new(GetCurrentTimestampResponse {
            timestamp_record: Some(record),
            processing_time_ns,
        }))
    }

    /// Streams records every `interval_ms` until `max_count` is reached or
    /// the call is cancelled.
    ///
    /// Every way a running stream can end (count reached, client gone,
    /// shutdown) closes the response with `OK`. Only calls that arrive after
    /// [`TimestampHandler::shutdown`] are refused, with `UNAVAILABLE`.
    #[tracing::instrument(
        skip_all,
        fields(
            source = %req.get_ref().source,
            timezone = requested_timezone(&req.get_ref().timezone),
            interval_ms = req.get_ref().interval_ms,
            max_count = req.get_ref().max_count,
        )
    )]
    async fn stream_timestamps(
        &self,
        req: Request<StreamTimestampsRequest>,
    ) -> Result<Response<Self::StreamTimestampsStream>, Status> {
        if self.is_shut_down() {
            increment_stream_terminations("rejected");
            return Err(Error::ServiceShutdown.into());
        }

        increment_requests("StreamTimestamps");
        increment_streams_inflight();

        let plan = StreamPlan::from(req.into_inner());
        tracing::debug!(?plan, "Starting timestamp stream");

        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<TimestampRecord, Status>>(self.config.stream_buffer_size);
        let cancel = self.shutdown.child_token();
        let shutdown = self.shutdown.clone();
        let start = Instant::now();

        let fut = {
            let cancel = cancel.clone();
            async move {
                let reason = match emit_timestamps(plan, resp_tx, cancel).await {
                    Ok(emitted) => {
                        tracing::debug!(emitted, "Stream reached max_count");
                        "completed"
                    }
                    Err(Error::RequestCancelled) if shutdown.is_cancelled() => {
                        tracing::debug!("Stream stopped by service shutdown");
                        "shutdown"
                    }
                    Err(e) => {
                        tracing::debug!("Stream ended by client: {}", e);
                        "client"
                    }
                };

                increment_stream_terminations(reason);
                decrement_streams_inflight();
                record_stream_duration(start.elapsed().as_millis() as f64);
            }
        };

        tokio::spawn(fut.instrument(tracing::info_span!("streaming")));

        let stream = CancelOnDrop::new(ReceiverStream::new(resp_rx), cancel);
        Ok(Response::new(Box::pin(stream)))
    }
}
