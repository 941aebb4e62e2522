use super::request::StreamPlan;
use crate::server::telemetry::increment_timestamps_emitted;
use timestamp_tonic_core::{Error, format::record_now, proto::TimestampRecord};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Emits timestamp records for a single `StreamTimestamps` call.
///
/// Each iteration checks for cancellation and the requested count, builds a
/// record labelled `Stream timestamp #<n>` (1-based), sends it through
/// `resp_tx`, then sleeps for the plan's interval. Both the send and the sleep
/// race against `cancel`, so a cancelled call stops without waiting out a
/// full interval or a full response buffer.
///
/// # Returns
///
/// - `Ok(n)` once `n == max_count` records have been sent.
/// - [`Error::RequestCancelled`] when `cancel` fires.
/// - [`Error::ChannelError`] when the response receiver was dropped.
///
/// None of these reach the client as a status: the caller closes the
/// response channel and the RPC ends with `OK`.
pub async fn emit_timestamps(
    plan: StreamPlan,
    resp_tx: mpsc::Sender<Result<TimestampRecord, Status>>,
    cancel: CancellationToken,
) -> Result<u64, Error> {
    let mut emitted: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::RequestCancelled);
        }
        if plan.is_complete(emitted) {
            return Ok(emitted);
        }

        let record = record_now(
            plan.source.as_str(),
            format!("Stream timestamp #{}", emitted + 1),
            plan.precision,
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::RequestCancelled),
            sent = resp_tx.send(Ok(record)) => {
                if sent.is_err() {
                    return Err(Error::ChannelError {
                        context: "response receiver dropped".to_string(),
                    });
                }
            }
        }

        emitted += 1;
        increment_timestamps_emitted(1);
        tracing::trace!(emitted, "Sent stream timestamp");

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::RequestCancelled),
            () = tokio::time::sleep(plan.interval) => {}
        }
    }
}
