//! Builds [`TimestampRecord`]s from the system clock.
//!
//! Formatting is infallible. The clock is read once per record and the
//! nanosecond fraction is truncated to the resolved precision. Records always
//! report `"UTC"`: no timezone conversion is performed, whatever the caller
//! asked for.

use crate::proto::{TimestampPrecision, TimestampRecord};
use prost_types::Timestamp;
use std::time::SystemTime;

/// Timezone label carried by every record.
pub const UTC: &str = "UTC";

/// Builds a record for the current instant.
pub fn record_now(
    source: impl Into<String>,
    message: impl Into<String>,
    precision: TimestampPrecision,
) -> TimestampRecord {
    record_at(SystemTime::now(), source, message, precision)
}

/// Builds a record for `now`.
///
/// Instants before the Unix epoch are normalized the protobuf way: negative
/// seconds with a non-negative nanosecond fraction.
pub fn record_at(
    now: SystemTime,
    source: impl Into<String>,
    message: impl Into<String>,
    precision: TimestampPrecision,
) -> TimestampRecord {
    let precision = precision.resolve();
    let Timestamp { seconds, nanos } = Timestamp::from(now);

    let mut record = TimestampRecord {
        timestamp: Some(Timestamp {
            seconds,
            nanos: precision.truncate_nanos(nanos),
        }),
        source: source.into(),
        message: message.into(),
        timezone: UTC.to_owned(),
        ..Default::default()
    };
    record.set_precision(precision);
    record
}
