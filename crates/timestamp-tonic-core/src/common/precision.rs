//! Precision handling for timestamp records.
//!
//! A precision only ever affects the nanosecond fraction of a timestamp; the
//! seconds component is left untouched. Lower precisions truncate toward zero,
//! so a fraction of `999_999_999` at millisecond precision becomes
//! `999_000_000`, never a carry into the next second.

use crate::proto::TimestampPrecision;

const NANOS_PER_MILLI: i32 = 1_000_000;
const NANOS_PER_MICRO: i32 = 1_000;

impl TimestampPrecision {
    /// Maps `Unspecified` to `Nanoseconds`; every other value is returned as
    /// is.
    pub fn resolve(self) -> Self {
        match self {
            Self::Unspecified => Self::Nanoseconds,
            other => other,
        }
    }

    /// Resolves a raw wire value. Unknown values fall back to `Nanoseconds`.
    pub fn from_wire(value: i32) -> Self {
        Self::try_from(value)
            .unwrap_or(Self::Unspecified)
            .resolve()
    }

    /// Truncates a nanosecond fraction (`0..1_000_000_000`) to this
    /// precision.
    pub fn truncate_nanos(self, nanos: i32) -> i32 {
        match self {
            Self::Seconds => 0,
            Self::Milliseconds => (nanos / NANOS_PER_MILLI) * NANOS_PER_MILLI,
            Self::Microseconds => (nanos / NANOS_PER_MICRO) * NANOS_PER_MICRO,
            Self::Nanoseconds | Self::Unspecified => nanos,
        }
    }
}
