use core::time::Duration;
use timestamp_tonic_core::proto::{StreamTimestampsRequest, TimestampPrecision};

/// Interval used when a request asks for `interval_ms <= 0`.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// A normalized [`StreamTimestampsRequest`].
///
/// Out-of-range fields are never rejected; they fall back to defaults:
///
/// - `interval_ms <= 0` becomes [`DEFAULT_INTERVAL`].
/// - `max_count <= 0` means the stream is unbounded (`None`).
/// - Unspecified or unknown precisions resolve to nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPlan {
    pub interval: Duration,
    pub max_count: Option<u32>,
    pub source: String,
    pub precision: TimestampPrecision,
}

impl StreamPlan {
    /// Whether `emitted` records already satisfy the requested count.
    pub fn is_complete(&self, emitted: u64) -> bool {
        self.max_count.is_some_and(|max| emitted >= u64::from(max))
    }
}

impl From<StreamTimestampsRequest> for StreamPlan {
    fn from(req: StreamTimestampsRequest) -> Self {
        let interval = u64::try_from(req.interval_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map_or(DEFAULT_INTERVAL, Duration::from_millis);
        let max_count = u32::try_from(req.max_count).ok().filter(|n| *n > 0);

        Self {
            interval,
            max_count,
            precision: TimestampPrecision::from_wire(req.precision),
            source: req.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(interval_ms: i32, max_count: i32, precision: i32) -> StreamTimestampsRequest {
        StreamTimestampsRequest {
            interval_ms,
            max_count,
            source: "plan".into(),
            timezone: "Europe/Paris".into(),
            precision,
        }
    }

    #[test]
    fn non_positive_interval_uses_default() {
        assert_eq!(StreamPlan::from(request(0, 1, 0)).interval, DEFAULT_INTERVAL);
        assert_eq!(StreamPlan::from(request(-25, 1, 0)).interval, DEFAULT_INTERVAL);
        assert_eq!(
            StreamPlan::from(request(250, 1, 0)).interval,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn non_positive_count_is_unbounded() {
        assert_eq!(StreamPlan::from(request(10, 0, 0)).max_count, None);
        assert_eq!(StreamPlan::from(request(10, -3, 0)).max_count, None);
        assert_eq!(StreamPlan::from(request(10, 3, 0)).max_count, Some(3));
    }

    #[test]
    fn completion_respects_bound() {
        let bounded = StreamPlan::from(request(10, 2, 0));
        assert!(!bounded.is_complete(1));
        assert!(bounded.is_complete(2));

        let unbounded = StreamPlan::from(request(10, 0, 0));
        assert!(!unbounded.is_complete(u64::MAX));
    }

    #[test]
    fn precision_is_resolved() {
        assert_eq!(
            StreamPlan::from(request(10, 1, 0)).precision,
            TimestampPrecision::Nanoseconds
        );
        assert_eq!(
            StreamPlan::from(request(10, 1, 99)).precision,
            TimestampPrecision::Nanoseconds
        );
        assert_eq!(
            StreamPlan::from(request(10, 1, TimestampPrecision::Seconds as i32)).precision,
            TimestampPrecision::Seconds
        );
    }
}
