// Interval Key Arithmetic
// Maps trade timestamps onto fixed-width candle buckets

/// Floor an epoch-millis timestamp to the start of its interval bucket.
///
/// For 1-minute granularity this zeroes seconds and sub-second parts; for
/// wider granularities the minute component is additionally floored to a
/// multiple of the width. Epoch alignment makes the same timestamp map to
/// the same bucket regardless of when the aggregator started.
pub fn interval_key(timestamp_ms: i64, interval_ms: i64) -> i64 {
    debug_assert!(interval_ms > 0);
    timestamp_ms - timestamp_ms.rem_euclid(interval_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE_MS: i64 = 60_000;

    #[test]
    fn test_floors_within_minute() {
        // 2023-01-01T12:30:45 UTC
        let ts = 1_672_576_245_000;
        let key = interval_key(ts, MINUTE_MS);
        // 2023-01-01T12:30:00 UTC
        assert_eq!(key, 1_672_576_200_000);
    }

    #[test]
    fn test_exact_boundary_is_identity() {
        let boundary = 1_672_576_200_000;
        assert_eq!(interval_key(boundary, MINUTE_MS), boundary);
    }

    #[test]
    fn test_multi_minute_granularity() {
        // 12:33:10 with 5-minute buckets lands in the 12:30 bucket
        let ts = 1_672_576_200_000 + 3 * MINUTE_MS + 10_000;
        assert_eq!(interval_key(ts, 5 * MINUTE_MS), 1_672_576_200_000);
    }

    #[test]
    fn test_adjacent_buckets_differ_by_width() {
        let ts = 1_672_576_245_000;
        let key = interval_key(ts, MINUTE_MS);
        let next = interval_key(ts + MINUTE_MS, MINUTE_MS);
        assert_eq!(next - key, MINUTE_MS);
    }

    #[test]
    fn test_sub_millisecond_of_boundary() {
        let boundary = 1_672_576_260_000;
        assert_eq!(interval_key(boundary - 1, MINUTE_MS), boundary - MINUTE_MS);
    }
}
