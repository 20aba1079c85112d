use chrono::{Duration as ChronoDuration, Local, Utc};
use log::info;

/// A point-in-time estimate of how far along a running build is.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub percent: u8,
    pub bucket: u8,
    pub remaining_ms: u64,
}

/// Computes progress against a historical duration estimate.
///
/// The percentage is clamped to [0, 99]: completion is signaled by the
/// build's terminal state, never by the estimate. Returns `None` when the
/// build has no usable estimate or start timestamp.
pub fn estimate_progress(estimated_ms: i64, start_ms: i64, now_ms: i64) -> Option<Progress> {
    if estimated_ms <= 0 || start_ms <= 0 {
        return None;
    }
    let elapsed = (now_ms - start_ms).max(0);
    let percent = (elapsed.saturating_mul(100) / estimated_ms).clamp(0, 99) as u8;
    let bucket = percent / 10 * 10;
    let remaining_ms = (estimated_ms - elapsed).max(0) as u64;
    Some(Progress {
        percent,
        bucket,
        remaining_ms,
    })
}

/// Throttles progress output to one emission per ten-percent bucket.
///
/// The estimate and start timestamp are anchored once, from the first
/// snapshot of a monitored build; later snapshots may disagree and are
/// ignored for the rest of the session.
#[derive(Debug)]
pub struct ProgressReporter {
    estimated_ms: i64,
    start_ms: i64,
    last_bucket: Option<u8>,
}

impl ProgressReporter {
    pub fn new(estimated_ms: i64, start_ms: i64) -> Self {
        Self {
            estimated_ms,
            start_ms,
            last_bucket: None,
        }
    }

    /// Returns the current progress only when the build has moved into a
    /// bucket that has not been reported yet.
    pub fn observe(&mut self, now_ms: i64) -> Option<Progress> {
        let progress = estimate_progress(self.estimated_ms, self.start_ms, now_ms)?;
        if self.last_bucket == Some(progress.bucket) {
            return None;
        }
        self.last_bucket = Some(progress.bucket);
        Some(progress)
    }

    /// Emits a progress line with ETA and estimated finish time if the
    /// bucket changed since the last emission.
    pub fn report(&mut self, display_name: &str, number: u32) {
        if let Some(progress) = self.observe(Utc::now().timestamp_millis()) {
            let finish = Local::now() + ChronoDuration::milliseconds(progress.remaining_ms as i64);
            info!(
                "{} #{}: ~{}% done, ETA {} (~{})",
                display_name,
                number,
                progress.percent,
                format_duration(progress.remaining_ms),
                finish.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
}

/// Formats a millisecond duration as e.g. `1h 2m 5s`, omitting zero-valued
/// leading units but always showing seconds.
pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3_725_000, "1h 2m 5s")]
    #[case(45_000, "45s")]
    #[case(0, "0s")]
    #[case(60_000, "1m 0s")]
    #[case(3_600_000, "1h 0s")]
    #[case(999, "0s")]
    fn test_format_duration(#[case] ms: u64, #[case] expected: &str) {
        assert_eq!(format_duration(ms), expected);
    }

    #[test]
    fn test_percent_bounds_and_monotonicity() {
        let estimated = 100_000;
        let mut last = 0;
        for elapsed in (0..=estimated).step_by(1_000) {
            let progress = estimate_progress(estimated, 1, 1 + elapsed).unwrap();
            assert!(progress.percent <= 99);
            assert!(progress.percent >= last);
            assert_eq!(progress.bucket, progress.percent / 10 * 10);
            last = progress.percent;
        }
    }

    #[test]
    fn test_never_reports_completion_while_polling() {
        let progress = estimate_progress(10_000, 1, 1_000_000).unwrap();
        assert_eq!(progress.percent, 99);
        assert_eq!(progress.bucket, 90);
        assert_eq!(progress.remaining_ms, 0);
    }

    #[test]
    fn test_clock_behind_start_clamps_to_zero() {
        let progress = estimate_progress(10_000, 5_000, 1_000).unwrap();
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.remaining_ms, 10_000);
    }

    #[rstest]
    #[case(0, 1_000)]
    #[case(-1, 1_000)]
    #[case(10_000, 0)]
    fn test_missing_estimate_is_a_noop(#[case] estimated: i64, #[case] start: i64) {
        assert!(estimate_progress(estimated, start, 2_000).is_none());
        let mut reporter = ProgressReporter::new(estimated, start);
        assert!(reporter.observe(2_000).is_none());
    }

    #[test]
    fn test_bucket_reported_at_most_once() {
        let mut reporter = ProgressReporter::new(100_000, 1_000);
        let first = reporter.observe(11_000).unwrap();
        assert_eq!(first.bucket, 10);

        // Re-polls within the same bucket stay silent
        assert!(reporter.observe(12_000).is_none());
        assert!(reporter.observe(15_000).is_none());

        let next = reporter.observe(21_000).unwrap();
        assert_eq!(next.bucket, 20);
    }

    #[test]
    fn test_first_observation_reports_bucket_zero() {
        let mut reporter = ProgressReporter::new(100_000, 1_000);
        let progress = reporter.observe(2_000).unwrap();
        assert_eq!(progress.bucket, 0);
    }
}
