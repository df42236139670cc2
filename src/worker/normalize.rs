//! Timestamp normalization
//!
//! Capture devices rarely start at pts 0. The normalizer rebases raw
//! timestamps so tracks start at zero.

use crate::registry::Subscriber;
use crate::source::TimestampPolicy;

/// Offset state owned by the decode worker
///
/// Passed by reference into every dispatch step.
#[derive(Debug, Clone)]
pub struct TimestampNormalizer {
    policy: TimestampPolicy,
    offset: Option<i64>,
}

impl TimestampNormalizer {
    /// Create a normalizer with no offset established
    pub fn new(policy: TimestampPolicy) -> Self {
        Self {
            policy,
            offset: None,
        }
    }

    /// Normalization policy in use
    pub fn policy(&self) -> TimestampPolicy {
        self.policy
    }

    /// The worker-lifetime offset, once established
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Record a raw timestamp, establishing the offset on the first call
    ///
    /// Returns the worker-lifetime offset.
    pub fn observe(&mut self, raw_pts: i64) -> i64 {
        *self.offset.get_or_insert(raw_pts)
    }

    /// Normalized timestamp of `raw_pts` against the worker-lifetime offset
    ///
    /// `None` if no offset exists yet or the result would be negative.
    pub fn normalize(&self, raw_pts: i64) -> Option<i64> {
        let offset = self.offset?;
        raw_pts.checked_sub(offset).filter(|pts| *pts >= 0)
    }

    /// Normalized timestamp for one subscriber under the configured policy
    pub fn normalize_for(&self, subscriber: &Subscriber, raw_pts: i64) -> Option<i64> {
        match self.policy {
            TimestampPolicy::WorkerGlobal => self.normalize(raw_pts),
            TimestampPolicy::PerSubscriber => {
                let base = subscriber.first_pts(raw_pts);
                raw_pts.checked_sub(base).filter(|pts| *pts >= 0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::media::MediaKind;
    use crate::registry::TrackId;

    fn subscriber(id: u64) -> Subscriber {
        let (tx, _rx) = mpsc::unbounded_channel();
        Subscriber::new(TrackId(id), MediaKind::Video, tx)
    }

    #[test]
    fn test_first_frame_fixes_offset() {
        let mut normalizer = TimestampNormalizer::new(TimestampPolicy::WorkerGlobal);
        assert_eq!(normalizer.offset(), None);
        assert_eq!(normalizer.normalize(1000), None);

        assert_eq!(normalizer.observe(1000), 1000);
        assert_eq!(normalizer.observe(1033), 1000);
        assert_eq!(normalizer.offset(), Some(1000));

        assert_eq!(normalizer.normalize(1000), Some(0));
        assert_eq!(normalizer.normalize(1033), Some(33));
    }

    #[test]
    fn test_earlier_timestamp_is_rejected() {
        let mut normalizer = TimestampNormalizer::new(TimestampPolicy::WorkerGlobal);
        normalizer.observe(1000);

        assert_eq!(normalizer.normalize(999), None);
    }

    #[test]
    fn test_negative_raw_timestamps() {
        let mut normalizer = TimestampNormalizer::new(TimestampPolicy::WorkerGlobal);
        normalizer.observe(-500);

        assert_eq!(normalizer.normalize(-500), Some(0));
        assert_eq!(normalizer.normalize(0), Some(500));
    }

    #[test]
    fn test_worker_global_ignores_subscriber() {
        let mut normalizer = TimestampNormalizer::new(TimestampPolicy::WorkerGlobal);
        normalizer.observe(1000);
        let late = subscriber(2);

        // A late joiner inherits the worker offset
        assert_eq!(normalizer.normalize_for(&late, 1066), Some(66));
    }

    #[test]
    fn test_per_subscriber_rebases_late_joiner() {
        let mut normalizer = TimestampNormalizer::new(TimestampPolicy::PerSubscriber);
        normalizer.observe(1000);
        let early = subscriber(1);
        let late = subscriber(2);

        assert_eq!(normalizer.normalize_for(&early, 1000), Some(0));
        assert_eq!(normalizer.normalize_for(&early, 1066), Some(66));
        assert_eq!(normalizer.normalize_for(&late, 1066), Some(0));
        assert_eq!(normalizer.normalize_for(&late, 1099), Some(33));
    }
}
