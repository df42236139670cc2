//! Decode loop
//!
//! Runs on a dedicated OS thread, pulls frames from the container, rebases
//! their timestamps and fans them out to a snapshot of the registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{DecodeError, Error, Result};
use crate::media::{DecodeResult, DecodedFrame, MediaKind, SourceContainer, TrackItem};
use crate::registry::SubscriberRegistry;
use crate::source::SourceConfig;
use crate::stats::{WorkerStats, WorkerStatsSnapshot};

use super::normalize::TimestampNormalizer;

/// Why the decode worker stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The container was exhausted
    EndOfStream,
    /// The container failed
    Failed(DecodeError),
    /// The cancellation flag was set
    Cancelled,
}

/// Report returned by the worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerExit {
    /// Why the loop terminated
    pub reason: ExitReason,
    /// Counters at the time the loop terminated
    pub stats: WorkerStatsSnapshot,
}

/// Delivers the end marker to every subscriber when dropped
///
/// Covers every way out of the loop, a panicking container included.
struct EndGuard<'a> {
    registry: &'a SubscriberRegistry,
}

impl Drop for EndGuard<'_> {
    fn drop(&mut self) {
        let snapshot = self.registry.close();
        for subscriber in snapshot.iter() {
            subscriber.send(TrackItem::End);
        }
        tracing::debug!(subscribers = snapshot.len(), "End of stream dispatched");
    }
}

/// The decode loop and the state it owns
pub(crate) struct DecodeWorker<C> {
    container: C,
    registry: Arc<SubscriberRegistry>,
    cancel: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    media_kind: MediaKind,
    normalizer: TimestampNormalizer,
}

impl<C: SourceContainer> DecodeWorker<C> {
    pub(crate) fn new(
        mut container: C,
        registry: Arc<SubscriberRegistry>,
        cancel: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
        config: &SourceConfig,
    ) -> Self {
        container.bind_cancel(Arc::clone(&cancel));

        Self {
            container,
            registry,
            cancel,
            stats,
            media_kind: config.media_kind,
            normalizer: TimestampNormalizer::new(config.timestamp_policy),
        }
    }

    /// Run until end of stream, decode failure or cancellation
    pub(crate) fn run(mut self) -> WorkerExit {
        tracing::info!(kind = %self.media_kind, "Decode worker started");

        let registry = Arc::clone(&self.registry);
        let guard = EndGuard {
            registry: &registry,
        };

        let reason = loop {
            if self.cancel.load(Ordering::Acquire) {
                break ExitReason::Cancelled;
            }

            match self.container.next_frame() {
                DecodeResult::Frame(frame) => {
                    self.stats.record_decoded();
                    self.handle_frame(frame);
                }
                // A container released by cancellation reports end of stream
                DecodeResult::EndOfStream if self.cancel.load(Ordering::Acquire) => {
                    break ExitReason::Cancelled
                }
                DecodeResult::EndOfStream => break ExitReason::EndOfStream,
                DecodeResult::Error(e) => {
                    tracing::error!(error = %e, "Decode failed, stopping worker");
                    break ExitReason::Failed(e);
                }
            }
        };

        drop(guard);

        let stats = self.stats.snapshot();
        tracing::info!(
            reason = ?reason,
            frames_dispatched = stats.frames_dispatched,
            skipped = stats.skipped(),
            "Decode worker stopped"
        );

        WorkerExit { reason, stats }
    }

    fn handle_frame(&mut self, frame: DecodedFrame) {
        if frame.kind != self.media_kind {
            self.stats.record_skipped_kind();
            return;
        }

        let Some(raw_pts) = frame.pts else {
            tracing::warn!(kind = %frame.kind, "Skipping frame with no pts");
            self.stats.record_skipped_no_pts();
            return;
        };

        dispatch(
            &frame,
            raw_pts,
            &mut self.normalizer,
            &self.registry,
            &self.stats,
        );
    }
}

/// One dispatch step: normalize and enqueue to the current snapshot
fn dispatch(
    frame: &DecodedFrame,
    raw_pts: i64,
    normalizer: &mut TimestampNormalizer,
    registry: &SubscriberRegistry,
    stats: &WorkerStats,
) {
    let offset = normalizer.observe(raw_pts);
    let Some(pts) = normalizer.normalize(raw_pts) else {
        tracing::warn!(raw_pts, offset, "Skipping frame earlier than first pts");
        stats.record_skipped_negative_pts();
        return;
    };

    let snapshot = registry.snapshot();
    let shared = frame.normalized(pts);
    let mut deliveries = 0;

    for subscriber in snapshot.iter() {
        if subscriber.kind() != frame.kind {
            continue;
        }

        let item = match normalizer.normalize_for(subscriber, raw_pts) {
            Some(track_pts) if track_pts == pts => TrackItem::Frame(shared.clone()),
            Some(track_pts) => TrackItem::Frame(frame.normalized(track_pts)),
            None => {
                tracing::warn!(
                    track_id = %subscriber.id(),
                    raw_pts,
                    "Skipping frame earlier than track's first pts"
                );
                stats.record_skipped_negative_pts();
                continue;
            }
        };

        if subscriber.send(item) {
            deliveries += 1;
        } else if registry.detach(subscriber.id()) {
            tracing::debug!(track_id = %subscriber.id(), "Pruned closed subscriber");
            stats.record_pruned();
        }
    }

    tracing::trace!(pts, deliveries, "Frame dispatched");
    stats.record_dispatch(deliveries);
}

/// Spawn the decode worker on its own thread
pub(crate) fn spawn<C>(
    container: C,
    registry: Arc<SubscriberRegistry>,
    cancel: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    config: &SourceConfig,
) -> Result<JoinHandle<WorkerExit>>
where
    C: SourceContainer + 'static,
{
    let worker = DecodeWorker::new(container, registry, cancel, stats, config);

    tracing::info!(thread = %config.thread_name, "Starting worker thread");
    std::thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || worker.run())
        .map_err(Error::Spawn)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::media::{Frame, ScriptedContainer};
    use crate::registry::Subscriber;
    use crate::source::TimestampPolicy;

    fn attach(
        registry: &SubscriberRegistry,
        kind: MediaKind,
    ) -> mpsc::UnboundedReceiver<TrackItem> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.attach(Arc::new(Subscriber::new(registry.next_id(), kind, tx)));
        rx
    }

    fn run(container: ScriptedContainer, registry: &Arc<SubscriberRegistry>) -> WorkerExit {
        DecodeWorker::new(
            container,
            Arc::clone(registry),
            Arc::new(AtomicBool::new(false)),
            Arc::new(WorkerStats::new()),
            &SourceConfig::default(),
        )
        .run()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TrackItem>) -> (Vec<Frame>, bool) {
        let mut frames = Vec::new();
        let mut ended = false;
        while let Ok(item) = rx.try_recv() {
            match item {
                TrackItem::Frame(frame) => frames.push(frame),
                TrackItem::End => ended = true,
            }
        }
        (frames, ended)
    }

    #[test]
    fn test_normalizes_and_ends() {
        let registry = Arc::new(SubscriberRegistry::new());
        let mut rx = attach(&registry, MediaKind::Video);

        let container = ScriptedContainer::new()
            .video(Some(1000), Bytes::from_static(b"a"))
            .video(Some(1033), Bytes::from_static(b"b"));
        let exit = run(container, &registry);

        assert_eq!(exit.reason, ExitReason::EndOfStream);
        assert_eq!(exit.stats.frames_dispatched, 2);

        let (frames, ended) = drain(&mut rx);
        let pts: Vec<i64> = frames.iter().map(|f| f.pts).collect();
        assert_eq!(pts, vec![0, 33]);
        assert!(ended);
        assert!(registry.is_closed());
    }

    #[test]
    fn test_skips_missing_pts_and_other_kinds() {
        let registry = Arc::new(SubscriberRegistry::new());
        let mut rx = attach(&registry, MediaKind::Video);

        let container = ScriptedContainer::new()
            .video(Some(1000), Bytes::new())
            .video(None, Bytes::new())
            .frame(DecodedFrame::audio(Some(500), Bytes::new()))
            .video(Some(1033), Bytes::new());
        let exit = run(container, &registry);

        assert_eq!(exit.stats.frames_decoded, 4);
        assert_eq!(exit.stats.skipped_no_pts, 1);
        assert_eq!(exit.stats.skipped_kind, 1);

        let (frames, _) = drain(&mut rx);
        let pts: Vec<i64> = frames.iter().map(|f| f.pts).collect();
        assert_eq!(pts, vec![0, 33]);
    }

    #[test]
    fn test_decode_error_is_terminal() {
        let registry = Arc::new(SubscriberRegistry::new());
        let mut rx = attach(&registry, MediaKind::Video);

        let container = ScriptedContainer::new()
            .video(Some(10), Bytes::new())
            .error("corrupt stream")
            .video(Some(20), Bytes::new());
        let exit = run(container, &registry);

        assert_eq!(
            exit.reason,
            ExitReason::Failed(DecodeError::new("corrupt stream"))
        );

        let (frames, ended) = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert!(ended);
    }

    #[test]
    fn test_earlier_pts_dropped() {
        let registry = Arc::new(SubscriberRegistry::new());
        let mut rx = attach(&registry, MediaKind::Video);

        let container = ScriptedContainer::new()
            .video(Some(1000), Bytes::new())
            .video(Some(990), Bytes::new())
            .video(Some(1040), Bytes::new());
        let exit = run(container, &registry);

        assert_eq!(exit.stats.skipped_negative_pts, 1);
        let (frames, _) = drain(&mut rx);
        assert!(frames.iter().all(|f| f.pts >= 0));
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_cancelled_before_first_decode() {
        let registry = Arc::new(SubscriberRegistry::new());
        let mut rx = attach(&registry, MediaKind::Video);

        let exit = DecodeWorker::new(
            ScriptedContainer::new().video(Some(1), Bytes::new()),
            Arc::clone(&registry),
            Arc::new(AtomicBool::new(true)),
            Arc::new(WorkerStats::new()),
            &SourceConfig::default(),
        )
        .run();

        assert_eq!(exit.reason, ExitReason::Cancelled);
        let (frames, ended) = drain(&mut rx);
        assert!(frames.is_empty());
        assert!(ended);
    }

    #[test]
    fn test_closed_subscriber_is_pruned() {
        let registry = Arc::new(SubscriberRegistry::new());
        let rx = attach(&registry, MediaKind::Video);
        drop(rx);

        let exit = run(ScriptedContainer::new().video(Some(1), Bytes::new()), &registry);

        assert_eq!(exit.stats.pruned_subscribers, 1);
        assert_eq!(exit.stats.deliveries, 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_per_subscriber_policy() {
        let registry = Arc::new(SubscriberRegistry::new());
        let stats = Arc::new(WorkerStats::new());
        let config = SourceConfig::default().timestamp_policy(TimestampPolicy::PerSubscriber);
        let mut worker = DecodeWorker::new(
            ScriptedContainer::new(),
            Arc::clone(&registry),
            Arc::new(AtomicBool::new(false)),
            Arc::clone(&stats),
            &config,
        );

        let mut early = attach(&registry, MediaKind::Video);
        worker.handle_frame(DecodedFrame::video(Some(1000), Bytes::new()));
        worker.handle_frame(DecodedFrame::video(Some(1033), Bytes::new()));
        let mut late = attach(&registry, MediaKind::Video);
        worker.handle_frame(DecodedFrame::video(Some(1066), Bytes::new()));

        let (early_frames, _) = drain(&mut early);
        let (late_frames, _) = drain(&mut late);
        assert_eq!(
            early_frames.iter().map(|f| f.pts).collect::<Vec<_>>(),
            vec![0, 33, 66]
        );
        assert_eq!(late_frames.iter().map(|f| f.pts).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_per_subscriber_earlier_pts_skipped_and_counted() {
        let registry = Arc::new(SubscriberRegistry::new());
        let stats = Arc::new(WorkerStats::new());
        let config = SourceConfig::default().timestamp_policy(TimestampPolicy::PerSubscriber);
        let mut worker = DecodeWorker::new(
            ScriptedContainer::new(),
            Arc::clone(&registry),
            Arc::new(AtomicBool::new(false)),
            Arc::clone(&stats),
            &config,
        );

        let mut early = attach(&registry, MediaKind::Video);
        worker.handle_frame(DecodedFrame::video(Some(1000), Bytes::new()));
        let mut late = attach(&registry, MediaKind::Video);
        worker.handle_frame(DecodedFrame::video(Some(1066), Bytes::new()));

        // Reordered frame: after the worker offset, before the late track's base
        worker.handle_frame(DecodedFrame::video(Some(1050), Bytes::new()));

        let (early_frames, _) = drain(&mut early);
        let (late_frames, _) = drain(&mut late);
        assert_eq!(
            early_frames.iter().map(|f| f.pts).collect::<Vec<_>>(),
            vec![0, 66, 50]
        );
        assert_eq!(late_frames.iter().map(|f| f.pts).collect::<Vec<_>>(), vec![0]);
        assert_eq!(stats.snapshot().skipped_negative_pts, 1);
    }

    #[test]
    fn test_cancel_releases_blocked_feed_container() {
        use crate::media::feed_channel;

        let registry = Arc::new(SubscriberRegistry::new());
        let mut rx = attach(&registry, MediaKind::Video);
        let cancel = Arc::new(AtomicBool::new(false));
        let (feeder, container) = feed_channel();

        let worker = DecodeWorker::new(
            container,
            Arc::clone(&registry),
            Arc::clone(&cancel),
            Arc::new(WorkerStats::new()),
            &SourceConfig::default(),
        );
        let handle = std::thread::spawn(move || worker.run());

        feeder.push_video(Some(7), Bytes::new());
        std::thread::sleep(std::time::Duration::from_millis(50));
        cancel.store(true, Ordering::Release);

        let exit = handle.join().unwrap();
        assert_eq!(exit.reason, ExitReason::Cancelled);
        let (frames, ended) = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert!(ended);
        drop(feeder);
    }
}
