//! Ready-made containers
//!
//! - [`ScriptedContainer`] replays a fixed sequence of decode results
//! - [`FeedContainer`] blocks on frames pushed from another thread through a
//!   [`FrameFeeder`], for bridging callback-style capture APIs

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::error::DecodeError;

use super::container::{DecodeResult, SourceContainer};
use super::frame::DecodedFrame;

/// How often a waiting [`FeedContainer`] checks for cancellation
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Container that replays a scripted sequence of decode results
///
/// Once the script is exhausted every call returns
/// [`DecodeResult::EndOfStream`].
#[derive(Debug, Default)]
pub struct ScriptedContainer {
    script: VecDeque<DecodeResult>,
    interval: Option<Duration>,
}

impl ScriptedContainer {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before producing each result, like a live device
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Append a decoded frame
    pub fn frame(mut self, frame: DecodedFrame) -> Self {
        self.script.push_back(DecodeResult::Frame(frame));
        self
    }

    /// Append a video frame with the given raw timestamp
    pub fn video(self, pts: Option<i64>, data: impl Into<Bytes>) -> Self {
        self.frame(DecodedFrame::video(pts, data.into()))
    }

    /// Append a decode failure
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.script
            .push_back(DecodeResult::Error(DecodeError::new(message)));
        self
    }

    /// Number of results left in the script
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl FromIterator<DecodeResult> for ScriptedContainer {
    fn from_iter<I: IntoIterator<Item = DecodeResult>>(iter: I) -> Self {
        Self {
            script: iter.into_iter().collect(),
            interval: None,
        }
    }
}

impl SourceContainer for ScriptedContainer {
    fn next_frame(&mut self) -> DecodeResult {
        if let Some(interval) = self.interval {
            std::thread::sleep(interval);
        }
        self.script.pop_front().unwrap_or(DecodeResult::EndOfStream)
    }
}

/// Create a connected feeder/container pair
pub fn feed_channel() -> (FrameFeeder, FeedContainer) {
    let (tx, rx) = mpsc::channel();
    (FrameFeeder { tx }, FeedContainer { rx, cancel: None })
}

/// Sending half of a [`feed_channel`]
///
/// Dropping the feeder ends the stream.
#[derive(Debug, Clone)]
pub struct FrameFeeder {
    tx: mpsc::Sender<DecodeResult>,
}

impl FrameFeeder {
    /// Push a decoded frame
    ///
    /// Returns `false` if the container has been dropped.
    pub fn push(&self, frame: DecodedFrame) -> bool {
        self.tx.send(DecodeResult::Frame(frame)).is_ok()
    }

    /// Push a video frame with the given raw timestamp
    pub fn push_video(&self, pts: Option<i64>, data: impl Into<Bytes>) -> bool {
        self.push(DecodedFrame::video(pts, data.into()))
    }

    /// Make the container fail with a decode error
    ///
    /// Returns `false` if the container has been dropped.
    pub fn fail(self, message: impl Into<String>) -> bool {
        self.tx
            .send(DecodeResult::Error(DecodeError::new(message)))
            .is_ok()
    }

    /// End the stream
    ///
    /// Returns `false` if the container has been dropped.
    pub fn finish(self) -> bool {
        self.tx.send(DecodeResult::EndOfStream).is_ok()
    }
}

/// Receiving half of a [`feed_channel`]
///
/// Blocks until a result is pushed, the feeder is dropped, or the owning
/// worker is cancelled.
#[derive(Debug)]
pub struct FeedContainer {
    rx: mpsc::Receiver<DecodeResult>,
    cancel: Option<Arc<AtomicBool>>,
}

impl FeedContainer {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|cancel| cancel.load(Ordering::Acquire))
    }
}

impl SourceContainer for FeedContainer {
    fn next_frame(&mut self) -> DecodeResult {
        loop {
            match self.rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Disconnected) => return DecodeResult::EndOfStream,
                Err(RecvTimeoutError::Timeout) if self.is_cancelled() => {
                    return DecodeResult::EndOfStream
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn bind_cancel(&mut self, cancel: Arc<AtomicBool>) {
        self.cancel = Some(cancel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_replays_in_order() {
        let mut container = ScriptedContainer::new()
            .video(Some(1000), Bytes::from_static(b"a"))
            .video(None, Bytes::from_static(b"b"))
            .error("boom");

        assert_eq!(container.remaining(), 3);
        match container.next_frame() {
            DecodeResult::Frame(frame) => assert_eq!(frame.pts, Some(1000)),
            other => panic!("unexpected {:?}", other),
        }
        match container.next_frame() {
            DecodeResult::Frame(frame) => assert_eq!(frame.pts, None),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(container.next_frame(), DecodeResult::Error(_)));
        assert!(matches!(container.next_frame(), DecodeResult::EndOfStream));
        assert!(matches!(container.next_frame(), DecodeResult::EndOfStream));
    }

    #[test]
    fn test_feed_channel() {
        let (feeder, mut container) = feed_channel();

        assert!(feeder.push_video(Some(5), Bytes::new()));
        assert!(matches!(container.next_frame(), DecodeResult::Frame(_)));

        assert!(feeder.fail("device unplugged"));
        match container.next_frame() {
            DecodeResult::Error(e) => assert_eq!(e.message(), "device unplugged"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancel_unblocks_waiting_container() {
        let (feeder, mut container) = feed_channel();
        let cancel = Arc::new(AtomicBool::new(false));
        container.bind_cancel(Arc::clone(&cancel));

        let waiter = std::thread::spawn(move || container.next_frame());
        std::thread::sleep(Duration::from_millis(50));
        cancel.store(true, Ordering::Release);

        assert!(matches!(waiter.join().unwrap(), DecodeResult::EndOfStream));
        // The feeder is still alive; only cancellation released the wait
        drop(feeder);
    }

    #[test]
    fn test_finish_after_container_dropped() {
        let (feeder, container) = feed_channel();
        drop(container);

        assert!(!feeder.push_video(Some(1), Bytes::new()));
        assert!(!feeder.finish());
    }

    #[test]
    fn test_dropped_feeder_ends_stream() {
        let (feeder, mut container) = feed_channel();
        drop(feeder);

        assert!(matches!(container.next_frame(), DecodeResult::EndOfStream));
    }
}
