//! Consumer tracks
//!
//! A [`ConsumerTrack`] is the async handle a caller drains frames from. It
//! registers with the source's registry when constructed and detaches when
//! it ends, is stopped, or is dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::error::{Error, Result};
use crate::media::{Frame, MediaKind, TrackItem};
use crate::registry::{Subscriber, SubscriberRegistry, TrackId};

/// Lifecycle state of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Constructed, not yet registered
    Created,
    /// Registered and eligible for dispatch
    Live,
    /// Ended or stopped; never revived
    Ended,
}

/// Per-consumer handle with a private ordered queue
#[derive(Debug)]
pub struct ConsumerTrack {
    id: TrackId,
    kind: MediaKind,
    state: TrackState,
    rx: mpsc::UnboundedReceiver<TrackItem>,
    registry: Arc<SubscriberRegistry>,
}

impl ConsumerTrack {
    /// Create a track and register it before returning
    pub(crate) fn new(registry: Arc<SubscriberRegistry>, kind: MediaKind) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.next_id();

        let mut track = Self {
            id,
            kind,
            state: TrackState::Created,
            rx,
            registry,
        };

        track
            .registry
            .attach(Arc::new(Subscriber::new(id, kind, tx)));
        track.state = TrackState::Live;

        track
    }

    /// Track id, unique within its source
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Media kind of this track
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Current lifecycle state
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Whether the track can still yield frames
    pub fn is_live(&self) -> bool {
        self.state == TrackState::Live
    }

    /// Wait for the next frame
    ///
    /// Returns [`Error::StreamEnded`] once the end marker has been received,
    /// and immediately on every call after that or after [`stop`](Self::stop).
    pub async fn recv(&mut self) -> Result<Frame> {
        if self.state == TrackState::Ended {
            return Err(Error::StreamEnded);
        }

        match self.rx.recv().await {
            Some(TrackItem::Frame(frame)) => Ok(frame),
            Some(TrackItem::End) | None => {
                self.end();
                Err(Error::StreamEnded)
            }
        }
    }

    /// Take the next frame if one is already queued
    ///
    /// `Ok(None)` means the queue is empty but the track is still live.
    pub fn try_recv(&mut self) -> Result<Option<Frame>> {
        if self.state == TrackState::Ended {
            return Err(Error::StreamEnded);
        }

        match self.rx.try_recv() {
            Ok(TrackItem::Frame(frame)) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Ok(TrackItem::End) | Err(TryRecvError::Disconnected) => {
                self.end();
                Err(Error::StreamEnded)
            }
        }
    }

    /// End the track and stop receiving frames
    ///
    /// Idempotent. Frames still queued are discarded.
    pub fn stop(&mut self) {
        if self.state == TrackState::Ended {
            return;
        }
        self.end();
        self.rx.close();
    }

    fn end(&mut self) {
        self.state = TrackState::Ended;
        if self.registry.detach(self.id) {
            tracing::debug!(track_id = %self.id, kind = %self.kind, "Track ended");
        }
    }
}

impl Drop for ConsumerTrack {
    fn drop(&mut self) {
        self.registry.detach(self.id);
    }
}
