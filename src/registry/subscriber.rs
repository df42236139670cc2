//! Subscriber handles
//!
//! A [`Subscriber`] is the worker-facing half of a consumer track: the
//! sending side of the track's private queue plus what the worker needs to
//! decide whether and how to deliver a frame to it.

use std::sync::OnceLock;

use tokio::sync::mpsc;

use crate::media::{MediaKind, TrackItem};

/// Unique identifier of a consumer track within one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub(crate) u64);

impl TrackId {
    /// Numeric value of the id
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// Worker-facing handle of one consumer track
#[derive(Debug)]
pub struct Subscriber {
    id: TrackId,
    kind: MediaKind,
    tx: mpsc::UnboundedSender<TrackItem>,
    /// Raw timestamp of the first frame delivered to this subscriber.
    /// Only consulted under `TimestampPolicy::PerSubscriber`.
    first_pts: OnceLock<i64>,
}

impl Subscriber {
    pub(crate) fn new(id: TrackId, kind: MediaKind, tx: mpsc::UnboundedSender<TrackItem>) -> Self {
        Self {
            id,
            kind,
            tx,
            first_pts: OnceLock::new(),
        }
    }

    /// Id of the track this subscriber feeds
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Media kind the track asked for
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Whether the track's queue has been closed or dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Offset for this subscriber, fixed by the first raw timestamp offered
    pub(crate) fn first_pts(&self, raw_pts: i64) -> i64 {
        *self.first_pts.get_or_init(|| raw_pts)
    }

    /// Enqueue an item without blocking
    ///
    /// Returns `false` if the track is gone.
    pub(crate) fn send(&self, item: TrackItem) -> bool {
        self.tx.send(item).is_ok()
    }
}
