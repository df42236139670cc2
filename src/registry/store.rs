//! Subscriber registry implementation
//!
//! Copy-on-write set of subscribers shared between consumer-side calls and
//! the decode worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::media::TrackItem;

use super::subscriber::{Subscriber, TrackId};

/// Immutable view of the registry taken for one dispatch step
pub type Snapshot = Arc<[Arc<Subscriber>]>;

struct Members {
    list: Snapshot,
    /// Set once the worker has delivered its final end marker
    closed: bool,
}

/// Registry of subscribers eligible for dispatch
///
/// Writers rebuild the member list under a short write lock; readers clone
/// the current `Arc` and iterate it without holding any lock.
pub struct SubscriberRegistry {
    members: RwLock<Members>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            members: RwLock::new(Members {
                list: Arc::from(Vec::new()),
                closed: false,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh track id
    pub fn next_id(&self) -> TrackId {
        TrackId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a subscriber
    ///
    /// Effective for the next snapshot. If the registry has already been
    /// closed the subscriber is not added; it receives the end marker
    /// directly and `false` is returned.
    pub fn attach(&self, subscriber: Arc<Subscriber>) -> bool {
        let mut members = self.members.write();

        if members.closed {
            subscriber.send(TrackItem::End);
            tracing::debug!(track_id = %subscriber.id(), "Attach after end of stream");
            return false;
        }

        let mut list = members.list.to_vec();
        list.push(subscriber);
        members.list = Arc::from(list);

        tracing::debug!(subscribers = members.list.len(), "Subscriber attached");
        true
    }

    /// Remove a subscriber
    ///
    /// Idempotent: returns `false` if it was not registered.
    pub fn detach(&self, id: TrackId) -> bool {
        let mut members = self.members.write();

        if !members.list.iter().any(|s| s.id() == id) {
            return false;
        }

        let list: Vec<_> = members
            .list
            .iter()
            .filter(|s| s.id() != id)
            .cloned()
            .collect();
        members.list = Arc::from(list);

        tracing::debug!(
            track_id = %id,
            subscribers = members.list.len(),
            "Subscriber detached"
        );
        true
    }

    /// Current members as an immutable snapshot
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.members.read().list)
    }

    /// Close the registry and return the final snapshot
    ///
    /// Later attaches are answered with an immediate end marker, so no
    /// track can wait on a worker that has already stopped.
    pub(crate) fn close(&self) -> Snapshot {
        let mut members = self.members.write();
        members.closed = true;
        Arc::clone(&members.list)
    }

    /// Whether the worker has finished with this registry
    pub fn is_closed(&self) -> bool {
        self.members.read().closed
    }

    /// Check whether a track is currently registered
    pub fn contains(&self, id: TrackId) -> bool {
        self.members.read().list.iter().any(|s| s.id() == id)
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        self.members.read().list.len()
    }

    /// Whether no subscribers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members = self.members.read();
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &members.list.len())
            .field("closed", &members.closed)
            .finish()
    }
}
