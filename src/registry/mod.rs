//! Subscriber registry for frame fan-out
//!
//! The registry holds the set of consumer tracks the decode worker delivers
//! to. Tracks attach and detach from async tasks while the worker reads the
//! set from its own thread.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<SubscriberRegistry>
//!                     ┌─────────────────────────┐
//!                     │ members: RwLock<        │
//!                     │   Arc<[Arc<Subscriber>]>│
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │ snapshot()
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [DecodeWorker]          [ConsumerTrack]         [ConsumerTrack]
//!   tx.send(item) ───────►  rx.recv().await         rx.recv().await
//! ```
//!
//! # Copy-on-Write
//!
//! Attach and detach replace the member list wholesale, so a snapshot taken
//! by the worker is never modified underneath it and the worker never holds
//! the lock while enqueueing frames.

pub mod store;
pub mod subscriber;

pub use store::{Snapshot, SubscriberRegistry};
pub use subscriber::{Subscriber, TrackId};
