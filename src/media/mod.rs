//! Media types and the container interface
//!
//! This module provides:
//! - Frame types before and after timestamp normalization
//! - The `SourceContainer` / `MediaBackend` traits the worker drives
//! - Scripted and channel-fed containers

pub mod container;
pub mod frame;
pub mod scripted;

pub use container::{DecodeResult, MediaBackend, OpenOptions, SourceContainer};
pub use frame::{DecodedFrame, Frame, MediaKind, TrackItem};
pub use scripted::{feed_channel, FeedContainer, FrameFeeder, ScriptedContainer};
