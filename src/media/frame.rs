//! Frame types flowing through the relay
//!
//! [`DecodedFrame`] is what a container produces. [`Frame`] is what a
//! consumer track receives after timestamp normalization.

use bytes::Bytes;

/// Media type of a frame or track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Video frame
    Video,
    /// Audio frame
    Audio,
    /// Subtitle frame
    Subtitle,
    /// Any other stream type
    Data,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Subtitle => "subtitle",
            MediaKind::Data => "data",
        };
        f.write_str(name)
    }
}

/// A frame as decoded by the container
///
/// The timestamp is in the stream's own clock and may be absent on
/// malformed input.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Type of frame
    pub kind: MediaKind,
    /// Presentation timestamp, if the container supplied one
    pub pts: Option<i64>,
    /// Decoded payload (reference counted)
    pub data: Bytes,
}

impl DecodedFrame {
    /// Create a video frame
    pub fn video(pts: Option<i64>, data: Bytes) -> Self {
        Self {
            kind: MediaKind::Video,
            pts,
            data,
        }
    }

    /// Create an audio frame
    pub fn audio(pts: Option<i64>, data: Bytes) -> Self {
        Self {
            kind: MediaKind::Audio,
            pts,
            data,
        }
    }

    /// Rebase this frame onto a normalized timestamp
    pub(crate) fn normalized(&self, pts: i64) -> Frame {
        Frame {
            kind: self.kind,
            pts,
            data: self.data.clone(),
        }
    }
}

/// A frame delivered to a consumer track
///
/// Cheap to clone: all tracks share the same payload allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Type of frame
    pub kind: MediaKind,
    /// Timestamp relative to the first frame seen, never negative
    pub pts: i64,
    /// Decoded payload
    pub data: Bytes,
}

/// An item in a consumer track's queue
#[derive(Debug, Clone)]
pub enum TrackItem {
    /// A normalized frame
    Frame(Frame),
    /// End of stream, either graceful or after a decode failure
    End,
}
