//! Source configuration

use crate::media::MediaKind;

/// How normalized timestamps are computed for tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// One offset for the worker's lifetime, fixed by the first timestamped
    /// frame. Tracks attached later see non-zero first timestamps.
    #[default]
    WorkerGlobal,
    /// Each track is rebased on the first frame delivered to it, so every
    /// track starts at zero.
    PerSubscriber,
}

/// Source configuration options
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Media kind forwarded to tracks; other frames are discarded
    pub media_kind: MediaKind,

    /// Timestamp normalization policy
    pub timestamp_policy: TimestampPolicy,

    /// Name of the decode worker thread
    pub thread_name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            media_kind: MediaKind::Video,
            timestamp_policy: TimestampPolicy::WorkerGlobal,
            thread_name: "media-player".to_string(),
        }
    }
}

impl SourceConfig {
    /// Create a config forwarding the given media kind
    pub fn with_kind(kind: MediaKind) -> Self {
        Self {
            media_kind: kind,
            ..Default::default()
        }
    }

    /// Set the forwarded media kind
    pub fn media_kind(mut self, kind: MediaKind) -> Self {
        self.media_kind = kind;
        self
    }

    /// Set the timestamp policy
    pub fn timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    /// Set the worker thread name
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}
