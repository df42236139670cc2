//! Container interface
//!
//! The relay does not demux or decode anything itself. A [`MediaBackend`]
//! opens a [`SourceContainer`], which the decode worker then drains one
//! [`DecodeResult`] at a time on its own thread.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::{DecodeError, Result};

use super::frame::DecodedFrame;

/// Outcome of one decode call
#[derive(Debug, Clone)]
pub enum DecodeResult {
    /// A decoded frame
    Frame(DecodedFrame),
    /// The container is exhausted
    EndOfStream,
    /// The container failed; no further frames will be produced
    Error(DecodeError),
}

/// A lazy sequence of decoded frames
///
/// `next_frame` may block for as long as it takes to produce the next frame.
/// It runs on the worker thread only.
pub trait SourceContainer: Send {
    /// Decode the next frame
    fn next_frame(&mut self) -> DecodeResult;

    /// Hand the container the worker's cancellation flag
    ///
    /// Called once before the worker starts. Containers whose decode call
    /// can wait without bound should poll the flag and return
    /// [`DecodeResult::EndOfStream`] once it is set.
    fn bind_cancel(&mut self, _cancel: Arc<AtomicBool>) {}
}

impl<F> SourceContainer for F
where
    F: FnMut() -> DecodeResult + Send,
{
    fn next_frame(&mut self) -> DecodeResult {
        (self)()
    }
}

/// Parameters for opening a container
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Device path, file path or URL
    pub descriptor: String,
    /// Container or device format, autodetected when `None`
    pub format: Option<String>,
    /// Backend-specific options (e.g. `video_size`)
    pub options: BTreeMap<String, String>,
}

impl OpenOptions {
    /// Create options for a descriptor
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            ..Default::default()
        }
    }

    /// Set the format
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Add a backend option
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Opens containers
///
/// Implemented by the glue around whatever media library supplies frames.
pub trait MediaBackend {
    /// Container type produced by this backend
    type Container: SourceContainer + 'static;

    /// Open a container. Failures map to [`Error::Open`](crate::Error::Open).
    fn open(&self, options: &OpenOptions) -> Result<Self::Container>;
}
