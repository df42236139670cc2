//! Media source facade
//!
//! A [`Source`] owns one decode session: the worker thread, the subscriber
//! registry and the cancellation flag. Callers attach tracks to it and drain
//! them from async tasks.

pub mod config;

pub use config::{SourceConfig, TimestampPolicy};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::{Error, Result};
use crate::media::{MediaBackend, MediaKind, OpenOptions, SourceContainer};
use crate::registry::SubscriberRegistry;
use crate::stats::{WorkerStats, WorkerStatsSnapshot};
use crate::track::ConsumerTrack;
use crate::worker::{self, WorkerExit};

/// A media source fanning decoded frames out to consumer tracks
///
/// The worker starts as soon as the source is constructed. Dropping the
/// source cancels the worker and joins its thread.
///
/// # Example
/// ```no_run
/// use media_relay::media::{MediaKind, ScriptedContainer};
/// use media_relay::{Source, SourceConfig};
///
/// # async fn example() -> media_relay::Result<()> {
/// let container = ScriptedContainer::new()
///     .video(Some(1000), &b"frame"[..])
///     .video(Some(1033), &b"frame"[..]);
///
/// let mut source = Source::start(container, SourceConfig::default())?;
/// let mut track = source.attach(MediaKind::Video);
///
/// while let Ok(frame) = track.recv().await {
///     println!("pts={}", frame.pts);
/// }
///
/// let exit = source.join()?;
/// println!("worker stopped: {:?}", exit.reason);
/// # Ok(())
/// # }
/// ```
pub struct Source {
    config: SourceConfig,
    registry: Arc<SubscriberRegistry>,
    cancel: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    worker: Option<JoinHandle<WorkerExit>>,
    exit: Option<WorkerExit>,
}

impl Source {
    /// Open a container through a backend and start decoding
    pub fn open<B: MediaBackend>(
        backend: &B,
        options: &OpenOptions,
        config: SourceConfig,
    ) -> Result<Self> {
        let container = backend.open(options)?;

        tracing::info!(
            descriptor = %options.descriptor,
            format = ?options.format,
            "Container opened"
        );

        Self::start(container, config)
    }

    /// Start decoding an already opened container
    pub fn start<C>(container: C, config: SourceConfig) -> Result<Self>
    where
        C: SourceContainer + 'static,
    {
        let registry = Arc::new(SubscriberRegistry::new());
        let cancel = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let handle = worker::spawn(
            container,
            Arc::clone(&registry),
            Arc::clone(&cancel),
            Arc::clone(&stats),
            &config,
        )?;

        Ok(Self {
            config,
            registry,
            cancel,
            stats,
            worker: Some(handle),
            exit: None,
        })
    }

    /// Create a track that receives every frame dispatched from now on
    ///
    /// The track is registered before this returns.
    pub fn attach(&self, kind: MediaKind) -> ConsumerTrack {
        if kind != self.config.media_kind {
            tracing::warn!(
                requested = %kind,
                forwarded = %self.config.media_kind,
                "Track kind is not forwarded by this source; it will only see end of stream"
            );
        }

        let track = ConsumerTrack::new(Arc::clone(&self.registry), kind);
        tracing::debug!(track_id = %track.id(), kind = %kind, "Track attached");
        track
    }

    /// Cancel the worker and wait for its thread to exit
    ///
    /// Blocks for at most one in-flight decode call. Every live track
    /// receives end of stream. Calling again returns the same report.
    pub fn stop(&mut self) -> Result<WorkerExit> {
        self.cancel.store(true, Ordering::Release);
        self.join()
    }

    /// Wait for the worker to finish on its own, without cancelling it
    pub fn join(&mut self) -> Result<WorkerExit> {
        if let Some(handle) = self.worker.take() {
            let exit = handle.join().map_err(|_| Error::WorkerPanicked)?;
            self.exit = Some(exit);
        }

        self.exit.clone().ok_or(Error::WorkerPanicked)
    }

    /// Cancel the worker and join it from a blocking task
    ///
    /// Same as [`stop`](Self::stop) without blocking the async runtime.
    pub async fn shutdown(mut self) -> Result<WorkerExit> {
        self.cancel.store(true, Ordering::Release);

        match self.worker.take() {
            Some(handle) => {
                let joined = tokio::task::spawn_blocking(move || handle.join())
                    .await
                    .map_err(|_| Error::WorkerPanicked)?;
                joined.map_err(|_| Error::WorkerPanicked)
            }
            None => self.exit.clone().ok_or(Error::WorkerPanicked),
        }
    }

    /// Whether the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Number of tracks currently eligible for dispatch
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Current worker statistics
    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Source configuration
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                tracing::error!(error = %e, "Decode worker did not stop cleanly");
            }
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("finished", &self.is_finished())
            .finish()
    }
}
