//! media-relay: fan out decoded frames to async consumer tracks
//!
//! This library bridges a blocking decoder and async consumers:
//! - A dedicated worker thread drains a container of decoded frames
//! - Timestamps are rebased so tracks start at zero
//! - Every frame is delivered, in order, to every attached track
//! - End of stream (or a decode failure) ends every track
//!
//! # Example
//!
//! ```no_run
//! use media_relay::media::{feed_channel, MediaKind};
//! use media_relay::{Source, SourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (feeder, container) = feed_channel();
//!     let source = Source::start(container, SourceConfig::default())?;
//!     let mut track = source.attach(MediaKind::Video);
//!
//!     std::thread::spawn(move || {
//!         for i in 0..30 {
//!             feeder.push_video(Some(90_000 + i * 3_000), vec![0u8; 16]);
//!         }
//!         feeder.finish();
//!     });
//!
//!     while let Ok(frame) = track.recv().await {
//!         println!("frame at pts {}", frame.pts);
//!     }
//!
//!     source.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod media;
pub mod registry;
pub mod source;
pub mod stats;
pub mod track;
pub mod worker;

// Re-export main types for convenience
pub use error::{DecodeError, Error, Result};
pub use media::{DecodeResult, DecodedFrame, Frame, MediaBackend, MediaKind, SourceContainer};
pub use source::{Source, SourceConfig, TimestampPolicy};
pub use track::{ConsumerTrack, TrackState};
pub use worker::{ExitReason, WorkerExit};
