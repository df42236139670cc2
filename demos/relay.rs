//! Relay demo: one simulated camera, several consumers
//!
//! Run with: cargo run --example relay [FRAMES]
//!
//! A scripted 30 fps camera whose clock starts at an arbitrary pts is decoded
//! on the worker thread. Two tracks attach up front, a third joins halfway
//! through. Ctrl+C stops the source early.
//!
//! Set `RUST_LOG=media_relay=trace` to watch every dispatch.

use std::time::Duration;

use bytes::Bytes;
use media_relay::media::{MediaKind, ScriptedContainer};
use media_relay::{ConsumerTrack, Source, SourceConfig};

/// 90 kHz clock, 30 fps
const PTS_STEP: i64 = 3_000;
const FIRST_PTS: i64 = 1_234_567;

fn camera(frames: u32) -> ScriptedContainer {
    let mut container = ScriptedContainer::new().with_interval(Duration::from_millis(33));
    for i in 0..frames {
        // Every tenth frame comes out of the decoder without a timestamp
        let pts = if i % 10 == 7 {
            None
        } else {
            Some(FIRST_PTS + i64::from(i) * PTS_STEP)
        };
        container = container.video(pts, Bytes::from(vec![i as u8; 64]));
    }
    container
}

async fn consume(name: &'static str, mut track: ConsumerTrack) -> usize {
    let mut received = 0;
    while let Ok(frame) = track.recv().await {
        received += 1;
        println!("[{}] pts={} bytes={}", name, frame.pts, frame.data.len());
    }
    println!("[{}] stream ended after {} frames", name, received);
    received
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let frames: u32 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 60,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("media_relay=info".parse()?),
        )
        .init();

    let source = Source::start(camera(frames), SourceConfig::default())?;

    let first = tokio::spawn(consume("viewer-1", source.attach(MediaKind::Video)));
    let second = tokio::spawn(consume("viewer-2", source.attach(MediaKind::Video)));

    tokio::time::sleep(Duration::from_millis(33 * u64::from(frames) / 2)).await;
    let late = tokio::spawn(consume("late-joiner", source.attach(MediaKind::Video)));

    tokio::select! {
        _ = async {
            let _ = tokio::join!(first, second, late);
        } => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    let exit = source.shutdown().await?;
    println!(
        "Worker stopped: {:?} (dispatched={} skipped={})",
        exit.reason,
        exit.stats.frames_dispatched,
        exit.stats.skipped()
    );

    Ok(())
}
