//! Decode worker
//!
//! The worker owns the container once started. Its loop is the only code
//! that blocks, and only inside the container's decode call; delivery to
//! tracks goes through non-blocking unbounded queues.
//!
//! ```text
//!  Running ──(cancel | end of stream | decode error)──► Stopping
//!  Stopping ──(end marker sent to final snapshot)─────► Stopped
//! ```

pub mod decode;
pub mod normalize;

pub(crate) use decode::spawn;
pub use decode::{ExitReason, WorkerExit};
pub use normalize::TimestampNormalizer;
