//! HTTP download engine with Range-based resume
//!
//! A [`ResumableTransfer`] streams one URL into one file with:
//! - Buffered writes to keep I/O operations low on large files
//! - Pause/Resume/Cancel through a cloneable [`TransferHandle`]
//! - Resume from the current byte offset via `Range` requests, restarting from
//!   zero when the server ignores the range
//! - Progress snapshots and a SHA-256 of the finished file
//!
//! The engine makes a single attempt. Retry policy belongs to the caller.

mod control;
mod error;
mod transfer;
mod types;

pub use control::TransferHandle;
pub use error::TransferError;
pub use transfer::ResumableTransfer;
pub use types::{StartMode, TransferOutcome, TransferProgress, TransferState, WRITE_BUFFER_SIZE};
