use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// No usable response: connection refused, reset, or the body stream broke.
    #[error("transfer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to write destination: {0}")]
    Io(#[from] io::Error),

    #[error("transfer cancelled")]
    Cancelled,
}

impl TransferError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferError::Cancelled)
    }
}
