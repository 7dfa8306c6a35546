//! Transfer status and progress payloads

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Write buffer size for downloads (2 MB) - reduces I/O operations
pub const WRITE_BUFFER_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferState {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "downloading")]
    Downloading,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferState::Pending => write!(f, "pending"),
            TransferState::Downloading => write!(f, "downloading"),
            TransferState::Paused => write!(f, "paused"),
            TransferState::Completed => write!(f, "completed"),
            TransferState::Failed => write!(f, "failed"),
            TransferState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Progress snapshot published by a running transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferProgress {
    pub state: TransferState,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed: f64, // bytes per second, current session only
}

impl TransferProgress {
    pub(crate) fn pending() -> Self {
        Self {
            state: TransferState::Pending,
            downloaded_bytes: 0,
            total_bytes: None,
            speed: 0.0,
        }
    }
}

/// Where a transfer starts writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartMode {
    /// Fetch from byte zero into a new partial file.
    #[default]
    Fresh,
    /// Keep the bytes of an earlier partial file (or of the destination when
    /// there is none) and request only the missing tail.
    ContinueExisting,
}

/// A completed transfer
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub path: PathBuf,
    pub bytes: u64,
    /// Hex SHA-256 of the whole file, including any bytes kept from a previous run.
    pub sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_state_display_matches_expected_strings() {
        assert_eq!(TransferState::Pending.to_string(), "pending");
        assert_eq!(TransferState::Downloading.to_string(), "downloading");
        assert_eq!(TransferState::Paused.to_string(), "paused");
        assert_eq!(TransferState::Completed.to_string(), "completed");
        assert_eq!(TransferState::Failed.to_string(), "failed");
        assert_eq!(TransferState::Cancelled.to_string(), "cancelled");
    }
}
