//! Download metadata and artifact types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server-side description of a stored file. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadMetadata {
    pub filename: String,
}

/// A downloaded file on local storage. The core never deletes it.
#[derive(Debug, Clone, Serialize)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub filename: String,
    pub extension: String,
    pub size: u64,
    pub sha256: String,
}

/// Extension used for local bookkeeping: the word characters after the last
/// `.`, or `bin` when there are none.
pub fn file_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            ext
        }
        _ => "bin",
    }
}
