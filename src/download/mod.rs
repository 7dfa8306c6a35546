//! Retrieval side: metadata lookup and resumable file download
//!
//! - `metadata`: identifier -> stored filename
//! - `worker`: filename -> local artifact, with pause/resume/cancel exposed
//! - `types`: metadata and artifact payloads

mod metadata;
mod types;
mod worker;

pub use metadata::MetadataFetcher;
pub use types::{file_extension, DownloadMetadata, LocalArtifact};
pub use worker::{PreparedDownload, ResumableDownloader};
