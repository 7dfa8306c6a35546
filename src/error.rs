//! Error taxonomy for upload, retrieval and dispatch

use resume_dl::TransferError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid file: {0}")]
    InvalidFile(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not reach server: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("please enter a file ID")]
    EmptyIdentifier,

    #[error("could not reach server: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("unexpected metadata response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("server reported an unusable filename: {0:?}")]
    InvalidFilename(String),

    #[error("download interrupted: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("failed to write download: {0}")]
    Io(#[source] io::Error),

    #[error("download cancelled")]
    Cancelled,
}

impl From<TransferError> for DownloadError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Request(e) => DownloadError::Transport(e),
            TransferError::Status { status, message } => DownloadError::Rejected { status, message },
            TransferError::Io(e) => DownloadError::Io(e),
            TransferError::Cancelled => DownloadError::Cancelled,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("permission to access media library denied")]
    PermissionDenied,

    #[error("gallery error: {0}")]
    Io(#[from] io::Error),

    #[error("share failed: {0}")]
    Share(String),
}

/// Failure of the metadata -> download -> dispatch pipeline, tagged by stage
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("error fetching metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("{0}")]
    Download(#[from] DownloadError),

    #[error("{0}")]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid server URL {url:?}: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}
