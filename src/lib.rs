//! Drop-server client: upload a file under a fresh identifier, then fetch it
//! back by identifier and hand it to the host platform.

pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod identifier;
pub mod pipeline;
pub mod upload;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use dispatch::{DispatchResult, Platform, PlatformDispatcher};
pub use download::{LocalArtifact, MetadataFetcher, ResumableDownloader};
pub use error::{
    ConfigError, DispatchError, DownloadError, MetadataError, RetrievalError, UploadError,
};
pub use identifier::{FileIdentifier, Identifier, IdentifierGenerator, RandomIdentifiers};
pub use pipeline::{RetrievalPipeline, RetrievalSession};
pub use upload::{LocalFile, UploadCoordinator};

use clap::Parser;
use std::process::ExitCode;

/// Parse the command line and run it
pub async fn run() -> ExitCode {
    cli::execute(cli::Cli::parse()).await
}
