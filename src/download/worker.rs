//! Download worker - binds a server filename to a resumable transfer

use log::info;
use resume_dl::{ResumableTransfer, TransferHandle};
use std::path::{Component, Path, PathBuf};

use super::types::{file_extension, LocalArtifact};
use crate::api::ApiClient;
use crate::error::DownloadError;

/// Streams stored files into the documents storage root.
///
/// Two downloads of the same filename write the same local path; the later
/// one wins.
#[derive(Debug, Clone)]
pub struct ResumableDownloader {
    api: ApiClient,
    storage_root: PathBuf,
}

impl ResumableDownloader {
    pub fn new(api: ApiClient, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            api,
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Build the transfer descriptor without starting it, so a caller can hold
    /// its pause/resume/cancel handle.
    pub fn prepare(&self, filename: &str) -> Result<PreparedDownload, DownloadError> {
        let filename = checked_filename(filename)?;
        let destination = self.storage_root.join(filename);
        let source_url = self.api.file_url(filename);

        let transfer = ResumableTransfer::new(self.api.http().clone(), source_url, destination);
        Ok(PreparedDownload {
            filename: filename.to_string(),
            transfer,
        })
    }

    /// Single attempt; interrupted transfers are reported, not retried.
    pub async fn download(&self, filename: &str) -> Result<LocalArtifact, DownloadError> {
        self.prepare(filename)?.run().await
    }
}

pub struct PreparedDownload {
    filename: String,
    transfer: ResumableTransfer,
}

impl PreparedDownload {
    pub fn handle(&self) -> TransferHandle {
        self.transfer.handle()
    }

    pub fn source_url(&self) -> &str {
        self.transfer.url()
    }

    pub fn destination(&self) -> &Path {
        self.transfer.destination()
    }

    pub async fn run(self) -> Result<LocalArtifact, DownloadError> {
        let PreparedDownload { filename, transfer } = self;
        let outcome = transfer.run().await?;

        info!(
            "download: {} saved to {} ({} bytes)",
            filename,
            outcome.path.display(),
            outcome.bytes
        );

        Ok(LocalArtifact {
            extension: file_extension(&filename).to_string(),
            path: outcome.path,
            filename,
            size: outcome.bytes,
            sha256: outcome.sha256,
        })
    }
}

/// The server picks the name, so it must stay a single path component under
/// the storage root.
fn checked_filename(filename: &str) -> Result<&str, DownloadError> {
    let invalid = || DownloadError::InvalidFilename(filename.to_string());

    if filename.is_empty() || filename.contains(['/', '\\', '\0']) {
        return Err(invalid());
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(filename),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Client, Url};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader(server: &MockServer, root: &Path) -> ResumableDownloader {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        ResumableDownloader::new(ApiClient::new(Client::new(), base), root)
    }

    #[test]
    fn path_like_filenames_are_rejected() {
        for name in ["", ".", "..", "../etc/passwd", "a/b.txt", "a\\b.txt", "/abs"] {
            assert!(
                matches!(checked_filename(name), Err(DownloadError::InvalidFilename(_))),
                "{name:?} should be rejected"
            );
        }
        assert_eq!(checked_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(checked_filename("..hidden").unwrap(), "..hidden");
    }

    #[tokio::test]
    async fn prepare_binds_source_and_destination() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let prepared = downloader(&server, dir.path()).prepare("my report.pdf").unwrap();

        assert_eq!(prepared.destination(), dir.path().join("my report.pdf"));
        assert_eq!(
            prepared.source_url(),
            format!("{}/file/my%20report.pdf", server.uri())
        );
    }

    #[tokio::test]
    async fn download_produces_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file/photo.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\xff\xd8\xff".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let artifact = downloader(&server, dir.path()).download("photo.jpg").await.unwrap();

        assert_eq!(artifact.path, dir.path().join("photo.jpg"));
        assert_eq!(artifact.filename, "photo.jpg");
        assert_eq!(artifact.extension, "jpg");
        assert_eq!(artifact.size, 3);
        assert_eq!(std::fs::read(&artifact.path).unwrap(), b"\xff\xd8\xff");
    }

    #[tokio::test]
    async fn rejected_download_keeps_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(410).set_body_string("expired"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = downloader(&server, dir.path()).download("old.zip").await.unwrap_err();

        assert!(matches!(
            err,
            DownloadError::Rejected { status: 410, ref message } if message == "expired"
        ));
    }

    #[tokio::test]
    async fn unwritable_destination_is_io_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        // storage root is a regular file, so nothing can be created under it
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, b"").unwrap();

        let err = downloader(&server, &root).download("a.txt").await.unwrap_err();
        assert!(matches!(err, DownloadError::Io(_)));
    }
}
