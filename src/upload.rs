use log::{info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::api::{error_text, ApiClient};
use crate::error::UploadError;
use crate::identifier::{
    AuxiliaryToken, FileIdentifier, Identifier, IdentifierGenerator, RandomIdentifiers,
};

/// Media type sent when the source does not declare one
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
    pub media_type: Option<String>,
}

impl LocalFile {
    /// Name defaults to the final path component
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Self {
            path,
            name,
            media_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn media_type(&self) -> &str {
        self.media_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MEDIA_TYPE)
    }
}

/// One multipart submission: the file under `file`, plus `fileId` and `iv`
#[derive(Debug)]
pub struct UploadRequest<'a> {
    pub file: &'a LocalFile,
    pub file_id: Identifier,
    pub iv: AuxiliaryToken,
}

impl UploadRequest<'_> {
    /// Open the file and build the form. The file body is streamed, not buffered.
    pub async fn into_form(self) -> Result<Form, UploadError> {
        let name = self.file.name.trim();
        if name.is_empty() {
            return Err(UploadError::InvalidFile("file name is empty".to_string()));
        }

        let path = &self.file.path;
        let metadata = tokio::fs::metadata(path).await.map_err(|e| io_error(path, e))?;
        if !metadata.is_file() {
            return Err(UploadError::InvalidFile(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let file = File::open(path).await.map_err(|e| io_error(path, e))?;
        let body = Body::wrap_stream(ReaderStream::new(file));
        let media_type = self.file.media_type();

        let part = Part::stream_with_length(body, metadata.len())
            .file_name(name.to_string())
            .mime_str(media_type)
            .map_err(|_| UploadError::InvalidFile(format!("invalid media type {media_type:?}")))?;

        Ok(Form::new()
            .part("file", part)
            .text("fileId", self.file_id.to_string())
            .text("iv", self.iv.to_string()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> UploadError {
    UploadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "fileId")]
    file_id: FileIdentifier,
}

pub struct UploadCoordinator {
    api: ApiClient,
    ids: Arc<dyn IdentifierGenerator>,
}

impl UploadCoordinator {
    pub fn new(api: ApiClient) -> Self {
        Self::with_generator(api, Arc::new(RandomIdentifiers))
    }

    pub fn with_generator(api: ApiClient, ids: Arc<dyn IdentifierGenerator>) -> Self {
        Self { api, ids }
    }

    /// Send `file` in a single POST and return the identifier the server confirmed.
    ///
    /// One attempt only; failures are returned, never retried.
    pub async fn upload(&self, file: &LocalFile) -> Result<FileIdentifier, UploadError> {
        let request = UploadRequest {
            file,
            file_id: self.ids.generate(),
            iv: AuxiliaryToken::new(self.ids.generate()),
        };
        let proposed = FileIdentifier::from(request.file_id);
        let form = request.into_form().await?;

        let url = self.api.upload_url();
        info!("upload: {} ({}) -> {}", file.name, file.media_type(), url);

        let response = self
            .api
            .http()
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("upload: {} transport error: {}", file.name, e);
                UploadError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = error_text(response).await;
            warn!("upload: {} rejected ({}): {}", file.name, status, message);
            return Err(UploadError::Rejected(message));
        }

        let body = response.text().await.map_err(UploadError::Transport)?;
        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        if parsed.file_id.as_str().is_empty() {
            return Err(UploadError::InvalidResponse("empty fileId".to_string()));
        }

        if parsed.file_id != proposed {
            warn!(
                "upload: server assigned {} instead of proposed {}",
                parsed.file_id, proposed
            );
        }
        info!("upload: {} stored as {}", file.name, parsed.file_id);

        Ok(parsed.file_id)
    }
}
