//! Endpoints of the drop server

use reqwest::{Client, Response, Url};

use crate::config::ClientConfig;
use crate::error::ConfigError;

/// HTTP client bound to one server. No auth header is ever attached.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// `base_url` must end in `/`; [`ClientConfig::server_base`] guarantees this.
    pub fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = config.server_base()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(ConfigError::Client)?;

        Ok(Self::new(http, base_url))
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// POST, multipart
    pub fn upload_url(&self) -> String {
        format!("{}upload", self.base_url)
    }

    /// GET, JSON metadata for a file identifier
    pub fn metadata_url(&self, file_id: &str) -> String {
        format!("{}download/{}", self.base_url, urlencoding::encode(file_id))
    }

    /// GET, raw bytes of a stored file
    pub fn file_url(&self, filename: &str) -> String {
        format!("{}file/{}", self.base_url, urlencoding::encode(filename))
    }
}

/// Body of a non-success response, surfaced to the user verbatim.
/// Falls back to the status line when the body is empty or unreadable.
pub(crate) async fn error_text(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => status.to_string(),
    }
}
