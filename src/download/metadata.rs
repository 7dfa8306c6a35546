use log::{info, warn};

use super::types::DownloadMetadata;
use crate::api::{error_text, ApiClient};
use crate::error::MetadataError;

/// Looks up the stored filename for a file identifier. Nothing is cached.
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    api: ApiClient,
}

impl MetadataFetcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn fetch_metadata(&self, identifier: &str) -> Result<DownloadMetadata, MetadataError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(MetadataError::EmptyIdentifier);
        }

        let url = self.api.metadata_url(identifier);
        info!("metadata: {} -> {}", identifier, url);

        let response = self.api.http().get(&url).send().await.map_err(|e| {
            warn!("metadata: {} transport error: {}", identifier, e);
            MetadataError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = error_text(response).await;
            warn!("metadata: {} not available ({}): {}", identifier, status, message);
            return Err(MetadataError::NotFound(message));
        }

        let body = response.text().await.map_err(MetadataError::Transport)?;
        let metadata: DownloadMetadata = serde_json::from_str(&body)
            .map_err(|e| MetadataError::InvalidResponse(e.to_string()))?;
        if metadata.filename.is_empty() {
            return Err(MetadataError::InvalidResponse("empty filename".to_string()));
        }

        info!("metadata: {} is {}", identifier, metadata.filename);
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Client, Url};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> MetadataFetcher {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        MetadataFetcher::new(ApiClient::new(Client::new(), base))
    }

    #[tokio::test]
    async fn returns_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/abc123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "filename": "report.pdf", "uploadedAt": 1 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let metadata = fetcher(&server).fetch_metadata("abc123").await.unwrap();
        assert_eq!(metadata.filename, "report.pdf");
    }

    #[tokio::test]
    async fn not_found_carries_server_text_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/doesnotexist"))
            .respond_with(ResponseTemplate::new(404).set_body_string("file not found"))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_metadata("doesnotexist").await.unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(ref m) if m == "file not found"));
    }

    #[tokio::test]
    async fn empty_identifier_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_metadata("   ").await.unwrap_err();
        assert!(matches!(err, MetadataError::EmptyIdentifier));
    }

    #[tokio::test]
    async fn unparseable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_metadata("abc123").await.unwrap_err();
        assert!(matches!(err, MetadataError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn missing_filename_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "x" })))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch_metadata("abc123").await.unwrap_err();
        assert!(matches!(err, MetadataError::InvalidResponse(_)));
    }
}
