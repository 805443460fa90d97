//! Caption endpoint client.

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::file::SelectedFile;
use crate::preview::PreviewStore;
use crate::state::{CaptionResult, UploadRequest, ViewerState};

/// Multipart field name the endpoint reads the image from.
pub const FILE_FIELD: &str = "file";

/// Performs the upload for a submitted [`UploadRequest`].
#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<CaptionResult, ViewerError>;
}

#[derive(Deserialize)]
struct FailureBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// HTTP client for the `/upload_image` endpoint.
///
/// No timeout is configured: a request waits until the transport resolves.
#[derive(Debug, Clone)]
pub struct HttpCaptionClient {
    client: reqwest::Client,
    endpoint_url: String,
}

impl HttpCaptionClient {
    pub fn new(config: &ViewerConfig) -> Self {
        Self::with_endpoint(config.endpoint_url.clone())
    }

    pub fn with_endpoint(endpoint_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint_url: endpoint_url.into(),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Builds the upload form. A declared type that is not a valid MIME
    /// string is left off the part rather than failing the upload.
    fn form(request: UploadRequest) -> Form {
        let file = request.file;
        let part = |bytes: Bytes| {
            let len = bytes.len() as u64;
            Part::stream_with_length(bytes, len).file_name(file.name.clone())
        };

        let part = match part(file.bytes.clone()).mime_str(&file.content_type) {
            Ok(part) => part,
            Err(e) => {
                tracing::warn!(
                    content_type = %file.content_type,
                    error = %e,
                    "sending file without content type"
                );
                part(file.bytes.clone())
            }
        };
        Form::new().part(FILE_FIELD, part)
    }
}

#[async_trait]
impl CaptionService for HttpCaptionClient {
    async fn upload(&self, request: UploadRequest) -> Result<CaptionResult, ViewerError> {
        tracing::info!(
            endpoint = %self.endpoint_url,
            name = %request.file.name,
            bytes = request.file.len(),
            "uploading image"
        );

        let form = Self::form(request);
        let response = self
            .client
            .post(&self.endpoint_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(500).collect();
            tracing::warn!(%status, body = %excerpt, "caption endpoint rejected upload");
            let detail = serde_json::from_str::<FailureBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .and_then(|d| d.as_str().map(str::to_string));
            return Err(ViewerError::rejected(detail));
        }

        let result: CaptionResult = serde_json::from_str(&body)
            .map_err(|e| ViewerError::Transport(e.to_string()))?;

        tracing::info!(caption = %result.caption, colors = result.detected_colors.len(), "caption received");
        Ok(result)
    }
}

/// Runs one pick and, when the file is accepted, one submit through `service`.
///
/// Returns the settled state: never loading, with either a result or an error.
pub async fn caption_once(
    service: &dyn CaptionService,
    file: SelectedFile,
    previews: &PreviewStore,
) -> ViewerState {
    let state = ViewerState::new().on_file_picked(Some(file), previews);
    if !state.can_submit() {
        return state;
    }

    match state.on_submit() {
        (state, Some(request)) => {
            let outcome = service.upload(request).await;
            state.on_upload_complete(outcome)
        }
        (state, None) => state,
    }
}
