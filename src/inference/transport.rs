//! HTTP transport for the inference API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::config::ApiKey;
use crate::error::AssistError;

use super::request::{ChatRequest, TranscriptionRequest};

/// Status and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs single POSTs. Implementations report only transport-level
/// failures; status handling belongs to the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        api_key: &ApiKey,
        body: &ChatRequest,
    ) -> Result<HttpReply, AssistError>;

    async fn post_multipart(
        &self,
        url: &str,
        api_key: &ApiKey,
        form: TranscriptionRequest,
    ) -> Result<HttpReply, AssistError>;
}

/// `reqwest` backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read(response: reqwest::Response) -> Result<HttpReply, AssistError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AssistError::Transport(format!("failed to read response body: {e}")))?;
        debug!(status, size = body.len(), "response received");
        Ok(HttpReply::new(status, body))
    }
}

fn send_error(err: reqwest::Error) -> AssistError {
    AssistError::Transport(format!("request failed: {err}"))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &ApiKey,
        body: &ChatRequest,
    ) -> Result<HttpReply, AssistError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(send_error)?;
        Self::read(response).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        api_key: &ApiKey,
        form: TranscriptionRequest,
    ) -> Result<HttpReply, AssistError> {
        let file = Part::bytes(form.audio)
            .file_name(form.file_name)
            .mime_str(form.mime)
            .map_err(send_error)?;
        let multipart = Form::new()
            .part("file", file)
            .text("model", form.model)
            .text("language", form.language)
            .text("response_format", form.response_format);

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key.expose())
            .multipart(multipart)
            .send()
            .await
            .map_err(send_error)?;
        Self::read(response).await
    }
}
