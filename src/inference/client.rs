//! Inference client
//!
//! Sends chat and transcription requests, applies the request deadline and
//! normalizes responses into [`Reply`] or [`AssistError`]. There is no
//! retry: every failure is reported to the caller immediately.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{ApiKey, Config};
use crate::error::{AssistError, Endpoint};
use crate::prompts::Modality;

use super::protocol::{vendor_message, ChatCompletionResponse, TranscriptionResponse};
use super::request::{ChatRequest, Job, TranscriptionRequest};
use super::transport::{HttpReply, HttpTransport, Transport};

/// Outcome of a successful chat completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text of the first candidate
    Answer(String),
    /// 2xx response without usable content
    Empty,
}

impl Reply {
    /// What to display for this reply in the given modality
    pub fn display_text(&self, modality: Modality) -> &str {
        match self {
            Reply::Answer(text) => text,
            Reply::Empty => modality.empty_placeholder(),
        }
    }
}

/// Client for the chat completion and transcription endpoints
#[derive(Clone)]
pub struct InferenceClient {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl InferenceClient {
    /// Create a client using the HTTP transport
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    fn api_key(&self) -> Result<&ApiKey, AssistError> {
        self.config
            .credential
            .api_key()
            .ok_or(AssistError::Configuration)
    }

    /// Await a transport call, synthesizing a transport error on expiry
    async fn with_deadline<F>(&self, endpoint: Endpoint, call: F) -> Result<HttpReply, AssistError>
    where
        F: Future<Output = Result<HttpReply, AssistError>>,
    {
        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%endpoint, timeout = ?self.config.timeout, "request deadline expired");
                Err(AssistError::Transport(format!(
                    "request timed out after {:?}",
                    self.config.timeout
                )))
            }
        }
    }

    /// Run one chat completion
    pub async fn complete(&self, request: &ChatRequest) -> Result<Reply, AssistError> {
        let api_key = self.api_key()?;
        let started = Instant::now();

        info!(model = %request.model, "sending chat completion");
        let reply = self
            .with_deadline(
                Endpoint::Chat,
                self.transport
                    .post_json(&self.config.chat_url, api_key, request),
            )
            .await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !reply.is_success() {
            warn!(status = reply.status, elapsed_ms, "chat completion failed");
            return Err(AssistError::Upstream {
                endpoint: Endpoint::Chat,
                status: reply.status,
                message: vendor_message(&reply.body),
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&reply.body)
            .map_err(|e| AssistError::MalformedResponse(e.to_string()))?;

        match parsed.into_first_text() {
            Some(text) => {
                info!(elapsed_ms, chars = text.len(), "chat completion succeeded");
                Ok(Reply::Answer(text))
            }
            None => {
                info!(elapsed_ms, "chat completion returned no candidates");
                Ok(Reply::Empty)
            }
        }
    }

    /// Transcribe a recorded clip
    pub async fn transcribe(&self, request: TranscriptionRequest) -> Result<String, AssistError> {
        let api_key = self.api_key()?;
        let started = Instant::now();

        info!(model = request.model, size = request.audio.len(), "sending transcription");
        let reply = self
            .with_deadline(
                Endpoint::Transcription,
                self.transport
                    .post_multipart(&self.config.transcription_url, api_key, request),
            )
            .await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if !reply.is_success() {
            warn!(status = reply.status, elapsed_ms, "transcription failed");
            return Err(AssistError::Upstream {
                endpoint: Endpoint::Transcription,
                status: reply.status,
                message: vendor_message(&reply.body),
            });
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&reply.body)
            .map_err(|e| AssistError::MalformedResponse(e.to_string()))?;
        let text = parsed.into_text().ok_or(AssistError::EmptyTranscript)?;

        info!(elapsed_ms, chars = text.len(), "transcription succeeded");
        Ok(text)
    }

    /// Execute a job; voice jobs only reach the chat endpoint after a
    /// successful transcription
    pub async fn run(&self, job: Job) -> Result<Reply, AssistError> {
        match job {
            Job::Chat { request, .. } => self.complete(&request).await,
            Job::Voice { transcription } => {
                let transcript = self.transcribe(transcription).await?;
                debug!(%transcript, "answering transcript");
                self.complete(&ChatRequest::for_transcript(&transcript)).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::capture::{CapturedFrame, Recording};
    use crate::config::{ApiKey, Credential};
    use crate::inference::request::{MessageContent, RawInput, RequestBuilder};
    use crate::inference::testing::{Call, MockTransport};
    use crate::prompts::AnalysisMode;

    fn configured() -> Config {
        Config::default().with_credential(Credential::Configured(ApiKey::new("gsk_test")))
    }

    fn client(transport: &Arc<MockTransport>) -> InferenceClient {
        InferenceClient::with_transport(configured(), transport.clone())
    }

    fn text_job(text: &str) -> Job {
        RequestBuilder::new(configured().credential)
            .build(AnalysisMode::Identify, RawInput::Text(text))
            .unwrap()
    }

    #[tokio::test]
    async fn test_answer_is_first_candidate() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(200, r#"{"choices":[{"message":{"content":"X"}}]}"#);

        let reply = client(&transport).run(text_job("what is X?")).await.unwrap();
        assert_eq!(reply, Reply::Answer("X".to_string()));
        assert_eq!(reply.display_text(Modality::Text), "X");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Chat { url, api_key, .. } => {
                assert_eq!(url, crate::config::DEFAULT_CHAT_URL);
                assert_eq!(api_key, "gsk_test");
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_soft_empty() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(200, r#"{"choices":[]}"#);

        let reply = client(&transport).run(text_job("hello")).await.unwrap();
        assert_eq!(reply, Reply::Empty);
        assert_eq!(
            reply.display_text(Modality::Text),
            "No response generated. Please try again."
        );
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_status_and_message() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(429, r#"{"error":{"message":"rate limited"}}"#);

        let err = client(&transport).run(text_job("hello")).await.unwrap_err();
        let shown = err.to_string();
        assert!(shown.contains("429"), "{shown}");
        assert!(shown.contains("rate limited"), "{shown}");
    }

    #[tokio::test]
    async fn test_error_without_vendor_message() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(502, "upstream gone");

        let err = client(&transport).run(text_job("hello")).await.unwrap_err();
        assert_eq!(
            err,
            AssistError::Upstream {
                endpoint: Endpoint::Chat,
                status: 502,
                message: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_network_failure_has_no_status() {
        let transport = Arc::new(MockTransport::new());
        transport.push_failure("connection refused");

        let err = client(&transport).run(text_job("hello")).await.unwrap_err();
        assert_eq!(err, AssistError::Transport("connection refused".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(200, "not json");

        let err = client(&transport).run(text_job("hello")).await.unwrap_err();
        assert!(matches!(err, AssistError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_transport_error() {
        let transport = Arc::new(MockTransport::new().with_delay(Duration::from_secs(5)));
        transport.push_reply(200, r#"{"choices":[{"message":{"content":"late"}}]}"#);

        let mut config = configured();
        config.timeout = Duration::from_millis(20);
        let client = InferenceClient::with_transport(config, transport.clone());

        let err = client.run(text_job("hello")).await.unwrap_err();
        assert!(matches!(err, AssistError::Transport(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_unconfigured_client_makes_no_calls() {
        let transport = Arc::new(MockTransport::new());
        let client = InferenceClient::with_transport(Config::default(), transport.clone());

        let request = ChatRequest::for_transcript("hi");
        assert_eq!(client.complete(&request).await, Err(AssistError::Configuration));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_voice_transcribes_then_completes() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(200, r#"{"text":"What is a closure?"}"#);
        transport.push_reply(200, r#"{"choices":[{"message":{"content":"A function value."}}]}"#);

        let clip = Recording::new(b"RIFF-audio".to_vec());
        let job = RequestBuilder::new(configured().credential)
            .build(AnalysisMode::Identify, RawInput::Voice(Some(&clip)))
            .unwrap();

        let reply = client(&transport).run(job).await.unwrap();
        assert_eq!(reply, Reply::Answer("A function value.".to_string()));

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Transcription { form, .. } => assert_eq!(form.audio, b"RIFF-audio"),
            other => panic!("expected transcription first, got {other:?}"),
        }
        match &calls[1] {
            Call::Chat { body, .. } => assert_eq!(
                body.user_content(),
                Some(&MessageContent::Text("What is a closure?".to_string()))
            ),
            other => panic!("expected chat second, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_transcription_prevents_chat() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(400, r#"{"error":{"message":"file too short"}}"#);

        let clip = Recording::new(b"RIFF".to_vec());
        let job = RequestBuilder::new(configured().credential)
            .build(AnalysisMode::Identify, RawInput::Voice(Some(&clip)))
            .unwrap();

        let err = client(&transport).run(job).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to transcribe audio: 400"));
        assert!(err.to_string().contains("file too short"));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_transcript_prevents_chat() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(200, r#"{"text":""}"#);

        let clip = Recording::new(b"RIFF".to_vec());
        let job = Job::Voice {
            transcription: TranscriptionRequest::new(&clip),
        };

        let err = client(&transport).run(job).await.unwrap_err();
        assert_eq!(err, AssistError::EmptyTranscript);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_image_placeholder_on_empty() {
        let transport = Arc::new(MockTransport::new());
        transport.push_reply(200, r#"{"choices":[{"message":{}}]}"#);

        let frame = CapturedFrame::new(vec![1, 2], "image/jpeg");
        let job = RequestBuilder::new(configured().credential)
            .build(AnalysisMode::Extract, RawInput::Image(Some(&frame)))
            .unwrap();
        let modality = job.modality();

        let reply = client(&transport).run(job).await.unwrap();
        assert_eq!(
            reply.display_text(modality),
            "No analysis generated. Please try again."
        );
    }
}
