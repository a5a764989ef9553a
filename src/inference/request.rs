//! Request construction
//!
//! Maps the active modality, the image analysis mode and the raw input to a
//! ready-to-send request. Nothing is built without a credential.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capture::{CapturedFrame, Recording};
use crate::config::Credential;
use crate::error::AssistError;
use crate::prompts::{
    self, AnalysisMode, Modality, PromptTemplate, TRANSCRIPTION_LANGUAGE, TRANSCRIPTION_MODEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Body of a chat completion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
}

impl ChatRequest {
    /// Build a request from a template row and the user message content
    pub fn from_template(template: &PromptTemplate, content: MessageContent) -> Self {
        Self {
            model: template.model.to_string(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: MessageContent::Text(template.system.to_string()),
                },
                ChatMessage {
                    role: Role::User,
                    content,
                },
            ],
            temperature: template.sampling.temperature,
            max_tokens: template.sampling.max_tokens,
            top_p: template.sampling.top_p,
            stream: false,
            presence_penalty: template.sampling.presence_penalty,
            frequency_penalty: template.sampling.frequency_penalty,
        }
    }

    /// Chat request answering a voice transcript
    pub fn for_transcript(transcript: &str) -> Self {
        Self::from_template(
            prompts::template(Modality::Voice, AnalysisMode::default()),
            MessageContent::Text(transcript.to_string()),
        )
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .and_then(|m| match &m.content {
                MessageContent::Text(text) => Some(text.as_str()),
                MessageContent::Parts(_) => None,
            })
    }

    pub fn user_content(&self) -> Option<&MessageContent> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| &m.content)
    }
}

/// Multipart body of a transcription call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub audio: Vec<u8>,
    pub file_name: &'static str,
    pub mime: &'static str,
    pub model: &'static str,
    pub language: &'static str,
    pub response_format: &'static str,
}

impl TranscriptionRequest {
    pub fn new(recording: &Recording) -> Self {
        Self {
            audio: recording.bytes().to_vec(),
            file_name: Recording::FILE_NAME,
            mime: Recording::MIME,
            model: TRANSCRIPTION_MODEL,
            language: TRANSCRIPTION_LANGUAGE,
            response_format: "json",
        }
    }
}

/// Work dispatched to the inference client for one submission
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// A single chat completion
    Chat {
        modality: Modality,
        request: ChatRequest,
    },
    /// Transcribe, then answer the transcript
    Voice { transcription: TranscriptionRequest },
}

impl Job {
    pub fn modality(&self) -> Modality {
        match self {
            Job::Chat { modality, .. } => *modality,
            Job::Voice { .. } => Modality::Voice,
        }
    }
}

/// Raw input for one submission, tagged by modality
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    Text(&'a str),
    Image(Option<&'a CapturedFrame>),
    Voice(Option<&'a Recording>),
}

impl RawInput<'_> {
    pub fn modality(&self) -> Modality {
        match self {
            RawInput::Text(_) => Modality::Text,
            RawInput::Image(_) => Modality::Image,
            RawInput::Voice(_) => Modality::Voice,
        }
    }
}

/// Turns raw input into jobs, gated on the credential
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    credential: Credential,
}

impl RequestBuilder {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn build(&self, mode: AnalysisMode, input: RawInput<'_>) -> Result<Job, AssistError> {
        if !self.credential.is_configured() {
            return Err(AssistError::Configuration);
        }

        let modality = input.modality();
        let template = prompts::template(modality, mode);

        let job = match input {
            RawInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(AssistError::MissingInput(
                        "Please enter a question first.",
                    ));
                }
                Job::Chat {
                    modality,
                    request: ChatRequest::from_template(
                        template,
                        MessageContent::Text(text.to_string()),
                    ),
                }
            }
            RawInput::Image(frame) => {
                let frame = frame
                    .filter(|f| !f.is_empty())
                    .ok_or(AssistError::MissingInput(
                        "No image captured. Please capture an image first.",
                    ))?;
                let mut parts = Vec::with_capacity(2);
                if let Some(user) = template.user {
                    parts.push(ContentPart::Text {
                        text: user.to_string(),
                    });
                }
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: frame.to_data_url(),
                    },
                });
                Job::Chat {
                    modality,
                    request: ChatRequest::from_template(template, MessageContent::Parts(parts)),
                }
            }
            RawInput::Voice(recording) => {
                let recording = recording
                    .filter(|r| !r.is_empty())
                    .ok_or(AssistError::MissingInput(
                        "No audio recorded. Please record some audio first.",
                    ))?;
                Job::Voice {
                    transcription: TranscriptionRequest::new(recording),
                }
            }
        };

        debug!(%modality, %mode, "request built");
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use tokio_test::{assert_err, assert_ok};

    fn builder() -> RequestBuilder {
        RequestBuilder::new(Credential::Configured(ApiKey::new("gsk_test")))
    }

    #[test]
    fn test_unconfigured_builder_rejects_every_modality() {
        let builder = RequestBuilder::new(Credential::Unconfigured);
        let frame = CapturedFrame::new(vec![1, 2, 3], "image/jpeg");
        let clip = Recording::new(vec![1, 2, 3]);

        for input in [
            RawInput::Text("what is rust?"),
            RawInput::Image(Some(&frame)),
            RawInput::Voice(Some(&clip)),
        ] {
            assert_eq!(
                builder.build(AnalysisMode::Identify, input),
                Err(AssistError::Configuration)
            );
        }
    }

    #[test]
    fn test_credential_checked_before_input() {
        let builder = RequestBuilder::new(Credential::Unconfigured);
        assert_eq!(
            builder.build(AnalysisMode::Identify, RawInput::Voice(None)),
            Err(AssistError::Configuration)
        );
    }

    #[test]
    fn test_text_content_is_verbatim() {
        let question = "  Explain  ownership\nwith an example ";
        let job = assert_ok!(builder().build(AnalysisMode::Search, RawInput::Text(question)));

        let Job::Chat { modality, request } = job else {
            panic!("expected chat job");
        };
        assert_eq!(modality, Modality::Text);
        assert_eq!(
            request.user_content(),
            Some(&MessageContent::Text(question.to_string()))
        );
        assert_eq!(request.model, "llama3-70b-8192");
        assert_eq!(request.max_tokens, None);
    }

    #[test]
    fn test_blank_text_rejected() {
        assert_err!(builder().build(AnalysisMode::Identify, RawInput::Text("   ")));
    }

    #[test]
    fn test_image_prompts_match_table_row() {
        let frame = CapturedFrame::new(vec![0xff, 0xd8, 0xff], "image/jpeg");

        for mode in AnalysisMode::ALL {
            let row = prompts::template(Modality::Image, mode);
            let job = assert_ok!(builder().build(mode, RawInput::Image(Some(&frame))));
            let Job::Chat { request, .. } = job else {
                panic!("expected chat job");
            };

            assert_eq!(request.system_prompt(), Some(row.system));
            let Some(MessageContent::Parts(parts)) = request.user_content() else {
                panic!("expected multi-part content");
            };
            assert_eq!(
                parts[0],
                ContentPart::Text {
                    text: row.user.unwrap().to_string()
                }
            );
            assert_eq!(
                parts[1],
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "data:image/jpeg;base64,/9j/".to_string()
                    }
                }
            );

            for other in AnalysisMode::ALL.iter().filter(|m| **m != mode) {
                let other_row = prompts::template(Modality::Image, *other);
                assert_ne!(request.system_prompt(), Some(other_row.system));
            }
        }
    }

    #[test]
    fn test_image_without_frame_rejected() {
        assert_eq!(
            builder().build(AnalysisMode::Identify, RawInput::Image(None)),
            Err(AssistError::MissingInput(
                "No image captured. Please capture an image first."
            ))
        );
    }

    #[test]
    fn test_voice_builds_transcription_first() {
        let clip = Recording::new(b"RIFF....WAVE".to_vec());
        let job = assert_ok!(builder().build(AnalysisMode::Identify, RawInput::Voice(Some(&clip))));

        let Job::Voice { transcription } = job else {
            panic!("expected voice job");
        };
        assert_eq!(transcription.audio, clip.bytes());
        assert_eq!(transcription.model, "whisper-large-v3");
        assert_eq!(transcription.language, "en");
    }

    #[test]
    fn test_chat_request_wire_format() {
        let frame = CapturedFrame::new(vec![1], "image/png");
        let Job::Chat { request, .. } = builder()
            .build(AnalysisMode::Extract, RawInput::Image(Some(&frame)))
            .unwrap()
        else {
            panic!("expected chat job");
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"][0]["type"], "text");
        assert_eq!(json["messages"][1]["content"][1]["type"], "image_url");
        assert!(json["messages"][1]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_text_request_omits_unset_sampling() {
        let Job::Chat { request, .. } = builder()
            .build(AnalysisMode::Identify, RawInput::Text("hi"))
            .unwrap()
        else {
            panic!("expected chat job");
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("top_p").is_none());
        assert_eq!(json["messages"][1]["content"], "hi");
    }
}
