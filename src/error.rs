//! Errors surfaced at the action boundary
//!
//! Every variant is rendered to a display string by the session and never
//! propagated further; nothing here terminates the process.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::capture::DeviceError;

/// Which vendor endpoint produced an upstream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Chat,
    Transcription,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Chat => write!(f, "chat"),
            Endpoint::Transcription => write!(f, "transcription"),
        }
    }
}

/// Failure of a single user-triggered action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistError {
    /// Credential missing; detected before any request is formed
    #[error("API key is missing. Please check your environment variables.")]
    Configuration,

    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Request sent but no response received (including deadline expiry)
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx response from the vendor API
    #[error("{}", upstream_text(.endpoint, .status, .message))]
    Upstream {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },

    /// 2xx response whose body could not be decoded
    #[error("Invalid response from API: {0}")]
    MalformedResponse(String),

    #[error("No speech detected in the recording.")]
    EmptyTranscript,

    #[error("{0}")]
    MissingInput(&'static str),

    #[error("A request is already in progress.")]
    Busy,
}

fn upstream_text(endpoint: &Endpoint, status: &u16, message: &str) -> String {
    let reason = StatusCode::from_u16(*status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");
    let prefix = match endpoint {
        Endpoint::Chat => "API error",
        Endpoint::Transcription => "Failed to transcribe audio",
    };
    let text = format!("{prefix}: {status} {reason}. {message}");
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_includes_status_and_message() {
        let err = AssistError::Upstream {
            endpoint: Endpoint::Chat,
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 429 Too Many Requests. rate limited");
    }

    #[test]
    fn test_upstream_display_without_vendor_message() {
        let err = AssistError::Upstream {
            endpoint: Endpoint::Transcription,
            status: 500,
            message: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to transcribe audio: 500 Internal Server Error."
        );
    }

    #[test]
    fn test_transport_display() {
        let err = AssistError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
