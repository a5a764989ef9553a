//! Events module for session transitions
//!
//! Structured events published by the session on every user action and
//! every completed request.

use serde::{Deserialize, Serialize};

use crate::prompts::{AnalysisMode, Modality};

/// Events emitted by the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// User switched the active modality
    ModalityChanged { modality: Modality },

    /// User picked a different image analysis mode
    AnalysisModeChanged { mode: AnalysisMode },

    /// A request was dispatched
    SubmitStarted {
        modality: Modality,
        generation: u64,
    },

    /// The request finished with a reply
    ResponseReceived {
        modality: Modality,
        /// Milliseconds between dispatch and completion
        duration_ms: u64,
        /// Reply carried no usable content
        empty: bool,
    },

    /// The request finished with an error
    RequestFailed {
        modality: Modality,
        duration_ms: u64,
        message: String,
    },

    /// A completion arrived for a session state that has moved on
    StaleResponseDiscarded { generation: u64 },

    /// A still frame was captured
    FrameCaptured { size: usize },

    /// Captured frame and result were cleared
    CaptureReset,

    /// Microphone acquired
    RecordingStarted,

    /// Microphone released
    RecordingStopped { size: usize },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::ModalityChanged { modality } => {
                write!(f, "MODALITY_CHANGED ({})", modality)
            }
            SessionEvent::AnalysisModeChanged { mode } => {
                write!(f, "ANALYSIS_MODE_CHANGED ({})", mode)
            }
            SessionEvent::SubmitStarted {
                modality,
                generation,
            } => write!(f, "SUBMIT_STARTED ({}, gen {})", modality, generation),
            SessionEvent::ResponseReceived {
                modality,
                duration_ms,
                empty,
            } => {
                if *empty {
                    write!(f, "EMPTY_RESPONSE ({}, {}ms)", modality, duration_ms)
                } else {
                    write!(f, "RESPONSE_RECEIVED ({}, {}ms)", modality, duration_ms)
                }
            }
            SessionEvent::RequestFailed {
                modality,
                duration_ms,
                ..
            } => write!(f, "REQUEST_FAILED ({}, {}ms)", modality, duration_ms),
            SessionEvent::StaleResponseDiscarded { generation } => {
                write!(f, "STALE_RESPONSE_DISCARDED (gen {})", generation)
            }
            SessionEvent::FrameCaptured { size } => write!(f, "FRAME_CAPTURED ({} bytes)", size),
            SessionEvent::CaptureReset => write!(f, "CAPTURE_RESET"),
            SessionEvent::RecordingStarted => write!(f, "RECORDING_STARTED"),
            SessionEvent::RecordingStopped { size } => {
                write!(f, "RECORDING_STOPPED ({} bytes)", size)
            }
        }
    }
}
