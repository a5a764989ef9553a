//! Input modalities and the prompt table keyed by them

mod table;

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use table::{template, PromptTemplate, TRANSCRIPTION_LANGUAGE, TRANSCRIPTION_MODEL};

/// The active input mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Typed question
    #[default]
    Text,
    /// Still frame from a camera
    Image,
    /// Recorded audio clip
    Voice,
}

impl Modality {
    /// Informational text shown when the API answers without content
    pub fn empty_placeholder(&self) -> &'static str {
        match self {
            Modality::Image => "No analysis generated. Please try again.",
            Modality::Text | Modality::Voice => "No response generated. Please try again.",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::Text => write!(f, "text"),
            Modality::Image => write!(f, "image"),
            Modality::Voice => write!(f, "voice"),
        }
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" | "vision" => Ok(Modality::Image),
            "voice" | "audio" => Ok(Modality::Voice),
            other => Err(format!("unknown mode '{other}' (expected text, image or voice)")),
        }
    }
}

/// Image sub-mode selecting the prompt pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Describe objects and scene
    #[default]
    Identify,
    /// Transcribe visible text
    Extract,
    /// Identify, then synthesize background information
    Search,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 3] = [
        AnalysisMode::Identify,
        AnalysisMode::Extract,
        AnalysisMode::Search,
    ];
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Identify => write!(f, "identify"),
            AnalysisMode::Extract => write!(f, "extract"),
            AnalysisMode::Search => write!(f, "search"),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identify" => Ok(AnalysisMode::Identify),
            "extract" => Ok(AnalysisMode::Extract),
            "search" => Ok(AnalysisMode::Search),
            other => Err(format!(
                "unknown analysis mode '{other}' (expected identify, extract or search)"
            )),
        }
    }
}
