//! Fixed prompt templates
//!
//! The table is constant data; nothing mutates it at runtime.

use super::{AnalysisMode, Modality};

/// Sampling parameters sent with a chat completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
}

impl Sampling {
    /// Plain question answering: temperature only
    pub const CONVERSATIONAL: Sampling = Sampling {
        temperature: 0.7,
        max_tokens: None,
        top_p: None,
        presence_penalty: None,
        frequency_penalty: None,
    };

    /// Long-form answers for vision and voice
    pub const DETAILED: Sampling = Sampling {
        temperature: 0.7,
        max_tokens: Some(4096),
        top_p: Some(0.9),
        presence_penalty: Some(0.1),
        frequency_penalty: Some(0.1),
    };
}

/// One row of the prompt table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptTemplate {
    pub system: &'static str,
    /// Instruction sent alongside an image; text and voice send the raw input instead
    pub user: Option<&'static str>,
    pub model: &'static str,
    pub sampling: Sampling,
}

pub const TEXT_MODEL: &str = "llama3-70b-8192";
pub const VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const TRANSCRIPTION_MODEL: &str = "whisper-large-v3";
pub const TRANSCRIPTION_LANGUAGE: &str = "en";

pub const TUTOR_SYSTEM_PROMPT: &str =
    "You are a helpful learning assistant that provides clear, concise explanations and examples.";

pub const TEXT: PromptTemplate = PromptTemplate {
    system: TUTOR_SYSTEM_PROMPT,
    user: None,
    model: TEXT_MODEL,
    sampling: Sampling::CONVERSATIONAL,
};

pub const VOICE: PromptTemplate = PromptTemplate {
    system: TUTOR_SYSTEM_PROMPT,
    user: None,
    model: VISION_MODEL,
    sampling: Sampling::DETAILED,
};

pub const IMAGE_IDENTIFY: PromptTemplate = PromptTemplate {
    system: "You are a powerful visual analysis assistant. Analyze the image and describe what you see in detail. Identify objects, people, text, and any other relevant information. Provide educational insights about what is visible. Be specific and detailed in your analysis.",
    user: Some("Please analyze this image and tell me what you see. What objects are present? What can I learn from this image?"),
    model: VISION_MODEL,
    sampling: Sampling::DETAILED,
};

pub const IMAGE_EXTRACT: PromptTemplate = PromptTemplate {
    system: "You are a text extraction specialist. Extract and transcribe ALL text visible in the image. Format the extracted text clearly, preserving any structure, headings, or formatting you can infer. If there is no text, say \"No text detected in the image.\"",
    user: Some("Extract and transcribe all text visible in this image."),
    model: VISION_MODEL,
    sampling: Sampling::DETAILED,
};

pub const IMAGE_SEARCH: PromptTemplate = PromptTemplate {
    system: "You are a visual search assistant. Identify the main objects, text, or concepts in the image, then search the web for relevant information about them. Provide a comprehensive analysis that combines what you see with web-sourced information. Include educational insights and interesting facts.",
    user: Some("Identify what you see in this image and search for relevant information about it. Provide educational insights and interesting facts."),
    model: VISION_MODEL,
    sampling: Sampling::DETAILED,
};

/// Look up the template for a modality. The analysis mode only matters for images.
pub fn template(modality: Modality, mode: AnalysisMode) -> &'static PromptTemplate {
    match modality {
        Modality::Text => &TEXT,
        Modality::Voice => &VOICE,
        Modality::Image => match mode {
            AnalysisMode::Identify => &IMAGE_IDENTIFY,
            AnalysisMode::Extract => &IMAGE_EXTRACT,
            AnalysisMode::Search => &IMAGE_SEARCH,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_modes_map_to_distinct_rows() {
        let rows: Vec<_> = AnalysisMode::ALL
            .iter()
            .map(|mode| template(Modality::Image, *mode))
            .collect();

        assert_eq!(rows[0], &IMAGE_IDENTIFY);
        assert_eq!(rows[1], &IMAGE_EXTRACT);
        assert_eq!(rows[2], &IMAGE_SEARCH);
        assert_ne!(rows[0].system, rows[1].system);
        assert_ne!(rows[1].system, rows[2].system);
        assert!(rows.iter().all(|row| row.user.is_some()));
    }

    #[test]
    fn test_text_and_voice_ignore_analysis_mode() {
        for mode in AnalysisMode::ALL {
            assert_eq!(template(Modality::Text, mode), &TEXT);
            assert_eq!(template(Modality::Voice, mode), &VOICE);
        }
    }

    #[test]
    fn test_text_uses_conversational_sampling() {
        assert_eq!(TEXT.sampling.max_tokens, None);
        assert_eq!(VOICE.sampling.max_tokens, Some(4096));
    }
}
