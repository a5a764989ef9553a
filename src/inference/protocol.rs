//! Response bodies returned by the vendor API
//!
//! Every field is optional on the wire; decoding only fails on bodies that
//! are not JSON objects at all.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first candidate, if it has any
    pub(crate) fn into_first_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

impl TranscriptionResponse {
    pub(crate) fn into_text(self) -> Option<String> {
        self.text.filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Vendor-supplied error message from a failure body, empty when absent
pub(crate) fn vendor_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|wrapper| wrapper.error)
        .and_then(|error| error.message)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(body: &str) -> ChatCompletionResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_first_candidate_extracted() {
        let body = r#"{"choices":[{"message":{"content":"X"}},{"message":{"content":"Y"}}]}"#;
        assert_eq!(chat(body).into_first_text().as_deref(), Some("X"));
    }

    #[test]
    fn test_missing_or_empty_candidates() {
        assert_eq!(chat(r#"{"choices":[]}"#).into_first_text(), None);
        assert_eq!(chat(r#"{}"#).into_first_text(), None);
        assert_eq!(chat(r#"{"choices":[{}]}"#).into_first_text(), None);
        assert_eq!(
            chat(r#"{"choices":[{"message":{"content":null}}]}"#).into_first_text(),
            None
        );
        assert_eq!(
            chat(r#"{"choices":[{"message":{"content":""}}]}"#).into_first_text(),
            None
        );
    }

    #[test]
    fn test_vendor_message() {
        assert_eq!(
            vendor_message(r#"{"error":{"message":"rate limited","type":"tokens"}}"#),
            "rate limited"
        );
        assert_eq!(vendor_message(r#"{"error":{}}"#), "");
        assert_eq!(vendor_message("<html>bad gateway</html>"), "");
    }

    #[test]
    fn test_transcription_text() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text":" What is photosynthesis?"}"#).unwrap();
        assert_eq!(
            parsed.into_text().as_deref(),
            Some(" What is photosynthesis?")
        );

        let blank: TranscriptionResponse = serde_json::from_str(r#"{"text":"  "}"#).unwrap();
        assert_eq!(blank.into_text(), None);
    }
}
