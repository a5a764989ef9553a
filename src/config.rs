//! Configuration loading and management
//!
//! Everything the inference client needs is read once from the environment
//! into an explicit [`Config`] and handed to the client at construction.

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Environment variable holding the bearer credential
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Overrides the chat completion endpoint
pub const CHAT_URL_VAR: &str = "SKILLSNAP_CHAT_URL";
/// Overrides the audio transcription endpoint
pub const TRANSCRIPTION_URL_VAR: &str = "SKILLSNAP_TRANSCRIPTION_URL";
/// Per-request deadline in seconds
pub const TIMEOUT_VAR: &str = "SKILLSNAP_TIMEOUT_SECS";

pub const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_TRANSCRIPTION_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Bearer token for the inference API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Whether a credential was supplied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Configured(ApiKey),
    Unconfigured,
}

impl Credential {
    /// Build from a raw value; blank strings count as absent
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            Some(key) if !key.trim().is_empty() => Self::Configured(ApiKey::new(key.trim())),
            _ => Self::Unconfigured,
        }
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        match self {
            Self::Configured(key) => Some(key),
            Self::Unconfigured => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for both endpoints
    pub credential: Credential,

    /// Chat completion endpoint
    pub chat_url: String,

    /// Audio transcription endpoint
    pub transcription_url: String,

    /// Deadline applied to every request
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credential: Credential::Unconfigured,
            chat_url: DEFAULT_CHAT_URL.to_string(),
            transcription_url: DEFAULT_TRANSCRIPTION_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{TIMEOUT_VAR} must be a whole number of seconds"))?;
                if secs == 0 {
                    bail!("{TIMEOUT_VAR} must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            credential: Credential::from_raw(lookup(API_KEY_VAR)),
            chat_url: lookup(CHAT_URL_VAR).unwrap_or(defaults.chat_url),
            transcription_url: lookup(TRANSCRIPTION_URL_VAR).unwrap_or(defaults.transcription_url),
            timeout,
        })
    }

    /// Replace the credential
    #[cfg(test)]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }
}
