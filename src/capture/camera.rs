//! Still-frame capture

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use super::{DeviceError, DeviceKind};

/// Mime type assumed when the source does not say
const DEFAULT_FRAME_MIME: &str = "image/jpeg";

/// A single captured image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    bytes: Vec<u8>,
    mime: String,
}

impl CapturedFrame {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encode as a `data:` URL for inline transfer
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }
}

/// Anything that can produce a still frame on demand
pub trait FrameSource: Send {
    fn snapshot(&mut self) -> Result<CapturedFrame, DeviceError>;
}

/// Camera backed by an image file on disk
#[derive(Debug, Clone)]
pub struct ImageFileCamera {
    path: PathBuf,
}

impl ImageFileCamera {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }
}

impl FrameSource for ImageFileCamera {
    fn snapshot(&mut self) -> Result<CapturedFrame, DeviceError> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            warn!(path = ?self.path, error = %e, "camera read failed");
            DeviceError::from_io(DeviceKind::Camera, &e)
        })?;

        if bytes.is_empty() {
            return Err(DeviceError::CaptureFailed);
        }

        let mime = mime_guess::from_path(&self.path)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_FRAME_MIME.to_string());

        debug!(path = ?self.path, size = bytes.len(), %mime, "frame captured");
        Ok(CapturedFrame::new(bytes, mime))
    }
}
