//! Input capture devices
//!
//! Camera and microphone are reached through small traits so the session
//! never depends on a particular backend. The shipped backends read a still
//! image or a WAV clip from disk.

mod camera;
mod microphone;

pub use camera::{CapturedFrame, FrameSource, ImageFileCamera};
pub use microphone::{AudioInput, Recorder, Recording, WavFileInput};

/// Kind of capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Camera,
    Microphone,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Camera => write!(f, "camera"),
            DeviceKind::Microphone => write!(f, "microphone"),
        }
    }
}

/// Errors raised while acquiring or reading a capture device
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to access {0}. Please check permissions.")]
    PermissionDenied(DeviceKind),

    #[error("The {device} is unavailable: {reason}")]
    Unavailable { device: DeviceKind, reason: String },

    #[error("Failed to capture image from camera.")]
    CaptureFailed,

    #[error("A recording is already in progress. Stop it first.")]
    AlreadyRecording,

    #[error("No recording in progress.")]
    NotRecording,
}

impl DeviceError {
    /// Classify an I/O failure on the given device
    pub fn from_io(device: DeviceKind, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied(device),
            _ => DeviceError::Unavailable {
                device,
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_error_message() {
        let io = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = DeviceError::from_io(DeviceKind::Microphone, &io);
        assert_eq!(
            err.to_string(),
            "Failed to access microphone. Please check permissions."
        );
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let io = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = DeviceError::from_io(DeviceKind::Camera, &io);
        assert!(matches!(
            err,
            DeviceError::Unavailable {
                device: DeviceKind::Camera,
                ..
            }
        ));
    }
}
