//! Microphone recording
//!
//! A [`Recorder`] owns at most one open [`AudioStream`]. The stream is
//! released on stop, on read failure and on drop.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{DeviceError, DeviceKind};

const CHUNK_SIZE: usize = 16 * 1024;

/// A finished audio clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    bytes: Vec<u8>,
}

impl Recording {
    pub const FILE_NAME: &'static str = "audio.wav";
    pub const MIME: &'static str = "audio/wav";

    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An acquired audio device
pub trait AudioStream: Send {
    /// Next chunk of captured audio, `None` once the source is exhausted
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, DeviceError>;

    /// Stop all tracks and give the device back. Must be idempotent.
    fn release(&mut self);
}

/// A device that can be opened for recording
pub trait AudioInput {
    fn open(&self) -> Result<Box<dyn AudioStream>, DeviceError>;
}

/// Microphone backed by a WAV file on disk
#[derive(Debug, Clone)]
pub struct WavFileInput {
    path: PathBuf,
}

impl WavFileInput {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }
}

impl AudioInput for WavFileInput {
    fn open(&self) -> Result<Box<dyn AudioStream>, DeviceError> {
        let file = File::open(&self.path).map_err(|e| {
            warn!(path = ?self.path, error = %e, "microphone open failed");
            DeviceError::from_io(DeviceKind::Microphone, &e)
        })?;
        debug!(path = ?self.path, "microphone opened");
        Ok(Box::new(WavFileStream { file: Some(file) }))
    }
}

struct WavFileStream {
    file: Option<File>,
}

impl AudioStream for WavFileStream {
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, DeviceError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = file
            .read(&mut buf)
            .map_err(|e| DeviceError::from_io(DeviceKind::Microphone, &e))?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    fn release(&mut self) {
        self.file = None;
    }
}

/// Single-slot recorder
#[derive(Default)]
pub struct Recorder {
    active: Option<Box<dyn AudioStream>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Acquire the device and start recording
    pub fn start(&mut self, input: &dyn AudioInput) -> Result<(), DeviceError> {
        if self.active.is_some() {
            return Err(DeviceError::AlreadyRecording);
        }

        self.active = Some(input.open()?);
        info!("recording started");
        Ok(())
    }

    /// Stop recording, release the device and return the captured clip
    pub fn stop(&mut self) -> Result<Recording, DeviceError> {
        let mut stream = self.active.take().ok_or(DeviceError::NotRecording)?;

        let mut bytes = Vec::new();
        let drained = loop {
            match stream.read_chunk() {
                Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        stream.release();
        drained?;

        info!(size = bytes.len(), "recording stopped");
        Ok(Recording::new(bytes))
    }

    /// Release the device without reading the clip. Returns whether a
    /// recording was active.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(mut stream) => {
                stream.release();
                info!("recording cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(mut stream) = self.active.take() {
            debug!("releasing microphone on drop");
            stream.release();
        }
    }
}
