//! Session state machine
//!
//! Tracks the presentation phase (Idle, Busy, Success, Failed) alongside the
//! user's inputs. Only re-submission while Busy is refused; every other
//! action is accepted in any phase.

use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::capture::{AudioInput, CapturedFrame, FrameSource, Recorder, Recording};
use crate::error::AssistError;
use crate::events::SessionEvent;
use crate::inference::{InferenceClient, Job, RawInput, Reply, RequestBuilder};
use crate::prompts::{AnalysisMode, Modality};

/// Interim result shown while an image is being analyzed
pub const ANALYZING_PLACEHOLDER: &str = "Analyzing image...";

/// Presentation phase of the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet, or a stale request was dropped
    #[default]
    Idle,
    /// A request is in flight
    Busy,
    /// Last request produced a result
    Success,
    /// Last request produced an error
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Busy => write!(f, "Busy"),
            Phase::Success => write!(f, "Success"),
            Phase::Failed => write!(f, "Failed"),
        }
    }
}

/// Everything the user has entered plus the last outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active_modality: Modality,
    pub input_text: String,
    pub captured_frame: Option<CapturedFrame>,
    pub recorded_audio: Option<Recording>,
    pub analysis_mode: AnalysisMode,
    pub last_error: Option<String>,
    pub last_result: Option<String>,
}

impl SessionState {
    fn raw_input(&self) -> RawInput<'_> {
        match self.active_modality {
            Modality::Text => RawInput::Text(&self.input_text),
            Modality::Image => RawInput::Image(self.captured_frame.as_ref()),
            Modality::Voice => RawInput::Voice(self.recorded_audio.as_ref()),
        }
    }
}

/// Proof of a dispatched request; hand it back to [`Session::finish`]
#[derive(Debug)]
pub struct Ticket {
    generation: u64,
    modality: Modality,
    started_at: Instant,
}

/// The session that owns all user-facing state
pub struct Session {
    state: SessionState,
    phase: Phase,
    /// Bumped whenever in-flight results would no longer apply
    generation: u64,
    phase_entered_at: Instant,
    recorder: Recorder,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Create a new session
    pub fn new(event_tx: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            state: SessionState::default(),
            phase: Phase::Idle,
            generation: 0,
            phase_entered_at: Instant::now(),
            recorder: Recorder::new(),
            event_tx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Busy
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Switch the active modality, dropping inputs and outcomes of the old one
    pub fn select_modality(&mut self, modality: Modality) {
        if modality == self.state.active_modality {
            return;
        }

        info!(from = %self.state.active_modality, to = %modality, "modality changed");
        if self.recorder.cancel() {
            self.emit(SessionEvent::RecordingStopped { size: 0 });
        }
        self.state.active_modality = modality;
        self.state.captured_frame = None;
        self.state.recorded_audio = None;
        self.state.last_error = None;
        self.state.last_result = None;
        self.invalidate();
        self.emit(SessionEvent::ModalityChanged { modality });
    }

    pub fn set_analysis_mode(&mut self, mode: AnalysisMode) {
        if mode == self.state.analysis_mode {
            return;
        }
        self.state.analysis_mode = mode;
        self.emit(SessionEvent::AnalysisModeChanged { mode });
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input_text = text.into();
        self.state.last_error = None;
    }

    /// Take a still frame from the camera
    pub fn capture_frame(&mut self, camera: &mut dyn FrameSource) -> Result<(), AssistError> {
        match camera.snapshot() {
            Ok(frame) => {
                let size = frame.len();
                self.state.captured_frame = Some(frame);
                self.state.last_error = None;
                self.emit(SessionEvent::FrameCaptured { size });
                Ok(())
            }
            Err(e) => Err(self.record_error(e.into())),
        }
    }

    /// Discard the captured frame and any result derived from it
    pub fn reset_capture(&mut self) {
        self.state.captured_frame = None;
        self.state.last_result = None;
        self.state.last_error = None;
        self.invalidate();
        self.emit(SessionEvent::CaptureReset);
    }

    /// Acquire the microphone; refused while a recording is active
    pub fn start_recording(&mut self, microphone: &dyn AudioInput) -> Result<(), AssistError> {
        if let Err(e) = self.recorder.start(microphone) {
            return Err(self.record_error(e.into()));
        }
        self.state.last_error = None;
        self.emit(SessionEvent::RecordingStarted);
        Ok(())
    }

    /// Release the microphone and keep the clip for submission
    pub fn stop_recording(&mut self) -> Result<(), AssistError> {
        match self.recorder.stop() {
            Ok(clip) => {
                let size = clip.len();
                self.state.recorded_audio = Some(clip);
                self.emit(SessionEvent::RecordingStopped { size });
                Ok(())
            }
            Err(e) => Err(self.record_error(e.into())),
        }
    }

    /// Validate input and move to Busy, returning the job to dispatch
    pub fn begin_submit(&mut self, builder: &RequestBuilder) -> Result<(Ticket, Job), AssistError> {
        if self.is_busy() {
            debug!("submit ignored while busy");
            return Err(AssistError::Busy);
        }

        let job = match builder.build(self.state.analysis_mode, self.state.raw_input()) {
            Ok(job) => job,
            Err(e) => return Err(self.record_error(e)),
        };

        let modality = self.state.active_modality;
        self.state.last_error = None;
        if modality == Modality::Image {
            self.state.last_result = Some(ANALYZING_PLACEHOLDER.to_string());
        }
        self.transition_to(Phase::Busy);
        self.emit(SessionEvent::SubmitStarted {
            modality,
            generation: self.generation,
        });

        let ticket = Ticket {
            generation: self.generation,
            modality,
            started_at: Instant::now(),
        };
        Ok((ticket, job))
    }

    /// Apply a completed request. Returns false when the result was stale
    /// and therefore discarded.
    pub fn finish(&mut self, ticket: Ticket, outcome: Result<Reply, AssistError>) -> bool {
        let duration_ms = ticket.started_at.elapsed().as_millis() as u64;

        if ticket.generation != self.generation {
            warn!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            if self.is_busy() {
                self.transition_to(Phase::Idle);
            }
            self.emit(SessionEvent::StaleResponseDiscarded {
                generation: ticket.generation,
            });
            return false;
        }

        match outcome {
            Ok(reply) => {
                let empty = reply == Reply::Empty;
                self.state.last_result = Some(reply.display_text(ticket.modality).to_string());
                self.state.last_error = None;
                self.transition_to(Phase::Success);
                self.emit(SessionEvent::ResponseReceived {
                    modality: ticket.modality,
                    duration_ms,
                    empty,
                });
            }
            Err(e) => {
                let message = e.to_string();
                self.state.last_error = Some(message.clone());
                self.state.last_result = None;
                self.transition_to(Phase::Failed);
                self.emit(SessionEvent::RequestFailed {
                    modality: ticket.modality,
                    duration_ms,
                    message,
                });
            }
        }
        true
    }

    /// Submit and wait for the result in one step
    pub async fn submit(
        &mut self,
        builder: &RequestBuilder,
        client: &InferenceClient,
    ) -> Result<(), AssistError> {
        let (ticket, job) = self.begin_submit(builder)?;
        let outcome = client.run(job).await;
        self.finish(ticket, outcome);
        Ok(())
    }

    /// Make any in-flight result stale
    fn invalidate(&mut self) {
        self.generation += 1;
        debug!(generation = self.generation, "session generation bumped");
    }

    fn record_error(&mut self, err: AssistError) -> AssistError {
        warn!(error = %err, "action failed");
        self.state.last_error = Some(err.to_string());
        err
    }

    /// Perform a phase transition
    fn transition_to(&mut self, new_phase: Phase) {
        let old_phase = self.phase;
        let duration_ms = self.phase_entered_at.elapsed().as_millis() as u64;

        info!(
            from = %old_phase,
            to = %new_phase,
            duration_ms = duration_ms,
            "phase transition"
        );

        self.phase = new_phase;
        self.phase_entered_at = Instant::now();
    }

    fn emit(&self, event: SessionEvent) {
        debug!(%event, "emitting session event");
        let _ = self.event_tx.send(event);
    }
}
