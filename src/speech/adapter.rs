//! Voice capture adapter — an explicit state machine over a pluggable
//! recognition capability.
//!
//! [`SpeechCapture`] owns the `Idle ↔ Listening` lifecycle:
//!
//! ```text
//! Idle ──start() ok (mic granted)──▶ Listening
//! Listening ──stop() │ final transcript │ error │ end-of-session──▶ Idle
//! ```
//!
//! There is no paused or intermediate state. `Listening` is entered only
//! after the microphone was acquired successfully; every session event
//! exits it. A finalised transcript is handed to the caller exactly once
//! per utterance, with no further confirmation step, and a natural
//! end-of-session surfaces nothing at all.
//!
//! The platform capability hides behind [`SpeechRecognizer`], so a
//! deterministic test double can drive the adapter without any audio
//! hardware.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors raised while initialising or activating voice capture.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Microphone access failed — denied, missing, or misconfigured.
    #[error("microphone unavailable: {0}")]
    Microphone(String),

    /// The speech model file is not present on disk.
    #[error("speech model not found: {0}")]
    ModelNotFound(String),

    /// The recogniser backend failed to initialise.
    #[error("speech recogniser failed to initialise: {0}")]
    Init(String),
}

// ---------------------------------------------------------------------------
// Session events & traits
// ---------------------------------------------------------------------------

/// Events emitted by a recognition session.
///
/// Only *final* results exist — the capability never surfaces interim
/// transcripts, and each utterance carries a single alternative.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    /// A finalised utterance transcript.
    Final(String),
    /// Recognition failed.
    Error(String),
    /// The session ended naturally (silence only, stream closed).
    Ended,
}

/// Handle to one running recognition session.
pub trait RecognitionSession {
    /// Request the session to stop. Must be idempotent — calling it on an
    /// already-stopped session is a no-op.
    fn stop(&mut self);
}

/// A continuous-recognition capability.
///
/// `start` performs the microphone-permission step synchronously and, on
/// success, streams [`SpeechEvent`]s into `events` from a background
/// context until the session ends.
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self, events: Sender<SpeechEvent>)
        -> Result<Box<dyn RecognitionSession>, SpeechError>;
}

// ---------------------------------------------------------------------------
// SpeechCapture
// ---------------------------------------------------------------------------

/// Adapter state as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Not capturing; `start` may be called.
    Idle,
    /// Microphone granted, session running.
    Listening,
}

/// What the adapter asks its owner to do after a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutcome {
    /// Submit this finalised transcript to the extraction pipeline.
    Transcript(String),
    /// Surface this recognition failure to the user.
    Failure(String),
}

/// The voice-capture state machine.
pub struct SpeechCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
    session: Option<Box<dyn RecognitionSession>>,
    events: Option<Receiver<SpeechEvent>>,
}

impl SpeechCapture {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self {
            recognizer,
            session: None,
            events: None,
        }
    }

    /// Current adapter state.
    pub fn state(&self) -> AdapterState {
        if self.session.is_some() {
            AdapterState::Listening
        } else {
            AdapterState::Idle
        }
    }

    /// Enter `Listening`.
    ///
    /// Acquires the microphone first; on failure the adapter stays `Idle`
    /// and the error is returned for the caller to surface. Calling `start`
    /// while already listening is a no-op.
    pub fn start(&mut self) -> Result<(), SpeechError> {
        if self.session.is_some() {
            return Ok(());
        }

        let (tx, rx) = channel();
        let session = self.recognizer.start(tx)?;
        self.session = Some(session);
        self.events = Some(rx);
        log::debug!("speech: Idle → Listening");
        Ok(())
    }

    /// Return to `Idle`. Idempotent — a no-op when not listening.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
            log::debug!("speech: Listening → Idle");
        }
        self.events = None;
    }

    /// Drain the session's next event, if any.
    ///
    /// Every event exits `Listening`:
    /// * `Final` → `Some(Transcript)` — submit exactly once, automatically.
    /// * `Error` → `Some(Failure)` — surface to the user.
    /// * `Ended` → `None` — normal end, nothing surfaced.
    pub fn poll(&mut self) -> Option<SpeechOutcome> {
        let event = self.events.as_ref()?.try_recv().ok()?;
        self.stop();

        match event {
            SpeechEvent::Final(text) => Some(SpeechOutcome::Transcript(text)),
            SpeechEvent::Error(message) => Some(SpeechOutcome::Failure(message)),
            SpeechEvent::Ended => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
