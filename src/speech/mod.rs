//! Voice capture module.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  SpeechCapture (state machine: Idle ↔ Listening)       │
//! │        │ start / stop / poll                           │
//! │        ▼                                               │
//! │  SpeechRecognizer (trait)                              │
//! │        │                                               │
//! │        ▼                                               │
//! │  WhisperRecognizer                                     │
//! │    cpal mic ─▶ endpointer ─▶ whisper ─▶ Final(text)    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The adapter never blocks: the UI calls [`SpeechCapture::poll`] each
//! frame and receives at most one [`SpeechOutcome`] per utterance.

pub mod adapter;
pub mod engine;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use adapter::{
    AdapterState, RecognitionSession, SpeechCapture, SpeechError, SpeechEvent, SpeechOutcome,
    SpeechRecognizer,
};
pub use engine::WhisperRecognizer;
