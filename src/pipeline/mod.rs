//! Capture pipeline module.
//!
//! Wires free text (typed or transcribed) through prompt construction, the
//! provider call, reply cleanup, decoding, and normalisation, and exposes
//! the shared phase the UI reads to gate manual re-submission.
//!
//! # Architecture
//!
//! ```text
//! CaptureCommand (tokio mpsc)
//!        │
//!        ▼
//! ExtractionRunner::run()  ← async tokio task
//!        │
//!        └─ Extract { text, source }
//!              ├─ empty text          → CaptureEvent::Skipped
//!              └─ per-submission task → CaptureEvent::Extracted / Failed
//!
//! CaptureEvent (tokio mpsc) ←─── polled by the egui update loop
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{
    alert_for, extract_record, CaptureCommand, CaptureEvent, ExtractionRunner, SubmissionSource,
    QUOTA_ALERT,
};
pub use state::CapturePhase;
