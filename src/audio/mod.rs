//! Audio capture and utterance segmentation.
//!
//! ```text
//! cpal callback ──SampleChunk──▶ worker thread
//!                                  │ downmix_mono + resample (16 kHz)
//!                                  ▼
//!                              Endpointer ──finalised utterance──▶ whisper
//! ```

pub mod capture;
pub mod endpoint;
pub mod resample;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use capture::{MicCapture, MicError, MicHandle, SampleChunk};
pub use endpoint::{EndpointSettings, Endpointer};
pub use resample::{downmix_mono, resample};
