//! Streaming utterance endpointing.
//!
//! [`Endpointer`] consumes mono audio chunk by chunk and decides where one
//! spoken utterance ends. Audio is split into 30 ms frames; a frame whose
//! RMS amplitude exceeds the configured threshold counts as speech.
//!
//! * Leading silence is discarded — buffering starts at the first speech
//!   frame.
//! * An utterance is finalised once the configured run of trailing silence
//!   follows speech, with that trailing silence trimmed off.
//! * Utterances shorter than the minimum speech length are dropped as noise
//!   and listening continues.
//! * The maximum utterance length finalises unconditionally.
//!
//! The recogniser feeds each finalised utterance to whisper exactly once,
//! which is what makes the session a final-results-only stream.

use crate::config::AudioConfig;

/// Frame length used for speech/silence classification (30 ms).
const FRAME_MS: u64 = 30;

// ---------------------------------------------------------------------------
// EndpointSettings
// ---------------------------------------------------------------------------

/// Tuning knobs for the endpointer.
#[derive(Debug, Clone)]
pub struct EndpointSettings {
    /// RMS amplitude above which a frame counts as speech.
    pub rms_threshold: f32,
    /// Trailing silence that finalises an utterance, in milliseconds.
    pub silence_ms: u64,
    /// Minimum voiced audio for an utterance to be kept, in milliseconds.
    pub min_speech_ms: u64,
    /// Hard cap on utterance length, in seconds.
    pub max_utterance_secs: f32,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            rms_threshold: 0.01,
            silence_ms: 700,
            min_speech_ms: 300,
            max_utterance_secs: 30.0,
        }
    }
}

impl EndpointSettings {
    /// Derive settings from the user-facing audio configuration.
    pub fn from_audio_config(config: &AudioConfig) -> Self {
        Self {
            rms_threshold: config.rms_threshold,
            silence_ms: config.silence_ms,
            max_utterance_secs: config.max_utterance_secs,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Endpointer
// ---------------------------------------------------------------------------

/// Incremental speech endpointer over a mono sample stream.
pub struct Endpointer {
    threshold: f32,
    frame_size: usize,
    silence_frames: usize,
    min_speech_frames: usize,
    max_samples: usize,

    /// Partial frame carried between `push` calls.
    pending: Vec<f32>,
    /// Samples buffered since the first speech frame.
    utterance: Vec<f32>,
    voiced_frames: usize,
    silent_run: usize,
    in_speech: bool,
}

impl Endpointer {
    /// Create an endpointer for audio at `sample_rate` Hz.
    pub fn new(settings: EndpointSettings, sample_rate: u32) -> Self {
        let frame_size = ((sample_rate as u64 * FRAME_MS) / 1_000).max(1) as usize;
        let silence_frames = (settings.silence_ms / FRAME_MS).max(1) as usize;
        let min_speech_frames = (settings.min_speech_ms / FRAME_MS).max(1) as usize;
        let max_samples =
            (settings.max_utterance_secs.max(1.0) * sample_rate as f32) as usize;

        Self {
            threshold: settings.rms_threshold,
            frame_size,
            silence_frames,
            min_speech_frames,
            max_samples,
            pending: Vec::new(),
            utterance: Vec::new(),
            voiced_frames: 0,
            silent_run: 0,
            in_speech: false,
        }
    }

    /// `true` once speech has been detected for the current utterance.
    pub fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// Feed a chunk of mono samples.
    ///
    /// Returns a finalised utterance as soon as one completes inside this
    /// chunk; any samples after the boundary stay buffered for the next
    /// call.
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        self.pending.extend_from_slice(samples);

        while self.pending.len() >= self.frame_size {
            let frame: Vec<f32> = self.pending.drain(..self.frame_size).collect();
            if let Some(utterance) = self.push_frame(&frame) {
                return Some(utterance);
            }
        }

        None
    }

    fn push_frame(&mut self, frame: &[f32]) -> Option<Vec<f32>> {
        let voiced = rms(frame) > self.threshold;

        if !self.in_speech {
            if !voiced {
                return None; // leading silence
            }
            self.in_speech = true;
            self.voiced_frames = 0;
            self.silent_run = 0;
        }

        self.utterance.extend_from_slice(frame);

        if voiced {
            self.voiced_frames += 1;
            self.silent_run = 0;
        } else {
            self.silent_run += 1;
            if self.silent_run >= self.silence_frames {
                return self.finalise(true);
            }
        }

        if self.utterance.len() >= self.max_samples {
            return self.finalise(false);
        }

        None
    }

    /// Close out the current utterance. `trim_tail` removes the trailing
    /// silence run (silence-triggered finalisation only).
    fn finalise(&mut self, trim_tail: bool) -> Option<Vec<f32>> {
        let mut utterance = std::mem::take(&mut self.utterance);
        if trim_tail {
            let tail = self.silent_run * self.frame_size;
            utterance.truncate(utterance.len().saturating_sub(tail));
        }

        let keep = self.voiced_frames >= self.min_speech_frames;
        self.in_speech = false;
        self.voiced_frames = 0;
        self.silent_run = 0;

        if keep && !utterance.is_empty() {
            Some(utterance)
        } else {
            None // too short — noise, keep listening
        }
    }
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let mean_sq: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
