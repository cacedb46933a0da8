//! Microphone capture via `cpal`.
//!
//! [`MicCapture::open`] acquires an input device — this is the
//! microphone-permission step, performed lazily when the user opts into
//! voice capture, never at startup. [`MicCapture::start`] begins streaming
//! [`SampleChunk`]s over an mpsc channel; the returned [`MicHandle`] is a
//! RAII guard and dropping it stops the underlying cpal stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// SampleChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]` at the device's native
/// rate; the capture worker downmixes and resamples before endpointing.
#[derive(Debug, Clone)]
pub struct SampleChunk {
    /// Interleaved PCM samples.
    pub samples: Vec<f32>,
    /// Sample rate of this chunk in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// MicHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
pub struct MicHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// MicError
// ---------------------------------------------------------------------------

/// Errors raised while acquiring or running the microphone.
///
/// Every variant is surfaced to the user as a permission/availability
/// problem — the adapter stays inactive when any of these occur.
#[derive(Debug, Error)]
pub enum MicError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("configured input device \"{0}\" was not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Enumerate(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// MicCapture
// ---------------------------------------------------------------------------

/// Microphone wrapper built on top of `cpal`.
pub struct MicCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl MicCapture {
    /// Acquire an input device.
    ///
    /// `preferred` selects a device by name; `None` uses the system
    /// default. The device's own preferred stream configuration is used, so
    /// no rate/channel setup is required from callers.
    ///
    /// # Errors
    ///
    /// Any [`MicError`] — callers treat all of them as "microphone
    /// unavailable / permission denied" and abort activation.
    pub fn open(preferred: Option<&str>) -> Result<Self, MicError> {
        let host = cpal::default_host();

        let device = match preferred {
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| MicError::DeviceNotFound(name.to_string()))?,
            None => host.default_input_device().ok_or(MicError::NoDevice)?,
        };

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start streaming and send [`SampleChunk`]s to `tx`.
    ///
    /// The cpal callback runs on a dedicated audio thread; send errors
    /// (receiver dropped) are silently ignored so that thread never
    /// panics.
    pub fn start(&self, tx: mpsc::Sender<SampleChunk>) -> Result<MicHandle, MicError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let chunk = SampleChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                };
                let _ = tx.send(chunk);
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(MicHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels in each [`SampleChunk`].
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// `SampleChunk` must be `Send` so it can cross thread boundaries.
    #[test]
    fn sample_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SampleChunk>();
    }

    #[test]
    fn sample_chunk_fields() {
        let chunk = SampleChunk {
            samples: vec![0.0_f32; 512],
            sample_rate: 48_000,
            channels: 2,
        };
        assert_eq!(chunk.samples.len(), 512);
        assert_eq!(chunk.sample_rate, 48_000);
        assert_eq!(chunk.channels, 2);
    }

    #[test]
    fn device_not_found_error_names_the_device() {
        let err = MicError::DeviceNotFound("Imaginary Mic".into());
        assert!(err.to_string().contains("Imaginary Mic"));
    }
}
