//! Whisper-backed implementation of [`SpeechRecognizer`].
//!
//! [`WhisperRecognizer::initialize`] probes for the GGML model at startup;
//! an `Err` here means the platform lacks the capability and the voice
//! control is disabled without affecting the rest of the application.
//!
//! A session wires: cpal callback → worker thread → downmix/resample →
//! [`Endpointer`] → whisper (greedy, single alternative, fixed language) →
//! one [`SpeechEvent::Final`] per finalised utterance. A silence-only
//! session ends with [`SpeechEvent::Ended`] and no transcript.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::{downmix_mono, resample, Endpointer, EndpointSettings, MicCapture, MicHandle, SampleChunk};
use crate::config::{AppConfig, AppPaths};
use crate::speech::adapter::{RecognitionSession, SpeechError, SpeechEvent, SpeechRecognizer};

/// whisper's fixed input rate.
const WHISPER_RATE: u32 = 16_000;

/// whisper rejects clips shorter than one second; shorter utterances are
/// padded with silence before inference.
const MIN_CLIP_SAMPLES: usize = 16_000;

// ---------------------------------------------------------------------------
// Transcriber
// ---------------------------------------------------------------------------

/// Owns the loaded `WhisperContext` plus the fixed recognition language.
struct Transcriber {
    ctx: WhisperContext,
    language: String,
}

// `WhisperContext` holds a raw pointer internally but declares
// `unsafe impl Send` and `unsafe impl Sync` in whisper-rs — the model
// weights are read-only after loading. `language` is an owned String.
// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs.
unsafe impl Send for Transcriber {}
unsafe impl Sync for Transcriber {}

impl Transcriber {
    /// Run greedy inference over one utterance and return the joined text.
    fn transcribe(&self, audio: &[f32]) -> Result<String, String> {
        let clip = pad_clip(audio);

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(self.language.as_str()));
        params.set_n_threads(inference_threads());
        params.set_print_progress(false);
        params.set_print_realtime(false);

        let mut state = self.ctx.create_state().map_err(|e| e.to_string())?;
        state.full(params, &clip).map_err(|e| e.to_string())?;

        let n_segments = state.full_n_segments().map_err(|e| e.to_string())?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| format!("segment {i}: {e}"))?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }
}

/// Pad an utterance to whisper's one-second minimum with trailing silence.
fn pad_clip(audio: &[f32]) -> Vec<f32> {
    let mut clip = audio.to_vec();
    if clip.len() < MIN_CLIP_SAMPLES {
        clip.resize(MIN_CLIP_SAMPLES, 0.0);
    }
    clip
}

/// Inference thread count: physical parallelism capped at 4.
fn inference_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .min(4) as i32
}

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

/// Production [`SpeechRecognizer`] backed by whisper-rs and cpal.
pub struct WhisperRecognizer {
    transcriber: Arc<Transcriber>,
    device: Option<String>,
    endpoint: EndpointSettings,
}

// `Transcriber` wraps a `WhisperContext`, which is an opaque FFI handle
// without a `Debug` impl, so derive is unavailable — format the
// inspectable fields and elide the transcriber.
impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("device", &self.device)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl WhisperRecognizer {
    /// Load the GGML model and prepare the recogniser.
    ///
    /// Called once at startup. The microphone is *not* touched here —
    /// that happens lazily in [`SpeechRecognizer::start`] when the user
    /// opts into voice capture.
    ///
    /// # Errors
    ///
    /// * [`SpeechError::ModelNotFound`] — no model file on disk.
    /// * [`SpeechError::Init`] — whisper-rs could not load the file.
    pub fn initialize(config: &AppConfig, paths: &AppPaths) -> Result<Self, SpeechError> {
        let model_path = paths.speech_model_file(&config.speech.model);

        if !model_path.exists() {
            return Err(SpeechError::ModelNotFound(model_path.display().to_string()));
        }

        let path_str = model_path.to_str().ok_or_else(|| {
            SpeechError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                model_path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SpeechError::Init(e.to_string()))?;

        log::info!("speech model loaded: {}", model_path.display());

        Ok(Self {
            transcriber: Arc::new(Transcriber {
                ctx,
                language: config.speech.language.clone(),
            }),
            device: config.speech.audio_device.clone(),
            endpoint: EndpointSettings::from_audio_config(&config.audio),
        })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    /// Acquire the microphone (the permission step) and launch the
    /// recognition worker.
    fn start(
        &self,
        events: Sender<SpeechEvent>,
    ) -> Result<Box<dyn RecognitionSession>, SpeechError> {
        let mic = MicCapture::open(self.device.as_deref())
            .map_err(|e| SpeechError::Microphone(e.to_string()))?;

        let (chunk_tx, chunk_rx) = channel::<SampleChunk>();
        let handle = mic
            .start(chunk_tx)
            .map_err(|e| SpeechError::Microphone(e.to_string()))?;

        let stop = Arc::new(AtomicBool::new(false));

        let transcriber = Arc::clone(&self.transcriber);
        let settings = self.endpoint.clone();
        let stop_flag = Arc::clone(&stop);

        std::thread::Builder::new()
            .name("speech-recognise".into())
            .spawn(move || {
                let mut endpointer = Endpointer::new(settings, WHISPER_RATE);

                while let Ok(chunk) = chunk_rx.recv() {
                    if stop_flag.load(Ordering::SeqCst) {
                        return; // explicit stop — exit silently
                    }

                    let mono = downmix_mono(&chunk.samples, chunk.channels);
                    let audio = resample(&mono, chunk.sample_rate, WHISPER_RATE);

                    if let Some(utterance) = endpointer.push(&audio) {
                        log::debug!(
                            "speech: utterance finalised ({} samples)",
                            utterance.len()
                        );
                        let event = match transcriber.transcribe(&utterance) {
                            Ok(text) if !text.is_empty() => SpeechEvent::Final(text),
                            // Recognised nothing — treat like silence.
                            Ok(_) => SpeechEvent::Ended,
                            Err(e) => SpeechEvent::Error(format!("transcription failed: {e}")),
                        };
                        let _ = events.send(event);
                        return; // one finalised utterance per session
                    }
                }

                // Chunk channel closed: the stream is gone. Natural end
                // unless the user stopped us.
                if !stop_flag.load(Ordering::SeqCst) {
                    let _ = events.send(SpeechEvent::Ended);
                }
            })
            .map_err(|e| SpeechError::Init(e.to_string()))?;

        Ok(Box::new(WhisperSession { stop, _mic: handle }))
    }
}

// ---------------------------------------------------------------------------
// WhisperSession
// ---------------------------------------------------------------------------

/// Running session: holds the stop flag and keeps the cpal stream alive.
///
/// Dropping the session drops the [`MicHandle`], which stops the hardware
/// stream and lets the worker thread drain out.
struct WhisperSession {
    stop: Arc<AtomicBool>,
    _mic: MicHandle,
}

impl RecognitionSession for WhisperSession {
    fn stop(&mut self) {
        // Idempotent by construction — storing true twice is harmless.
        self.stop.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
