//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! The provider API key is the one setting that never touches disk: it is
//! read from the `GROQ_API_KEY` environment variable when the config is
//! loaded and carried in memory only.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ExtractorConfig
// ---------------------------------------------------------------------------

/// Settings for the LLM extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Base URL of the OpenAI-compatible API.
    ///
    /// The chat-completions path (`/v1/chat/completions`) is appended by the
    /// client.
    pub base_url: String,
    /// Model identifier sent with every extraction request.
    pub model: String,
    /// Provider API key, taken from [`ExtractorConfig::API_KEY_ENV`] at load
    /// time.
    ///
    /// `None` when the variable is unset — the request is then sent without
    /// authentication and the provider's rejection surfaces on first use.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl ExtractorConfig {
    /// Environment variable holding the provider API key.
    pub const API_KEY_ENV: &'static str = "GROQ_API_KEY";
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".into(),
            model: "llama-3.3-70b-versatile".into(),
            api_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for local speech recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// GGML model file stem (e.g. `"ggml-base.en"`), resolved under the
    /// models directory.
    pub model: String,
    /// Recognition language as an ISO-639-1 code. A single fixed locale —
    /// there is no per-utterance language switching.
    pub language: String,
    /// Audio input device name — `None` means the system default.
    pub audio_device: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: "ggml-base.en".into(),
            language: "en".into(),
            audio_device: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and utterance endpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// RMS amplitude threshold (0.0 – 1.0); frames above this level count
    /// as speech.
    pub rms_threshold: f32,
    /// Milliseconds of trailing silence after speech that finalise an
    /// utterance.
    pub silence_ms: u64,
    /// Maximum utterance length in seconds; the endpointer finalises
    /// unconditionally once this is reached.
    pub max_utterance_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            rms_threshold: 0.01,
            silence_ms: 700,
            max_utterance_secs: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels. `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Currency symbol shown next to amounts in the expense list.
    pub currency: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            currency: "₹".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use expense_capture::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM extraction settings.
    pub extractor: ExtractorConfig,
    /// Speech recognition settings.
    pub speech: SpeechConfig,
    /// Microphone capture / endpointing settings.
    pub audio: AudioConfig,
    /// Window / display settings.
    pub ui: UiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            speech: SpeechConfig::default(),
            audio: AudioConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml` and
    /// pick up the provider API key from the environment.
    ///
    /// Returns `Ok` with defaults when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file. A missing API key is not an error here — it surfaces as a
    /// provider rejection on the first extraction attempt.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&AppPaths::new().settings_file)?;
        config.extractor.api_key = std::env::var(ExtractorConfig::API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty());
        Ok(config)
    }

    /// Load from an explicit path (useful for tests). Does not consult the
    /// environment.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.extractor.base_url, loaded.extractor.base_url);
        assert_eq!(original.extractor.model, loaded.extractor.model);

        assert_eq!(original.speech.model, loaded.speech.model);
        assert_eq!(original.speech.language, loaded.speech.language);
        assert_eq!(original.speech.audio_device, loaded.speech.audio_device);

        assert_eq!(original.audio.rms_threshold, loaded.audio.rms_threshold);
        assert_eq!(original.audio.silence_ms, loaded.audio.silence_ms);
        assert_eq!(
            original.audio.max_utterance_secs,
            loaded.audio.max_utterance_secs
        );

        assert_eq!(original.ui.currency, loaded.ui.currency);
        assert_eq!(original.ui.window_position, loaded.ui.window_position);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.extractor.base_url, default.extractor.base_url);
        assert_eq!(config.extractor.model, default.extractor.model);
        assert_eq!(config.speech.language, default.speech.language);
        assert_eq!(config.audio.silence_ms, default.audio.silence_ms);
    }

    /// Verify the shipped defaults.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.extractor.base_url, "https://api.groq.com/openai");
        assert_eq!(cfg.extractor.model, "llama-3.3-70b-versatile");
        assert!(cfg.extractor.api_key.is_none());
        assert_eq!(cfg.speech.model, "ggml-base.en");
        assert_eq!(cfg.speech.language, "en");
        assert_eq!(cfg.audio.silence_ms, 700);
        assert_eq!(cfg.ui.currency, "₹");
    }

    /// The API key must never be written to disk.
    #[test]
    fn api_key_is_not_serialised() {
        let mut cfg = AppConfig::default();
        cfg.extractor.api_key = Some("gsk-secret".into());

        let toml = toml::to_string_pretty(&cfg).expect("serialise");
        assert!(!toml.contains("gsk-secret"));
        assert!(!toml.contains("api_key"));
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.extractor.base_url = "http://localhost:11434".into();
        cfg.extractor.model = "llama-3.1-8b-instant".into();
        cfg.speech.language = "de".into();
        cfg.speech.audio_device = Some("USB Microphone".into());
        cfg.audio.silence_ms = 1_200;
        cfg.ui.currency = "$".into();
        cfg.ui.window_position = Some((100.0, 200.0));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.extractor.base_url, "http://localhost:11434");
        assert_eq!(loaded.extractor.model, "llama-3.1-8b-instant");
        assert_eq!(loaded.speech.language, "de");
        assert_eq!(loaded.speech.audio_device.as_deref(), Some("USB Microphone"));
        assert_eq!(loaded.audio.silence_ms, 1_200);
        assert_eq!(loaded.ui.currency, "$");
        assert_eq!(loaded.ui.window_position, Some((100.0, 200.0)));
    }
}
