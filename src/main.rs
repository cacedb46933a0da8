//! Application entry point — Expense Capture.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and pick
//!    up the provider API key from the environment. A missing key is not
//!    checked here — it surfaces as a credential alert on first use.
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the one [`GroqExtractor`] for the session.
//! 5. Create the capture command/event channels.
//! 6. Spawn the extraction runner on the tokio runtime.
//! 7. Probe the speech capability; on failure the voice control is disabled
//!    and the rest of the application runs normally.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;

use expense_capture::{
    app::ExpenseApp,
    config::{AppConfig, AppPaths, ExtractorConfig},
    extract::{ExpenseExtractor, GroqExtractor},
    pipeline::{CaptureCommand, CaptureEvent, ExtractionRunner},
    speech::{SpeechCapture, SpeechRecognizer, WhisperRecognizer},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([620.0, 720.0])
        .with_min_inner_size([420.0, 400.0]);

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Expense Capture starting up");

    // 2. Configuration (+ API key from the environment)
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    if config.extractor.api_key.is_none() {
        log::warn!(
            "{} is not set — extraction will fail with a credential alert until it is",
            ExtractorConfig::API_KEY_ENV
        );
    }

    // 3. Tokio runtime (2 workers — enough for overlapping extractions)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. One extractor client for the whole session
    let extractor: Arc<dyn ExpenseExtractor> =
        Arc::new(GroqExtractor::from_config(&config.extractor));

    // 5. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<CaptureCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<CaptureEvent>(32);

    // 6. Spawn the extraction runner
    rt.spawn(ExtractionRunner::new(Arc::clone(&extractor), command_rx, event_tx).run());

    // 7. Speech capability probe — absence disables the voice control only
    let voice = match WhisperRecognizer::initialize(&config, &AppPaths::new()) {
        Ok(recognizer) => {
            let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(recognizer);
            Ok(SpeechCapture::new(recognizer))
        }
        Err(e) => {
            log::warn!("Voice capture unavailable: {e}");
            Err(format!("Voice capture is not available: {e}"))
        }
    };

    // 8. Run the window (blocks until closed); the runtime must outlive it
    let app = ExpenseApp::new(command_tx, event_rx, voice, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "Expense Capture",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
