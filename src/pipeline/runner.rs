//! Extraction runner — drives text → provider → record for every
//! submission.
//!
//! [`ExtractionRunner`] listens for [`CaptureCommand`]s on a tokio mpsc
//! channel and answers with [`CaptureEvent`]s. Each non-empty submission is
//! spawned as its own task, so a voice transcript arriving while a manual
//! submission is outstanding runs concurrently with it and records append
//! in completion order.
//!
//! # Flow per submission
//!
//! ```text
//! CaptureCommand::Extract { text, source }
//!   ├─ text empty/whitespace ──▶ CaptureEvent::Skipped   (no network call)
//!   └─ otherwise, in its own task:
//!        extractor.extract(text, today)      (prompt + provider call)
//!        └─ decode_response(raw)             (fence cleanup + JSON decode)
//!            └─ ExpenseRecord::from_extracted (infallible normalisation)
//!                ──▶ CaptureEvent::Extracted
//!        any Err ──▶ CaptureEvent::Failed with a user-facing alert
//! ```
//!
//! Every command produces exactly one event, so the UI can release its busy
//! state on all exit paths. Failures never escape the task.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;

use crate::config::ExtractorConfig;
use crate::expense::ExpenseRecord;
use crate::extract::{decode_response, ExpenseExtractor, ExtractError};

// ---------------------------------------------------------------------------
// Commands & events
// ---------------------------------------------------------------------------

/// Where a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionSource {
    /// Typed into the free-text field and submitted by hand.
    Manual,
    /// A finalised voice transcript, submitted automatically.
    Voice,
}

/// Commands sent from the UI to the runner.
#[derive(Debug, Clone)]
pub enum CaptureCommand {
    /// Run the extraction pipeline over `text`.
    Extract {
        text: String,
        source: SubmissionSource,
    },
}

/// Terminal events delivered back to the UI — exactly one per command.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Empty submission ignored; release the busy state, show nothing.
    Skipped { source: SubmissionSource },
    /// Extraction succeeded; append the record.
    Extracted {
        source: SubmissionSource,
        record: ExpenseRecord,
    },
    /// Extraction failed; show the alert and release the busy state.
    Failed {
        source: SubmissionSource,
        alert: String,
    },
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Shown when the provider answers 429.
pub const QUOTA_ALERT: &str = "API quota exceeded — you have hit the provider's rate limit. \
     Check your plan and billing details before retrying.";

/// User-facing alert text for an extraction error.
pub fn alert_for(error: &ExtractError) -> String {
    match error {
        ExtractError::RateLimited => QUOTA_ALERT.into(),
        ExtractError::Unauthorized => format!(
            "API key rejected — check that the {} environment variable is set to a valid key.",
            ExtractorConfig::API_KEY_ENV
        ),
        ExtractError::Malformed(message) | ExtractError::Unknown(message) => {
            format!("Failed to process expense: {message}. Please try again.")
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline core
// ---------------------------------------------------------------------------

/// Run the full extraction pipeline for one submission.
///
/// `text` must be non-empty (the runner guards this); `today` is the
/// capture date used both in the prompt and as the date fallback.
pub async fn extract_record(
    extractor: &dyn ExpenseExtractor,
    text: &str,
    today: NaiveDate,
) -> Result<ExpenseRecord, ExtractError> {
    let raw = extractor.extract(text, today).await?;
    let fields = decode_response(&raw)?;
    Ok(ExpenseRecord::from_extracted(fields, today))
}

// ---------------------------------------------------------------------------
// ExtractionRunner
// ---------------------------------------------------------------------------

/// Consumes capture commands until the channel closes.
///
/// Create with [`ExtractionRunner::new`], then spawn
/// [`run`](Self::run) on the tokio runtime.
pub struct ExtractionRunner {
    extractor: Arc<dyn ExpenseExtractor>,
    command_rx: mpsc::Receiver<CaptureCommand>,
    event_tx: mpsc::Sender<CaptureEvent>,
}

impl ExtractionRunner {
    /// * `extractor`  — the session's single provider client (or a double).
    /// * `command_rx` — submissions from the UI.
    /// * `event_tx`   — terminal events back to the UI.
    pub fn new(
        extractor: Arc<dyn ExpenseExtractor>,
        command_rx: mpsc::Receiver<CaptureCommand>,
        event_tx: mpsc::Sender<CaptureEvent>,
    ) -> Self {
        Self {
            extractor,
            command_rx,
            event_tx,
        }
    }

    /// Process commands until the command channel is closed.
    pub async fn run(mut self) {
        while let Some(command) = self.command_rx.recv().await {
            match command {
                CaptureCommand::Extract { text, source } => {
                    self.handle_extract(text, source);
                }
            }
        }

        log::info!("pipeline: command channel closed, runner shutting down");
    }

    fn handle_extract(&self, text: String, source: SubmissionSource) {
        // Empty submission: no prompt, no network call, no alert.
        if text.trim().is_empty() {
            log::debug!("pipeline: empty {source:?} submission skipped");
            let event_tx = self.event_tx.clone();
            tokio::spawn(async move {
                let _ = event_tx.send(CaptureEvent::Skipped { source }).await;
            });
            return;
        }

        let extractor = Arc::clone(&self.extractor);
        let event_tx = self.event_tx.clone();

        // One task per submission: a voice transcript must not queue
        // behind an outstanding manual call, and vice versa.
        tokio::spawn(async move {
            let today = Local::now().date_naive();

            let event = match extract_record(extractor.as_ref(), &text, today).await {
                Ok(record) => {
                    log::debug!("pipeline: extracted {:?} from {source:?}", record.title);
                    CaptureEvent::Extracted { source, record }
                }
                Err(error) => {
                    log::warn!("pipeline: extraction failed ({error})");
                    CaptureEvent::Failed {
                        source,
                        alert: alert_for(&error),
                    }
                }
            };

            let _ = event_tx.send(event).await;
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Returns a canned reply and counts how often it was called.
    struct CannedExtractor {
        reply: String,
        calls: Arc<AtomicUsize>,
    }

    impl CannedExtractor {
        fn new(reply: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    reply: reply.into(),
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl ExpenseExtractor for CannedExtractor {
        async fn extract(&self, _text: &str, _today: NaiveDate) -> Result<String, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    /// Always fails with the configured error.
    struct FailingExtractor(ExtractError);

    #[async_trait]
    impl ExpenseExtractor for FailingExtractor {
        async fn extract(&self, _text: &str, _today: NaiveDate) -> Result<String, ExtractError> {
            Err(self.0.clone())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    const FULL_REPLY: &str = r#"{"title":"Biryani","amount":100,"category":"Food","description":"Lunch biryani","date":"2025-03-10"}"#;

    /// Feed `commands` to a runner over `extractor` and collect every event.
    async fn drive(
        extractor: Arc<dyn ExpenseExtractor>,
        commands: Vec<CaptureCommand>,
    ) -> Vec<CaptureEvent> {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::channel(8);

        let runner = ExtractionRunner::new(extractor, command_rx, event_tx);
        let runner_task = tokio::spawn(runner.run());

        for command in commands {
            command_tx.send(command).await.unwrap();
        }
        drop(command_tx); // close the channel so run() returns

        // The event channel closes once the runner and all of its spawned
        // submission tasks have dropped their senders.
        let mut events = Vec::new();
        while let Some(event) = event_rx.recv().await {
            events.push(event);
        }

        runner_task.await.unwrap();
        events
    }

    fn extract(text: &str, source: SubmissionSource) -> CaptureCommand {
        CaptureCommand::Extract {
            text: text.into(),
            source,
        }
    }

    // -----------------------------------------------------------------------
    // Empty-input short-circuit
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_submission_never_calls_the_provider() {
        let (extractor, calls) = CannedExtractor::new(FULL_REPLY);
        let events = drive(
            Arc::new(extractor),
            vec![extract("", SubmissionSource::Manual)],
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            events.as_slice(),
            [CaptureEvent::Skipped {
                source: SubmissionSource::Manual
            }]
        ));
    }

    #[tokio::test]
    async fn whitespace_submission_is_skipped_too() {
        let (extractor, calls) = CannedExtractor::new(FULL_REPLY);
        let events = drive(
            Arc::new(extractor),
            vec![extract("   \n\t ", SubmissionSource::Voice)],
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(events.as_slice(), [CaptureEvent::Skipped { .. }]));
    }

    // -----------------------------------------------------------------------
    // Success paths
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn well_formed_reply_yields_a_matching_record() {
        let (extractor, _) = CannedExtractor::new(FULL_REPLY);
        let events = drive(
            Arc::new(extractor),
            vec![extract("100 rupees biryani", SubmissionSource::Manual)],
        )
        .await;

        match events.as_slice() {
            [CaptureEvent::Extracted { source, record }] => {
                assert_eq!(*source, SubmissionSource::Manual);
                assert_eq!(record.title, "Biryani");
                assert_eq!(record.description, "Lunch biryani");
                assert_eq!(record.amount, 100.0);
                assert_eq!(record.date, "2025-03-10");
            }
            other => panic!("expected one Extracted event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fenced_reply_extracts_like_the_plain_one() {
        let fenced = format!("```json\n{FULL_REPLY}\n```");
        let (extractor, _) = CannedExtractor::new(&fenced);
        let events = drive(
            Arc::new(extractor),
            vec![extract("biryani", SubmissionSource::Manual)],
        )
        .await;

        match events.as_slice() {
            [CaptureEvent::Extracted { record, .. }] => {
                assert_eq!(record.title, "Biryani");
                assert_eq!(record.amount, 100.0);
            }
            other => panic!("expected one Extracted event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn voice_source_is_echoed_in_the_event() {
        let (extractor, _) = CannedExtractor::new(FULL_REPLY);
        let events = drive(
            Arc::new(extractor),
            vec![extract("taxi home", SubmissionSource::Voice)],
        )
        .await;

        assert!(matches!(
            events.as_slice(),
            [CaptureEvent::Extracted {
                source: SubmissionSource::Voice,
                ..
            }]
        ));
    }

    #[tokio::test]
    async fn concurrent_submissions_each_produce_an_event() {
        let (extractor, calls) = CannedExtractor::new(FULL_REPLY);
        let events = drive(
            Arc::new(extractor),
            vec![
                extract("manual entry", SubmissionSource::Manual),
                extract("voice entry", SubmissionSource::Voice),
            ],
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, CaptureEvent::Extracted { .. })));
    }

    // -----------------------------------------------------------------------
    // Failure paths
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn rate_limited_failure_raises_the_quota_alert() {
        let events = drive(
            Arc::new(FailingExtractor(ExtractError::RateLimited)),
            vec![extract("biryani", SubmissionSource::Manual)],
        )
        .await;

        match events.as_slice() {
            [CaptureEvent::Failed { alert, .. }] => {
                assert_eq!(alert, QUOTA_ALERT);
            }
            other => panic!("expected one Failed event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_failure_points_at_the_api_key() {
        let events = drive(
            Arc::new(FailingExtractor(ExtractError::Unauthorized)),
            vec![extract("biryani", SubmissionSource::Manual)],
        )
        .await;

        match events.as_slice() {
            [CaptureEvent::Failed { alert, .. }] => {
                assert!(alert.contains("API key"));
                assert!(alert.contains(ExtractorConfig::API_KEY_ENV));
            }
            other => panic!("expected one Failed event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_failure_includes_the_underlying_message() {
        let events = drive(
            Arc::new(FailingExtractor(ExtractError::Unknown(
                "connection refused".into(),
            ))),
            vec![extract("biryani", SubmissionSource::Manual)],
        )
        .await;

        match events.as_slice() {
            [CaptureEvent::Failed { alert, .. }] => {
                assert!(alert.contains("connection refused"));
                assert!(alert.contains("try again"));
            }
            other => panic!("expected one Failed event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_reply_fails_with_the_generic_alert() {
        let (extractor, _) = CannedExtractor::new("Sorry, I cannot help with that.");
        let events = drive(
            Arc::new(extractor),
            vec![extract("biryani", SubmissionSource::Manual)],
        )
        .await;

        assert!(matches!(events.as_slice(), [CaptureEvent::Failed { .. }]));
    }

    // -----------------------------------------------------------------------
    // extract_record directly
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn extract_record_applies_normalisation_fallbacks() {
        let (extractor, _) = CannedExtractor::new(r#"{"category":"Food"}"#);
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        let record = extract_record(&extractor, "some food", today)
            .await
            .expect("extracts");

        assert_eq!(record.title, crate::expense::DEFAULT_TITLE);
        assert_eq!(record.description, "Food");
        assert_eq!(record.amount, 0.0);
        assert_eq!(record.date, "2025-03-14");
    }
}
