//! LLM extraction module for Expense Capture.
//!
//! This module provides:
//! * [`ExpenseExtractor`] — async trait implemented by extractor backends.
//! * [`GroqExtractor`] — chat-completions REST client (the one provider
//!   contract this build supports).
//! * [`extraction_prompt`] — pure prompt construction.
//! * [`strip_code_fences`] / [`decode_response`] — reply cleanup + decode.
//! * [`ExtractedFields`] — the decoded, untrusted field set.
//! * [`ExtractError`] — closed error classification
//!   (`RateLimited` / `Unauthorized` / `Malformed` / `Unknown`).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use chrono::Local;
//! use expense_capture::config::ExtractorConfig;
//! use expense_capture::expense::ExpenseRecord;
//! use expense_capture::extract::{decode_response, ExpenseExtractor, GroqExtractor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let extractor = GroqExtractor::from_config(&ExtractorConfig::default());
//!
//!     let today = Local::now().date_naive();
//!     let raw = extractor
//!         .extract("100 rupees biryani yesterday", today)
//!         .await
//!         .unwrap();
//!
//!     let fields = decode_response(&raw).unwrap();
//!     let record = ExpenseRecord::from_extracted(fields, today);
//!     println!("{} — {}", record.title, record.amount);
//! }
//! ```

pub mod client;
pub mod prompt;
pub mod response;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{classify_status, ExpenseExtractor, ExtractError, GroqExtractor};
pub use prompt::extraction_prompt;
pub use response::{decode_fields, decode_response, strip_code_fences, ExtractedFields};
