//! Expense Capture — AI-assisted expense tracker.
//!
//! Records expenses three ways:
//!
//! * **Manual entry** — a structured form appended straight to the list.
//! * **Free-text entry** — a natural-language description sent to an LLM
//!   provider for structured extraction.
//! * **Voice entry** — spoken audio recognised locally, with each finalised
//!   utterance fed into the extraction pipeline automatically.
//!
//! # Pipeline
//!
//! ```text
//! UI event ──▶ (optional speech recognition) ──▶ prompt construction
//!          ──▶ provider call ──▶ fence cleanup ──▶ JSON decode
//!          ──▶ field normalisation ──▶ append to ExpenseLog ──▶ re-render
//! ```
//!
//! The expense list is volatile, in-memory, and append-only for the
//! lifetime of the session. Application settings persist as TOML; expenses
//! do not.

pub mod app;
pub mod audio;
pub mod config;
pub mod expense;
pub mod extract;
pub mod pipeline;
pub mod speech;
