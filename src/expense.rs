//! Expense domain types.
//!
//! [`ExpenseRecord`] is the single domain entity: a fully-populated,
//! normalised expense row. Construction never fails — every field has a
//! fallback, so a record is complete even when the upstream extraction was
//! partial or malformed.
//!
//! [`ExpenseLog`] is the session's append-only expense list. Records are
//! never updated or removed; the log lives in memory and dies with the
//! session.

use chrono::NaiveDate;

use crate::extract::ExtractedFields;

/// Title used when the extraction (or the form) supplies none.
pub const DEFAULT_TITLE: &str = "Expense";

// ---------------------------------------------------------------------------
// ExpenseRecord
// ---------------------------------------------------------------------------

/// A normalised expense row.
///
/// Invariant: all fields are populated. `date` is a calendar date string in
/// `YYYY-MM-DD` form; it is kept as text because the provider's value is
/// untrusted free text with a capture-date fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// Short human-readable label.
    pub title: String,
    /// Free-text summary; the extraction's category doubles as a fallback.
    pub description: String,
    /// Numeric amount; zero when the source value was absent or non-numeric.
    pub amount: f64,
    /// Calendar date string (`YYYY-MM-DD`).
    pub date: String,
}

impl ExpenseRecord {
    /// Build a record from decoded extraction fields, applying fallbacks:
    ///
    /// * `title` → [`DEFAULT_TITLE`]
    /// * `description` → `category` → `""`
    /// * `amount` → `0.0` (absent, non-numeric, or non-finite)
    /// * `date` → `today`
    ///
    /// Empty strings count as absent. This step never fails.
    pub fn from_extracted(fields: ExtractedFields, today: NaiveDate) -> Self {
        let description = non_empty(fields.description)
            .or_else(|| non_empty(fields.category))
            .unwrap_or_default();

        Self {
            title: non_empty(fields.title).unwrap_or_else(|| DEFAULT_TITLE.into()),
            description,
            amount: coerce_amount(fields.amount.as_ref()),
            date: non_empty(fields.date).unwrap_or_else(|| format_date(today)),
        }
    }

    /// Build a record from the manual-entry form.
    ///
    /// The form delivers raw strings; the same fallback rules apply so a
    /// manual record is as fully populated as an extracted one.
    pub fn manual(title: &str, description: &str, amount: &str, date: &str, today: NaiveDate) -> Self {
        Self {
            title: if title.is_empty() {
                DEFAULT_TITLE.into()
            } else {
                title.to_string()
            },
            description: description.to_string(),
            amount: amount.trim().parse().ok().filter(|a: &f64| a.is_finite()).unwrap_or(0.0),
            date: if date.is_empty() {
                format_date(today)
            } else {
                date.to_string()
            },
        }
    }
}

/// Format a capture date the way the provider is asked to (`YYYY-MM-DD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Coerce the untrusted `amount` value to a finite `f64`.
///
/// Accepts a JSON number or a numeric string; everything else (including
/// NaN/inf) becomes `0.0`.
fn coerce_amount(value: Option<&serde_json::Value>) -> f64 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|a| a.is_finite()).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// ExpenseLog
// ---------------------------------------------------------------------------

/// Ordered, append-only sequence of records for the current session.
///
/// There is deliberately no update or delete operation.
#[derive(Debug, Default)]
pub struct ExpenseLog {
    records: Vec<ExpenseRecord>,
}

impl ExpenseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the end of the log.
    pub fn append(&mut self, record: ExpenseRecord) {
        self.records.push(record);
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all recorded amounts.
    pub fn total(&self) -> f64 {
        self.records.iter().map(|r| r.amount).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
