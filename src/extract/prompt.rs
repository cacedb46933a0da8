//! Extraction prompt construction.
//!
//! [`extraction_prompt`] turns a free-text expense description and the
//! capture date into the instruction sent to the provider. Construction is
//! pure and synchronous; the caller is responsible for never invoking it
//! with empty input (the runner short-circuits empty submissions before any
//! prompt is built).

use chrono::NaiveDate;

use crate::expense::format_date;

/// Instruction template. The provider is asked to answer with a bare JSON
/// object carrying exactly the five expected keys.
const INSTRUCTION: &str = "You are an expense extraction assistant.";

/// Build the extraction prompt for `text`, defaulting the date to `today`.
///
/// # Example
/// ```rust
/// use chrono::NaiveDate;
/// use expense_capture::extract::extraction_prompt;
///
/// let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// let prompt = extraction_prompt("100 rupees biryani", today);
/// assert!(prompt.contains("100 rupees biryani"));
/// assert!(prompt.contains("2025-03-14"));
/// ```
pub fn extraction_prompt(text: &str, today: NaiveDate) -> String {
    let today = format_date(today);
    format!(
        "{INSTRUCTION}\n\
         Extract details in JSON format from the text: \"{text}\".\n\
         Include:\n\
         - title (short name of expense)\n\
         - amount (in number)\n\
         - category (like Food, Travel, etc.)\n\
         - description (short summary)\n\
         - date (use current date: {today})\n\n\
         Return ONLY valid JSON, no additional text."
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn prompt_embeds_the_input_text() {
        let prompt = extraction_prompt("coffee with Ana, 4 euros", today());
        assert!(prompt.contains("coffee with Ana, 4 euros"));
    }

    #[test]
    fn prompt_embeds_the_capture_date() {
        let prompt = extraction_prompt("bus ticket", today());
        assert!(prompt.contains("2025-03-14"));
    }

    #[test]
    fn prompt_names_all_five_keys() {
        let prompt = extraction_prompt("groceries", today());
        for key in ["title", "amount", "category", "description", "date"] {
            assert!(prompt.contains(key), "prompt must mention {key}");
        }
    }

    #[test]
    fn prompt_demands_json_only_output() {
        let prompt = extraction_prompt("groceries", today());
        assert!(prompt.contains("ONLY valid JSON"));
    }
}
