//! Manual-submission gate.
//!
//! [`CapturePhase`] tracks whether a manually-submitted extraction is in
//! flight. The UI reads it to disable the submit controls while a call is
//! outstanding and re-enables them unconditionally when the terminal event
//! for that submission arrives — success, failure, or skip.
//!
//! Voice-triggered submissions deliberately do not pass through this gate:
//! a finalised transcript may start a second extraction while a manual one
//! is still outstanding (see DESIGN.md).

// ---------------------------------------------------------------------------
// CapturePhase
// ---------------------------------------------------------------------------

/// Phase of the manual capture flow.
///
/// ```text
/// Ready ──submit──▶ Extracting ──terminal event──▶ Ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    /// No manual submission outstanding; the form accepts input.
    #[default]
    Ready,

    /// A manual extraction call is in flight; re-submission is disabled.
    Extracting,
}

impl CapturePhase {
    /// `true` while a manual extraction call is outstanding.
    ///
    /// ```
    /// use expense_capture::pipeline::CapturePhase;
    ///
    /// assert!(!CapturePhase::Ready.is_busy());
    /// assert!(CapturePhase::Extracting.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, CapturePhase::Extracting)
    }

    /// Label for the submit button.
    pub fn label(&self) -> &'static str {
        match self {
            CapturePhase::Ready => "Add Expense With AI",
            CapturePhase::Extracting => "Processing...",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
