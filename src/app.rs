//! Expense Capture window — egui/eframe application.
//!
//! # Architecture
//!
//! [`ExpenseApp`] is the top-level [`eframe::App`] that owns the UI state
//! and two channel endpoints:
//!
//! * `command_tx` — sends [`CaptureCommand`] to the extraction runner.
//! * `event_rx`  — receives [`CaptureEvent`] terminal events back.
//!
//! Voice capture is owned directly as a [`SpeechCapture`] state machine and
//! polled every frame; a finalised transcript is submitted to the runner
//! exactly like typed text, tagged [`SubmissionSource::Voice`].
//!
//! # Busy discipline
//!
//! The AI submit button is disabled while a manual extraction is in flight
//! and re-enabled on *every* terminal event for it — extracted, failed, or
//! skipped. Voice submissions bypass that gate and may overlap a manual
//! call; they only drive the small in-flight indicator.

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::expense::{ExpenseLog, ExpenseRecord};
use crate::pipeline::{CaptureCommand, CaptureEvent, CapturePhase, SubmissionSource};
use crate::speech::{AdapterState, SpeechCapture, SpeechOutcome};

// ---------------------------------------------------------------------------
// ExpenseApp
// ---------------------------------------------------------------------------

/// eframe application — the expense capture window.
pub struct ExpenseApp {
    // ── Manual entry form ────────────────────────────────────────────────
    manual_title: String,
    manual_amount: String,
    manual_description: String,
    manual_date: String,

    // ── AI entry ─────────────────────────────────────────────────────────
    /// Free-text input for the extraction pipeline.
    ai_input: String,
    /// Manual-submission gate.
    phase: CapturePhase,
    /// Voice extractions currently in flight (indicator only — these do
    /// not gate manual submission).
    voice_in_flight: usize,

    // ── Voice capture ────────────────────────────────────────────────────
    /// `Err` carries the reason the capability is disabled on this system.
    voice: Result<SpeechCapture, String>,

    // ── Output ───────────────────────────────────────────────────────────
    /// Session expense list (append-only).
    expenses: ExpenseLog,
    /// Current user-facing alert, if any.
    alert: Option<String>,

    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<CaptureCommand>,
    event_rx: mpsc::Receiver<CaptureEvent>,

    // ── Configuration ────────────────────────────────────────────────────
    config: AppConfig,
}

impl ExpenseApp {
    /// Create a new [`ExpenseApp`].
    ///
    /// * `command_tx` — sender end of the capture command channel.
    /// * `event_rx`   — receiver end of the capture event channel.
    /// * `voice`      — the voice adapter, or the reason it is disabled.
    /// * `config`     — loaded application configuration.
    pub fn new(
        command_tx: mpsc::Sender<CaptureCommand>,
        event_rx: mpsc::Receiver<CaptureEvent>,
        voice: Result<SpeechCapture, String>,
        config: AppConfig,
    ) -> Self {
        Self {
            manual_title: String::new(),
            manual_amount: String::new(),
            manual_description: String::new(),
            manual_date: String::new(),
            ai_input: String::new(),
            phase: CapturePhase::Ready,
            voice_in_flight: 0,
            voice,
            expenses: ExpenseLog::new(),
            alert: None,
            command_tx,
            event_rx,
            config,
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending capture events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                CaptureEvent::Skipped { source } => {
                    // Silently ignored — just release the busy state.
                    self.release(source);
                }
                CaptureEvent::Extracted { source, record } => {
                    self.expenses.append(record);
                    if source == SubmissionSource::Manual {
                        self.ai_input.clear();
                    }
                    self.release(source);
                }
                CaptureEvent::Failed { source, alert } => {
                    self.alert = Some(alert);
                    self.release(source);
                }
            }
        }
    }

    /// Release the busy state for a finished submission.
    fn release(&mut self, source: SubmissionSource) {
        match source {
            SubmissionSource::Manual => self.phase = CapturePhase::Ready,
            SubmissionSource::Voice => {
                self.voice_in_flight = self.voice_in_flight.saturating_sub(1);
            }
        }
    }

    /// Poll the voice adapter and submit any finalised transcript.
    fn poll_voice(&mut self) {
        let Ok(capture) = self.voice.as_mut() else {
            return;
        };

        match capture.poll() {
            Some(SpeechOutcome::Transcript(text)) => {
                log::debug!("app: voice transcript submitted ({} chars)", text.len());
                self.voice_in_flight += 1;
                let _ = self.command_tx.try_send(CaptureCommand::Extract {
                    text,
                    source: SubmissionSource::Voice,
                });
            }
            Some(SpeechOutcome::Failure(message)) => {
                self.alert = Some(format!("Voice capture failed: {message}"));
            }
            None => {}
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Submit the free-text input to the extraction pipeline.
    fn submit_ai(&mut self) {
        if self.phase.is_busy() {
            return;
        }
        self.phase = CapturePhase::Extracting;
        let _ = self.command_tx.try_send(CaptureCommand::Extract {
            text: self.ai_input.clone(),
            source: SubmissionSource::Manual,
        });
    }

    /// Append a manually-entered record. No network involved.
    fn submit_manual(&mut self) {
        let today = chrono::Local::now().date_naive();
        let record = ExpenseRecord::manual(
            &self.manual_title,
            &self.manual_description,
            &self.manual_amount,
            &self.manual_date,
            today,
        );
        self.expenses.append(record);

        self.manual_title.clear();
        self.manual_amount.clear();
        self.manual_description.clear();
        self.manual_date.clear();
    }

    /// Toggle the voice adapter between Idle and Listening.
    fn toggle_voice(&mut self) {
        let Ok(capture) = self.voice.as_mut() else {
            return;
        };

        match capture.state() {
            AdapterState::Listening => capture.stop(),
            AdapterState::Idle => {
                if let Err(error) = capture.start() {
                    self.alert = Some(error.to_string());
                }
            }
        }
    }

    fn listening(&self) -> bool {
        self.voice
            .as_ref()
            .map(|c| c.state() == AdapterState::Listening)
            .unwrap_or(false)
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_alert(&mut self, ui: &mut egui::Ui) {
        let Some(message) = self.alert.clone() else {
            return;
        };

        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgb(60, 34, 30))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(message)
                            .color(egui::Color32::from_rgb(255, 136, 68)),
                    );
                });
                if ui.small_button("Dismiss").clicked() {
                    self.alert = None;
                }
            });
        ui.add_space(6.0);
    }

    fn draw_manual_form(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Add manually")
            .default_open(false)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.manual_title).hint_text("Title"),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.manual_amount).hint_text("Amount"),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.manual_description)
                        .hint_text("Description"),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.manual_date)
                        .hint_text("Date (YYYY-MM-DD, today if empty)"),
                );
                if ui.button("Add Expense").clicked() {
                    self.submit_manual();
                }
            });
    }

    fn draw_ai_form(&mut self, ui: &mut egui::Ui) {
        ui.label("Describe an expense — or say it aloud:");

        let response = ui.add(
            egui::TextEdit::singleline(&mut self.ai_input)
                .hint_text("e.g. 100 rupees biryani")
                .desired_width(f32::INFINITY),
        );

        let submitted =
            response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        ui.horizontal(|ui| {
            let busy = self.phase.is_busy();
            let clicked = ui
                .add_enabled(!busy, egui::Button::new(self.phase.label()))
                .clicked();
            if (clicked || submitted) && !busy {
                self.submit_ai();
            }

            self.draw_voice_control(ui);

            if busy || self.voice_in_flight > 0 {
                ui.spinner();
            }
        });
    }

    fn draw_voice_control(&mut self, ui: &mut egui::Ui) {
        if let Err(reason) = &self.voice {
            ui.add_enabled(false, egui::Button::new("Speak Expense"))
                .on_disabled_hover_text(reason.as_str());
            return;
        }

        let listening = self.listening();
        let label = if listening {
            "Stop Listening"
        } else {
            "Speak Expense"
        };
        if ui.button(label).clicked() {
            self.toggle_voice();
        }
        if listening {
            ui.label(
                egui::RichText::new("listening…").color(egui::Color32::from_rgb(255, 80, 80)),
            );
        }
    }

    fn draw_expense_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Expenses");
        ui.add_space(4.0);

        if self.expenses.is_empty() {
            ui.label(egui::RichText::new("No expenses yet.").weak());
            return;
        }

        let currency = self.config.ui.currency.clone();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for record in self.expenses.iter() {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.label(egui::RichText::new(&record.title).strong());
                            if !record.description.is_empty() {
                                ui.label(
                                    egui::RichText::new(&record.description).weak().size(11.0),
                                );
                            }
                        });
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                ui.label(egui::RichText::new(&record.date).weak().size(11.0));
                                ui.label(
                                    egui::RichText::new(format!(
                                        "{currency}{:.2}",
                                        record.amount
                                    ))
                                    .color(egui::Color32::from_rgb(68, 136, 255))
                                    .strong(),
                                );
                            },
                        );
                    });
                });
            }
        });

        ui.add_space(4.0);
        ui.label(
            egui::RichText::new(format!(
                "Total: {currency}{:.2}",
                self.expenses.total()
            ))
            .strong(),
        );
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for ExpenseApp {
    /// Called every frame by eframe. Polls channels, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.poll_voice();

        // Keep polling while anything is outstanding.
        if self.phase.is_busy() || self.voice_in_flight > 0 || self.listening() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Expense Tracker With AI Voice");
            ui.add_space(8.0);

            self.draw_alert(ui);
            self.draw_manual_form(ui);
            ui.add_space(8.0);
            self.draw_ai_form(ui);
            ui.add_space(12.0);
            ui.separator();
            self.draw_expense_list(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!(
            "expense capture closing ({} records this session)",
            self.expenses.len()
        );
    }
}
