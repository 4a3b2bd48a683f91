// EVGuard - ui/panels/report.rs
//
// Report options modal window. Section toggles plus Save; the report is
// rendered over the current filtered view.

use crate::app::state::AppState;
use crate::core::report::{self, ReportOptions};

/// Render the report dialog (if state.show_report_dialog is true).
/// `options` persists across frames so the toggles keep their values.
pub fn render(ctx: &egui::Context, state: &mut AppState, options: &mut ReportOptions) {
    if !state.show_report_dialog {
        return;
    }

    let mut open = true;
    egui::Window::new("Compliance Report")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(format!(
                "Report covers the current view: {} vehicle(s).",
                state.filtered_indices.len()
            ));
            ui.add_space(4.0);

            let mut always_on = true;
            ui.add_enabled(false, egui::Checkbox::new(&mut always_on, "Compliance table"));
            ui.checkbox(&mut options.include_summary, "Fleet summary");
            ui.checkbox(&mut options.include_discrepancies, "Discrepancy table");
            ui.checkbox(&mut options.include_details, "Vehicle details");

            ui.add_space(8.0);
            ui.separator();

            let can_save = !state.filtered_indices.is_empty();
            ui.horizontal(|ui| {
                ui.add_enabled_ui(can_save, |ui| {
                    if ui.button("Save\u{2026}").clicked() {
                        save_report(state, options);
                        state.show_report_dialog = false;
                    }
                });
                if ui.button("Cancel").clicked() {
                    state.show_report_dialog = false;
                }
            });
        });

    if !open {
        state.show_report_dialog = false;
    }
}

fn save_report(state: &mut AppState, options: &ReportOptions) {
    let Some(summary) = state.summary.clone() else {
        state.status_message = "No analysis to report on.".to_string();
        return;
    };
    let Some(dest) = rfd::FileDialog::new()
        .add_filter("Text report", &["txt"])
        .set_file_name(report::default_report_filename(options.report_date))
        .save_file()
    else {
        return;
    };

    match report::render_report(&state.scored, &state.filtered_indices, &summary, options) {
        Ok(text) => match std::fs::write(&dest, text) {
            Ok(()) => {
                state.status_message = format!("Report saved to '{}'.", dest.display());
                tracing::info!(path = %dest.display(), "Report saved");
            }
            Err(e) => {
                state.status_message = format!("Cannot write report: {e}");
            }
        },
        Err(e) => {
            state.status_message = format!("Report failed: {e}");
        }
    }
}
