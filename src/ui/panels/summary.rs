// EVGuard - ui/panels/summary.rs
//
// Analysis summary modal window.
// Shows fleet statistics, per-category violation counts, scan warnings,
// and the fleet-level narrative.

use crate::app::state::AppState;
use crate::app::summarizer::{SummaryManager, SummaryTarget};
use crate::core::model::ViolationKind;

/// Render the analysis summary dialog (if state.show_summary is true).
/// Returns true if the user requested a fleet narrative.
pub fn render(ctx: &egui::Context, state: &mut AppState, summaries: &mut SummaryManager) -> bool {
    if !state.show_summary {
        return false;
    }

    let mut fleet_summary_requested = false;
    let mut open = true;
    egui::Window::new("Analysis Summary")
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .min_width(480.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            if let Some(ref summary) = state.summary {
                // -----------------------------------------------------------------
                // Overall statistics
                // -----------------------------------------------------------------
                ui.strong("Overview");
                egui::Grid::new("summary_overview")
                    .num_columns(2)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Vehicles scored:");
                        ui.label(summary.vehicle_count.to_string());
                        ui.end_row();

                        ui.label("Mean compliance score:");
                        ui.label(format!("{:.1}", summary.mean_score));
                        ui.end_row();

                        ui.label("Charging discrepancies:");
                        let disc_colour = if summary.discrepancy_count > 0 {
                            egui::Color32::from_rgb(253, 186, 116)
                        } else {
                            ui.style().visuals.text_color()
                        };
                        ui.colored_label(disc_colour, summary.discrepancy_count.to_string());
                        ui.end_row();

                        ui.label("Chargers flagged:");
                        let fault_colour = if summary.faulty_charger_count > 0 {
                            egui::Color32::from_rgb(248, 113, 113)
                        } else {
                            ui.style().visuals.text_color()
                        };
                        ui.colored_label(fault_colour, summary.faulty_charger_count.to_string());
                        ui.end_row();

                        ui.label("Duration:");
                        ui.label(format!("{:.2}s", summary.duration.as_secs_f64()));
                        ui.end_row();
                    });

                // -----------------------------------------------------------------
                // Per-category violation counts
                // -----------------------------------------------------------------
                ui.add_space(8.0);
                ui.separator();
                ui.strong("Violations by category");
                egui::Grid::new("summary_violations")
                    .num_columns(2)
                    .striped(true)
                    .spacing([12.0, 3.0])
                    .show(ui, |ui| {
                        for kind in ViolationKind::all() {
                            let count =
                                summary.violations_by_kind.get(kind).copied().unwrap_or(0);
                            ui.label(kind.label());
                            let colour = if count > 0 && kind.scored() {
                                egui::Color32::from_rgb(248, 113, 113)
                            } else {
                                ui.style().visuals.text_color()
                            };
                            ui.colored_label(colour, count.to_string());
                            ui.end_row();
                        }
                    });

                // -----------------------------------------------------------------
                // Fleet narrative
                // -----------------------------------------------------------------
                ui.add_space(8.0);
                ui.separator();
                if let Some(text) = summaries.cached(&SummaryTarget::Fleet).map(str::to_string) {
                    ui.horizontal(|ui| {
                        ui.strong("Narrative");
                        if ui.small_button("Regenerate").clicked() {
                            summaries.evict(&SummaryTarget::Fleet);
                            fleet_summary_requested = true;
                        }
                    });
                    egui::ScrollArea::vertical()
                        .id_salt("summary_narrative")
                        .max_height(160.0)
                        .show(ui, |ui| {
                            ui.label(text);
                        });
                } else if summaries.is_in_flight(&SummaryTarget::Fleet) {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Generating narrative\u{2026}");
                    });
                } else if ui.button("Summarise the fleet").clicked() {
                    fleet_summary_requested = true;
                }

                // -----------------------------------------------------------------
                // Warnings
                // -----------------------------------------------------------------
                if !state.warnings.is_empty() {
                    ui.add_space(8.0);
                    ui.separator();
                    ui.strong(format!("Warnings ({})", state.warnings.len()));

                    egui::ScrollArea::vertical()
                        .id_salt("summary_warnings")
                        .max_height(120.0)
                        .show(ui, |ui| {
                            for warn in &state.warnings {
                                ui.label(
                                    egui::RichText::new(warn)
                                        .color(egui::Color32::from_rgb(253, 186, 116))
                                        .size(11.5),
                                );
                            }
                        });
                }
            } else {
                ui.label("No analysis has been completed yet.");
            }

            ui.add_space(8.0);
            ui.separator();
            if ui.button("Close").clicked() {
                state.show_summary = false;
            }
        });

    if !open {
        state.show_summary = false;
    }
    fleet_summary_requested
}
