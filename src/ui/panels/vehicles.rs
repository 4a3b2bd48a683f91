// EVGuard - ui/panels/vehicles.rs
//
// Virtual-scrolling scored-vehicle table (central area).
//
// Uses egui's `ScrollArea::show_rows` which renders only the rows currently
// visible in the viewport, giving O(1) rendering cost regardless of fleet
// size. Row clicks select the underlying scored vehicle, so the selection
// stays on the same vehicle across filter and sort changes.

use crate::app::state::AppState;
use crate::ui::theme;
use egui::text::{LayoutJob, TextFormat};

/// Render the vehicle table (central area).
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    let filtered = state.filtered_indices.len();

    if filtered == 0 {
        ui.centered_and_justified(|ui| {
            if state.scored.is_empty() {
                ui.label(
                    "No analysis results.\nOpen a charging log via File \u{2192} Open Log, \
                     or run the demo dataset.",
                );
            } else {
                ui.label("No vehicles match the current filters.");
            }
        });
        return;
    }

    // Column header row.
    ui.horizontal(|ui| {
        ui.monospace(format!(
            "{:<12}  {:<16}  {:<10}  {:>7}  {:>7}  {:>6}  {:>5}  {}",
            "PLATE", "OWNER", "TYPE", "BILLED", "DETECT", "DIFF", "SCORE", "FLAG"
        ));
    });
    ui.separator();

    let row_height = theme::ROW_HEIGHT;
    let mut clicked_vehicle: Option<usize> = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show_rows(ui, row_height, filtered, |ui, row_range| {
            for display_idx in row_range {
                let Some(&vehicle_idx) = state.filtered_indices.get(display_idx) else {
                    continue;
                };
                let Some(sv) = state.scored.get(vehicle_idx) else {
                    continue;
                };

                let is_selected = state.selected_index == Some(vehicle_idx);
                let font = egui::FontId::monospace(12.0);

                let mut row_job = LayoutJob::default();
                row_job.append(
                    &format!(
                        "{:<12}  {:<16}  {:<10}  {:>7.2}  {:>7.2}  {:>6.2}  ",
                        sv.plate,
                        truncate(&sv.registry.owner, 16),
                        sv.vehicle_type.label(),
                        sv.charging.billed_kwh,
                        sv.charging.detected_kwh,
                        sv.charging.difference_kwh,
                    ),
                    0.0,
                    TextFormat {
                        font_id: font.clone(),
                        ..Default::default()
                    },
                );
                row_job.append(
                    &format!("{:>5}  ", sv.compliance.score),
                    0.0,
                    TextFormat {
                        font_id: font.clone(),
                        color: theme::score_colour(sv.compliance.score),
                        ..Default::default()
                    },
                );
                row_job.append(
                    sv.charging.flag.short_label(),
                    0.0,
                    TextFormat {
                        font_id: font,
                        color: theme::flag_colour(&sv.charging.flag),
                        ..Default::default()
                    },
                );

                let response = ui.selectable_label(is_selected, row_job);
                if let Some(bg) = theme::flag_bg_colour(&sv.charging.flag) {
                    ui.painter().rect_filled(response.rect, 0.0, bg);
                }
                if response.clicked() {
                    clicked_vehicle = Some(vehicle_idx);
                }
            }
        });

    if let Some(idx) = clicked_vehicle {
        state.selected_index = Some(idx);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}
