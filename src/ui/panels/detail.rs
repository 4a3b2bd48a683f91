// EVGuard - ui/panels/detail.rs
//
// Vehicle detail pane: registry statuses, charging summary, violations,
// and the per-vehicle narrative.

use crate::app::state::AppState;
use crate::app::summarizer::{SummaryManager, SummaryTarget};
use crate::core::model::ViolationKind;
use crate::ui::theme;

/// Render the detail pane (bottom panel). Returns the plate if the user
/// requested a narrative summary for the selected vehicle.
pub fn render(
    ui: &mut egui::Ui,
    state: &AppState,
    summaries: &mut SummaryManager,
) -> Option<String> {
    let Some(sv) = state.selected_vehicle() else {
        ui.centered_and_justified(|ui| {
            ui.label("Select a vehicle to view details.");
        });
        return None;
    };

    let mut summary_requested = None;

    ui.horizontal(|ui| {
        ui.heading(&sv.plate);
        ui.label(
            egui::RichText::new(format!("score {}", sv.compliance.score))
                .strong()
                .color(theme::score_colour(sv.compliance.score)),
        );
        ui.label(
            egui::RichText::new(sv.charging.flag.label())
                .color(theme::flag_colour(&sv.charging.flag)),
        );
    });
    ui.separator();

    ui.columns(2, |cols| {
        cols[0].label(egui::RichText::new("Registry").strong());
        egui::Grid::new("detail_registry_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(&mut cols[0], |ui| {
                ui.label("Owner:");
                ui.label(&sv.registry.owner);
                ui.end_row();

                ui.label("Type:");
                ui.label(sv.vehicle_type.label());
                ui.end_row();

                ui.label("Registration:");
                ui.label(sv.registry.registration.label());
                ui.end_row();

                ui.label("Insurance:");
                ui.label(sv.registry.insurance.label());
                ui.end_row();

                ui.label("Pollution cert:");
                ui.label(sv.registry.pollution.label());
                ui.end_row();

                ui.label("Fine:");
                ui.label(sv.registry.fine.label());
                ui.end_row();

                if !sv.registry.fine_reason.is_empty() {
                    ui.label("Fine reason:");
                    ui.label(&sv.registry.fine_reason);
                    ui.end_row();
                }

                ui.label("Road tax:");
                ui.label(sv.registry.road_tax.label());
                ui.end_row();

                ui.label("Helmet:");
                ui.label(sv.helmet.label());
                ui.end_row();
            });

        cols[1].label(egui::RichText::new("Charging session").strong());
        egui::Grid::new("detail_charging_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(&mut cols[1], |ui| {
                ui.label("Timestamp:");
                ui.label(sv.timestamp.to_rfc3339());
                ui.end_row();

                ui.label("Charger:");
                ui.label(&sv.charging.charger_id);
                ui.end_row();

                ui.label("Billed:");
                ui.label(format!("{:.2} kWh", sv.charging.billed_kwh));
                ui.end_row();

                ui.label("Detected:");
                ui.label(format!("{:.2} kWh", sv.charging.detected_kwh));
                ui.end_row();

                ui.label("Difference:");
                ui.label(format!("{:+.2} kWh", sv.charging.difference_kwh));
                ui.end_row();

                ui.label("Amount:");
                ui.label(format!("\u{20b9}{:.2}", sv.amount));
                ui.end_row();
            });
    });

    ui.separator();

    if sv.compliance.violations.is_empty() {
        ui.label("No violations.");
    } else {
        ui.label(egui::RichText::new("Violations").strong());
        for v in &sv.compliance.violations {
            let colour = if v.kind == ViolationKind::HelmetAdvisory {
                theme::score_colour(60) // advisory amber
            } else {
                theme::score_colour(0)
            };
            ui.label(egui::RichText::new(format!("\u{2022} {}", v.message)).color(colour));
        }
    }

    ui.separator();

    let target = SummaryTarget::Vehicle(sv.plate.clone());
    if let Some(text) = summaries.cached(&target).map(str::to_string) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Narrative").strong());
            if ui.small_button("Regenerate").clicked() {
                summaries.evict(&target);
                summary_requested = Some(sv.plate.clone());
            }
        });
        egui::ScrollArea::vertical()
            .id_salt("detail_narrative")
            .max_height(100.0)
            .show(ui, |ui| {
                ui.label(text);
            });
    } else if summaries.is_in_flight(&target) {
        ui.spinner();
        ui.label("Generating narrative\u{2026}");
    } else if ui.button("Summarise this vehicle").clicked() {
        summary_requested = Some(sv.plate.clone());
    }

    summary_requested
}
