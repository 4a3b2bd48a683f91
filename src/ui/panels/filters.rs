// EVGuard - ui/panels/filters.rs
//
// Filter controls sidebar.

use crate::app::state::AppState;
use crate::core::filter::{FilterState, SortKey};
use crate::core::model::{DiscrepancyFlag, VehicleType};
use crate::util::constants;

/// Render the filter controls.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Quick filters
    if ui.button("Discrepancies Only").clicked() {
        state.filter_state = FilterState::default();
        state.filter_state.flags.insert(DiscrepancyFlag::Suspicious);
        state
            .filter_state
            .flags
            .insert(DiscrepancyFlag::PotentialChargerFault);
        state.apply_filters();
    }
    if ui.button("Violations Only").clicked() {
        state.filter_state = FilterState::default();
        state.filter_state.violations_only = true;
        state.apply_filters();
    }
    if ui.button("Clear Filters").clicked() {
        state.filter_state = FilterState::default();
        state.apply_filters();
    }

    ui.separator();

    // Flag checkboxes
    ui.label("Charging flag:");
    let mut changed = false;
    for flag in DiscrepancyFlag::all() {
        let mut checked = state.filter_state.flags.contains(flag);
        if ui.checkbox(&mut checked, flag.label()).changed() {
            if checked {
                state.filter_state.flags.insert(*flag);
            } else {
                state.filter_state.flags.remove(flag);
            }
            changed = true;
        }
    }

    ui.separator();

    // Vehicle type checkboxes
    ui.label("Vehicle type:");
    for vt in VehicleType::all() {
        let mut checked = state.filter_state.vehicle_types.contains(vt);
        if ui.checkbox(&mut checked, vt.label()).changed() {
            if checked {
                state.filter_state.vehicle_types.insert(*vt);
            } else {
                state.filter_state.vehicle_types.remove(vt);
            }
            changed = true;
        }
    }

    ui.separator();

    // Score range
    ui.label("Score range:");
    let mut min = state.filter_state.min_score;
    let mut max = state.filter_state.max_score;
    if ui
        .add(egui::Slider::new(&mut min, 0..=constants::MAX_SCORE).text("min"))
        .changed()
    {
        state.filter_state.min_score = min.min(state.filter_state.max_score);
        changed = true;
    }
    if ui
        .add(egui::Slider::new(&mut max, 0..=constants::MAX_SCORE).text("max"))
        .changed()
    {
        state.filter_state.max_score = max.max(state.filter_state.min_score);
        changed = true;
    }

    if ui
        .checkbox(&mut state.filter_state.violations_only, "Violations only")
        .changed()
    {
        changed = true;
    }

    ui.separator();

    // Text search (plate, owner, charger)
    ui.label("Search (plate / owner / charger):");
    let mut pattern = state.filter_state.text_search.clone();
    let mut regex = state.filter_state.regex_enabled;
    let text_changed = ui.text_edit_singleline(&mut pattern).changed();
    let regex_changed = ui.checkbox(&mut regex, "Regex").changed();
    if text_changed || regex_changed {
        if let Err(e) = state.filter_state.set_search(&pattern, regex) {
            state.status_message = e.to_string();
        }
        changed = true;
    }

    ui.separator();

    // Sorting
    ui.label("Sort by:");
    for (key, label) in [
        (SortKey::Score, "Score"),
        (SortKey::Plate, "Plate"),
        (SortKey::BilledKwh, "Billed kWh"),
        (SortKey::Difference, "Discrepancy"),
    ] {
        if ui
            .radio_value(&mut state.filter_state.sort_key, key, label)
            .changed()
        {
            changed = true;
        }
    }
    if ui
        .checkbox(&mut state.filter_state.sort_ascending, "Ascending")
        .changed()
    {
        changed = true;
    }

    if changed {
        state.apply_filters();
    }
}
