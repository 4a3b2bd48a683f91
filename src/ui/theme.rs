// EVGuard - ui/theme.rs
//
// Colour scheme, score/flag colour mapping, and layout constants.
// No dependencies on app state or business logic.

use crate::core::model::DiscrepancyFlag;
use egui::Color32;

/// Colour for a compliance score. Green through amber to red.
pub fn score_colour(score: u32) -> Color32 {
    match score {
        80..=100 => Color32::from_rgb(34, 197, 94),  // Green 500
        60..=79 => Color32::from_rgb(234, 179, 8),   // Yellow 500
        40..=59 => Color32::from_rgb(217, 119, 6),   // Amber 600
        _ => Color32::from_rgb(220, 38, 38),         // Red 600
    }
}

/// Colour for a discrepancy flag.
pub fn flag_colour(flag: &DiscrepancyFlag) -> Color32 {
    match flag {
        DiscrepancyFlag::Ok => Color32::from_rgb(107, 114, 128), // Gray 500
        DiscrepancyFlag::Suspicious => Color32::from_rgb(217, 119, 6), // Amber 600
        DiscrepancyFlag::PotentialChargerFault => Color32::from_rgb(220, 38, 38), // Red 600
    }
}

/// Background highlight colour for a flag (subtle, for row backgrounds).
pub fn flag_bg_colour(flag: &DiscrepancyFlag) -> Option<Color32> {
    match flag {
        DiscrepancyFlag::Suspicious => Some(Color32::from_rgba_premultiplied(217, 119, 6, 15)),
        DiscrepancyFlag::PotentialChargerFault => {
            Some(Color32::from_rgba_premultiplied(220, 38, 38, 25))
        }
        DiscrepancyFlag::Ok => None,
    }
}

/// Layout constants.
pub const SIDEBAR_WIDTH: f32 = 250.0;
pub const DETAIL_PANE_HEIGHT: f32 = 220.0;
pub const ROW_HEIGHT: f32 = 20.0;
