// EVGuard - app/state.rs
//
// Application state management. Holds the loaded reference datasets, the
// current analysis results, filter state, and selection.
// Owned by the eframe::App implementation.

use crate::core::filter::FilterState;
use crate::core::model::{
    AnalysisSummary, Detection, RegistryRecord, ScoredVehicle, Transaction,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level application state.
#[derive(Debug)]
pub struct AppState {
    /// Path of the loaded transaction log (None in demo/pasted mode).
    pub log_path: Option<PathBuf>,

    /// Detection dataset keyed by plate.
    pub detections: HashMap<String, Detection>,

    /// Registry dataset keyed by plate.
    pub registry: HashMap<String, RegistryRecord>,

    /// Whether the current reference datasets are the built-in demo set.
    pub demo_mode: bool,

    /// Whether an analysis is currently in progress.
    pub analysis_in_progress: bool,

    /// Parsed transactions from the most recent completed analysis.
    pub transactions: Vec<Transaction>,

    /// Scored vehicles from the most recent completed analysis.
    pub scored: Vec<ScoredVehicle>,

    /// Indices of scored vehicles matching the current filter (into `scored`).
    pub filtered_indices: Vec<usize>,

    /// Current filter configuration.
    pub filter_state: FilterState,

    /// Index into `scored` of the selected vehicle. Stored against the
    /// underlying list, not the filtered view, so re-filtering or
    /// re-sorting never moves the selection onto a different vehicle.
    pub selected_index: Option<usize>,

    /// Summary from the most recent completed analysis.
    pub summary: Option<AnalysisSummary>,

    /// Status message for the status bar.
    pub status_message: String,

    /// Non-fatal warnings (config validation, dataset loads).
    pub warnings: Vec<String>,

    /// Whether to show the analysis summary dialog.
    pub show_summary: bool,

    /// Whether to show the report options dialog.
    pub show_report_dialog: bool,

    /// Whether debug mode is enabled.
    pub debug_mode: bool,
}

impl AppState {
    /// Create initial state with the given reference datasets.
    pub fn new(
        detections: HashMap<String, Detection>,
        registry: HashMap<String, RegistryRecord>,
        demo_mode: bool,
        debug_mode: bool,
    ) -> Self {
        Self {
            log_path: None,
            detections,
            registry,
            demo_mode,
            analysis_in_progress: false,
            transactions: Vec::new(),
            scored: Vec::new(),
            filtered_indices: Vec::new(),
            filter_state: FilterState::default(),
            selected_index: None,
            summary: None,
            status_message: "Ready. Open a charging log to begin.".to_string(),
            warnings: Vec::new(),
            show_summary: false,
            show_report_dialog: false,
            debug_mode,
        }
    }

    /// Recompute filtered indices from current results and filter state.
    pub fn apply_filters(&mut self) {
        self.filtered_indices =
            crate::core::filter::apply_filters(&self.scored, &self.filter_state);

        // Clear the selection when its vehicle left the filtered view.
        if let Some(idx) = self.selected_index {
            if !self.filtered_indices.contains(&idx) {
                self.selected_index = None;
            }
        }
    }

    /// Get the currently selected scored vehicle, if any.
    pub fn selected_vehicle(&self) -> Option<&ScoredVehicle> {
        self.selected_index.and_then(|idx| self.scored.get(idx))
    }

    /// Install a completed analysis, replacing previous results.
    pub fn install_results(
        &mut self,
        transactions: Vec<Transaction>,
        scored: Vec<ScoredVehicle>,
        summary: AnalysisSummary,
    ) {
        self.transactions = transactions;
        self.scored = scored;
        self.summary = Some(summary);
        self.selected_index = None;
        self.analysis_in_progress = false;
        self.apply_filters();
    }

    /// Clear all analysis results and reset to initial state. Reference
    /// datasets are kept.
    pub fn clear(&mut self) {
        self.transactions.clear();
        self.scored.clear();
        self.filtered_indices.clear();
        self.filter_state = FilterState::default();
        self.selected_index = None;
        self.summary = None;
        self.warnings.clear();
        self.show_summary = false;
        self.show_report_dialog = false;
        self.status_message = "Ready.".to_string();
    }
}
