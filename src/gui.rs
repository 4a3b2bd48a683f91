// EVGuard - gui.rs
//
// Top-level eframe::App implementation.
// Wires together all UI panels and manages the analysis lifecycle.

use crate::app::analysis::{AnalysisManager, AnalysisRequest};
use crate::app::state::AppState;
use crate::app::summarizer::{
    self, HttpBackend, NarrativeBackend, SummaryManager, SummaryProgress, SummaryTarget,
    TemplateBackend,
};
use crate::core::engine::ScoringConfig;
use crate::core::model::AnalysisProgress;
use crate::core::reference;
use crate::core::report::ReportOptions;
use crate::platform::config::AppConfig;
use crate::ui;

/// The EVGuard application.
pub struct EvGuardApp {
    pub state: AppState,
    pub config: AppConfig,
    pub analysis_manager: AnalysisManager,
    pub summary_manager: SummaryManager,
    report_options: ReportOptions,

    /// Log path given on the command line, analysed on the first frame.
    initial_log: Option<std::path::PathBuf>,
}

impl EvGuardApp {
    /// Create a new application instance with the given state and config.
    pub fn new(state: AppState, config: AppConfig) -> Self {
        let report_options = ReportOptions {
            lines_per_page: config.report_lines_per_page,
            ..ReportOptions::default()
        };
        let initial_log = state.log_path.clone();
        Self {
            state,
            config,
            analysis_manager: AnalysisManager::new(),
            summary_manager: SummaryManager::new(),
            report_options,
            initial_log,
        }
    }

    fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            kwh_tolerance: self.config.kwh_tolerance,
            charger_fault_threshold: self.config.charger_fault_threshold,
            ..ScoringConfig::default()
        }
    }

    fn start_analysis(&mut self, request: AnalysisRequest) {
        self.state.clear();
        self.state.analysis_in_progress = true;
        self.state.status_message = "Analysing\u{2026}".to_string();
        self.summary_manager.clear();
        self.analysis_manager.start(request);
    }

    /// Pick the narrative backend from config: HTTP when fully configured,
    /// local template otherwise.
    fn narrative_backend(&self) -> Box<dyn NarrativeBackend> {
        if self.config.summarizer_enabled {
            if let (Some(endpoint), Some(model)) = (
                self.config.summarizer_endpoint.clone(),
                self.config.summarizer_model.clone(),
            ) {
                return Box::new(HttpBackend {
                    endpoint,
                    model,
                    api_key_env: self.config.api_key_env.clone(),
                });
            }
        }
        Box::new(TemplateBackend)
    }
}

impl eframe::App for EvGuardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Start the CLI-provided analysis once, on the first frame.
        if let Some(path) = self.initial_log.take() {
            let request = AnalysisRequest {
                log_path: Some(path.clone()),
                raw_log: None,
                detections: self.state.detections.clone(),
                registry: self.state.registry.clone(),
                scoring: self.scoring_config(),
            };
            self.start_analysis(request);
            self.state.log_path = Some(path);
        }

        // Poll for analysis progress
        let messages = self.analysis_manager.poll_progress();
        let had_messages = !messages.is_empty();
        for msg in messages {
            match msg {
                AnalysisProgress::Started => {
                    self.state.status_message = "Parsing transaction log\u{2026}".to_string();
                }
                AnalysisProgress::Completed {
                    transactions,
                    scored,
                    summary,
                } => {
                    self.state.status_message = format!(
                        "Analysis complete: {} vehicles, mean score {:.1}, {} discrepancies in {:.2}s",
                        summary.vehicle_count,
                        summary.mean_score,
                        summary.discrepancy_count,
                        summary.duration.as_secs_f64()
                    );
                    self.state.install_results(transactions, scored, summary);
                }
                AnalysisProgress::Failed { error } => {
                    self.state.status_message = format!("Analysis failed: {error}");
                    self.state.analysis_in_progress = false;
                }
            }
        }
        if had_messages || self.state.analysis_in_progress {
            ctx.request_repaint();
        }

        // Poll narrative workers.
        for msg in self.summary_manager.poll_progress() {
            match msg {
                SummaryProgress::Completed { target, .. } => {
                    self.state.status_message =
                        format!("Narrative ready for {}.", target.label());
                }
                SummaryProgress::Failed { target, error } => {
                    self.state.status_message =
                        format!("Narrative failed for {}: {error}", target.label());
                }
            }
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Log\u{2026}").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Charging logs", &["log", "txt", "csv"])
                            .pick_file()
                        {
                            let request = AnalysisRequest {
                                log_path: Some(path.clone()),
                                raw_log: None,
                                detections: self.state.detections.clone(),
                                registry: self.state.registry.clone(),
                                scoring: self.scoring_config(),
                            };
                            self.start_analysis(request);
                            self.state.log_path = Some(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Run Demo Dataset").clicked() {
                        self.state.detections = reference::demo_detections();
                        self.state.registry = reference::demo_registry();
                        self.state.demo_mode = true;
                        let request = AnalysisRequest {
                            log_path: None,
                            raw_log: Some(reference::demo_transaction_log()),
                            detections: self.state.detections.clone(),
                            registry: self.state.registry.clone(),
                            scoring: self.scoring_config(),
                        };
                        self.start_analysis(request);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Load Detections CSV\u{2026}").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .pick_file()
                        {
                            match reference::load_detections_csv(&path) {
                                Ok(dets) => {
                                    self.state.status_message = format!(
                                        "Loaded {} detection records from '{}'.",
                                        dets.len(),
                                        path.display()
                                    );
                                    self.state.detections = dets;
                                    self.state.demo_mode = false;
                                }
                                Err(e) => {
                                    self.state.status_message =
                                        format!("Detection load failed: {e}");
                                }
                            }
                        }
                        ui.close_menu();
                    }
                    if ui.button("Load Registry CSV\u{2026}").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .pick_file()
                        {
                            match reference::load_registry_csv(&path) {
                                Ok(reg) => {
                                    self.state.status_message = format!(
                                        "Loaded {} registry records from '{}'.",
                                        reg.len(),
                                        path.display()
                                    );
                                    self.state.registry = reg;
                                    self.state.demo_mode = false;
                                }
                                Err(e) => {
                                    self.state.status_message =
                                        format!("Registry load failed: {e}");
                                }
                            }
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    // Export sub-menu -- enabled only when the view is non-empty
                    let has_vehicles = !self.state.filtered_indices.is_empty();
                    ui.add_enabled_ui(has_vehicles, |ui| {
                        ui.menu_button("Export", |ui| {
                            if ui.button("Export CSV\u{2026}").clicked() {
                                if let Some(dest) = rfd::FileDialog::new()
                                    .add_filter("CSV", &["csv"])
                                    .set_file_name("evguard-export.csv")
                                    .save_file()
                                {
                                    let result = std::fs::File::create(&dest)
                                        .map_err(|e| format!("Cannot create file: {e}"))
                                        .and_then(|f| {
                                            crate::core::export::export_csv(
                                                f,
                                                &self.state.scored,
                                                &self.state.filtered_indices,
                                            )
                                            .map_err(|e| e.to_string())
                                        });
                                    self.state.status_message = match result {
                                        Ok(()) => format!(
                                            "Exported {} vehicles to CSV.",
                                            self.state.filtered_indices.len()
                                        ),
                                        Err(e) => format!("CSV export failed: {e}"),
                                    };
                                }
                                ui.close_menu();
                            }
                            if ui.button("Export JSON\u{2026}").clicked() {
                                if let Some(dest) = rfd::FileDialog::new()
                                    .add_filter("JSON", &["json"])
                                    .set_file_name("evguard-export.json")
                                    .save_file()
                                {
                                    let result = std::fs::File::create(&dest)
                                        .map_err(|e| format!("Cannot create file: {e}"))
                                        .and_then(|f| {
                                            crate::core::export::export_json(
                                                f,
                                                &self.state.scored,
                                                &self.state.filtered_indices,
                                            )
                                            .map_err(|e| e.to_string())
                                        });
                                    self.state.status_message = match result {
                                        Ok(()) => format!(
                                            "Exported {} vehicles to JSON.",
                                            self.state.filtered_indices.len()
                                        ),
                                        Err(e) => format!("JSON export failed: {e}"),
                                    };
                                }
                                ui.close_menu();
                            }
                        });
                    });
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Analysis Summary").clicked() {
                        self.state.show_summary = true;
                        ui.close_menu();
                    }
                    let has_vehicles = !self.state.filtered_indices.is_empty();
                    ui.add_enabled_ui(has_vehicles, |ui| {
                        if ui.button("Compliance Report\u{2026}").clicked() {
                            self.state.show_report_dialog = true;
                            ui.close_menu();
                        }
                    });
                });
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.state.demo_mode {
                    ui.label(
                        egui::RichText::new(" DEMO ")
                            .strong()
                            .color(egui::Color32::from_rgb(96, 165, 250)) // Blue 400
                            .background_color(egui::Color32::from_rgba_premultiplied(
                                96, 165, 250, 30,
                            )),
                    );
                    ui.separator();
                }
                ui.label(&self.state.status_message);
                if self.state.analysis_in_progress {
                    ui.spinner();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let total = self.state.scored.len();
                    let filtered = self.state.filtered_indices.len();
                    if total > 0 {
                        ui.label(format!("{filtered}/{total} vehicles"));
                    }
                });
            });
        });

        // Detail pane (bottom)
        let mut vehicle_summary_request: Option<String> = None;
        egui::TopBottomPanel::bottom("detail_pane")
            .resizable(true)
            .default_height(ui::theme::DETAIL_PANE_HEIGHT)
            .show(ctx, |ui| {
                vehicle_summary_request =
                    ui::panels::detail::render(ui, &self.state, &mut self.summary_manager);
            });

        // Left sidebar (filters)
        egui::SidePanel::left("sidebar")
            .default_width(ui::theme::SIDEBAR_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        ui::panels::filters::render(ui, &mut self.state);
                    });
            });

        // Central panel (vehicle table)
        egui::CentralPanel::default().show(ctx, |ui| {
            ui::panels::vehicles::render(ui, &mut self.state);
        });

        // Dialogs
        let fleet_summary_request =
            ui::panels::summary::render(ctx, &mut self.state, &mut self.summary_manager);
        ui::panels::report::render(ctx, &mut self.state, &mut self.report_options);

        // Narrative requests collected from panels this frame.
        if let Some(plate) = vehicle_summary_request {
            if let Some(sv) = self.state.scored.iter().find(|sv| sv.plate == plate) {
                let prompt = summarizer::vehicle_prompt(sv);
                let backend = self.narrative_backend();
                self.summary_manager
                    .request(SummaryTarget::Vehicle(plate), prompt, backend);
            }
        }
        if fleet_summary_request {
            if let Some(summary) = &self.state.summary {
                let prompt = summarizer::fleet_prompt(summary, &self.state.scored);
                let backend = self.narrative_backend();
                self.summary_manager
                    .request(SummaryTarget::Fleet, prompt, backend);
            }
        }
    }
}
