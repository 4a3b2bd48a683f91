// EVGuard - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. Reference dataset loading (CSV files or built-in demo set)
// 4. eframe GUI launch

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod gui;

// Re-export modules from the library crate so that `gui.rs` and other
// binary-side code can still use `crate::app::...`, `crate::core::...` etc.
pub use evguard::app;

pub use evguard::core;
pub use evguard::platform;
pub use evguard::ui;
pub use evguard::util;

use clap::Parser;
use std::path::PathBuf;

/// EVGuard - EV charging compliance analyser.
///
/// Point EVGuard at a charging transaction log to join it with ANPR
/// detections and the motor registry, score each vehicle, and flag billing
/// discrepancies and suspect chargers.
#[derive(Parser, Debug)]
#[command(name = "EVGuard", version, about)]
struct Cli {
    /// Charging transaction log to analyse on startup (opens empty if omitted).
    log: Option<PathBuf>,

    /// Detection dataset CSV (built-in demo data if omitted).
    #[arg(long = "detections")]
    detections: Option<PathBuf>,

    /// Motor registry CSV (built-in demo data if omitted).
    #[arg(long = "registry")]
    registry: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Resolve platform paths and load config before logging so the
    // configured log level can participate in filter resolution.
    let platform_paths = platform::config::PlatformPaths::resolve();
    let (config, config_warnings) = platform::config::load_config(&platform_paths.config_dir);

    // Initialise logging subsystem
    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "EVGuard starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    // Load reference datasets: CLI paths take priority, otherwise the
    // built-in demo set so the application is usable out of the box.
    let mut demo_mode = true;
    let mut dataset_warnings: Vec<String> = Vec::new();

    let detections = match &cli.detections {
        Some(path) => match core::reference::load_detections_csv(path) {
            Ok(dets) => {
                demo_mode = false;
                dets
            }
            Err(e) => {
                let msg = format!("Detection dataset load failed: {e}. Using demo data.");
                tracing::warn!("{}", msg);
                dataset_warnings.push(msg);
                core::reference::demo_detections()
            }
        },
        None => core::reference::demo_detections(),
    };

    let registry = match &cli.registry {
        Some(path) => match core::reference::load_registry_csv(path) {
            Ok(reg) => {
                demo_mode = false;
                reg
            }
            Err(e) => {
                let msg = format!("Registry dataset load failed: {e}. Using demo data.");
                tracing::warn!("{}", msg);
                dataset_warnings.push(msg);
                core::reference::demo_registry()
            }
        },
        None => core::reference::demo_registry(),
    };

    tracing::info!(
        detections = detections.len(),
        registry = registry.len(),
        demo = demo_mode,
        "Reference datasets ready"
    );

    // Create application state
    let mut state = app::state::AppState::new(detections, registry, demo_mode, cli.debug);
    state.warnings.extend(config_warnings);
    state.warnings.extend(dataset_warnings);

    // If a log was provided on the CLI, record it; the GUI starts the
    // analysis on its first frame via the stored path.
    if let Some(ref path) = cli.log {
        state.log_path = Some(path.clone());
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "{} v{}",
                util::constants::APP_NAME,
                util::constants::APP_VERSION
            ))
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        util::constants::APP_NAME,
        native_options,
        Box::new(move |cc| {
            let mut style = (*cc.egui_ctx.style()).clone();
            style
                .text_styles
                .entry(egui::TextStyle::Body)
                .and_modify(|f| f.size = config.font_size);
            cc.egui_ctx.set_style(style);
            if config.dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }
            Ok(Box::new(gui::EvGuardApp::new(state, config)))
        }),
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to launch GUI");
        eprintln!("Error: Failed to launch EVGuard GUI: {e}");
        std::process::exit(1);
    }
}
