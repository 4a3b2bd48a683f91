// EVGuard - app/analysis.rs
//
// Analysis lifecycle management. Runs parse + score on a background thread,
// sending progress messages to the UI thread via an mpsc channel.
//
// Architecture:
//   - `AnalysisManager` lives on the UI thread; `run_analysis` runs on a
//     background thread.
//   - All cross-thread communication is via `AnalysisProgress` messages.
//   - A run is atomic: either the full scored list arrives in `Completed`
//     or `Failed` carries the error and no partial state is published.

use crate::core::engine::{self, ScoringConfig};
use crate::core::model::{AnalysisProgress, Detection, RegistryRecord};
use crate::core::parser::{self, ParseConfig};
use crate::util::constants;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

/// Input for one analysis run, assembled on the UI thread.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Path to the transaction log. None means `raw_log` holds pasted or
    /// demo content.
    pub log_path: Option<PathBuf>,

    /// Log content when no path is given.
    pub raw_log: Option<String>,

    pub detections: HashMap<String, Detection>,
    pub registry: HashMap<String, RegistryRecord>,
    pub scoring: ScoringConfig,
}

/// Manages an analysis run on a background thread.
pub struct AnalysisManager {
    /// Channel receiver for the UI to poll progress messages.
    progress_rx: Option<mpsc::Receiver<AnalysisProgress>>,

    /// True between `start` and the terminal message being polled.
    running: bool,
}

impl AnalysisManager {
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start an analysis run. Spawns a background thread immediately;
    /// progress is sent over the channel. A run already in flight keeps
    /// running but its channel is dropped, so its results are discarded.
    pub fn start(&mut self, request: AnalysisRequest) {
        let (tx, rx) = mpsc::channel();
        self.progress_rx = Some(rx);
        self.running = true;

        std::thread::spawn(move || {
            run_analysis(request, tx);
        });

        tracing::info!("Analysis started");
    }

    /// Poll for progress messages without blocking, up to the per-frame
    /// budget. Marks the run finished when a terminal message arrives.
    pub fn poll_progress(&mut self) -> Vec<AnalysisProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while messages.len() < constants::MAX_ANALYSIS_MESSAGES_PER_FRAME {
                match rx.try_recv() {
                    Ok(msg) => {
                        if matches!(
                            msg,
                            AnalysisProgress::Completed { .. } | AnalysisProgress::Failed { .. }
                        ) {
                            self.running = false;
                        }
                        messages.push(msg);
                    }
                    Err(_) => break,
                }
            }
        }
        messages
    }
}

impl Default for AnalysisManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Full analysis pipeline: read → parse → score → summarise.
/// Runs on a background thread. Sends `AnalysisProgress` messages to `tx`.
fn run_analysis(request: AnalysisRequest, tx: mpsc::Sender<AnalysisProgress>) {
    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                return; // Receiver dropped (UI closed or run superseded).
            }
        };
    }

    send!(AnalysisProgress::Started);
    let start = Instant::now();

    let raw = match read_log_input(&request) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(%error, "Analysis input unreadable");
            send!(AnalysisProgress::Failed { error });
            return;
        }
    };

    let transactions = match parser::parse_log(&raw, &ParseConfig::default()) {
        Ok(txs) => txs,
        Err(e) => {
            tracing::warn!(error = %e, "Log parse failed");
            send!(AnalysisProgress::Failed {
                error: e.to_string(),
            });
            return;
        }
    };

    let scored = engine::score_transactions(
        &transactions,
        &request.detections,
        &request.registry,
        &request.scoring,
        Utc::now().date_naive(),
    );

    let mut summary = engine::summarize(&scored);
    summary.duration = start.elapsed();

    tracing::info!(
        transactions = transactions.len(),
        mean_score = summary.mean_score,
        discrepancies = summary.discrepancy_count,
        "Analysis complete"
    );

    send!(AnalysisProgress::Completed {
        transactions,
        scored,
        summary,
    });
}

fn read_log_input(request: &AnalysisRequest) -> Result<String, String> {
    if let Some(path) = &request.log_path {
        let size = std::fs::metadata(path)
            .map_err(|e| format!("Cannot read '{}': {e}", path.display()))?
            .len();
        if size > constants::MAX_LOG_BYTES {
            return Err(format!(
                "'{}' is {size} bytes, above the {} byte limit",
                path.display(),
                constants::MAX_LOG_BYTES
            ));
        }
        std::fs::read_to_string(path).map_err(|e| format!("Cannot read '{}': {e}", path.display()))
    } else if let Some(raw) = &request.raw_log {
        Ok(raw.clone())
    } else {
        Err("No transaction log selected".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference;
    use std::time::Duration;

    fn wait_for_terminal(manager: &mut AnalysisManager) -> AnalysisProgress {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            for msg in manager.poll_progress() {
                match msg {
                    AnalysisProgress::Started => {}
                    terminal => return terminal,
                }
            }
            assert!(Instant::now() < deadline, "analysis did not finish in time");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_demo_analysis_completes() {
        let mut manager = AnalysisManager::new();
        manager.start(AnalysisRequest {
            log_path: None,
            raw_log: Some(reference::demo_transaction_log()),
            detections: reference::demo_detections(),
            registry: reference::demo_registry(),
            scoring: ScoringConfig::default(),
        });
        assert!(manager.is_running());

        match wait_for_terminal(&mut manager) {
            AnalysisProgress::Completed {
                transactions,
                scored,
                summary,
            } => {
                assert_eq!(transactions.len(), 8);
                assert_eq!(scored.len(), 8);
                assert_eq!(summary.vehicle_count, 8);
                // EV-CH-09 carries three out-of-tolerance sessions.
                assert_eq!(summary.faulty_charger_count, 1);
            }
            other => panic!("unexpected terminal message: {other:?}"),
        }
        assert!(!manager.is_running());
    }

    #[test]
    fn test_malformed_log_fails_without_partial_results() {
        let mut manager = AnalysisManager::new();
        manager.start(AnalysisRequest {
            log_path: None,
            raw_log: Some("timestamp,plate\n2025-10-31T09:15:00,KA03AB1234\n".to_string()),
            detections: HashMap::new(),
            registry: HashMap::new(),
            scoring: ScoringConfig::default(),
        });

        match wait_for_terminal(&mut manager) {
            AnalysisProgress::Failed { error } => {
                assert!(error.contains("billed_kwh"), "error was: {error}");
            }
            other => panic!("unexpected terminal message: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_fails() {
        let mut manager = AnalysisManager::new();
        manager.start(AnalysisRequest {
            log_path: Some(PathBuf::from("/nonexistent/charging.log")),
            raw_log: None,
            detections: HashMap::new(),
            registry: HashMap::new(),
            scoring: ScoringConfig::default(),
        });

        assert!(matches!(
            wait_for_terminal(&mut manager),
            AnalysisProgress::Failed { .. }
        ));
    }

    #[test]
    fn test_no_input_fails() {
        let mut manager = AnalysisManager::new();
        manager.start(AnalysisRequest {
            log_path: None,
            raw_log: None,
            detections: HashMap::new(),
            registry: HashMap::new(),
            scoring: ScoringConfig::default(),
        });

        match wait_for_terminal(&mut manager) {
            AnalysisProgress::Failed { error } => {
                assert!(error.contains("No transaction log"));
            }
            other => panic!("unexpected terminal message: {other:?}"),
        }
    }
}
