// EVGuard - app/summarizer.rs
//
// Narrative summaries of analysis results. A summary target is either the
// whole fleet or a single vehicle. Generation runs on a background thread
// and reports back over an mpsc channel, mirroring the analysis pipeline.
//
// Two backends:
//   - `HttpBackend` posts a chat-completions request to a configured
//     endpoint (blocking reqwest; the caller is already off the UI thread).
//   - `TemplateBackend` renders a deterministic local narrative and is the
//     fallback whenever the HTTP backend is disabled or misconfigured.
//
// Results are cached per target for the session; repeated requests for an
// in-flight target are dropped rather than duplicated. Regeneration is
// explicit: evict the cached entry, then request again.

use crate::core::model::{AnalysisSummary, DiscrepancyFlag, ScoredVehicle, ViolationKind};
use crate::util::constants;
use crate::util::error::SummaryError;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::time::Duration;

/// What a narrative describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SummaryTarget {
    /// Fleet-level narrative over the whole analysis.
    Fleet,
    /// Single vehicle, keyed by plate.
    Vehicle(String),
}

impl SummaryTarget {
    pub fn label(&self) -> String {
        match self {
            SummaryTarget::Fleet => "fleet".to_string(),
            SummaryTarget::Vehicle(plate) => plate.clone(),
        }
    }
}

/// Progress messages from a summary worker thread.
#[derive(Debug)]
pub enum SummaryProgress {
    Completed { target: SummaryTarget, text: String },
    Failed { target: SummaryTarget, error: String },
}

/// A narrative backend turns a prompt into prose.
pub trait NarrativeBackend: Send {
    fn generate(&self, prompt: &str) -> Result<String, SummaryError>;
}

// =============================================================================
// HTTP backend
// =============================================================================

/// Chat-completions HTTP backend. The API key is read from the configured
/// environment variable at request time and never stored.
pub struct HttpBackend {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
}

impl NarrativeBackend for HttpBackend {
    fn generate(&self, prompt: &str) -> Result<String, SummaryError> {
        let api_key =
            std::env::var(&self.api_key_env).map_err(|_| SummaryError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a concise compliance analyst for an EV charging network. \
                                Summarise findings in plain language for a non-technical operator."
                },
                { "role": "user", "content": prompt }
            ],
        });

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(constants::SUMMARY_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| SummaryError::Http { source })?;

        let response = client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|source| SummaryError::Http { source })?
            .error_for_status()
            .map_err(|source| SummaryError::Http { source })?;

        let value: serde_json::Value =
            response.json().map_err(|source| SummaryError::Http { source })?;
        let text = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| SummaryError::BadResponse {
                reason: "response has no choices[0].message.content".to_string(),
            })?;

        if text.trim().is_empty() {
            return Err(SummaryError::BadResponse {
                reason: "backend returned empty narrative".to_string(),
            });
        }
        Ok(truncate_narrative(text.trim()))
    }
}

// =============================================================================
// Template backend
// =============================================================================

/// Deterministic local narrative. No network, no key; always available.
pub struct TemplateBackend;

impl NarrativeBackend for TemplateBackend {
    fn generate(&self, prompt: &str) -> Result<String, SummaryError> {
        // The prompt body is already a readable findings digest; present it
        // with a short preamble.
        Ok(truncate_narrative(&format!(
            "Automated compliance digest (local template).\n\n{prompt}"
        )))
    }
}

fn truncate_narrative(text: &str) -> String {
    if text.chars().count() <= constants::MAX_NARRATIVE_CHARS {
        text.to_string()
    } else {
        text.chars().take(constants::MAX_NARRATIVE_CHARS).collect()
    }
}

// =============================================================================
// Prompt construction
// =============================================================================

/// Build the fleet-level prompt from the aggregate summary.
pub fn fleet_prompt(summary: &AnalysisSummary, scored: &[ScoredVehicle]) -> String {
    let mut prompt = format!(
        "Fleet analysis of {} charging transactions. Mean compliance score {:.1}/100. \
         {} transactions carried charging discrepancies; {} chargers are suspected faulty.\n",
        summary.vehicle_count,
        summary.mean_score,
        summary.discrepancy_count,
        summary.faulty_charger_count
    );

    for kind in ViolationKind::all() {
        if let Some(count) = summary.violations_by_kind.get(kind) {
            prompt.push_str(&format!("- {}: {count} vehicle(s)\n", kind.label()));
        }
    }

    let mut faulty: Vec<&str> = scored
        .iter()
        .filter(|sv| sv.charging.flag == DiscrepancyFlag::PotentialChargerFault)
        .map(|sv| sv.charging.charger_id.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    faulty.sort_unstable();
    if !faulty.is_empty() {
        prompt.push_str(&format!("Chargers to inspect: {}\n", faulty.join(", ")));
    }
    prompt
}

/// Build the single-vehicle prompt from its scored record.
pub fn vehicle_prompt(sv: &ScoredVehicle) -> String {
    let mut prompt = format!(
        "Vehicle {} ({}), owner {}. Compliance score {}/100. \
         Billed {:.1} kWh vs detected {:.1} kWh on {} ({}).\n",
        sv.plate,
        sv.vehicle_type.label(),
        sv.registry.owner,
        sv.compliance.score,
        sv.charging.billed_kwh,
        sv.charging.detected_kwh,
        sv.charging.charger_id,
        sv.charging.flag.label()
    );
    if sv.compliance.violations.is_empty() {
        prompt.push_str("No violations.\n");
    } else {
        for v in &sv.compliance.violations {
            prompt.push_str(&format!("- {}\n", v.message));
        }
    }
    prompt
}

// =============================================================================
// SummaryManager
// =============================================================================

/// Owns the summary worker channel, the in-flight set, and the session
/// cache. Lives on the UI thread.
pub struct SummaryManager {
    progress_rx: Option<mpsc::Receiver<SummaryProgress>>,
    progress_tx: Option<mpsc::Sender<SummaryProgress>>,

    /// Targets with a worker currently running.
    in_flight: HashSet<SummaryTarget>,

    /// Completed narratives for this session. Cleared on a new analysis.
    cache: HashMap<SummaryTarget, String>,
}

impl SummaryManager {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            progress_rx: Some(rx),
            progress_tx: Some(tx),
            in_flight: HashSet::new(),
            cache: HashMap::new(),
        }
    }

    pub fn cached(&self, target: &SummaryTarget) -> Option<&str> {
        self.cache.get(target).map(String::as_str)
    }

    pub fn is_in_flight(&self, target: &SummaryTarget) -> bool {
        self.in_flight.contains(target)
    }

    /// Drop all session state. Called when a new analysis replaces the
    /// scored list the narratives were describing. The channel pair is
    /// recreated so workers spawned before the clear send into a dead
    /// channel instead of leaking results into the new session.
    pub fn clear(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.progress_tx = Some(tx);
        self.progress_rx = Some(rx);
        self.in_flight.clear();
        self.cache.clear();
    }

    /// Drop one cached narrative so the next request regenerates it.
    pub fn evict(&mut self, target: &SummaryTarget) {
        self.cache.remove(target);
    }

    /// Request a narrative for `target`. Cached and in-flight targets are
    /// skipped. The backend is moved onto a worker thread.
    pub fn request(
        &mut self,
        target: SummaryTarget,
        prompt: String,
        backend: Box<dyn NarrativeBackend>,
    ) {
        if self.cache.contains_key(&target) || self.in_flight.contains(&target) {
            tracing::debug!(target = %target.label(), "Summary request deduplicated");
            return;
        }
        let Some(tx) = self.progress_tx.clone() else {
            return;
        };
        self.in_flight.insert(target.clone());
        tracing::info!(target = %target.label(), "Summary requested");

        std::thread::spawn(move || {
            let message = match backend.generate(&prompt) {
                Ok(text) => SummaryProgress::Completed { target, text },
                Err(e) => SummaryProgress::Failed {
                    target,
                    error: e.to_string(),
                },
            };
            // Receiver dropped means the UI closed; nothing to do.
            let _ = tx.send(message);
        });
    }

    /// Poll worker messages without blocking, up to the per-frame budget.
    /// Completed narratives enter the cache.
    pub fn poll_progress(&mut self) -> Vec<SummaryProgress> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.progress_rx {
            while messages.len() < constants::MAX_SUMMARY_MESSAGES_PER_FRAME {
                match rx.try_recv() {
                    Ok(msg) => messages.push(msg),
                    Err(_) => break,
                }
            }
        }
        for msg in &messages {
            match msg {
                SummaryProgress::Completed { target, text } => {
                    self.in_flight.remove(target);
                    self.cache.insert(target.clone(), text.clone());
                }
                SummaryProgress::Failed { target, .. } => {
                    self.in_flight.remove(target);
                }
            }
        }
        messages
    }
}

impl Default for SummaryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    struct CountingBackend {
        calls: Arc<AtomicUsize>,
        reply: Result<String, String>,
    }

    impl NarrativeBackend for CountingBackend {
        fn generate(&self, _prompt: &str) -> Result<String, SummaryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(reason) => Err(SummaryError::BadResponse {
                    reason: reason.clone(),
                }),
            }
        }
    }

    fn drain_until_idle(manager: &mut SummaryManager) -> Vec<SummaryProgress> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut all = Vec::new();
        while !manager.in_flight.is_empty() {
            all.extend(manager.poll_progress());
            assert!(Instant::now() < deadline, "summary workers did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
        all.extend(manager.poll_progress());
        all
    }

    #[test]
    fn test_completed_summary_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = SummaryManager::new();
        manager.request(
            SummaryTarget::Fleet,
            "prompt".to_string(),
            Box::new(CountingBackend {
                calls: Arc::clone(&calls),
                reply: Ok("All clear.".to_string()),
            }),
        );
        drain_until_idle(&mut manager);

        assert_eq!(manager.cached(&SummaryTarget::Fleet), Some("All clear."));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_target_not_regenerated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = SummaryManager::new();
        for _ in 0..3 {
            manager.request(
                SummaryTarget::Vehicle("KA03AB1234".to_string()),
                "prompt".to_string(),
                Box::new(CountingBackend {
                    calls: Arc::clone(&calls),
                    reply: Ok("text".to_string()),
                }),
            );
            drain_until_idle(&mut manager);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_reported_and_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = SummaryManager::new();
        manager.request(
            SummaryTarget::Fleet,
            "prompt".to_string(),
            Box::new(CountingBackend {
                calls: Arc::clone(&calls),
                reply: Err("bad payload".to_string()),
            }),
        );
        let messages = drain_until_idle(&mut manager);

        assert!(messages
            .iter()
            .any(|m| matches!(m, SummaryProgress::Failed { .. })));
        assert!(manager.cached(&SummaryTarget::Fleet).is_none());
        // A retry after failure is allowed.
        manager.request(
            SummaryTarget::Fleet,
            "prompt".to_string(),
            Box::new(CountingBackend {
                calls: Arc::clone(&calls),
                reply: Ok("recovered".to_string()),
            }),
        );
        drain_until_idle(&mut manager);
        assert_eq!(manager.cached(&SummaryTarget::Fleet), Some("recovered"));
    }

    struct DelayedBackend {
        delay: Duration,
        reply: String,
    }

    impl NarrativeBackend for DelayedBackend {
        fn generate(&self, _prompt: &str) -> Result<String, SummaryError> {
            std::thread::sleep(self.delay);
            Ok(self.reply.clone())
        }
    }

    /// A worker still running when `clear()` is called belongs to the old
    /// session; its late result must not be cached into the new one.
    #[test]
    fn test_result_from_before_clear_is_discarded() {
        let mut manager = SummaryManager::new();
        manager.request(
            SummaryTarget::Fleet,
            "prompt".to_string(),
            Box::new(DelayedBackend {
                delay: Duration::from_millis(200),
                reply: "old session".to_string(),
            }),
        );
        manager.clear();

        // Give the pre-clear worker time to finish and send.
        std::thread::sleep(Duration::from_millis(500));
        assert!(manager.poll_progress().is_empty());
        assert!(manager.cached(&SummaryTarget::Fleet).is_none());

        // The target is requestable again in the new session.
        let calls = Arc::new(AtomicUsize::new(0));
        manager.request(
            SummaryTarget::Fleet,
            "prompt".to_string(),
            Box::new(CountingBackend {
                calls: Arc::clone(&calls),
                reply: Ok("new session".to_string()),
            }),
        );
        drain_until_idle(&mut manager);
        assert_eq!(manager.cached(&SummaryTarget::Fleet), Some("new session"));
    }

    /// Evicting a cached narrative lets an explicit request re-invoke the
    /// backend where a plain repeat would be deduplicated.
    #[test]
    fn test_evicted_target_is_regenerated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = SummaryManager::new();
        let backend = |reply: &str| {
            Box::new(CountingBackend {
                calls: Arc::clone(&calls),
                reply: Ok(reply.to_string()),
            })
        };

        manager.request(SummaryTarget::Fleet, "prompt".to_string(), backend("first"));
        drain_until_idle(&mut manager);
        manager.request(SummaryTarget::Fleet, "prompt".to_string(), backend("second"));
        drain_until_idle(&mut manager);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "repeat request must dedup");

        manager.evict(&SummaryTarget::Fleet);
        manager.request(SummaryTarget::Fleet, "prompt".to_string(), backend("second"));
        drain_until_idle(&mut manager);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.cached(&SummaryTarget::Fleet), Some("second"));
    }

    #[test]
    fn test_clear_drops_cache() {
        let mut manager = SummaryManager::new();
        manager.request(
            SummaryTarget::Fleet,
            "prompt".to_string(),
            Box::new(CountingBackend {
                calls: Arc::new(AtomicUsize::new(0)),
                reply: Ok("text".to_string()),
            }),
        );
        drain_until_idle(&mut manager);
        assert!(manager.cached(&SummaryTarget::Fleet).is_some());
        manager.clear();
        assert!(manager.cached(&SummaryTarget::Fleet).is_none());
    }

    #[test]
    fn test_template_backend_renders_prompt() {
        let backend = TemplateBackend;
        let text = backend.generate("3 vehicles scored.").unwrap();
        assert!(text.contains("3 vehicles scored."));
    }

    #[test]
    fn test_http_backend_without_key_fails() {
        let backend = HttpBackend {
            endpoint: "https://api.example.com/v1/chat/completions".to_string(),
            model: "test".to_string(),
            api_key_env: "EVGUARD_TEST_NO_SUCH_KEY".to_string(),
        };
        let err = backend.generate("prompt").unwrap_err();
        assert!(matches!(err, SummaryError::MissingApiKey { .. }));
    }

    #[test]
    fn test_truncate_narrative_caps_length() {
        let long = "x".repeat(constants::MAX_NARRATIVE_CHARS + 100);
        assert_eq!(
            truncate_narrative(&long).chars().count(),
            constants::MAX_NARRATIVE_CHARS
        );
    }
}
