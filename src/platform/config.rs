// EVGuard - platform/config.rs
//
// Platform data-directory resolution and config.toml loading with startup
// validation. Invalid values produce actionable warnings and fall back to
// defaults; the application always starts.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for EVGuard data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/evguard/ or %APPDATA%\EVGuard\)
    pub config_dir: PathBuf,

    /// Data directory for exports, reports, caches.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[engine]` section.
    pub engine: EngineSection,
    /// `[ui]` section.
    pub ui: UiSection,
    /// `[summarizer]` section.
    pub summarizer: SummarizerSection,
    /// `[report]` section.
    pub report: ReportSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[engine]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Billed-vs-detected tolerance in kWh.
    pub kwh_tolerance: Option<f64>,
    /// Flagged discrepancies per charger before a fault is suspected.
    pub charger_fault_threshold: Option<usize>,
}

/// `[ui]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Theme: "dark" or "light".
    pub theme: Option<String>,
    /// Body font size in points.
    pub font_size: Option<f32>,
}

/// `[summarizer]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SummarizerSection {
    /// Enable the HTTP narrative backend. Off means the local template
    /// backend is used.
    pub enabled: Option<bool>,
    /// Chat-completions endpoint URL.
    pub endpoint: Option<String>,
    /// Model name passed through to the endpoint.
    pub model: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
}

/// `[report]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Lines per rendered report page.
    pub lines_per_page: Option<usize>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Engine --
    /// Billed-vs-detected tolerance in kWh.
    pub kwh_tolerance: f64,
    /// Flagged discrepancies per charger before a fault is suspected.
    pub charger_fault_threshold: usize,

    // -- UI --
    /// Dark mode (true) or light mode (false).
    pub dark_mode: bool,
    /// Body font size in points.
    pub font_size: f32,

    // -- Summariser --
    /// HTTP narrative backend enabled.
    pub summarizer_enabled: bool,
    /// Chat-completions endpoint URL.
    pub summarizer_endpoint: Option<String>,
    /// Model name for the endpoint.
    pub summarizer_model: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,

    // -- Report --
    /// Lines per rendered report page.
    pub report_lines_per_page: usize,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            kwh_tolerance: constants::DEFAULT_KWH_TOLERANCE,
            charger_fault_threshold: constants::DEFAULT_CHARGER_FAULT_THRESHOLD,
            dark_mode: true,
            font_size: constants::DEFAULT_FONT_SIZE,
            summarizer_enabled: false,
            summarizer_endpoint: None,
            summarizer_model: None,
            api_key_env: constants::DEFAULT_API_KEY_ENV.to_string(),
            report_lines_per_page: constants::DEFAULT_REPORT_LINES_PER_PAGE,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// warnings. If the file does not exist, returns defaults with no warnings
/// (first-run). If the file is unparseable, returns defaults with a
/// warning -- the application still starts but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    // Validate each field against named constants, accumulating all errors.
    let mut config = AppConfig::default();

    // -- Engine: kwh_tolerance --
    if let Some(tol) = raw.engine.kwh_tolerance {
        if tol.is_finite()
            && (constants::MIN_KWH_TOLERANCE..=constants::MAX_KWH_TOLERANCE).contains(&tol)
        {
            config.kwh_tolerance = tol;
        } else {
            warnings.push(format!(
                "[engine] kwh_tolerance = {tol} is out of range ({}-{}). Using default ({}).",
                constants::MIN_KWH_TOLERANCE,
                constants::MAX_KWH_TOLERANCE,
                constants::DEFAULT_KWH_TOLERANCE,
            ));
        }
    }

    // -- Engine: charger_fault_threshold --
    if let Some(threshold) = raw.engine.charger_fault_threshold {
        if (constants::MIN_CHARGER_FAULT_THRESHOLD..=constants::MAX_CHARGER_FAULT_THRESHOLD)
            .contains(&threshold)
        {
            config.charger_fault_threshold = threshold;
        } else {
            warnings.push(format!(
                "[engine] charger_fault_threshold = {threshold} is out of range ({}-{}). Using default ({}).",
                constants::MIN_CHARGER_FAULT_THRESHOLD,
                constants::MAX_CHARGER_FAULT_THRESHOLD,
                constants::DEFAULT_CHARGER_FAULT_THRESHOLD,
            ));
        }
    }

    // -- UI: theme --
    if let Some(ref theme) = raw.ui.theme {
        match theme.to_lowercase().as_str() {
            "dark" => config.dark_mode = true,
            "light" => config.dark_mode = false,
            other => {
                warnings.push(format!(
                    "[ui] theme = \"{other}\" is not recognised. Expected \"dark\" or \"light\". Using default (dark).",
                ));
            }
        }
    }

    // -- UI: font_size --
    if let Some(size) = raw.ui.font_size {
        if (constants::MIN_FONT_SIZE..=constants::MAX_FONT_SIZE).contains(&size) {
            config.font_size = size;
        } else {
            warnings.push(format!(
                "[ui] font_size = {size} is out of range ({}-{}). Using default ({}).",
                constants::MIN_FONT_SIZE,
                constants::MAX_FONT_SIZE,
                constants::DEFAULT_FONT_SIZE,
            ));
        }
    }

    // -- Summariser --
    if let Some(enabled) = raw.summarizer.enabled {
        config.summarizer_enabled = enabled;
    }
    if let Some(ref endpoint) = raw.summarizer.endpoint {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            config.summarizer_endpoint = Some(endpoint.clone());
        } else if !endpoint.is_empty() {
            warnings.push(format!(
                "[summarizer] endpoint = \"{endpoint}\" is not an http(s) URL. Ignoring.",
            ));
        }
    }
    if let Some(ref model) = raw.summarizer.model {
        if !model.is_empty() {
            config.summarizer_model = Some(model.clone());
        }
    }
    if let Some(ref env_var) = raw.summarizer.api_key_env {
        if !env_var.is_empty() {
            config.api_key_env = env_var.clone();
        }
    }
    if config.summarizer_enabled && config.summarizer_endpoint.is_none() {
        warnings.push(
            "[summarizer] enabled = true but no endpoint is set. \
             Falling back to the local template backend."
                .to_string(),
        );
        config.summarizer_enabled = false;
    }

    // -- Report: lines_per_page --
    if let Some(lines) = raw.report.lines_per_page {
        if (constants::MIN_REPORT_LINES_PER_PAGE..=constants::MAX_REPORT_LINES_PER_PAGE)
            .contains(&lines)
        {
            config.report_lines_per_page = lines;
        } else {
            warnings.push(format!(
                "[report] lines_per_page = {lines} is out of range ({}-{}). Using default ({}).",
                constants::MIN_REPORT_LINES_PER_PAGE,
                constants::MAX_REPORT_LINES_PER_PAGE,
                constants::DEFAULT_REPORT_LINES_PER_PAGE,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}
