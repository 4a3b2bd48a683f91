// EVGuard - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "EVGuard";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "EVGuard";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Log format contract
// =============================================================================

/// Field delimiter for the charging transaction log.
pub const LOG_DELIMITER: char = ',';

/// Required columns in the transaction log header, in canonical order.
/// Matching is case-insensitive; extra columns pass through untyped.
pub const REQUIRED_COLUMNS: &[&str] =
    &["timestamp", "plate", "billed_kwh", "amount", "charger_id"];

/// Maximum accepted log size in bytes. Realistic logs are hundreds to low
/// thousands of rows; this bound rejects accidental multi-GB uploads.
pub const MAX_LOG_BYTES: u64 = 16 * 1024 * 1024; // 16 MB

/// Maximum number of data rows accepted from a single log.
pub const MAX_LOG_ROWS: usize = 100_000;

// =============================================================================
// Scoring defaults
// =============================================================================

/// Default billed-vs-detected energy tolerance in kWh. A transaction whose
/// absolute difference exceeds this is flagged suspicious.
pub const DEFAULT_KWH_TOLERANCE: f64 = 2.0;

/// Minimum and maximum user-configurable kWh tolerance.
pub const MIN_KWH_TOLERANCE: f64 = 0.1;
pub const MAX_KWH_TOLERANCE: f64 = 100.0;

/// Default number of flagged discrepancies at a single charger before the
/// charger itself is considered faulty (systemic signal).
pub const DEFAULT_CHARGER_FAULT_THRESHOLD: usize = 3;

/// Minimum and maximum user-configurable charger-fault threshold.
pub const MIN_CHARGER_FAULT_THRESHOLD: usize = 2;
pub const MAX_CHARGER_FAULT_THRESHOLD: usize = 1_000;

/// Points deducted per failed compliance check.
pub const CATEGORY_PENALTY: u32 = 20;

/// Maximum compliance score (all checks pass).
pub const MAX_SCORE: u32 = 100;

// =============================================================================
// Reference data limits
// =============================================================================

/// Maximum number of detection records loaded from a reference CSV.
pub const MAX_DETECTION_RECORDS: usize = 100_000;

/// Maximum number of registry records loaded from a reference CSV.
pub const MAX_REGISTRY_RECORDS: usize = 100_000;

// =============================================================================
// Report
// =============================================================================

/// Default number of text lines per report page.
pub const DEFAULT_REPORT_LINES_PER_PAGE: usize = 60;

/// Minimum and maximum user-configurable report page length.
pub const MIN_REPORT_LINES_PER_PAGE: usize = 20;
pub const MAX_REPORT_LINES_PER_PAGE: usize = 500;

/// Report page width in characters (table layout and rules).
pub const REPORT_PAGE_WIDTH: usize = 92;

// =============================================================================
// Narrative summariser
// =============================================================================

/// Default environment variable read for the summariser API key.
pub const DEFAULT_API_KEY_ENV: &str = "EVGUARD_API_KEY";

/// HTTP timeout for a single summariser request.
pub const SUMMARY_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum characters of narrative text retained per target. Responses are
/// truncated beyond this so a misbehaving backend cannot grow the cache
/// without bound.
pub const MAX_NARRATIVE_CHARS: usize = 8_192;

// =============================================================================
// Per-frame UI message budgets
// =============================================================================

/// Maximum analysis-progress messages processed by the UI loop per frame.
pub const MAX_ANALYSIS_MESSAGES_PER_FRAME: usize = 100;

/// Maximum summary-progress messages processed by the UI loop per frame.
pub const MAX_SUMMARY_MESSAGES_PER_FRAME: usize = 50;

// =============================================================================
// UI defaults
// =============================================================================

/// Default UI body font size in points.
pub const DEFAULT_FONT_SIZE: f32 = 14.5;

/// Minimum user-configurable UI font size (points).
pub const MIN_FONT_SIZE: f32 = 10.0;

/// Maximum user-configurable UI font size (points).
pub const MAX_FONT_SIZE: f32 = 24.0;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
