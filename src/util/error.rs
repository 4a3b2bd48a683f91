// EVGuard - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; all errors preserve the causal chain
// for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all EVGuard operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum EvGuardError {
    /// Transaction log parsing failed.
    Parse(ParseError),

    /// Reference dataset (detection/registry CSV) loading failed.
    Reference(ReferenceError),

    /// Filter operation failed.
    Filter(FilterError),

    /// Export operation failed.
    Export(ExportError),

    /// Report rendering or writing failed.
    Report(ReportError),

    /// Narrative summariser call failed.
    Summary(SummaryError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for EvGuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Reference(e) => write!(f, "Reference data error: {e}"),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Report(e) => write!(f, "Report error: {e}"),
            Self::Summary(e) => write!(f, "Summary error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for EvGuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Reference(e) => Some(e),
            Self::Filter(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Report(e) => Some(e),
            Self::Summary(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors raised while parsing the charging transaction log.
///
/// All variants are non-recoverable for that input: the caller surfaces the
/// message and allows re-upload. A failing parse produces no partial results.
#[derive(Debug)]
pub enum ParseError {
    /// Input is empty or whitespace-only.
    EmptyInput,

    /// Input has a header but no data rows.
    MissingData,

    /// Header is missing one or more required columns.
    MissingColumns { columns: Vec<String> },

    /// A data row's field count does not match the header's.
    /// `row` is the 1-based data-row number (header excluded).
    MalformedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A required column's value failed its declared type.
    InvalidField {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    /// Input exceeds a named size bound.
    TooLarge { rows: usize, max: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Log input is empty"),
            Self::MissingData => write!(f, "Log contains a header but no data rows"),
            Self::MissingColumns { columns } => write!(
                f,
                "Log header is missing required column(s): {}",
                columns.join(", ")
            ),
            Self::MalformedRow {
                row,
                expected,
                actual,
            } => write!(
                f,
                "Row {row}: expected {expected} column(s), found {actual}"
            ),
            Self::InvalidField {
                row,
                column,
                value,
                expected,
            } => write!(
                f,
                "Row {row}: column '{column}' value '{value}' is not a valid {expected}"
            ),
            Self::TooLarge { rows, max } => {
                write!(f, "Log has {rows} data rows, exceeds maximum of {max}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for EvGuardError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Reference data errors
// ---------------------------------------------------------------------------

/// Errors raised while loading detection/registry reference CSVs.
#[derive(Debug)]
pub enum ReferenceError {
    /// CSV deserialisation failed.
    Csv { path: PathBuf, source: csv::Error },

    /// A record field could not be interpreted.
    InvalidRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// The dataset exceeds the maximum record count.
    TooManyRecords { path: PathBuf, max: usize },

    /// I/O error reading the file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { path, source } => {
                write!(f, "CSV error in '{}': {source}", path.display())
            }
            Self::InvalidRecord { path, line, reason } => {
                write!(f, "'{}' line {line}: {reason}", path.display())
            }
            Self::TooManyRecords { path, max } => write!(
                f,
                "'{}' exceeds maximum of {max} records",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ReferenceError> for EvGuardError {
    fn from(e: ReferenceError) -> Self {
        Self::Reference(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter operations.
#[derive(Debug)]
pub enum FilterError {
    /// User-provided regex is invalid.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid filter regex '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
        }
    }
}

impl From<FilterError> for EvGuardError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to CSV/JSON export operations. Path context is attached
/// by the caller that opened the destination file.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export stream.
    Io(io::Error),

    /// CSV serialisation error.
    Csv(csv::Error),

    /// JSON serialisation error.
    Json(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(source) => write!(f, "Export I/O error: {source}"),
            Self::Csv(source) => write!(f, "CSV export error: {source}"),
            Self::Json(source) => write!(f, "JSON export error: {source}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(source) => Some(source),
            Self::Csv(source) => Some(source),
            Self::Json(source) => Some(source),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ExportError> for EvGuardError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors related to compliance-report rendering and writing.
#[derive(Debug)]
pub enum ReportError {
    /// Nothing selected for the report.
    NoVehicles,

    /// I/O error writing the report file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVehicles => write!(f, "No vehicles selected for the report"),
            Self::Io { path, source } => {
                write!(f, "Report I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ReportError> for EvGuardError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

// ---------------------------------------------------------------------------
// Summary errors
// ---------------------------------------------------------------------------

/// Errors from the narrative summariser. Isolated per call; never abort or
/// invalidate already-computed scores.
#[derive(Debug)]
pub enum SummaryError {
    /// The configured API key environment variable is unset or empty.
    MissingApiKey { env_var: String },

    /// The HTTP request to the text-generation service failed.
    Http { source: reqwest::Error },

    /// The service responded but the payload could not be interpreted.
    BadResponse { reason: String },
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey { env_var } => write!(
                f,
                "Summariser API key not found; set the {env_var} environment variable"
            ),
            Self::Http { source } => write!(f, "Summariser request failed: {source}"),
            Self::BadResponse { reason } => {
                write!(f, "Summariser returned an unusable response: {reason}")
            }
        }
    }
}

impl std::error::Error for SummaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http { source } => Some(source),
            _ => None,
        }
    }
}

impl From<SummaryError> for EvGuardError {
    fn from(e: SummaryError) -> Self {
        Self::Summary(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for EvGuardError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for EVGuard results.
pub type Result<T> = std::result::Result<T, EvGuardError>;
