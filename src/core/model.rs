// EVGuard - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers. Category
// statuses are closed tagged enums rather than strings so that every
// match over them is exhaustiveness-checked.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Transaction (normalised output of parsing)
// =============================================================================

/// A single charging transaction parsed from one log row.
///
/// Immutable once parsed; the scoring engine joins transactions with the
/// detection and registry datasets but never mutates them. Input row order
/// is preserved for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    /// Transaction timestamp in UTC.
    pub timestamp: DateTime<Utc>,

    /// Vehicle licence plate. Join key across all three input datasets;
    /// non-unique within the log (a vehicle may charge more than once).
    pub plate: String,

    /// Energy billed by the charging point, in kWh. Never negative.
    pub billed_kwh: f64,

    /// Amount billed in the local currency.
    pub amount: f64,

    /// Identifier of the charging point.
    pub charger_id: String,

    /// Unrecognised columns, keyed by lowercased header name. Pass-through
    /// strings: the explicit schema types only the required columns.
    pub extras: HashMap<String, String>,
}

// =============================================================================
// Detection (AI-detected vehicle attributes)
// =============================================================================

/// Vehicle class assigned by the detection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VehicleType {
    TwoWheeler,
    FourWheeler,
    Truck,
    #[default]
    Other,
}

impl VehicleType {
    /// All variants in display order.
    pub fn all() -> &'static [VehicleType] {
        &[
            VehicleType::TwoWheeler,
            VehicleType::FourWheeler,
            VehicleType::Truck,
            VehicleType::Other,
        ]
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            VehicleType::TwoWheeler => "2-Wheeler",
            VehicleType::FourWheeler => "4-Wheeler",
            VehicleType::Truck => "Truck",
            VehicleType::Other => "Other",
        }
    }

    /// Parse a reference-data label. Unrecognised values map to `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "2-wheeler" | "2wheeler" | "two-wheeler" => VehicleType::TwoWheeler,
            "4-wheeler" | "4wheeler" | "four-wheeler" => VehicleType::FourWheeler,
            "truck" => VehicleType::Truck,
            _ => VehicleType::Other,
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Three-valued helmet observation from the detection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    pub fn label(&self) -> &'static str {
        match self {
            TriState::Yes => "Yes",
            TriState::No => "No",
            TriState::Unknown => "Unknown",
        }
    }
}

/// One detection record: AI-inferred attributes for a plate.
///
/// Supplied externally; the engine tolerates zero matches per plate and
/// assumes at most one in the current datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub plate: String,
    pub vehicle_type: VehicleType,
    pub helmet: TriState,
    /// Energy delivered as measured by the detection pipeline, in kWh.
    pub detected_kwh: f64,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Registry record (RTO data)
// =============================================================================

/// Insurance policy state in the motor registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsuranceStatus {
    Active,
    Expired,
}

impl InsuranceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InsuranceStatus::Active => "Active",
            InsuranceStatus::Expired => "Expired",
        }
    }
}

/// Road tax state in the motor registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadTaxStatus {
    Paid,
    Due,
}

impl RoadTaxStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RoadTaxStatus::Paid => "Paid",
            RoadTaxStatus::Due => "Due",
        }
    }
}

/// One motor-registry compliance record, keyed by plate.
/// Absence of a record means every status defaults to its failing value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub owner: String,
    pub vehicle_type: VehicleType,
    pub registration_valid_till: NaiveDate,
    pub insurance: InsuranceStatus,
    pub pollution_valid_till: NaiveDate,
    /// Outstanding fine amount in whole currency units. Zero means clear.
    pub pending_fine: u32,
    pub fine_reason: String,
    pub road_tax: RoadTaxStatus,
}

// =============================================================================
// Derived statuses
// =============================================================================

/// Date-derived validity for registration and pollution certificates.
/// `Expired` when the valid-till date is not strictly in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidityStatus {
    Valid,
    Expired,
}

impl ValidityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ValidityStatus::Valid => "Valid",
            ValidityStatus::Expired => "Expired",
        }
    }
}

/// Fine state derived from the registry's pending amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FineStatus {
    Clear,
    Pending { amount: u32 },
}

impl FineStatus {
    /// Display string: "OK" or a currency-formatted amount.
    pub fn label(&self) -> String {
        match self {
            FineStatus::Clear => "OK".to_string(),
            FineStatus::Pending { amount } => format!("\u{20b9}{amount}"),
        }
    }
}

/// Charging-discrepancy flag for a transaction.
///
/// `PotentialChargerFault` is the charger-level systemic signal and
/// overrides the vehicle-level `Suspicious`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DiscrepancyFlag {
    #[default]
    Ok,
    Suspicious,
    PotentialChargerFault,
}

impl DiscrepancyFlag {
    /// All variants in display order (most severe first).
    pub fn all() -> &'static [DiscrepancyFlag] {
        &[
            DiscrepancyFlag::PotentialChargerFault,
            DiscrepancyFlag::Suspicious,
            DiscrepancyFlag::Ok,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiscrepancyFlag::Ok => "OK",
            DiscrepancyFlag::Suspicious => "Suspicious",
            DiscrepancyFlag::PotentialChargerFault => "Potential Charger Fault",
        }
    }

    /// Short label for compact display (e.g. table columns).
    pub fn short_label(&self) -> &'static str {
        match self {
            DiscrepancyFlag::Ok => "OK",
            DiscrepancyFlag::Suspicious => "SUSP",
            DiscrepancyFlag::PotentialChargerFault => "FAULT",
        }
    }
}

impl std::fmt::Display for DiscrepancyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Violations
// =============================================================================

/// Compliance check categories, in the fixed evaluation order.
/// `HelmetAdvisory` is informational only and never deducts score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    Registration,
    Insurance,
    Pollution,
    Fine,
    RoadTax,
    ChargingDiscrepancy,
    HelmetAdvisory,
}

impl ViolationKind {
    /// All variants in check order.
    pub fn all() -> &'static [ViolationKind] {
        &[
            ViolationKind::Registration,
            ViolationKind::Insurance,
            ViolationKind::Pollution,
            ViolationKind::Fine,
            ViolationKind::RoadTax,
            ViolationKind::ChargingDiscrepancy,
            ViolationKind::HelmetAdvisory,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::Registration => "Registration",
            ViolationKind::Insurance => "Insurance",
            ViolationKind::Pollution => "Pollution",
            ViolationKind::Fine => "Fine",
            ViolationKind::RoadTax => "Road Tax",
            ViolationKind::ChargingDiscrepancy => "Charging Discrepancy",
            ViolationKind::HelmetAdvisory => "Helmet Advisory",
        }
    }

    /// Whether this category deducts score when failed.
    pub fn scored(&self) -> bool {
        !matches!(self, ViolationKind::HelmetAdvisory)
    }
}

/// One entry in a vehicle's ordered violation list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Templated human-readable message, e.g. "Registration Expired for KA01AB1234".
    pub message: String,
}

// =============================================================================
// Scored vehicle (core output)
// =============================================================================

/// Registry-derived view carried on the scored vehicle. When no registry
/// record exists the failing defaults appear here, indistinguishable from
/// genuinely failing statuses.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryView {
    pub owner: String,
    pub registration: ValidityStatus,
    pub insurance: InsuranceStatus,
    pub pollution: ValidityStatus,
    pub fine: FineStatus,
    pub fine_reason: String,
    pub road_tax: RoadTaxStatus,
}

/// Billed-vs-detected energy comparison for one transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ChargingSummary {
    pub billed_kwh: f64,
    pub detected_kwh: f64,
    /// billed − detected. Zero when no detection exists for the plate.
    pub difference_kwh: f64,
    pub flag: DiscrepancyFlag,
    pub charger_id: String,
}

/// Compliance outcome for one vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct Compliance {
    /// Aggregate score, 0-100. Each failed check deducts a fixed penalty;
    /// the displayed score floors at 0.
    pub score: u32,
    /// Ordered violation list: registration, insurance, pollution, fine,
    /// tax, charging-discrepancy, helmet.
    pub violations: Vec<Violation>,
}

/// The core output: one scored vehicle per transaction, created fresh on
/// every analysis run and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredVehicle {
    pub plate: String,
    pub vehicle_type: VehicleType,
    pub helmet: TriState,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub registry: RegistryView,
    pub charging: ChargingSummary,
    pub compliance: Compliance,
}

impl ScoredVehicle {
    /// True when any scored check failed (helmet advisories excluded).
    pub fn has_violations(&self) -> bool {
        self.compliance.violations.iter().any(|v| v.kind.scored())
    }
}

// =============================================================================
// Analysis summary
// =============================================================================

/// Aggregate statistics over a completed analysis run. Feeds the summary
/// panel and the fleet-level narrative prompt.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    /// Total scored vehicles (== transaction count).
    pub vehicle_count: usize,

    /// Mean compliance score across all vehicles (0 when empty).
    pub mean_score: f64,

    /// Violation counts per category (advisories included).
    pub violations_by_kind: HashMap<ViolationKind, usize>,

    /// Vehicles flagged `Suspicious` or `PotentialChargerFault`.
    pub discrepancy_count: usize,

    /// Chargers that crossed the fault threshold.
    pub faulty_charger_count: usize,

    /// Wall-clock duration of the parse+score pass.
    pub duration: std::time::Duration,
}

// =============================================================================
// Analysis progress (for UI updates)
// =============================================================================

/// Progress messages sent from the analysis thread to the UI thread.
#[derive(Debug)]
pub enum AnalysisProgress {
    /// Parse+score pass started.
    Started,

    /// Pass completed successfully.
    Completed {
        transactions: Vec<Transaction>,
        scored: Vec<ScoredVehicle>,
        summary: AnalysisSummary,
    },

    /// Parse failed; no partial results were produced.
    Failed { error: String },
}
