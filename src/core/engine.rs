// EVGuard - core/engine.rs
//
// Join & scoring engine: combines parsed transactions with the detection
// and registry datasets and produces one ScoredVehicle per transaction.
//
// Two passes:
//   Pass 1 pre-scans all transactions for billed-vs-detected discrepancies,
//   accumulating a per-charger counter. It must complete before pass 2
//   because the charger-fault threshold depends on the full counter.
//   Pass 2 scores each transaction independently.
//
// The engine is total: missing detection or registry records resolve to
// defined defaults, so scoring never fails over a well-formed transaction
// list. It is also pure: identical inputs yield identical output.

use crate::core::model::{
    AnalysisSummary, ChargingSummary, Compliance, Detection, DiscrepancyFlag, FineStatus,
    InsuranceStatus, RegistryRecord, RegistryView, RoadTaxStatus, ScoredVehicle, Transaction,
    TriState, ValidityStatus, VehicleType, Violation, ViolationKind,
};
use crate::util::constants;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

// =============================================================================
// Configuration
// =============================================================================

/// Engine tuning knobs. The tolerance and fault threshold are deployment
/// configuration (config.toml `[engine]`), not literals.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Absolute billed-vs-detected difference (kWh) beyond which a
    /// transaction is flagged suspicious.
    pub kwh_tolerance: f64,

    /// Number of flagged discrepancies at one charger that escalates every
    /// transaction on that charger to `PotentialChargerFault`.
    pub charger_fault_threshold: usize,

    /// Points deducted per failed compliance check.
    pub category_penalty: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            kwh_tolerance: constants::DEFAULT_KWH_TOLERANCE,
            charger_fault_threshold: constants::DEFAULT_CHARGER_FAULT_THRESHOLD,
            category_penalty: constants::CATEGORY_PENALTY,
        }
    }
}

// =============================================================================
// Lookup seams
// =============================================================================

/// Detection lookup by plate. The reference deployment backs this with a
/// static dataset; a real detection pipeline can substitute without
/// touching the engine.
pub trait DetectionLookup {
    fn detection(&self, plate: &str) -> Option<&Detection>;
}

impl DetectionLookup for HashMap<String, Detection> {
    fn detection(&self, plate: &str) -> Option<&Detection> {
        self.get(plate)
    }
}

/// Registry lookup by plate. Absence means no record found.
pub trait RegistryLookup {
    fn record(&self, plate: &str) -> Option<&RegistryRecord>;
}

impl RegistryLookup for HashMap<String, RegistryRecord> {
    fn record(&self, plate: &str) -> Option<&RegistryRecord> {
        self.get(plate)
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Outcome of the pass-1 discrepancy pre-scan.
#[derive(Debug, Default)]
struct PreScan {
    /// Plates with at least one out-of-tolerance transaction.
    suspicious_plates: HashSet<String>,

    /// Flagged-discrepancy count per charger id.
    charger_flags: HashMap<String, usize>,
}

/// Score every transaction against the detection and registry lookups.
///
/// `as_of` is the date used for registration/pollution validity checks
/// ("valid" means strictly after this date). Passing it explicitly keeps
/// the engine pure and the output reproducible.
///
/// Invariant: the output length equals the input length (left-outer join
/// from transactions), in input order.
pub fn score_transactions(
    transactions: &[Transaction],
    detections: &impl DetectionLookup,
    registry: &impl RegistryLookup,
    config: &ScoringConfig,
    as_of: NaiveDate,
) -> Vec<ScoredVehicle> {
    let prescan = prescan_discrepancies(transactions, detections, config);

    tracing::debug!(
        suspicious = prescan.suspicious_plates.len(),
        chargers_flagged = prescan.charger_flags.len(),
        "Discrepancy pre-scan complete"
    );

    transactions
        .iter()
        .map(|tx| score_one(tx, detections, registry, config, &prescan, as_of))
        .collect()
}

/// Pass 1: flag out-of-tolerance transactions and count them per charger.
/// Transactions with no matching detection cannot be judged and are skipped.
fn prescan_discrepancies(
    transactions: &[Transaction],
    detections: &impl DetectionLookup,
    config: &ScoringConfig,
) -> PreScan {
    let mut prescan = PreScan::default();

    for tx in transactions {
        let Some(det) = detections.detection(&tx.plate) else {
            continue;
        };
        let difference = tx.billed_kwh - det.detected_kwh;
        if difference.abs() > config.kwh_tolerance {
            prescan.suspicious_plates.insert(tx.plate.clone());
            *prescan
                .charger_flags
                .entry(tx.charger_id.clone())
                .or_insert(0) += 1;
        }
    }

    prescan
}

/// Pass 2: score a single transaction. Independent across vehicles.
fn score_one(
    tx: &Transaction,
    detections: &impl DetectionLookup,
    registry: &impl RegistryLookup,
    config: &ScoringConfig,
    prescan: &PreScan,
    as_of: NaiveDate,
) -> ScoredVehicle {
    // Detection defaults: unknown vehicle, unknown helmet, detected energy
    // equal to billed so the difference reads 0.
    let detection = detections.detection(&tx.plate);
    let vehicle_type = detection.map(|d| d.vehicle_type).unwrap_or_default();
    let helmet = detection.map(|d| d.helmet).unwrap_or_default();
    let detected_kwh = detection.map(|d| d.detected_kwh).unwrap_or(tx.billed_kwh);

    // Registry defaults: every status resolves to its failing value. A
    // missing record is therefore indistinguishable from a failing one in
    // the rendered statuses; this mirrors the upstream system.
    let record = registry.record(&tx.plate);
    let registration = match record {
        Some(r) if r.registration_valid_till > as_of => ValidityStatus::Valid,
        _ => ValidityStatus::Expired,
    };
    let insurance = record.map(|r| r.insurance).unwrap_or(InsuranceStatus::Expired);
    let pollution = match record {
        Some(r) if r.pollution_valid_till > as_of => ValidityStatus::Valid,
        _ => ValidityStatus::Expired,
    };
    let pending_fine = record.map(|r| r.pending_fine).unwrap_or(0);
    let fine = if pending_fine > 0 {
        FineStatus::Pending {
            amount: pending_fine,
        }
    } else {
        FineStatus::Clear
    };
    let fine_reason = record.map(|r| r.fine_reason.clone()).unwrap_or_default();
    let road_tax = record.map(|r| r.road_tax).unwrap_or(RoadTaxStatus::Due);
    let owner = record
        .map(|r| r.owner.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    // Charger-level fault signal overrides the vehicle-level one.
    let charger_flagged = prescan
        .charger_flags
        .get(&tx.charger_id)
        .copied()
        .unwrap_or(0)
        >= config.charger_fault_threshold;
    let flag = if charger_flagged {
        DiscrepancyFlag::PotentialChargerFault
    } else if prescan.suspicious_plates.contains(&tx.plate) {
        DiscrepancyFlag::Suspicious
    } else {
        DiscrepancyFlag::Ok
    };

    // Fixed check order: registration, insurance, pollution, fine, tax,
    // charging-discrepancy, helmet. The violation list preserves it.
    let mut deductions = 0u32;
    let mut violations = Vec::new();
    let mut fail = |violations: &mut Vec<Violation>, kind: ViolationKind, message: String| {
        if kind.scored() {
            deductions += config.category_penalty;
        }
        violations.push(Violation { kind, message });
    };

    if registration == ValidityStatus::Expired {
        fail(
            &mut violations,
            ViolationKind::Registration,
            format!("Registration Expired for {}", tx.plate),
        );
    }
    if insurance != InsuranceStatus::Active {
        fail(
            &mut violations,
            ViolationKind::Insurance,
            format!("Insurance Expired for {}", tx.plate),
        );
    }
    if pollution == ValidityStatus::Expired {
        fail(
            &mut violations,
            ViolationKind::Pollution,
            format!("Pollution Certificate Expired for {}", tx.plate),
        );
    }
    if let FineStatus::Pending { amount } = fine {
        fail(
            &mut violations,
            ViolationKind::Fine,
            format!("Fine Pending: \u{20b9}{amount} on {}", tx.plate),
        );
    }
    if road_tax != RoadTaxStatus::Paid {
        fail(
            &mut violations,
            ViolationKind::RoadTax,
            format!("Road Tax Due for {}", tx.plate),
        );
    }
    if flag != DiscrepancyFlag::Ok {
        let message = match flag {
            DiscrepancyFlag::PotentialChargerFault => format!(
                "Charging Discrepancy on {}: charger flagged for repeated mismatches",
                tx.charger_id
            ),
            _ => format!(
                "Charging Discrepancy for {}: billed {:.1} kWh vs detected {:.1} kWh",
                tx.plate, tx.billed_kwh, detected_kwh
            ),
        };
        fail(&mut violations, ViolationKind::ChargingDiscrepancy, message);
    }
    // Advisory only: appended to the list, no deduction.
    if vehicle_type == VehicleType::TwoWheeler && helmet == TriState::No {
        fail(
            &mut violations,
            ViolationKind::HelmetAdvisory,
            format!("Advisory: helmet not detected for 2-Wheeler {}", tx.plate),
        );
    }

    let score = constants::MAX_SCORE.saturating_sub(deductions);

    ScoredVehicle {
        plate: tx.plate.clone(),
        vehicle_type,
        helmet,
        timestamp: tx.timestamp,
        amount: tx.amount,
        registry: RegistryView {
            owner,
            registration,
            insurance,
            pollution,
            fine,
            fine_reason,
            road_tax,
        },
        charging: ChargingSummary {
            billed_kwh: tx.billed_kwh,
            detected_kwh,
            difference_kwh: tx.billed_kwh - detected_kwh,
            flag,
            charger_id: tx.charger_id.clone(),
        },
        compliance: Compliance { score, violations },
    }
}

// =============================================================================
// Aggregate statistics
// =============================================================================

/// Aggregate statistics over a scored-vehicle list.
pub fn summarize(scored: &[ScoredVehicle]) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        vehicle_count: scored.len(),
        ..Default::default()
    };

    let mut score_total = 0u64;
    let mut faulty_chargers = HashSet::new();

    for sv in scored {
        score_total += u64::from(sv.compliance.score);
        for v in &sv.compliance.violations {
            *summary.violations_by_kind.entry(v.kind).or_insert(0) += 1;
        }
        match sv.charging.flag {
            DiscrepancyFlag::Ok => {}
            DiscrepancyFlag::Suspicious => summary.discrepancy_count += 1,
            DiscrepancyFlag::PotentialChargerFault => {
                summary.discrepancy_count += 1;
                faulty_chargers.insert(sv.charging.charger_id.clone());
            }
        }
    }

    summary.faulty_charger_count = faulty_chargers.len();
    if !scored.is_empty() {
        summary.mean_score = score_total as f64 / scored.len() as f64;
    }
    summary
}
