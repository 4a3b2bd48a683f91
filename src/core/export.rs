// EVGuard - core/export.rs
//
// Export of scored vehicles to CSV and JSON. Exports always reflect the
// current filtered view: callers pass the visible indices, not the whole
// list. Writers are generic so tests run against in-memory buffers.

use crate::core::model::ScoredVehicle;
use crate::util::error::ExportError;
use std::io::Write;

const CSV_HEADER: &[&str] = &[
    "plate",
    "owner",
    "vehicle_type",
    "timestamp",
    "charger_id",
    "billed_kwh",
    "detected_kwh",
    "difference_kwh",
    "flag",
    "registration",
    "insurance",
    "pollution",
    "fine",
    "road_tax",
    "score",
    "violations",
];

/// Write the selected vehicles as CSV. Violations collapse into a single
/// `; `-joined column so the row count stays one-per-vehicle.
pub fn export_csv<W: Write>(
    writer: W,
    scored: &[ScoredVehicle],
    indices: &[usize],
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for &i in indices {
        let sv = &scored[i];
        let violations = sv
            .compliance
            .violations
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        csv.write_record([
            sv.plate.as_str(),
            sv.registry.owner.as_str(),
            sv.vehicle_type.label(),
            &sv.timestamp.to_rfc3339(),
            sv.charging.charger_id.as_str(),
            &format!("{:.2}", sv.charging.billed_kwh),
            &format!("{:.2}", sv.charging.detected_kwh),
            &format!("{:.2}", sv.charging.difference_kwh),
            sv.charging.flag.label(),
            sv.registry.registration.label(),
            sv.registry.insurance.label(),
            sv.registry.pollution.label(),
            &sv.registry.fine.label(),
            sv.registry.road_tax.label(),
            &sv.compliance.score.to_string(),
            &violations,
        ])?;
    }

    csv.flush().map_err(ExportError::Io)?;
    tracing::info!(rows = indices.len(), "CSV export complete");
    Ok(())
}

/// Write the selected vehicles as a pretty-printed JSON array of the full
/// ScoredVehicle structures.
pub fn export_json<W: Write>(
    mut writer: W,
    scored: &[ScoredVehicle],
    indices: &[usize],
) -> Result<(), ExportError> {
    let selection: Vec<&ScoredVehicle> = indices.iter().map(|&i| &scored[i]).collect();
    serde_json::to_writer_pretty(&mut writer, &selection)?;
    writer.write_all(b"\n").map_err(ExportError::Io)?;
    tracing::info!(rows = indices.len(), "JSON export complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        ChargingSummary, Compliance, DiscrepancyFlag, FineStatus, InsuranceStatus, RegistryView,
        RoadTaxStatus, TriState, ValidityStatus, VehicleType, Violation, ViolationKind,
    };
    use chrono::{TimeZone, Utc};

    fn vehicle(plate: &str, score: u32) -> ScoredVehicle {
        ScoredVehicle {
            plate: plate.to_string(),
            vehicle_type: VehicleType::TwoWheeler,
            helmet: TriState::Yes,
            timestamp: Utc.with_ymd_and_hms(2025, 10, 31, 9, 15, 0).unwrap(),
            amount: 625.0,
            registry: RegistryView {
                owner: "Asha Rao".to_string(),
                registration: ValidityStatus::Valid,
                insurance: InsuranceStatus::Expired,
                pollution: ValidityStatus::Valid,
                fine: FineStatus::Pending { amount: 500 },
                fine_reason: "Signal jump".to_string(),
                road_tax: RoadTaxStatus::Paid,
            },
            charging: ChargingSummary {
                billed_kwh: 12.5,
                detected_kwh: 12.5,
                difference_kwh: 0.0,
                flag: DiscrepancyFlag::Ok,
                charger_id: "EV-CH-01".to_string(),
            },
            compliance: Compliance {
                score,
                violations: vec![
                    Violation {
                        kind: ViolationKind::Insurance,
                        message: format!("Insurance Expired for {plate}"),
                    },
                    Violation {
                        kind: ViolationKind::Fine,
                        message: format!("Fine Pending: \u{20b9}500 on {plate}"),
                    },
                ],
            },
        }
    }

    #[test]
    fn test_csv_export_header_and_rows() {
        let scored = vec![vehicle("KA03AB1234", 60), vehicle("KA05CD5678", 100)];
        let mut buf = Vec::new();
        export_csv(&mut buf, &scored, &[0, 1]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("plate,owner,vehicle_type"));
        assert!(lines[1].contains("KA03AB1234"));
        assert!(lines[1].contains("Insurance Expired for KA03AB1234; Fine Pending"));
        assert!(lines[2].contains("KA05CD5678"));
    }

    #[test]
    fn test_csv_export_respects_indices() {
        let scored = vec![vehicle("KA03AB1234", 60), vehicle("KA05CD5678", 100)];
        let mut buf = Vec::new();
        export_csv(&mut buf, &scored, &[1]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("KA03AB1234"));
        assert!(text.contains("KA05CD5678"));
    }

    #[test]
    fn test_csv_export_empty_selection_writes_header_only() {
        let scored = vec![vehicle("KA03AB1234", 60)];
        let mut buf = Vec::new();
        export_csv(&mut buf, &scored, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_json_export_roundtrips_fields() {
        let scored = vec![vehicle("KA03AB1234", 60)];
        let mut buf = Vec::new();
        export_json(&mut buf, &scored, &[0]).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["plate"], "KA03AB1234");
        assert_eq!(arr[0]["compliance"]["score"], 60);
        assert_eq!(
            arr[0]["compliance"]["violations"][0]["kind"],
            "Insurance"
        );
    }
}
