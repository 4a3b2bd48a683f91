// EVGuard - core/reference.rs
//
// Reference dataset loading: the ANPR detection feed and the motor
// registry, both keyed by plate. Files are CSV with a header row. Record
// counts are capped so a mistaken file selection cannot exhaust memory.
//
// A built-in demo dataset covers first-run and evaluation use without any
// files on disk.

use crate::core::model::{
    Detection, InsuranceStatus, RegistryRecord, RoadTaxStatus, TriState, VehicleType,
};
use crate::util::constants;
use crate::util::error::ReferenceError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

// Raw CSV rows. Parsed leniently as strings where the upstream exports
// are inconsistent (vehicle type spellings, yes/no variants), then
// interpreted into the typed model.

#[derive(Debug, Deserialize)]
struct RawDetection {
    plate: String,
    vehicle_type: String,
    helmet: String,
    detected_kwh: f64,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct RawRegistryRecord {
    plate: String,
    owner: String,
    vehicle_type: String,
    registration_valid_till: String,
    insurance: String,
    pollution_valid_till: String,
    pending_fine: u32,
    #[serde(default)]
    fine_reason: String,
    road_tax: String,
}

/// Load the detection dataset from a CSV file, keyed by plate. Later rows
/// for the same plate replace earlier ones.
pub fn load_detections_csv(path: &Path) -> Result<HashMap<String, Detection>, ReferenceError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| wrap_csv(path, e))?;
    let mut out = HashMap::new();

    for (n, row) in reader.deserialize::<RawDetection>().enumerate() {
        if out.len() >= constants::MAX_DETECTION_RECORDS {
            return Err(ReferenceError::TooManyRecords {
                path: path.to_path_buf(),
                max: constants::MAX_DETECTION_RECORDS,
            });
        }
        let raw = row.map_err(|e| wrap_csv(path, e))?;
        let line = n as u64 + 2; // 1-based, after the header
        let detection = interpret_detection(raw, path, line)?;
        out.insert(detection.plate.clone(), detection);
    }

    tracing::info!(records = out.len(), path = %path.display(), "Loaded detection dataset");
    Ok(out)
}

/// Load the motor registry from a CSV file, keyed by plate.
pub fn load_registry_csv(
    path: &Path,
) -> Result<HashMap<String, RegistryRecord>, ReferenceError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| wrap_csv(path, e))?;
    let mut out = HashMap::new();

    for (n, row) in reader.deserialize::<RawRegistryRecord>().enumerate() {
        if out.len() >= constants::MAX_REGISTRY_RECORDS {
            return Err(ReferenceError::TooManyRecords {
                path: path.to_path_buf(),
                max: constants::MAX_REGISTRY_RECORDS,
            });
        }
        let raw = row.map_err(|e| wrap_csv(path, e))?;
        let line = n as u64 + 2;
        let (plate, record) = interpret_registry(raw, path, line)?;
        out.insert(plate, record);
    }

    tracing::info!(records = out.len(), path = %path.display(), "Loaded registry dataset");
    Ok(out)
}

fn wrap_csv(path: &Path, e: csv::Error) -> ReferenceError {
    ReferenceError::Csv {
        path: path.to_path_buf(),
        source: e,
    }
}

fn invalid(path: &Path, line: u64, reason: String) -> ReferenceError {
    ReferenceError::InvalidRecord {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

fn interpret_detection(
    raw: RawDetection,
    path: &Path,
    line: u64,
) -> Result<Detection, ReferenceError> {
    let plate = raw.plate.trim().to_string();
    if plate.is_empty() {
        return Err(invalid(path, line, "empty plate".to_string()));
    }
    if !raw.detected_kwh.is_finite() || raw.detected_kwh < 0.0 {
        return Err(invalid(
            path,
            line,
            format!("detected_kwh '{}' is not a non-negative number", raw.detected_kwh),
        ));
    }
    let timestamp = parse_timestamp(&raw.timestamp)
        .ok_or_else(|| invalid(path, line, format!("bad timestamp '{}'", raw.timestamp)))?;

    Ok(Detection {
        plate,
        vehicle_type: VehicleType::parse(&raw.vehicle_type),
        helmet: parse_tristate(&raw.helmet),
        detected_kwh: raw.detected_kwh,
        timestamp,
    })
}

fn interpret_registry(
    raw: RawRegistryRecord,
    path: &Path,
    line: u64,
) -> Result<(String, RegistryRecord), ReferenceError> {
    let plate = raw.plate.trim().to_string();
    if plate.is_empty() {
        return Err(invalid(path, line, "empty plate".to_string()));
    }
    let registration_valid_till = parse_date(&raw.registration_valid_till).ok_or_else(|| {
        invalid(
            path,
            line,
            format!(
                "bad registration_valid_till '{}'",
                raw.registration_valid_till
            ),
        )
    })?;
    let pollution_valid_till = parse_date(&raw.pollution_valid_till).ok_or_else(|| {
        invalid(
            path,
            line,
            format!("bad pollution_valid_till '{}'", raw.pollution_valid_till),
        )
    })?;

    let record = RegistryRecord {
        owner: raw.owner.trim().to_string(),
        vehicle_type: VehicleType::parse(&raw.vehicle_type),
        registration_valid_till,
        insurance: parse_insurance(&raw.insurance),
        pollution_valid_till,
        pending_fine: raw.pending_fine,
        fine_reason: raw.fine_reason.trim().to_string(),
        road_tax: parse_road_tax(&raw.road_tax),
    };
    Ok((plate, record))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_tristate(raw: &str) -> TriState {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => TriState::Yes,
        "no" | "n" | "false" | "0" => TriState::No,
        _ => TriState::Unknown,
    }
}

fn parse_insurance(raw: &str) -> InsuranceStatus {
    match raw.trim().to_lowercase().as_str() {
        "active" | "valid" => InsuranceStatus::Active,
        _ => InsuranceStatus::Expired,
    }
}

fn parse_road_tax(raw: &str) -> RoadTaxStatus {
    match raw.trim().to_lowercase().as_str() {
        "paid" => RoadTaxStatus::Paid,
        _ => RoadTaxStatus::Due,
    }
}

// =============================================================================
// Demo dataset
// =============================================================================

fn demo_ts(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 31, h, m, 0).unwrap()
}

fn demo_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Built-in detection dataset for demo mode.
pub fn demo_detections() -> HashMap<String, Detection> {
    let items = vec![
        Detection {
            plate: "KA03AB1234".to_string(),
            vehicle_type: VehicleType::FourWheeler,
            helmet: TriState::Unknown,
            detected_kwh: 12.5,
            timestamp: demo_ts(9, 14),
        },
        Detection {
            plate: "KA05MN4455".to_string(),
            vehicle_type: VehicleType::TwoWheeler,
            helmet: TriState::No,
            detected_kwh: 3.2,
            timestamp: demo_ts(10, 2),
        },
        Detection {
            plate: "KA01QQ7788".to_string(),
            vehicle_type: VehicleType::TwoWheeler,
            helmet: TriState::Yes,
            detected_kwh: 2.8,
            timestamp: demo_ts(10, 40),
        },
        Detection {
            plate: "KA09TR1122".to_string(),
            vehicle_type: VehicleType::Truck,
            helmet: TriState::Unknown,
            detected_kwh: 41.0,
            timestamp: demo_ts(11, 25),
        },
        Detection {
            plate: "KA21GH3344".to_string(),
            vehicle_type: VehicleType::FourWheeler,
            helmet: TriState::Unknown,
            detected_kwh: 9.0,
            timestamp: demo_ts(12, 5),
        },
        Detection {
            plate: "KA22HJ5566".to_string(),
            vehicle_type: VehicleType::FourWheeler,
            helmet: TriState::Unknown,
            detected_kwh: 8.5,
            timestamp: demo_ts(12, 31),
        },
        Detection {
            plate: "KA23KL7788".to_string(),
            vehicle_type: VehicleType::FourWheeler,
            helmet: TriState::Unknown,
            detected_kwh: 7.5,
            timestamp: demo_ts(13, 12),
        },
    ];
    items.into_iter().map(|d| (d.plate.clone(), d)).collect()
}

/// Built-in registry dataset for demo mode.
pub fn demo_registry() -> HashMap<String, RegistryRecord> {
    let items = vec![
        (
            "KA03AB1234",
            RegistryRecord {
                owner: "Asha Rao".to_string(),
                vehicle_type: VehicleType::FourWheeler,
                registration_valid_till: demo_date(2026, 6, 30),
                insurance: InsuranceStatus::Active,
                pollution_valid_till: demo_date(2026, 3, 31),
                pending_fine: 0,
                fine_reason: String::new(),
                road_tax: RoadTaxStatus::Paid,
            },
        ),
        (
            "KA05MN4455",
            RegistryRecord {
                owner: "Ravi Kumar".to_string(),
                vehicle_type: VehicleType::TwoWheeler,
                registration_valid_till: demo_date(2026, 1, 15),
                insurance: InsuranceStatus::Expired,
                pollution_valid_till: demo_date(2025, 12, 31),
                pending_fine: 500,
                fine_reason: "Signal jump".to_string(),
                road_tax: RoadTaxStatus::Due,
            },
        ),
        (
            "KA01QQ7788",
            RegistryRecord {
                owner: "Meera Nair".to_string(),
                vehicle_type: VehicleType::TwoWheeler,
                registration_valid_till: demo_date(2027, 2, 28),
                insurance: InsuranceStatus::Active,
                pollution_valid_till: demo_date(2026, 8, 31),
                pending_fine: 0,
                fine_reason: String::new(),
                road_tax: RoadTaxStatus::Paid,
            },
        ),
        (
            "KA09TR1122",
            RegistryRecord {
                owner: "Bellary Haulage Pvt Ltd".to_string(),
                vehicle_type: VehicleType::Truck,
                registration_valid_till: demo_date(2025, 4, 30),
                insurance: InsuranceStatus::Active,
                pollution_valid_till: demo_date(2025, 9, 30),
                pending_fine: 2000,
                fine_reason: "Overloading".to_string(),
                road_tax: RoadTaxStatus::Due,
            },
        ),
        (
            "KA21GH3344",
            RegistryRecord {
                owner: "Sunil Shetty".to_string(),
                vehicle_type: VehicleType::FourWheeler,
                registration_valid_till: demo_date(2026, 11, 30),
                insurance: InsuranceStatus::Active,
                pollution_valid_till: demo_date(2026, 5, 31),
                pending_fine: 0,
                fine_reason: String::new(),
                road_tax: RoadTaxStatus::Paid,
            },
        ),
        (
            "KA22HJ5566",
            RegistryRecord {
                owner: "Divya Prasad".to_string(),
                vehicle_type: VehicleType::FourWheeler,
                registration_valid_till: demo_date(2026, 7, 31),
                insurance: InsuranceStatus::Active,
                pollution_valid_till: demo_date(2026, 4, 30),
                pending_fine: 0,
                fine_reason: String::new(),
                road_tax: RoadTaxStatus::Paid,
            },
        ),
        (
            "KA23KL7788",
            RegistryRecord {
                owner: "Imran Pasha".to_string(),
                vehicle_type: VehicleType::FourWheeler,
                registration_valid_till: demo_date(2026, 9, 30),
                insurance: InsuranceStatus::Active,
                pollution_valid_till: demo_date(2026, 2, 28),
                pending_fine: 0,
                fine_reason: String::new(),
                road_tax: RoadTaxStatus::Paid,
            },
        ),
    ];
    items
        .into_iter()
        .map(|(p, r)| (p.to_string(), r))
        .collect()
}

/// Built-in charging log for demo mode, in the standard delimited format.
/// Includes a clean vehicle, an over-billed one, a helmet advisory case,
/// an unknown plate, and three mismatches on one charger that trip the
/// charger-fault threshold.
pub fn demo_transaction_log() -> String {
    [
        "timestamp,plate,billed_kwh,amount,charger_id",
        "2025-10-31T09:15:00,KA03AB1234,15.0,750.00,EV-CH-01",
        "2025-10-31T10:03:00,KA05MN4455,3.4,170.00,EV-CH-02",
        "2025-10-31T10:41:00,KA01QQ7788,2.8,140.00,EV-CH-02",
        "2025-10-31T11:26:00,KA09TR1122,40.5,2025.00,EV-CH-03",
        "2025-10-31T12:06:00,KA21GH3344,14.0,700.00,EV-CH-09",
        "2025-10-31T12:32:00,KA22HJ5566,13.5,675.00,EV-CH-09",
        "2025-10-31T13:13:00,KA23KL7788,12.5,625.00,EV-CH-09",
        "2025-10-31T13:55:00,KA77ZZ0001,6.0,300.00,EV-CH-04",
        "",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_detections_csv() {
        let f = write_temp(
            "plate,vehicle_type,helmet,detected_kwh,timestamp\n\
             KA03AB1234,4-Wheeler,Unknown,12.5,2025-10-31T09:14:00\n\
             KA05MN4455,2-Wheeler,No,3.2,2025-10-31 10:02:00\n",
        );
        let dets = load_detections_csv(f.path()).unwrap();
        assert_eq!(dets.len(), 2);
        let d = &dets["KA03AB1234"];
        assert_eq!(d.vehicle_type, VehicleType::FourWheeler);
        assert_eq!(d.helmet, TriState::Unknown);
        assert_eq!(d.detected_kwh, 12.5);
        assert_eq!(dets["KA05MN4455"].helmet, TriState::No);
    }

    #[test]
    fn test_load_detections_bad_timestamp_names_line() {
        let f = write_temp(
            "plate,vehicle_type,helmet,detected_kwh,timestamp\n\
             KA03AB1234,4-Wheeler,Unknown,12.5,yesterday\n",
        );
        let err = load_detections_csv(f.path()).unwrap_err();
        match err {
            ReferenceError::InvalidRecord { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("yesterday"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_detections_duplicate_plate_last_wins() {
        let f = write_temp(
            "plate,vehicle_type,helmet,detected_kwh,timestamp\n\
             KA03AB1234,4-Wheeler,Unknown,12.5,2025-10-31T09:14:00\n\
             KA03AB1234,4-Wheeler,Unknown,13.0,2025-10-31T09:20:00\n",
        );
        let dets = load_detections_csv(f.path()).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets["KA03AB1234"].detected_kwh, 13.0);
    }

    #[test]
    fn test_load_registry_csv() {
        let f = write_temp(
            "plate,owner,vehicle_type,registration_valid_till,insurance,pollution_valid_till,pending_fine,fine_reason,road_tax\n\
             KA03AB1234,Asha Rao,4-Wheeler,2026-06-30,Active,2026-03-31,0,,Paid\n\
             KA05MN4455,Ravi Kumar,2-Wheeler,2026-01-15,Expired,2025-12-31,500,Signal jump,Due\n",
        );
        let reg = load_registry_csv(f.path()).unwrap();
        assert_eq!(reg.len(), 2);
        let r = &reg["KA05MN4455"];
        assert_eq!(r.insurance, InsuranceStatus::Expired);
        assert_eq!(r.road_tax, RoadTaxStatus::Due);
        assert_eq!(r.pending_fine, 500);
        assert_eq!(r.fine_reason, "Signal jump");
    }

    #[test]
    fn test_load_registry_bad_date_names_line() {
        let f = write_temp(
            "plate,owner,vehicle_type,registration_valid_till,insurance,pollution_valid_till,pending_fine,fine_reason,road_tax\n\
             KA03AB1234,Asha Rao,4-Wheeler,June 2026,Active,2026-03-31,0,,Paid\n",
        );
        let err = load_registry_csv(f.path()).unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::InvalidRecord { line: 2, .. }
        ));
    }

    #[test]
    fn test_load_registry_empty_plate_rejected() {
        let f = write_temp(
            "plate,owner,vehicle_type,registration_valid_till,insurance,pollution_valid_till,pending_fine,fine_reason,road_tax\n\
             ,Asha Rao,4-Wheeler,2026-06-30,Active,2026-03-31,0,,Paid\n",
        );
        assert!(load_registry_csv(f.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_csv_error() {
        let err = load_detections_csv(Path::new("/nonexistent/detections.csv")).unwrap_err();
        assert!(matches!(err, ReferenceError::Csv { .. }));
    }

    #[test]
    fn test_demo_datasets_are_consistent() {
        let dets = demo_detections();
        let reg = demo_registry();
        // Every demo registry plate has a detection, and vice versa.
        for plate in reg.keys() {
            assert!(dets.contains_key(plate), "missing detection for {plate}");
        }
        for plate in dets.keys() {
            assert!(reg.contains_key(plate), "missing registry row for {plate}");
        }
    }

    #[test]
    fn test_demo_log_parses() {
        use crate::core::parser::{parse_log, ParseConfig};
        let txs = parse_log(&demo_transaction_log(), &ParseConfig::default()).unwrap();
        assert_eq!(txs.len(), 8);
        // Unknown plate present to exercise the missing-reference path.
        assert!(txs.iter().any(|t| t.plate == "KA77ZZ0001"));
    }
}
