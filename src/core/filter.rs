// EVGuard - core/filter.rs
//
// Scored-vehicle filtering and sorting. Filters never mutate the scored
// list: `apply_filters` returns indices into the original slice and the
// UI renders through them.

use crate::core::model::{DiscrepancyFlag, ScoredVehicle, VehicleType};
use crate::util::error::FilterError;
use regex::Regex;
use std::collections::HashSet;

/// Sort key for the vehicle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Plate,
    Score,
    BilledKwh,
    /// Absolute billed-vs-detected difference.
    Difference,
}

/// Current filter selection. Compiled regex is cached alongside the raw
/// pattern so `apply_filters` stays infallible.
#[derive(Debug, Clone)]
pub struct FilterState {
    /// Discrepancy flags to show. Empty set means show all.
    pub flags: HashSet<DiscrepancyFlag>,

    /// Vehicle types to show. Empty set means show all.
    pub vehicle_types: HashSet<VehicleType>,

    /// Inclusive score range.
    pub min_score: u32,
    pub max_score: u32,

    /// Show only vehicles with at least one scored violation.
    pub violations_only: bool,

    /// Plain-text search over plate, owner, and charger id.
    pub text_search: String,

    /// Whether `text_search` is interpreted as a regex.
    pub regex_enabled: bool,

    /// Compiled form of `text_search` when regex mode is on and the
    /// pattern is valid. None otherwise.
    pub compiled_regex: Option<Regex>,

    pub sort_key: SortKey,
    pub sort_ascending: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            flags: HashSet::new(),
            vehicle_types: HashSet::new(),
            min_score: 0,
            max_score: crate::util::constants::MAX_SCORE,
            violations_only: false,
            text_search: String::new(),
            regex_enabled: false,
            compiled_regex: None,
            sort_key: SortKey::Score,
            sort_ascending: true,
        }
    }
}

impl FilterState {
    /// Recompile the search pattern after `text_search` or `regex_enabled`
    /// changed. Case-insensitive. Returns the compile error for the UI to
    /// display; filtering falls back to matching nothing in regex mode
    /// until a valid pattern arrives.
    pub fn set_search(&mut self, pattern: &str, regex: bool) -> Result<(), FilterError> {
        self.text_search = pattern.to_string();
        self.regex_enabled = regex;
        self.compiled_regex = None;

        if regex && !pattern.is_empty() {
            match Regex::new(&format!("(?i){pattern}")) {
                Ok(re) => self.compiled_regex = Some(re),
                Err(e) => {
                    return Err(FilterError::InvalidRegex {
                        pattern: pattern.to_string(),
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.flags.is_empty()
            || !self.vehicle_types.is_empty()
            || self.min_score > 0
            || self.max_score < crate::util::constants::MAX_SCORE
            || self.violations_only
            || !self.text_search.is_empty()
    }

    fn matches(&self, sv: &ScoredVehicle) -> bool {
        if !self.flags.is_empty() && !self.flags.contains(&sv.charging.flag) {
            return false;
        }
        if !self.vehicle_types.is_empty() && !self.vehicle_types.contains(&sv.vehicle_type) {
            return false;
        }
        if sv.compliance.score < self.min_score || sv.compliance.score > self.max_score {
            return false;
        }
        if self.violations_only && !sv.has_violations() {
            return false;
        }
        if !self.text_search.is_empty() {
            if self.regex_enabled {
                let Some(re) = &self.compiled_regex else {
                    return false;
                };
                if !re.is_match(&sv.plate)
                    && !re.is_match(&sv.registry.owner)
                    && !re.is_match(&sv.charging.charger_id)
                {
                    return false;
                }
            } else {
                let needle = self.text_search.to_lowercase();
                if !sv.plate.to_lowercase().contains(&needle)
                    && !sv.registry.owner.to_lowercase().contains(&needle)
                    && !sv.charging.charger_id.to_lowercase().contains(&needle)
                {
                    return false;
                }
            }
        }
        true
    }
}

/// Apply filters and sorting, returning indices into `scored`.
pub fn apply_filters(scored: &[ScoredVehicle], filter: &FilterState) -> Vec<usize> {
    let mut indices: Vec<usize> = scored
        .iter()
        .enumerate()
        .filter(|(_, sv)| filter.matches(sv))
        .map(|(i, _)| i)
        .collect();

    indices.sort_by(|&a, &b| {
        let (va, vb) = (&scored[a], &scored[b]);
        let ord = match filter.sort_key {
            SortKey::Plate => va.plate.cmp(&vb.plate),
            SortKey::Score => va
                .compliance
                .score
                .cmp(&vb.compliance.score)
                .then_with(|| va.plate.cmp(&vb.plate)),
            SortKey::BilledKwh => va
                .charging
                .billed_kwh
                .total_cmp(&vb.charging.billed_kwh)
                .then_with(|| va.plate.cmp(&vb.plate)),
            SortKey::Difference => va
                .charging
                .difference_kwh
                .abs()
                .total_cmp(&vb.charging.difference_kwh.abs())
                .then_with(|| va.plate.cmp(&vb.plate)),
        };
        if filter.sort_ascending {
            ord
        } else {
            ord.reverse()
        }
    });

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        ChargingSummary, Compliance, FineStatus, InsuranceStatus, RegistryView, RoadTaxStatus,
        TriState, ValidityStatus, Violation, ViolationKind,
    };
    use chrono::{TimeZone, Utc};

    fn vehicle(plate: &str, score: u32, flag: DiscrepancyFlag, diff: f64) -> ScoredVehicle {
        let violations = if score < 100 {
            vec![Violation {
                kind: ViolationKind::RoadTax,
                message: format!("Road Tax Due for {plate}"),
            }]
        } else {
            Vec::new()
        };
        ScoredVehicle {
            plate: plate.to_string(),
            vehicle_type: VehicleType::FourWheeler,
            helmet: TriState::Unknown,
            timestamp: Utc.with_ymd_and_hms(2025, 10, 31, 12, 0, 0).unwrap(),
            amount: 500.0,
            registry: RegistryView {
                owner: "Asha".to_string(),
                registration: ValidityStatus::Valid,
                insurance: InsuranceStatus::Active,
                pollution: ValidityStatus::Valid,
                fine: FineStatus::Clear,
                fine_reason: String::new(),
                road_tax: RoadTaxStatus::Paid,
            },
            charging: ChargingSummary {
                billed_kwh: 10.0 + diff,
                detected_kwh: 10.0,
                difference_kwh: diff,
                flag,
                charger_id: "EV-CH-01".to_string(),
            },
            compliance: Compliance { score, violations },
        }
    }

    fn sample() -> Vec<ScoredVehicle> {
        vec![
            vehicle("KA01AA0001", 100, DiscrepancyFlag::Ok, 0.0),
            vehicle("KA02BB0002", 60, DiscrepancyFlag::Suspicious, 3.5),
            vehicle("KA03CC0003", 20, DiscrepancyFlag::PotentialChargerFault, 9.0),
            vehicle("KA04DD0004", 80, DiscrepancyFlag::Ok, 1.0),
        ]
    }

    #[test]
    fn test_default_filter_shows_all_sorted_by_score() {
        let scored = sample();
        let indices = apply_filters(&scored, &FilterState::default());
        assert_eq!(indices, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_flag_filter() {
        let scored = sample();
        let mut filter = FilterState::default();
        filter.flags.insert(DiscrepancyFlag::Suspicious);
        filter.flags.insert(DiscrepancyFlag::PotentialChargerFault);
        let indices = apply_filters(&scored, &filter);
        assert_eq!(indices.len(), 2);
        assert!(indices.contains(&1) && indices.contains(&2));
    }

    #[test]
    fn test_score_range_filter() {
        let scored = sample();
        let filter = FilterState {
            min_score: 50,
            max_score: 90,
            ..FilterState::default()
        };
        let indices = apply_filters(&scored, &filter);
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn test_violations_only() {
        let scored = sample();
        let filter = FilterState {
            violations_only: true,
            ..FilterState::default()
        };
        let indices = apply_filters(&scored, &filter);
        assert!(!indices.contains(&0));
        assert_eq!(indices.len(), 3);
    }

    #[test]
    fn test_text_search_case_insensitive() {
        let scored = sample();
        let mut filter = FilterState::default();
        filter.set_search("ka02", false).unwrap();
        let indices = apply_filters(&scored, &filter);
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn test_text_search_matches_owner_and_charger() {
        let scored = sample();
        let mut filter = FilterState::default();
        filter.set_search("ev-ch-01", false).unwrap();
        assert_eq!(apply_filters(&scored, &filter).len(), scored.len());
        filter.set_search("asha", false).unwrap();
        assert_eq!(apply_filters(&scored, &filter).len(), scored.len());
    }

    #[test]
    fn test_regex_search() {
        let scored = sample();
        let mut filter = FilterState::default();
        filter.set_search(r"KA0[12]", true).unwrap();
        let indices = apply_filters(&scored, &filter);
        assert_eq!(indices.len(), 2);
    }

    #[test]
    fn test_invalid_regex_reports_error_and_matches_nothing() {
        let scored = sample();
        let mut filter = FilterState::default();
        assert!(filter.set_search(r"KA0[", true).is_err());
        let indices = apply_filters(&scored, &filter);
        assert!(indices.is_empty());
    }

    #[test]
    fn test_sort_by_difference_descending() {
        let scored = sample();
        let filter = FilterState {
            sort_key: SortKey::Difference,
            sort_ascending: false,
            ..FilterState::default()
        };
        let indices = apply_filters(&scored, &filter);
        assert_eq!(indices, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_sort_by_plate() {
        let scored = sample();
        let filter = FilterState {
            sort_key: SortKey::Plate,
            ..FilterState::default()
        };
        let indices = apply_filters(&scored, &filter);
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_is_active() {
        let mut filter = FilterState::default();
        assert!(!filter.is_active());
        filter.violations_only = true;
        assert!(filter.is_active());
    }
}
