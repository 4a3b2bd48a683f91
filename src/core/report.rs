// EVGuard - core/report.rs
//
// Plain-text compliance report generation. The report is paginated for
// printing: a fixed page width, a configurable line budget per page, and
// a header/footer on every page. Sections start on a fresh page.

use crate::core::model::{AnalysisSummary, DiscrepancyFlag, ScoredVehicle, ViolationKind};
use crate::util::constants;
use crate::util::error::ReportError;
use chrono::{Local, NaiveDate};

/// Section toggles and pagination settings for the rendered report.
/// The compliance table is always present; everything else is opt-in.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Include the aggregate summary section.
    pub include_summary: bool,

    /// Include the table of charging discrepancies.
    pub include_discrepancies: bool,

    /// Include the per-vehicle detail section listing every failed check.
    pub include_details: bool,

    /// Lines per rendered page, header and footer included.
    pub lines_per_page: usize,

    /// Report date shown in page headers and the default filename.
    pub report_date: NaiveDate,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_discrepancies: true,
            include_details: true,
            lines_per_page: constants::DEFAULT_REPORT_LINES_PER_PAGE,
            report_date: Local::now().date_naive(),
        }
    }
}

/// Default filename for a saved report, e.g. `evguard-report-2025-10-31.txt`.
pub fn default_report_filename(date: NaiveDate) -> String {
    format!("evguard-report-{}.txt", date.format("%Y-%m-%d"))
}

/// Render the report over the given selection. The compliance table is
/// always emitted; summary, discrepancy, and detail sections follow the
/// toggles. Errors if the selection is empty.
pub fn render_report(
    scored: &[ScoredVehicle],
    indices: &[usize],
    summary: &AnalysisSummary,
    options: &ReportOptions,
) -> Result<String, ReportError> {
    if indices.is_empty() {
        return Err(ReportError::NoVehicles);
    }

    let mut sections: Vec<Vec<String>> = Vec::new();
    if options.include_summary {
        sections.push(summary_section(summary));
    }
    sections.push(compliance_section(scored, indices));
    if options.include_discrepancies {
        sections.push(discrepancies_section(scored, indices));
    }
    if options.include_details {
        sections.push(details_section(scored, indices));
    }

    Ok(paginate(&sections, options))
}

fn rule() -> String {
    "=".repeat(constants::REPORT_PAGE_WIDTH)
}

fn thin_rule() -> String {
    "-".repeat(constants::REPORT_PAGE_WIDTH)
}

fn summary_section(summary: &AnalysisSummary) -> Vec<String> {
    let mut lines = vec![
        "ANALYSIS SUMMARY".to_string(),
        thin_rule(),
        format!("Vehicles scored:        {}", summary.vehicle_count),
        format!("Mean compliance score:  {:.1}", summary.mean_score),
        format!("Charging discrepancies: {}", summary.discrepancy_count),
        format!("Chargers flagged:       {}", summary.faulty_charger_count),
        String::new(),
        "Violations by category:".to_string(),
    ];
    for kind in ViolationKind::all() {
        let count = summary.violations_by_kind.get(kind).copied().unwrap_or(0);
        lines.push(format!("  {:<24} {count}", kind.label()));
    }
    lines
}

fn compliance_section(scored: &[ScoredVehicle], indices: &[usize]) -> Vec<String> {
    let mut lines = vec![
        "COMPLIANCE".to_string(),
        thin_rule(),
        format!(
            "{:<12} {:<16} {:<12} {:>7}  {:>7}  {:>6}  {:>5}  {}",
            "PLATE", "OWNER", "TYPE", "BILLED", "DETECT", "DIFF", "SCORE", "FLAG"
        ),
    ];
    for &i in indices {
        let sv = &scored[i];
        lines.push(format!(
            "{:<12} {:<16} {:<12} {:>7.2}  {:>7.2}  {:>6.2}  {:>5}  {}",
            sv.plate,
            truncate(&sv.registry.owner, 16),
            sv.vehicle_type.label(),
            sv.charging.billed_kwh,
            sv.charging.detected_kwh,
            sv.charging.difference_kwh,
            sv.compliance.score,
            sv.charging.flag.short_label(),
        ));
    }
    lines
}

fn discrepancies_section(scored: &[ScoredVehicle], indices: &[usize]) -> Vec<String> {
    let mut lines = vec![
        "CHARGING DISCREPANCIES".to_string(),
        thin_rule(),
        format!(
            "{:<12} {:<12} {:>7}  {:>7}  {:>6}  {}",
            "PLATE", "CHARGER", "BILLED", "DETECT", "DIFF", "FLAG"
        ),
    ];
    let mut any = false;
    for &i in indices {
        let sv = &scored[i];
        if sv.charging.flag == DiscrepancyFlag::Ok {
            continue;
        }
        any = true;
        lines.push(format!(
            "{:<12} {:<12} {:>7.2}  {:>7.2}  {:>6.2}  {}",
            sv.plate,
            sv.charging.charger_id,
            sv.charging.billed_kwh,
            sv.charging.detected_kwh,
            sv.charging.difference_kwh,
            sv.charging.flag.label(),
        ));
    }
    if !any {
        lines.push("No charging discrepancies in the current selection.".to_string());
    }
    lines
}

fn details_section(scored: &[ScoredVehicle], indices: &[usize]) -> Vec<String> {
    let mut lines = vec!["VEHICLE DETAILS".to_string(), thin_rule()];
    for &i in indices {
        let sv = &scored[i];
        let fault_note = match sv.charging.flag {
            DiscrepancyFlag::PotentialChargerFault => " [charger fault suspected]",
            _ => "",
        };
        lines.push(format!(
            "{} / {} ({}), score {}{fault_note}",
            sv.plate,
            truncate(&sv.registry.owner, 24),
            sv.vehicle_type.label(),
            sv.compliance.score
        ));
        if sv.compliance.violations.is_empty() {
            lines.push("  No violations.".to_string());
        }
        for v in &sv.compliance.violations {
            lines.push(format!("  - {}", v.message));
        }
        lines.push(String::new());
    }
    lines
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}

/// Lay sections out onto pages. Each section begins on a new page; long
/// sections continue across pages. Every page carries a three-line header
/// and a one-line footer.
fn paginate(sections: &[Vec<String>], options: &ReportOptions) -> String {
    // Header (3 lines) + footer (1 line) leave this many body lines.
    let body_budget = options.lines_per_page.saturating_sub(4).max(1);

    let mut pages: Vec<Vec<String>> = Vec::new();
    for section in sections {
        let mut remaining = section.as_slice();
        loop {
            let take = remaining.len().min(body_budget);
            pages.push(remaining[..take].to_vec());
            remaining = &remaining[take..];
            if remaining.is_empty() {
                break;
            }
        }
    }

    let total = pages.len();
    let mut out = String::new();
    for (n, body) in pages.iter().enumerate() {
        out.push_str(&rule());
        out.push('\n');
        let date = options.report_date.format("%Y-%m-%d").to_string();
        out.push_str(&format!(
            "{} COMPLIANCE REPORT{date:>width$}",
            constants::APP_NAME,
            width = constants::REPORT_PAGE_WIDTH
                - constants::APP_NAME.len()
                - " COMPLIANCE REPORT".len()
        ));
        out.push('\n');
        out.push_str(&rule());
        out.push('\n');
        for line in body {
            out.push_str(line);
            out.push('\n');
        }
        // Pad short pages so the footer lands on the same line everywhere.
        for _ in body.len()..options.lines_per_page.saturating_sub(4) {
            out.push('\n');
        }
        out.push_str(&format!(
            "{:>width$}\n",
            format!("Page {} of {total}", n + 1),
            width = constants::REPORT_PAGE_WIDTH
        ));
        if n + 1 < total {
            out.push('\u{c}'); // form feed between pages
        }
    }
    out
}
