// EVGuard - core/parser.rs
//
// Charging transaction log parsing.
// Core layer: accepts raw text, never touches the filesystem directly.
//
// The parse is atomic all-or-nothing: any structural problem fails the
// whole input and produces no partial results. Required columns are typed
// by an explicit schema; unrecognised columns pass through as strings.

use crate::core::model::Transaction;
use crate::util::constants;
use crate::util::error::ParseError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;

/// Configuration for parsing operations.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub delimiter: char,
    pub max_rows: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            delimiter: constants::LOG_DELIMITER,
            max_rows: constants::MAX_LOG_ROWS,
        }
    }
}

/// Column layout resolved from the header line.
#[derive(Debug)]
struct HeaderLayout {
    /// Total column count, including extras. Every data row must match.
    width: usize,
    timestamp: usize,
    plate: usize,
    billed_kwh: usize,
    amount: usize,
    charger_id: usize,
    /// Unrecognised columns: (index, lowercased header name).
    extras: Vec<(usize, String)>,
}

/// Parse raw log text into an ordered transaction list.
///
/// Ordering matches input row order; it carries no meaning for the engine
/// but is preserved for presentation. Blank lines between data rows are
/// skipped silently.
pub fn parse_log(raw: &str, config: &ParseConfig) -> Result<Vec<Transaction>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut lines = raw.lines();
    let header_line = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line,
            // trim() above guarantees at least one non-blank line exists
            None => return Err(ParseError::EmptyInput),
        }
    };

    let layout = resolve_header(header_line, config.delimiter)?;

    let mut transactions = Vec::new();
    let mut row_number = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        row_number += 1;

        if row_number > config.max_rows {
            return Err(ParseError::TooLarge {
                rows: row_number,
                max: config.max_rows,
            });
        }

        let fields: Vec<&str> = line.split(config.delimiter).collect();
        if fields.len() != layout.width {
            return Err(ParseError::MalformedRow {
                row: row_number,
                expected: layout.width,
                actual: fields.len(),
            });
        }

        transactions.push(build_transaction(&fields, &layout, row_number)?);
    }

    if transactions.is_empty() {
        return Err(ParseError::MissingData);
    }

    tracing::debug!(rows = transactions.len(), "Transaction log parsed");
    Ok(transactions)
}

/// Split and validate the header line against the required-column contract.
fn resolve_header(header_line: &str, delimiter: char) -> Result<HeaderLayout, ParseError> {
    let names: Vec<String> = header_line
        .split(delimiter)
        .map(|c| c.trim().to_lowercase())
        .collect();

    let find = |wanted: &str| names.iter().position(|n| n == wanted);

    let missing: Vec<String> = constants::REQUIRED_COLUMNS
        .iter()
        .filter(|c| find(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingColumns { columns: missing });
    }

    // Positions are present after the missing-column check above.
    let timestamp = find("timestamp").unwrap_or_default();
    let plate = find("plate").unwrap_or_default();
    let billed_kwh = find("billed_kwh").unwrap_or_default();
    let amount = find("amount").unwrap_or_default();
    let charger_id = find("charger_id").unwrap_or_default();

    let required = [timestamp, plate, billed_kwh, amount, charger_id];
    let extras = names
        .iter()
        .enumerate()
        .filter(|(i, _)| !required.contains(i))
        .map(|(i, n)| (i, n.clone()))
        .collect();

    Ok(HeaderLayout {
        width: names.len(),
        timestamp,
        plate,
        billed_kwh,
        amount,
        charger_id,
        extras,
    })
}

/// Build one transaction from a width-checked field slice, applying the
/// per-column schema to the required columns.
fn build_transaction(
    fields: &[&str],
    layout: &HeaderLayout,
    row: usize,
) -> Result<Transaction, ParseError> {
    let timestamp = parse_timestamp(fields[layout.timestamp]).ok_or_else(|| {
        ParseError::InvalidField {
            row,
            column: "timestamp".to_string(),
            value: fields[layout.timestamp].trim().to_string(),
            expected: "timestamp (RFC 3339 or YYYY-MM-DD HH:MM:SS)",
        }
    })?;

    let plate = fields[layout.plate].trim().to_string();
    if plate.is_empty() {
        return Err(ParseError::InvalidField {
            row,
            column: "plate".to_string(),
            value: String::new(),
            expected: "non-empty plate",
        });
    }

    let billed_kwh = parse_non_negative(fields[layout.billed_kwh]).ok_or_else(|| {
        ParseError::InvalidField {
            row,
            column: "billed_kwh".to_string(),
            value: fields[layout.billed_kwh].trim().to_string(),
            expected: "non-negative number",
        }
    })?;

    let amount = parse_non_negative(fields[layout.amount]).ok_or_else(|| {
        ParseError::InvalidField {
            row,
            column: "amount".to_string(),
            value: fields[layout.amount].trim().to_string(),
            expected: "non-negative number",
        }
    })?;

    let charger_id = fields[layout.charger_id].trim().to_string();
    if charger_id.is_empty() {
        return Err(ParseError::InvalidField {
            row,
            column: "charger_id".to_string(),
            value: String::new(),
            expected: "non-empty charger id",
        });
    }

    let extras: HashMap<String, String> = layout
        .extras
        .iter()
        .map(|(i, name)| (name.clone(), fields[*i].trim().to_string()))
        .collect();

    Ok(Transaction {
        timestamp,
        plate,
        billed_kwh,
        amount,
        charger_id,
        extras,
    })
}

/// Parse a transaction timestamp.
///
/// Accepts RFC 3339 (`2025-10-31T10:20:00Z`, offset variants) first, then
/// the naive `%Y-%m-%dT%H:%M:%S` and `%Y-%m-%d %H:%M:%S` forms treated as
/// UTC. Returns `None` on failure; the caller raises the typed error.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.into());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ndt.and_utc());
        }
    }
    None
}

/// Parse a non-negative numeric field. Empty strings do not qualify.
fn parse_non_negative(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.is_finite() => Some(v),
        _ => None,
    }
}
