// Record Loader - encoding resolution + row parsing
// Decodes the raw file with a prioritized encoding list, then parses
// pipe-delimited rows into SalesRecord. Bad rows are collected, not fatal.

use crate::record::SalesRecord;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// ENCODING RESOLUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl Encoding {
    pub fn name(&self) -> &str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "Latin-1",
        }
    }

    /// Attempt a clean decode of the full byte stream.
    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            // Latin-1 maps every byte 1:1 onto U+0000..U+00FF
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Default priority order: strict UTF-8 first, Latin-1 as the fallback.
pub const DEFAULT_ENCODINGS: &[Encoding] = &[Encoding::Utf8, Encoding::Latin1];

/// Fatal: none of the candidate encodings produced a clean decode.
#[derive(Debug, Clone)]
pub struct EncodingError {
    pub attempted: Vec<Encoding>,
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.attempted.iter().map(Encoding::name).collect();
        write!(f, "Could not decode input with any encoding: {}", names.join(", "))
    }
}

impl std::error::Error for EncodingError {}

/// Decode bytes with the first encoding in `encodings` that succeeds.
pub fn decode_bytes(bytes: &[u8], encodings: &[Encoding]) -> Result<(String, Encoding), EncodingError> {
    for &encoding in encodings {
        if let Some(text) = encoding.decode(bytes) {
            return Ok((text, encoding));
        }
    }

    Err(EncodingError {
        attempted: encodings.to_vec(),
    })
}

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// Per-row, recoverable: the row produced no record but loading continued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseError {
    /// 1-indexed line in the source file
    pub line_number: usize,
    pub reason: String,
    /// Original line for debugging
    pub raw_line: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.reason)
    }
}

// ============================================================================
// LOAD OUTCOME
// ============================================================================

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub records: Vec<SalesRecord>,
    pub parse_errors: Vec<ParseError>,
    /// Data rows seen (header and blank lines excluded)
    pub total_rows: usize,
    /// Encoding that produced the clean decode
    pub encoding: Encoding,
}

impl LoadOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} rows parsed ({}): {} records, {} rejected",
            self.total_rows,
            self.encoding.name(),
            self.records.len(),
            self.parse_errors.len()
        )
    }
}

// ============================================================================
// LOADER
// ============================================================================

/// Expected field count per row:
/// TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region
const FIELD_COUNT: usize = 8;

/// Load sales records from a file of unknown encoding.
pub fn load_file(path: &Path) -> Result<LoadOutcome> {
    load_file_with_encodings(path, DEFAULT_ENCODINGS)
}

pub fn load_file_with_encodings(path: &Path, encodings: &[Encoding]) -> Result<LoadOutcome> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    load_bytes(&bytes, encodings)
}

/// Decode and parse an in-memory byte stream.
pub fn load_bytes(bytes: &[u8], encodings: &[Encoding]) -> Result<LoadOutcome> {
    let (text, encoding) = decode_bytes(bytes, encodings)?;
    let (records, parse_errors, total_rows) = parse_rows(&text)?;

    Ok(LoadOutcome {
        records,
        parse_errors,
        total_rows,
        encoding,
    })
}

fn parse_rows(text: &str) -> Result<(Vec<SalesRecord>, Vec<ParseError>, usize)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut total_rows = 0;

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                errors.push(ParseError {
                    line_number: e.position().map(|p| p.line() as usize).unwrap_or(0),
                    reason: format!("Unreadable row: {}", e),
                    raw_line: String::new(),
                });
                continue;
            }
        };

        // Physical line in the input, so blank lines the reader skips
        // do not shift the reported position
        let line_number = row.position().map(|p| p.line() as usize).unwrap_or(0);

        total_rows += 1;
        let raw_line = row.iter().collect::<Vec<_>>().join("|");

        if row.len() != FIELD_COUNT {
            errors.push(ParseError {
                line_number,
                reason: format!("Expected {} fields, found {}", FIELD_COUNT, row.len()),
                raw_line,
            });
            continue;
        }

        match parse_record(&row, line_number) {
            Ok(record) => records.push(record),
            Err(reason) => errors.push(ParseError {
                line_number,
                reason,
                raw_line,
            }),
        }
    }

    Ok((records, errors, total_rows))
}

fn parse_record(row: &csv::StringRecord, line_number: usize) -> Result<SalesRecord, String> {
    let transaction_id = row.get(0).unwrap_or("").to_string();
    let date = parse_date(row.get(1).unwrap_or(""))?;
    let product_id = row.get(2).unwrap_or("").to_string();
    // Product names in the source data sometimes carry stray commas
    let product_name = row.get(3).unwrap_or("").replace(',', "");
    let quantity = parse_quantity(row.get(4).unwrap_or(""))?;
    let unit_price = parse_price(row.get(5).unwrap_or(""))?;
    let customer_id = row.get(6).unwrap_or("").to_string();
    let region = row.get(7).unwrap_or("").to_string();

    Ok(SalesRecord {
        transaction_id,
        date,
        product_id,
        product_name,
        quantity,
        unit_price,
        customer_id,
        region,
        line_number,
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    if raw.is_empty() {
        return Err("Date is empty".to_string());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .map_err(|_| format!("Invalid date: {}", raw))
}

fn parse_quantity(raw: &str) -> Result<i64, String> {
    // Thousands separators appear in the exported data
    let cleaned = raw.replace(',', "");

    cleaned
        .parse::<i64>()
        .map_err(|_| format!("Non-numeric quantity: {}", raw))
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    let cleaned = raw.replace(',', "");

    Decimal::from_str(&cleaned).map_err(|_| format!("Non-numeric unit price: {}", raw))
}

// ============================================================================
// TESTS
// ============================================================================
