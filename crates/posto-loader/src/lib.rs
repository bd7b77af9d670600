//! CSV loaders for purchases, sales and inventory adjustments.
//!
//! Formats (header row required, column order free):
//!
//! - purchases: `id,product_code,purchase_date,cost_per_unit,original_volume,
//!   remaining_volume[,invoice_reference]`
//! - sales: `id,product_code,sale_date,volume_sold,total_revenue`
//! - adjustments: `product_code,kind,volume[,total_cost]`
//!
//! Dates are strict `YYYY-MM-DD`; numbers parse as exact decimals with a `.`
//! separator and no digit grouping (`1_000` and `1,000` are both rejected). Errors
//! name the CSV line. Range checks (negative volumes, remaining above
//! original) are left to the engine, which owns those rules.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use posto_fifo::{AdjustmentKind, InventoryAdjustment, PurchaseBatch, Sale};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Loader errors are small, explicit, and test-friendly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(String),

    #[error("csv error at line {line}: {message}")]
    Csv { line: u64, message: String },

    #[error("line {line}: column {column}: invalid date {value:?} (expected YYYY-MM-DD)")]
    BadDate {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: column {column}: invalid number {value:?}")]
    BadNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: {reason}")]
    BadRow { line: u64, reason: String },
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or(0);
        LoadError::Csv {
            line,
            message: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvPurchaseRow {
    id: i64,
    product_code: String,
    purchase_date: String,
    cost_per_unit: String,
    original_volume: String,
    remaining_volume: String,
    #[serde(default)]
    invoice_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CsvSaleRow {
    id: i64,
    product_code: String,
    sale_date: String,
    volume_sold: String,
    total_revenue: String,
}

#[derive(Debug, Deserialize)]
struct CsvAdjustmentRow {
    product_code: String,
    kind: String,
    volume: String,
    #[serde(default)]
    total_cost: Option<String>,
}

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

pub fn load_purchases_csv(path: impl AsRef<Path>) -> Result<Vec<PurchaseBatch>, LoadError> {
    read_purchases(File::open(path)?)
}

pub fn load_sales_csv(path: impl AsRef<Path>) -> Result<Vec<Sale>, LoadError> {
    read_sales(File::open(path)?)
}

pub fn load_adjustments_csv(path: impl AsRef<Path>) -> Result<Vec<InventoryAdjustment>, LoadError> {
    read_adjustments(File::open(path)?)
}

/// Parse purchase batches from any reader.
pub fn read_purchases<R: Read>(reader: R) -> Result<Vec<PurchaseBatch>, LoadError> {
    let out = read_rows(reader, |line, row: CsvPurchaseRow| {
        let original_volume = parse_decimal(line, "original_volume", &row.original_volume)?;
        Ok(PurchaseBatch::new(
            row.id,
            row.product_code.trim(),
            parse_date(line, "purchase_date", &row.purchase_date)?,
            parse_decimal(line, "cost_per_unit", &row.cost_per_unit)?,
            original_volume,
        )
        .with_remaining(parse_decimal(line, "remaining_volume", &row.remaining_volume)?)
        .with_invoice(row.invoice_reference.unwrap_or_default().trim()))
    })?;
    debug!(rows = out.len(), "purchases loaded");
    Ok(out)
}

/// Parse sales from any reader.
pub fn read_sales<R: Read>(reader: R) -> Result<Vec<Sale>, LoadError> {
    let out = read_rows(reader, |line, row: CsvSaleRow| {
        Ok(Sale::new(
            row.id,
            row.product_code.trim(),
            parse_date(line, "sale_date", &row.sale_date)?,
            parse_decimal(line, "volume_sold", &row.volume_sold)?,
            parse_decimal(line, "total_revenue", &row.total_revenue)?,
        ))
    })?;
    debug!(rows = out.len(), "sales loaded");
    Ok(out)
}

/// Parse inventory adjustments from any reader. A blank `total_cost` is zero.
pub fn read_adjustments<R: Read>(reader: R) -> Result<Vec<InventoryAdjustment>, LoadError> {
    let out = read_rows(reader, |line, row: CsvAdjustmentRow| {
        let total_cost = match row.total_cost.as_deref().map(str::trim) {
            None | Some("") => Decimal::ZERO,
            Some(raw) => parse_decimal(line, "total_cost", raw)?,
        };
        Ok(InventoryAdjustment {
            product_code: row.product_code.trim().to_string(),
            kind: parse_kind(line, &row.kind)?,
            volume: parse_decimal(line, "volume", &row.volume)?,
            total_cost,
        })
    })?;
    debug!(rows = out.len(), "adjustments loaded");
    Ok(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_rows<R, Row, T, F>(reader: R, mut convert: F) -> Result<Vec<T>, LoadError>
where
    R: Read,
    Row: DeserializeOwned,
    F: FnMut(u64, Row) -> Result<T, LoadError>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: Row = record
            .deserialize(Some(&headers))
            .map_err(|e| LoadError::BadRow {
                line,
                reason: e.to_string(),
            })?;
        out.push(convert(line, row)?);
    }
    Ok(out)
}

fn parse_date(line: u64, column: &'static str, raw: &str) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| LoadError::BadDate {
        line,
        column,
        value: raw.to_string(),
    })
}

fn parse_decimal(line: u64, column: &'static str, raw: &str) -> Result<Decimal, LoadError> {
    let bad = || LoadError::BadNumber {
        line,
        column,
        value: raw.to_string(),
    };
    let trimmed = raw.trim();
    // `Decimal::from_str` skips `_` separators.
    if trimmed.contains('_') {
        return Err(bad());
    }
    Decimal::from_str(trimmed).map_err(|_| bad())
}

fn parse_kind(line: u64, raw: &str) -> Result<AdjustmentKind, LoadError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "loss" => Ok(AdjustmentKind::Loss),
        "gain" => Ok(AdjustmentKind::Gain),
        other => Err(LoadError::BadRow {
            line,
            reason: format!("unknown adjustment kind {other:?} (expected loss|gain)"),
        }),
    }
}
