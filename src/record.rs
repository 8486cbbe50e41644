// Core record model for the analytics pipeline
// Records are created once by the loader and immutable afterwards

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One parsed sales transaction.
///
/// Revenue is always derived from quantity × unit price; the input file
/// carries no revenue column and a precomputed value is never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,

    #[serde(rename = "Date")]
    pub date: NaiveDate,

    #[serde(rename = "ProductID")]
    pub product_id: String,

    #[serde(rename = "ProductName")]
    pub product_name: String,

    #[serde(rename = "Quantity")]
    pub quantity: i64,

    #[serde(rename = "UnitPrice")]
    pub unit_price: Decimal,

    #[serde(rename = "CustomerID")]
    pub customer_id: String,

    #[serde(rename = "Region")]
    pub region: String,

    /// Line in the source file this record came from (1-indexed, provenance)
    #[serde(rename = "LineNumber")]
    pub line_number: usize,
}

impl SalesRecord {
    /// Revenue for this transaction, recomputed on every call.
    pub fn revenue(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}
