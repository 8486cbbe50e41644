// Validator / Filter - sanity checks + optional user criteria
// Records failing a sanity rule are dropped and the failure collected.
// Filter criteria are applied afterwards as a conjunction of predicates.

use crate::record::SalesRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// VALIDATION ISSUES
// ============================================================================

/// Per-record, recoverable: the record was dropped but the run continued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub line_number: usize,
    pub transaction_id: String,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} [{}] {}: {}",
            self.line_number, self.transaction_id, self.field, self.message
        )
    }
}

// ============================================================================
// FILTER CRITERIA
// ============================================================================

/// Optional predicate set. Absent fields mean "no constraint"; active
/// fields must all hold for a record to pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub regions: Option<BTreeSet<String>>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_revenue: Option<Decimal>,
    pub max_revenue: Option<Decimal>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_min_revenue(mut self, min: Decimal) -> Self {
        self.min_revenue = Some(min);
        self
    }

    pub fn with_max_revenue(mut self, max: Decimal) -> Self {
        self.max_revenue = Some(max);
        self
    }

    /// True when no constraint is active.
    pub fn is_empty(&self) -> bool {
        self.regions.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.min_revenue.is_none()
            && self.max_revenue.is_none()
    }

    /// True when the record satisfies every active constraint.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        if let Some(regions) = &self.regions {
            if !regions.contains(&record.region) {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if record.date < from {
                return false;
            }
        }

        if let Some(to) = self.date_to {
            if record.date > to {
                return false;
            }
        }

        let revenue = record.revenue();

        if let Some(min) = self.min_revenue {
            if revenue < min {
                return false;
            }
        }

        if let Some(max) = self.max_revenue {
            if revenue > max {
                return false;
            }
        }

        true
    }
}

// ============================================================================
// VALIDATION OUTCOME
// ============================================================================

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Records passing every sanity rule and every active filter predicate
    pub records: Vec<SalesRecord>,
    pub issues: Vec<ValidationIssue>,
    /// Valid records excluded by the filter (not errors)
    pub filtered_out: usize,
}

impl ValidationOutcome {
    pub fn summary(&self) -> String {
        format!(
            "{} valid, {} invalid, {} filtered out",
            self.records.len(),
            self.issues.len(),
            self.filtered_out
        )
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Validate records and apply the optional filter.
pub fn validate_and_filter(
    records: Vec<SalesRecord>,
    criteria: Option<&FilterCriteria>,
) -> ValidationOutcome {
    let mut valid = Vec::new();
    let mut issues = Vec::new();
    let mut filtered_out = 0;

    for record in records {
        let record_issues = check_record(&record);

        if !record_issues.is_empty() {
            issues.extend(record_issues);
            continue;
        }

        let passes = criteria.map(|c| c.matches(&record)).unwrap_or(true);

        if passes {
            valid.push(record);
        } else {
            filtered_out += 1;
        }
    }

    ValidationOutcome {
        records: valid,
        issues,
        filtered_out,
    }
}

/// Sanity rules for a single record. Empty result = valid.
fn check_record(record: &SalesRecord) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut fail = |field: &str, message: String| {
        issues.push(ValidationIssue {
            line_number: record.line_number,
            transaction_id: record.transaction_id.clone(),
            field: field.to_string(),
            message,
        });
    };

    if record.transaction_id.is_empty() {
        fail("transaction_id", "Transaction ID is empty".to_string());
    } else if !record.transaction_id.starts_with('T') {
        fail(
            "transaction_id",
            format!("Transaction ID must start with 'T': {}", record.transaction_id),
        );
    }

    if record.product_id.is_empty() {
        fail("product_id", "Product ID is empty".to_string());
    }

    if record.customer_id.is_empty() {
        fail("customer_id", "Customer ID is empty".to_string());
    }

    if record.region.is_empty() {
        fail("region", "Region is empty".to_string());
    }

    if record.quantity <= 0 {
        fail("quantity", format!("Quantity must be positive: {}", record.quantity));
    }

    if record.unit_price <= Decimal::ZERO {
        fail(
            "unit_price",
            format!("Unit price must be positive: {}", record.unit_price),
        );
    }

    issues
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(id: &str, region: &str, qty: i64, price: Decimal) -> SalesRecord {
        SalesRecord {
            transaction_id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            product_id: "P101".to_string(),
            product_name: "Laptop".to_string(),
            quantity: qty,
            unit_price: price,
            customer_id: "C501".to_string(),
            region: region.to_string(),
            line_number: 2,
        }
    }

    #[test]
    fn test_valid_record_passes() {
        let outcome = validate_and_filter(vec![record("T1", "North", 2, dec!(10))], None);

        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.filtered_out, 0);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let outcome = validate_and_filter(vec![record("T1", "North", -2, dec!(10))], None);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].field, "quantity");
    }

    #[test]
    fn test_zero_price_rejected() {
        let outcome = validate_and_filter(vec![record("T1", "North", 2, Decimal::ZERO)], None);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.issues[0].field, "unit_price");
    }

    #[test]
    fn test_bad_transaction_id_rejected() {
        let outcome = validate_and_filter(vec![record("X1", "North", 2, dec!(10))], None);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.issues[0].field, "transaction_id");
    }

    #[test]
    fn test_missing_identifiers_collect_multiple_issues() {
        let mut bad = record("T1", "", 2, dec!(10));
        bad.customer_id = String::new();

        let outcome = validate_and_filter(vec![bad], None);

        assert!(outcome.records.is_empty());
        let fields: Vec<&str> = outcome.issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"customer_id"));
        assert!(fields.contains(&"region"));
    }

    #[test]
    fn test_region_filter() {
        let criteria = FilterCriteria::new().with_regions(["North"]);

        let outcome = validate_and_filter(
            vec![
                record("T1", "North", 2, dec!(10)),
                record("T2", "South", 1, dec!(5)),
            ],
            Some(&criteria),
        );

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].region, "North");
        assert_eq!(outcome.filtered_out, 1);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_revenue_bounds_filter() {
        let criteria = FilterCriteria::new()
            .with_min_revenue(dec!(10))
            .with_max_revenue(dec!(100));

        let outcome = validate_and_filter(
            vec![
                record("T1", "North", 1, dec!(5)),   // revenue 5, below min
                record("T2", "North", 2, dec!(10)),  // revenue 20, in range
                record("T3", "North", 20, dec!(10)), // revenue 200, above max
            ],
            Some(&criteria),
        );

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].transaction_id, "T2");
        assert_eq!(outcome.filtered_out, 2);
    }

    #[test]
    fn test_date_range_filter_inclusive() {
        let criteria = FilterCriteria::new().with_date_range(
            NaiveDate::from_ymd_opt(2024, 1, 15),
            NaiveDate::from_ymd_opt(2024, 1, 15),
        );

        let outcome = validate_and_filter(vec![record("T1", "North", 2, dec!(10))], Some(&criteria));

        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_output_satisfies_all_active_criteria() {
        let criteria = FilterCriteria::new()
            .with_regions(["North", "South"])
            .with_min_revenue(dec!(10));

        let input = vec![
            record("T1", "North", 2, dec!(10)),
            record("T2", "South", 1, dec!(5)),
            record("T3", "East", 3, dec!(10)),
            record("T4", "South", 4, dec!(10)),
        ];

        let outcome = validate_and_filter(input.clone(), Some(&criteria));

        // Subset property: every survivor came from the input and matches
        for survivor in &outcome.records {
            assert!(input.contains(survivor));
            assert!(criteria.matches(survivor));
        }
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn test_empty_criteria_is_no_constraint() {
        let criteria = FilterCriteria::new();
        assert!(criteria.is_empty());
        assert!(criteria.matches(&record("T1", "North", 2, dec!(10))));
    }
}
