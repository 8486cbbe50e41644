// Aggregator - single-pass multi-dimensional revenue statistics
// Group maps are BTreeMaps so key order is fixed and runs are deterministic;
// ranking helpers sort stably, so ties fall back to that key order.

use crate::record::SalesRecord;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// TREND PERIOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendPeriod {
    Daily,
    Monthly,
}

impl TrendPeriod {
    pub fn name(&self) -> &str {
        match self {
            TrendPeriod::Daily => "daily",
            TrendPeriod::Monthly => "monthly",
        }
    }

    /// Bucket label for a date. Labels sort lexicographically in
    /// chronological order.
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            TrendPeriod::Daily => date.format("%Y-%m-%d").to_string(),
            TrendPeriod::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        }
    }
}

impl Default for TrendPeriod {
    fn default() -> Self {
        TrendPeriod::Daily
    }
}

// ============================================================================
// GROUP STATISTICS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub revenue: Decimal,
    pub transactions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductStats {
    /// Display name (product ids are the grouping key)
    pub name: String,
    pub units: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub spent: Decimal,
    pub orders: usize,
}

impl CustomerStats {
    pub fn average_order_value(&self) -> Decimal {
        if self.orders == 0 {
            Decimal::ZERO
        } else {
            self.spent / Decimal::from(self.orders as i64)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub revenue: Decimal,
    pub transactions: usize,
    pub customers: BTreeSet<String>,
}

impl PeriodStats {
    pub fn unique_customers(&self) -> usize {
        self.customers.len()
    }
}

// ============================================================================
// AGGREGATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub total_revenue: Decimal,
    pub transaction_count: usize,
    /// Earliest and latest transaction date, inclusive
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub by_region: BTreeMap<String, RegionStats>,
    pub by_product: BTreeMap<String, ProductStats>,
    pub by_customer: BTreeMap<String, CustomerStats>,
    /// Revenue per period, chronological; empty periods are omitted
    pub trend: BTreeMap<String, PeriodStats>,
    pub period: TrendPeriod,
}

impl AggregationResult {
    pub fn average_order_value(&self) -> Decimal {
        if self.transaction_count == 0 {
            Decimal::ZERO
        } else {
            self.total_revenue / Decimal::from(self.transaction_count as i64)
        }
    }

    /// Region revenue as a percentage of total revenue.
    pub fn region_share(&self, stats: &RegionStats) -> Decimal {
        if self.total_revenue.is_zero() {
            Decimal::ZERO
        } else {
            stats.revenue / self.total_revenue * Decimal::from(100)
        }
    }

    /// Regions sorted by revenue, highest first.
    pub fn regions_by_revenue(&self) -> Vec<(&String, &RegionStats)> {
        let mut regions: Vec<_> = self.by_region.iter().collect();
        regions.sort_by(|a, b| b.1.revenue.cmp(&a.1.revenue));
        regions
    }

    /// Top `n` products by units sold.
    pub fn top_products(&self, n: usize) -> Vec<(&String, &ProductStats)> {
        let mut products: Vec<_> = self.by_product.iter().collect();
        products.sort_by(|a, b| b.1.units.cmp(&a.1.units));
        products.truncate(n);
        products
    }

    /// Top `n` customers by total spend.
    pub fn top_customers(&self, n: usize) -> Vec<(&String, &CustomerStats)> {
        let mut customers: Vec<_> = self.by_customer.iter().collect();
        customers.sort_by(|a, b| b.1.spent.cmp(&a.1.spent));
        customers.truncate(n);
        customers
    }

    /// Products that moved fewer than `threshold` units, fewest first.
    pub fn low_performers(&self, threshold: i64) -> Vec<(&String, &ProductStats)> {
        let mut low: Vec<_> = self
            .by_product
            .iter()
            .filter(|(_, stats)| stats.units < threshold)
            .collect();
        low.sort_by(|a, b| a.1.units.cmp(&b.1.units));
        low
    }

    /// Period with the highest revenue; revenue ties resolve to the
    /// earliest period, matching the other ranking helpers.
    pub fn peak_period(&self) -> Option<(&String, &PeriodStats)> {
        self.trend
            .iter()
            .max_by(|a, b| a.1.revenue.cmp(&b.1.revenue).then_with(|| b.0.cmp(a.0)))
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Compute all groupings in a single pass over the validated records.
pub fn aggregate(records: &[SalesRecord], period: TrendPeriod) -> AggregationResult {
    let mut total_revenue = Decimal::ZERO;
    let mut date_range: Option<(NaiveDate, NaiveDate)> = None;
    let mut by_region: BTreeMap<String, RegionStats> = BTreeMap::new();
    let mut by_product: BTreeMap<String, ProductStats> = BTreeMap::new();
    let mut by_customer: BTreeMap<String, CustomerStats> = BTreeMap::new();
    let mut trend: BTreeMap<String, PeriodStats> = BTreeMap::new();

    for record in records {
        let revenue = record.revenue();
        total_revenue += revenue;

        date_range = Some(match date_range {
            None => (record.date, record.date),
            Some((min, max)) => (min.min(record.date), max.max(record.date)),
        });

        let region = by_region.entry(record.region.clone()).or_default();
        region.revenue += revenue;
        region.transactions += 1;

        let product = by_product.entry(record.product_id.clone()).or_default();
        if product.name.is_empty() {
            product.name = record.product_name.clone();
        }
        product.units += record.quantity;
        product.revenue += revenue;

        let customer = by_customer.entry(record.customer_id.clone()).or_default();
        customer.spent += revenue;
        customer.orders += 1;

        let bucket = trend.entry(period.label(record.date)).or_default();
        bucket.revenue += revenue;
        bucket.transactions += 1;
        bucket.customers.insert(record.customer_id.clone());
    }

    AggregationResult {
        total_revenue,
        transaction_count: records.len(),
        date_range,
        by_region,
        by_product,
        by_customer,
        trend,
        period,
    }
}

// ============================================================================
// TESTS
// ============================================================================
