// Report Formatter - renders an AggregationResult as sectioned text
// Pure formatting, no business logic. Writes to any io::Write.

use crate::aggregate::AggregationResult;
use crate::enrich::Enrichment;
use anyhow::Result;
use chrono::Local;
use std::io::Write;

const RULE: &str = "============================================";
const LINE: &str = "--------------------------------------------";

const TOP_N: usize = 5;
const LOW_UNITS_THRESHOLD: i64 = 10;

/// Recoverable-error counts surfaced in the report footer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunQuality {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub validation_issues: usize,
    pub filtered_out: usize,
}

/// Render the full report.
pub fn render_report<W: Write>(
    out: &mut W,
    result: &AggregationResult,
    enrichment: Option<&Enrichment>,
    quality: RunQuality,
) -> Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "        SALES ANALYTICS REPORT")?;
    writeln!(out, "      Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "      Records Processed: {}", result.transaction_count)?;
    writeln!(out, "{}\n", RULE)?;

    write_overall_summary(out, result)?;
    write_region_performance(out, result)?;
    write_top_products(out, result)?;
    write_top_customers(out, result)?;
    write_trend(out, result)?;
    write_product_performance(out, result)?;

    if let Some(enrichment) = enrichment {
        write_enrichment_summary(out, enrichment)?;
    }

    write_data_quality(out, quality)?;

    Ok(())
}

fn write_overall_summary<W: Write>(out: &mut W, result: &AggregationResult) -> Result<()> {
    writeln!(out, "OVERALL SUMMARY")?;
    writeln!(out, "{}", LINE)?;
    writeln!(out, "Total Revenue:        ₹{:.2}", result.total_revenue)?;
    writeln!(out, "Total Transactions:   {}", result.transaction_count)?;
    writeln!(out, "Average Order Value:  ₹{:.2}", result.average_order_value())?;

    match result.date_range {
        Some((from, to)) => writeln!(out, "Date Range:           {} to {}", from, to)?,
        None => writeln!(out, "Date Range:           N/A")?,
    }

    writeln!(out)?;
    Ok(())
}

fn write_region_performance<W: Write>(out: &mut W, result: &AggregationResult) -> Result<()> {
    writeln!(out, "REGION-WISE PERFORMANCE")?;
    writeln!(out, "{}", LINE)?;
    writeln!(out, "{:<12} {:>14} {:>9} {:>14}", "Region", "Revenue", "% Total", "Transactions")?;

    for (region, stats) in result.regions_by_revenue() {
        writeln!(
            out,
            "{:<12} ₹{:>13.2} {:>8.2}% {:>14}",
            region,
            stats.revenue,
            result.region_share(stats),
            stats.transactions
        )?;
    }

    writeln!(out)?;
    Ok(())
}

fn write_top_products<W: Write>(out: &mut W, result: &AggregationResult) -> Result<()> {
    writeln!(out, "TOP {} PRODUCTS", TOP_N)?;
    writeln!(out, "{}", LINE)?;
    writeln!(out, "{:<5} {:<10} {:<20} {:>8} {:>14}", "Rank", "ID", "Product", "Units", "Revenue")?;

    for (rank, (product_id, stats)) in result.top_products(TOP_N).iter().enumerate() {
        writeln!(
            out,
            "{:<5} {:<10} {:<20} {:>8} ₹{:>13.2}",
            rank + 1,
            product_id,
            stats.name,
            stats.units,
            stats.revenue
        )?;
    }

    writeln!(out)?;
    Ok(())
}

fn write_top_customers<W: Write>(out: &mut W, result: &AggregationResult) -> Result<()> {
    writeln!(out, "TOP {} CUSTOMERS", TOP_N)?;
    writeln!(out, "{}", LINE)?;
    writeln!(out, "{:<5} {:<12} {:>14} {:>8} {:>14}", "Rank", "Customer", "Total Spent", "Orders", "Avg Order")?;

    for (rank, (customer_id, stats)) in result.top_customers(TOP_N).iter().enumerate() {
        writeln!(
            out,
            "{:<5} {:<12} ₹{:>13.2} {:>8} ₹{:>13.2}",
            rank + 1,
            customer_id,
            stats.spent,
            stats.orders,
            stats.average_order_value()
        )?;
    }

    writeln!(out)?;
    Ok(())
}

fn write_trend<W: Write>(out: &mut W, result: &AggregationResult) -> Result<()> {
    writeln!(out, "SALES TREND ({})", result.period.name().to_uppercase())?;
    writeln!(out, "{}", LINE)?;
    writeln!(out, "{:<12} {:>14} {:>14} {:>10}", "Period", "Revenue", "Transactions", "Customers")?;

    for (period, stats) in &result.trend {
        writeln!(
            out,
            "{:<12} ₹{:>13.2} {:>14} {:>10}",
            period,
            stats.revenue,
            stats.transactions,
            stats.unique_customers()
        )?;
    }

    writeln!(out)?;
    Ok(())
}

fn write_product_performance<W: Write>(out: &mut W, result: &AggregationResult) -> Result<()> {
    writeln!(out, "PRODUCT PERFORMANCE")?;
    writeln!(out, "{}", LINE)?;

    match result.peak_period() {
        Some((period, stats)) => {
            writeln!(out, "Peak Period: {} (₹{:.2})", period, stats.revenue)?
        }
        None => writeln!(out, "Peak Period: N/A")?,
    }

    let low = result.low_performers(LOW_UNITS_THRESHOLD);
    writeln!(out, "Low Performing Products (under {} units):", LOW_UNITS_THRESHOLD)?;

    if low.is_empty() {
        writeln!(out, " - none")?;
    } else {
        for (product_id, stats) in low {
            writeln!(
                out,
                " - {} ({}): {} units, ₹{:.2}",
                stats.name, product_id, stats.units, stats.revenue
            )?;
        }
    }

    writeln!(out)?;
    Ok(())
}

fn write_enrichment_summary<W: Write>(out: &mut W, enrichment: &Enrichment) -> Result<()> {
    let summary = enrichment.summary();

    writeln!(out, "API ENRICHMENT SUMMARY")?;
    writeln!(out, "{}", LINE)?;

    if let Some(error) = &enrichment.fetch_error {
        writeln!(out, "Warning: product API unavailable ({})", error)?;
    }

    writeln!(out, "Products Enriched: {}/{}", summary.matched, summary.total)?;
    writeln!(out, "Success Rate: {:.2}%", summary.success_rate())?;

    if !summary.unmatched.is_empty() {
        writeln!(out, "Products Not Enriched:")?;
        for product_id in &summary.unmatched {
            let meta = &enrichment.metadata[product_id];
            writeln!(out, " - {} ({})", product_id, meta.title)?;
        }
    }

    writeln!(out)?;
    Ok(())
}

fn write_data_quality<W: Write>(out: &mut W, quality: RunQuality) -> Result<()> {
    writeln!(out, "DATA QUALITY")?;
    writeln!(out, "{}", LINE)?;
    writeln!(out, "Rows Read:           {}", quality.total_rows)?;
    writeln!(out, "Parse Errors:        {}", quality.parse_errors)?;
    writeln!(out, "Validation Errors:   {}", quality.validation_issues)?;
    writeln!(out, "Filtered Out:        {}", quality.filtered_out)?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
