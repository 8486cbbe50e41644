use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use sales_analytics::{
    aggregate, enrich_products, load_file, render_report, validate_and_filter,
    FilterCriteria, HttpProductSource, RunQuality, TrendPeriod, DEFAULT_API_URL,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrendArg {
    Daily,
    Monthly,
}

impl From<TrendArg> for TrendPeriod {
    fn from(arg: TrendArg) -> Self {
        match arg {
            TrendArg::Daily => TrendPeriod::Daily,
            TrendArg::Monthly => TrendPeriod::Monthly,
        }
    }
}

/// Batch sales analytics: clean a sales data file, aggregate revenue
/// statistics, enrich product metadata, and emit a text report.
#[derive(Debug, Parser)]
#[command(name = "sales-analytics", version)]
struct Cli {
    /// Input sales data file (pipe-delimited, header row)
    input: PathBuf,

    /// Only include these regions (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Earliest transaction date to include (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest transaction date to include (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Minimum per-transaction revenue to include
    #[arg(long)]
    min_revenue: Option<Decimal>,

    /// Maximum per-transaction revenue to include
    #[arg(long)]
    max_revenue: Option<Decimal>,

    /// Trend bucketing granularity
    #[arg(long, value_enum, default_value_t = TrendArg::Daily)]
    trend: TrendArg,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Skip the product API call
    #[arg(long)]
    no_enrich: bool,

    /// Product API base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,
}

impl Cli {
    fn criteria(&self) -> Option<FilterCriteria> {
        let mut criteria = FilterCriteria::new().with_date_range(self.from, self.to);

        if !self.regions.is_empty() {
            criteria = criteria.with_regions(self.regions.iter().cloned());
        }
        if let Some(min) = self.min_revenue {
            criteria = criteria.with_min_revenue(min);
        }
        if let Some(max) = self.max_revenue {
            criteria = criteria.with_max_revenue(max);
        }

        if criteria.is_empty() {
            None
        } else {
            Some(criteria)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("📊 Sales Analytics Pipeline");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load
    println!("\n[1/5] Loading {}...", cli.input.display());
    let loaded = load_file(&cli.input)?;
    println!("✓ {}", loaded.summary());

    for error in loaded.parse_errors.iter().take(5) {
        eprintln!("  ⚠ {}", error);
    }
    if loaded.parse_errors.len() > 5 {
        eprintln!("  ⚠ ... and {} more", loaded.parse_errors.len() - 5);
    }

    // 2. Validate + filter
    println!("\n[2/5] Validating and filtering...");
    let criteria = cli.criteria();
    let validated = validate_and_filter(loaded.records, criteria.as_ref());
    println!("✓ {}", validated.summary());

    // 3. Aggregate
    println!("\n[3/5] Aggregating...");
    let result = aggregate(&validated.records, cli.trend.into());
    println!(
        "✓ {} regions, {} products, {} customers, {} trend periods",
        result.by_region.len(),
        result.by_product.len(),
        result.by_customer.len(),
        result.trend.len()
    );

    // 4. Enrich (best-effort, never fatal)
    let enrichment = if cli.no_enrich {
        println!("\n[4/5] Enrichment skipped (--no-enrich)");
        None
    } else {
        println!("\n[4/5] Fetching product metadata from {}...", cli.api_url);
        match HttpProductSource::new(&cli.api_url) {
            Ok(source) => {
                let enrichment = enrich_products(&result, &source);
                if let Some(error) = &enrichment.fetch_error {
                    eprintln!("  ⚠ Product API unavailable, using placeholders: {}", error);
                }
                let summary = enrichment.summary();
                println!(
                    "✓ Enriched {}/{} products ({:.1}%)",
                    summary.matched,
                    summary.total,
                    summary.success_rate()
                );
                Some(enrichment)
            }
            Err(e) => {
                eprintln!("  ⚠ Could not build HTTP client, skipping enrichment: {:#}", e);
                None
            }
        }
    };

    // 5. Report
    println!("\n[5/5] Generating report...");
    let quality = RunQuality {
        total_rows: loaded.total_rows,
        parse_errors: loaded.parse_errors.len(),
        validation_issues: validated.issues.len(),
        filtered_out: validated.filtered_out,
    };

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create report file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            render_report(&mut writer, &result, enrichment.as_ref(), quality)?;
            writer.flush()?;
            println!("✓ Report saved to: {}", path.display());
        }
        None => {
            println!();
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            render_report(&mut handle, &result, enrichment.as_ref(), quality)?;
        }
    }

    Ok(())
}
