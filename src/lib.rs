// Sales Analytics Pipeline - Core Library
// Loader → Validator/Filter → Aggregator → Enrichment → Report

pub mod record;     // SalesRecord model
pub mod loader;     // Encoding resolution + row parsing
pub mod validate;   // Sanity validation + filter criteria
pub mod aggregate;  // Single-pass multi-dimensional aggregation
pub mod enrich;     // Best-effort product metadata client
pub mod report;     // Text report rendering

// Re-export commonly used types
pub use record::SalesRecord;
pub use loader::{
    Encoding, EncodingError, LoadOutcome, ParseError,
    load_bytes, load_file, load_file_with_encodings, DEFAULT_ENCODINGS,
};
pub use validate::{
    FilterCriteria, ValidationIssue, ValidationOutcome, validate_and_filter,
};
pub use aggregate::{
    aggregate, AggregationResult, CustomerStats, PeriodStats, ProductStats,
    RegionStats, TrendPeriod,
};
pub use enrich::{
    enrich_products, ApiProduct, Enrichment, EnrichmentSummary,
    HttpProductSource, ProductMeta, ProductSource, DEFAULT_API_URL,
};
pub use report::{render_report, RunQuality};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
