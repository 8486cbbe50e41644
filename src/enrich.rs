// Enrichment Client - best-effort product metadata lookup
// One time-bounded GET against the product API; any failure degrades to
// "unknown" placeholders instead of failing the pipeline.

use crate::aggregate::AggregationResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://dummyjson.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PRODUCT_LIMIT: u32 = 100;

pub const UNKNOWN: &str = "unknown";

// ============================================================================
// API TYPES
// ============================================================================

/// Product as returned by the API (DummyJSON shape).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProduct {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProductListResponse {
    products: Vec<ApiProduct>,
}

// ============================================================================
// PRODUCT SOURCE
// ============================================================================

/// Seam for the remote catalog so the pipeline can be tested offline.
pub trait ProductSource {
    fn fetch_products(&self) -> Result<Vec<ApiProduct>>;
}

/// HTTP-backed source. Blocking client with a request timeout so the
/// pipeline cannot stall indefinitely.
pub struct HttpProductSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpProductSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpProductSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl ProductSource for HttpProductSource {
    fn fetch_products(&self) -> Result<Vec<ApiProduct>> {
        let url = format!("{}/products?limit={}", self.base_url, PRODUCT_LIMIT);

        let body = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Product API request failed: {}", url))?
            .error_for_status()
            .context("Product API returned an error status")?
            .text()
            .context("Failed to read product API response")?;

        let response: ProductListResponse =
            serde_json::from_str(&body).context("Failed to decode product API response")?;

        Ok(response.products)
    }
}

// ============================================================================
// PRODUCT METADATA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMeta {
    pub title: String,
    pub category: String,
    pub brand: String,
    pub rating: Option<f64>,
    pub matched: bool,
}

impl ProductMeta {
    /// Placeholder used when the catalog has no entry or the API failed.
    pub fn unknown() -> Self {
        ProductMeta {
            title: UNKNOWN.to_string(),
            category: UNKNOWN.to_string(),
            brand: UNKNOWN.to_string(),
            rating: None,
            matched: false,
        }
    }
}

impl From<&ApiProduct> for ProductMeta {
    fn from(product: &ApiProduct) -> Self {
        ProductMeta {
            title: product.title.clone(),
            category: product.category.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            brand: product.brand.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            rating: product.rating,
            matched: true,
        }
    }
}

// ============================================================================
// ENRICHMENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct Enrichment {
    /// Metadata per aggregate product id, placeholder included
    pub metadata: BTreeMap<String, ProductMeta>,
    /// Set when the catalog fetch failed (non-fatal)
    pub fetch_error: Option<String>,
}

impl Enrichment {
    pub fn summary(&self) -> EnrichmentSummary {
        let total = self.metadata.len();
        let matched = self.metadata.values().filter(|m| m.matched).count();
        let unmatched: Vec<String> = self
            .metadata
            .iter()
            .filter(|(_, m)| !m.matched)
            .map(|(id, _)| id.clone())
            .collect();

        EnrichmentSummary {
            total,
            matched,
            unmatched,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: Vec<String>,
}

impl EnrichmentSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64 * 100.0
        }
    }
}

/// Look up metadata for every product in the aggregation result.
/// Never fails: catalog errors and unknown ids produce placeholders.
pub fn enrich_products(result: &AggregationResult, source: &dyn ProductSource) -> Enrichment {
    let (catalog, fetch_error) = match source.fetch_products() {
        Ok(products) => (build_catalog(products), None),
        Err(e) => (BTreeMap::new(), Some(format!("{:#}", e))),
    };

    let metadata = result
        .by_product
        .keys()
        .map(|product_id| {
            let meta = numeric_id(product_id)
                .and_then(|id| catalog.get(&id))
                .map(ProductMeta::from)
                .unwrap_or_else(ProductMeta::unknown);
            (product_id.clone(), meta)
        })
        .collect();

    Enrichment {
        metadata,
        fetch_error,
    }
}

fn build_catalog(products: Vec<ApiProduct>) -> BTreeMap<u64, ApiProduct> {
    products.into_iter().map(|p| (p.id, p)).collect()
}

/// Aggregate product ids look like "P101"; the API is keyed by the
/// numeric part.
fn numeric_id(product_id: &str) -> Option<u64> {
    product_id.strip_prefix('P')?.parse().ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, TrendPeriod};
    use crate::record::SalesRecord;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct StubSource {
        products: Vec<ApiProduct>,
    }

    impl ProductSource for StubSource {
        fn fetch_products(&self) -> Result<Vec<ApiProduct>> {
            Ok(self.products.clone())
        }
    }

    struct UnreachableSource;

    impl ProductSource for UnreachableSource {
        fn fetch_products(&self) -> Result<Vec<ApiProduct>> {
            anyhow::bail!("connection refused")
        }
    }

    fn api_product(id: u64, title: &str) -> ApiProduct {
        ApiProduct {
            id,
            title: title.to_string(),
            category: Some("electronics".to_string()),
            brand: Some("Acme".to_string()),
            rating: Some(4.5),
        }
    }

    fn result_with_products(ids: &[&str]) -> AggregationResult {
        let records: Vec<SalesRecord> = ids
            .iter()
            .enumerate()
            .map(|(i, product_id)| SalesRecord {
                transaction_id: format!("T{}", i + 1),
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                product_id: product_id.to_string(),
                product_name: format!("Product {}", product_id),
                quantity: 1,
                unit_price: dec!(10),
                customer_id: "C1".to_string(),
                region: "North".to_string(),
                line_number: i + 2,
            })
            .collect();

        aggregate(&records, TrendPeriod::Daily)
    }

    #[test]
    fn test_matched_products_get_api_metadata() {
        let source = StubSource {
            products: vec![api_product(101, "Laptop Pro")],
        };
        let result = result_with_products(&["P101"]);

        let enrichment = enrich_products(&result, &source);

        let meta = &enrichment.metadata["P101"];
        assert!(meta.matched);
        assert_eq!(meta.title, "Laptop Pro");
        assert_eq!(meta.brand, "Acme");
        assert!(enrichment.fetch_error.is_none());
    }

    #[test]
    fn test_missing_catalog_entry_gets_placeholder() {
        let source = StubSource {
            products: vec![api_product(101, "Laptop Pro")],
        };
        let result = result_with_products(&["P101", "P999"]);

        let enrichment = enrich_products(&result, &source);

        assert!(enrichment.metadata["P101"].matched);
        assert_eq!(enrichment.metadata["P999"], ProductMeta::unknown());
    }

    #[test]
    fn test_unreachable_api_is_non_fatal() {
        let result = result_with_products(&["P101", "P102"]);

        let enrichment = enrich_products(&result, &UnreachableSource);

        assert!(enrichment.fetch_error.is_some());
        assert_eq!(enrichment.metadata.len(), 2);
        assert!(enrichment.metadata.values().all(|m| !m.matched));
        assert!(enrichment.metadata.values().all(|m| m.title == UNKNOWN));
    }

    #[test]
    fn test_malformed_product_id_gets_placeholder() {
        let source = StubSource {
            products: vec![api_product(101, "Laptop Pro")],
        };
        let result = result_with_products(&["SKU-101"]);

        let enrichment = enrich_products(&result, &source);

        assert!(!enrichment.metadata["SKU-101"].matched);
    }

    #[test]
    fn test_summary_counts_and_rate() {
        let source = StubSource {
            products: vec![api_product(101, "Laptop Pro")],
        };
        let result = result_with_products(&["P101", "P999"]);

        let summary = enrich_products(&result, &source).summary();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unmatched, vec!["P999".to_string()]);
        assert!((summary.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_api_payload_decodes() {
        // DummyJSON shape; fields beyond the product list are ignored
        let body = r#"{"products":[{"id":101,"title":"Laptop Pro","category":"electronics","rating":4.5}],"total":1,"skip":0,"limit":100}"#;

        let response: ProductListResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.products.len(), 1);
        assert_eq!(response.products[0].id, 101);
        assert_eq!(response.products[0].title, "Laptop Pro");
        assert!(response.products[0].brand.is_none());
    }

    #[test]
    fn test_numeric_id_extraction() {
        assert_eq!(numeric_id("P101"), Some(101));
        assert_eq!(numeric_id("P0"), Some(0));
        assert_eq!(numeric_id("101"), None);
        assert_eq!(numeric_id("Pabc"), None);
        assert_eq!(numeric_id(""), None);
    }
}
