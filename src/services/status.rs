//! Catalog health overview: product counts and embedding coverage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::connection::CatalogDb;
use crate::embedding::provider::{read_encoder_metadata, EncoderMetadata};
use crate::VestraError;

/// Embedding coverage for one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCoverage {
    pub category: String,
    pub total: usize,
    pub embedded: usize,
}

/// Snapshot of catalog size, embedding coverage, and the recorded encoder.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_products: usize,
    pub embedded: usize,
    pub categories: Vec<CategoryCoverage>,
    pub encoder: Option<EncoderMetadata>,
}

impl CatalogStats {
    /// Embedding coverage as a percentage, `None` for an empty catalog.
    pub fn coverage_percent(&self) -> Option<f64> {
        if self.total_products == 0 {
            None
        } else {
            Some(self.embedded as f64 / self.total_products as f64 * 100.0)
        }
    }
}

/// Label used for products without a category.
pub const UNCATEGORIZED: &str = "(none)";

/// Collect catalog statistics for the status overview.
///
/// Reads counts only — never loads the encoder. The recorded metadata says
/// which model produced the stored embeddings without paying for a model
/// load on every status call.
pub async fn collect_catalog_stats(db: &CatalogDb) -> Result<CatalogStats, VestraError> {
    #[derive(Deserialize)]
    struct CountResult {
        count: usize,
    }

    let mut total_resp = db
        .query("SELECT count() AS count FROM product GROUP ALL")
        .await?;
    let total_rows: Vec<CountResult> = total_resp.take(0).unwrap_or_default();
    let total_products = total_rows.first().map(|r| r.count).unwrap_or(0);

    let mut embedded_resp = db
        .query("SELECT count() AS count FROM product WHERE style_embedding IS NOT NONE GROUP ALL")
        .await?;
    let embedded_rows: Vec<CountResult> = embedded_resp.take(0).unwrap_or_default();
    let embedded = embedded_rows.first().map(|r| r.count).unwrap_or(0);

    #[derive(Deserialize)]
    struct CategoryCount {
        category: Option<String>,
        count: usize,
    }

    let mut by_category: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    let mut cat_total_resp = db
        .query("SELECT category, count() AS count FROM product GROUP BY category")
        .await?;
    let cat_totals: Vec<CategoryCount> = cat_total_resp.take(0).unwrap_or_default();
    for row in cat_totals {
        let key = row.category.unwrap_or_else(|| UNCATEGORIZED.to_string());
        by_category.entry(key).or_default().0 += row.count;
    }

    let mut cat_embedded_resp = db
        .query(
            "SELECT category, count() AS count FROM product \
             WHERE style_embedding IS NOT NONE GROUP BY category",
        )
        .await?;
    let cat_embedded: Vec<CategoryCount> = cat_embedded_resp.take(0).unwrap_or_default();
    for row in cat_embedded {
        let key = row.category.unwrap_or_else(|| UNCATEGORIZED.to_string());
        by_category.entry(key).or_default().1 += row.count;
    }

    let categories = by_category
        .into_iter()
        .map(|(category, (total, embedded))| CategoryCoverage {
            category,
            total,
            embedded,
        })
        .collect();

    let encoder = read_encoder_metadata(db).await?;

    Ok(CatalogStats {
        total_products,
        embedded,
        categories,
        encoder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total: usize, embedded: usize) -> CatalogStats {
        CatalogStats {
            total_products: total,
            embedded,
            categories: Vec::new(),
            encoder: None,
        }
    }

    #[test]
    fn coverage_is_a_percentage() {
        let coverage = stats(4, 3).coverage_percent().unwrap();
        assert!((coverage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn empty_catalog_has_no_coverage() {
        assert_eq!(stats(0, 0).coverage_percent(), None);
    }

    #[test]
    fn full_coverage_is_one_hundred_percent() {
        let coverage = stats(7, 7).coverage_percent().unwrap();
        assert!((coverage - 100.0).abs() < 1e-9);
    }
}
