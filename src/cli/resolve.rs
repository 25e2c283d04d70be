//! Product ID resolution and normalization utilities.

use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

use crate::db::connection::CatalogDb;

/// A product matched by name lookup.
#[derive(Debug, Clone)]
pub struct ResolvedProduct {
    /// Bare catalog key (no `product:` prefix).
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct NameResult {
    id: surrealdb::RecordId,
    name: String,
}

/// Resolve an input string to product matches by case-insensitive name search.
///
/// Returns all matches; the caller decides how to handle ambiguity.
pub async fn resolve_product_by_name(
    db: &Arc<CatalogDb>,
    input: &str,
) -> Result<Vec<ResolvedProduct>> {
    let input_lower = input.to_lowercase();

    let mut resp = db
        .query("SELECT id, name FROM product WHERE string::lowercase(name) = $input")
        .bind(("input", input_lower))
        .await?;
    let results: Vec<NameResult> = resp.take(0).unwrap_or_default();

    Ok(results
        .into_iter()
        .map(|r| ResolvedProduct {
            id: r.id.key().to_string(),
            name: r.name,
        })
        .collect())
}
