use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::CatalogDb;
use crate::VestraError;

/// Product record as stored in the catalog.
///
/// The style embedding is deliberately not part of the typed model: it is
/// written by the fusion pipeline and read by retrieval through dedicated
/// queries with lenient parsing, so a legacy or corrupt stored value never
/// poisons ordinary catalog reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Set by the fusion pipeline alongside the embedding; cleared when
    /// re-ingestion changes the scraped fields.
    #[serde(default)]
    pub embedded_at: Option<Datetime>,
    pub created_at: Datetime,
    pub updated_at: Datetime,
}

/// Scraped fields for creating (or re-ingesting) a product.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProductCreate {
    pub name: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub product_url: Option<String>,
    pub source: Option<String>,
}

/// Outcome of ingesting one scraped product record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestOutcome {
    /// Product id was new; record created without an embedding.
    Created,
    /// Scraped fields changed; record rewritten and stale embedding cleared.
    Updated,
    /// Scraped fields identical; record (and its embedding) left untouched.
    Unchanged,
}

/// Full record content used when re-ingestion replaces a product.
/// Omits `style_embedding`/`embedded_at`, so the replace clears them.
#[skip_serializing_none]
#[derive(Serialize)]
struct ScrapedContent {
    name: String,
    category: Option<String>,
    image_url: Option<String>,
    brand: Option<String>,
    price: Option<f64>,
    product_url: Option<String>,
    source: Option<String>,
    created_at: Datetime,
    updated_at: Datetime,
}

/// Normalize a caller-supplied identifier to a product `RecordId`.
/// Accepts either the bare catalog key (`hm_3f2a…`) or the full
/// `product:hm_3f2a…` form.
pub fn product_record_id(input: &str) -> RecordId {
    let key = input.strip_prefix("product:").unwrap_or(input);
    RecordId::from_table_key("product", key)
}

/// Create a new product with a caller-specified ID.
///
/// # Arguments
///
/// * `db` - Catalog connection
/// * `id` - Stable catalog identifier (the key part, not the full RecordId)
/// * `data` - Scraped product fields
///
/// # Returns
///
/// The created product with bookkeeping timestamps filled in.
pub async fn create_product_with_id(
    db: &CatalogDb,
    id: &str,
    data: ProductCreate,
) -> Result<Product, VestraError> {
    let result: Option<Product> = db.create(("product", id)).content(data).await?;
    result.ok_or_else(|| VestraError::Catalog("Failed to create product".into()))
}

/// Get a product by ID (bare key or `product:key` form).
pub async fn get_product(db: &CatalogDb, id: &str) -> Result<Option<Product>, VestraError> {
    let result: Option<Product> = db.select(product_record_id(id)).await?;
    Ok(result)
}

/// List products, optionally filtered by category, ordered by name.
pub async fn list_products(
    db: &CatalogDb,
    category: Option<String>,
    limit: usize,
) -> Result<Vec<Product>, VestraError> {
    let mut response = match category {
        Some(cat) => {
            db.query(format!(
                "SELECT * FROM product WHERE category = $category ORDER BY name LIMIT {limit}"
            ))
            .bind(("category", cat))
            .await?
        }
        None => {
            db.query(format!("SELECT * FROM product ORDER BY name LIMIT {limit}"))
                .await?
        }
    };
    let products: Vec<Product> = response.take(0)?;
    Ok(products)
}

/// Ingest one scraped product record, creating or updating as needed.
///
/// Mirrors the scraping layer's contract: when an existing product's scraped
/// fields change, the record is rewritten and its stale style embedding (and
/// `embedded_at`) are dropped so the next fusion run re-embeds it. An
/// identical re-scrape leaves the record and embedding untouched.
pub async fn ingest_product(
    db: &CatalogDb,
    id: &str,
    data: ProductCreate,
) -> Result<IngestOutcome, VestraError> {
    let bare = id.strip_prefix("product:").unwrap_or(id);
    let key = product_record_id(bare);
    let existing: Option<Product> = db.select(key.clone()).await?;

    let Some(current) = existing else {
        create_product_with_id(db, bare, data).await?;
        return Ok(IngestOutcome::Created);
    };

    let unchanged = current.name == data.name
        && current.category == data.category
        && current.image_url == data.image_url
        && current.brand == data.brand
        && current.price == data.price
        && current.product_url == data.product_url
        && current.source == data.source;
    if unchanged {
        return Ok(IngestOutcome::Unchanged);
    }

    let content = ScrapedContent {
        name: data.name,
        category: data.category,
        image_url: data.image_url,
        brand: data.brand,
        price: data.price,
        product_url: data.product_url,
        source: data.source,
        created_at: current.created_at,
        updated_at: Datetime::from(chrono::Utc::now()),
    };
    let result: Option<Product> = db.update(key).content(content).await?;
    result.ok_or_else(|| VestraError::Catalog("Failed to update product".into()))?;
    Ok(IngestOutcome::Updated)
}
