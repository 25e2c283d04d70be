use crate::db::connection::CatalogDb;
use crate::VestraError;

/// Product catalog table (schemaless scraped records)
const SCHEMA_001: &str = include_str!("migrations/001_products.surql");

/// Category index for candidate scans
const SCHEMA_002: &str = include_str!("migrations/002_product_indexes.surql");

/// Encoder provenance metadata (catalog_meta singleton)
const SCHEMA_003: &str = include_str!("migrations/003_catalog_meta.surql");

/// Apply the catalog schema to an initialized database connection.
///
/// This executes all DEFINE statements in the schema files, creating tables
/// and indexes. Migrations are applied in order:
/// - 001: Product table (schemaless, so scraped field drift and legacy
///   embedding values stay readable)
/// - 002: Category index (candidate scans always filter on category)
/// - 003: Catalog metadata (encoder model/dimensions recorded per fusion run)
///
/// It's safe to call multiple times - each statement is a no-op when the
/// definition already exists.
///
/// # Arguments
///
/// * `db` - An initialized catalog connection
///
/// # Returns
///
/// `Ok(())` if schema applied successfully, `Err(VestraError)` otherwise.
///
/// # Example
///
/// ```no_run
/// # use vestra::db::{connection::{init_db, DbConfig}, schema::apply_schema};
/// # use std::path::Path;
/// # async fn example() -> Result<(), vestra::VestraError> {
/// let config = DbConfig::Embedded { path: Some("./data/catalog.db".into()) };
/// let db = init_db(&config, Path::new("./data")).await?;
/// apply_schema(&db).await?;
/// # Ok(())
/// # }
/// ```
pub async fn apply_schema(db: &CatalogDb) -> Result<(), VestraError> {
    db.query(SCHEMA_001).await?;
    db.query(SCHEMA_002).await?;
    db.query(SCHEMA_003).await?;
    Ok(())
}
