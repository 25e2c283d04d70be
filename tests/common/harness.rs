//! Test harness for catalog lifecycle management.
//!
//! Provides isolated catalog instances per test using tempfile.

use std::sync::Arc;
use tempfile::TempDir;

use vestra::db::connection::{init_db, CatalogDb, DbConfig};
use vestra::db::schema::apply_schema;

/// Test harness that manages catalog lifecycle.
///
/// Each TestHarness creates an isolated catalog in a temporary directory.
/// The database is automatically cleaned up when the harness is dropped.
pub struct TestHarness {
    /// Catalog connection wrapped in Arc for service sharing
    pub db: Arc<CatalogDb>,
    /// Temporary directory (kept alive while harness exists)
    pub temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with an isolated catalog.
    ///
    /// Panics if database initialization fails (appropriate for tests).
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test catalog");

        let db_path = temp_dir.path().join("test.db");
        let config = DbConfig::Embedded {
            path: Some(db_path.to_string_lossy().into_owned()),
        };
        let db = init_db(&config, temp_dir.path())
            .await
            .expect("Failed to initialize test catalog");

        apply_schema(&db)
            .await
            .expect("Failed to apply schema to test catalog");

        Self {
            db: Arc::new(db),
            temp_dir,
        }
    }

    /// Get the path to the temporary directory.
    ///
    /// Useful for creating additional files (e.g., rules overrides) in the
    /// same isolated directory.
    pub fn temp_path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}

/// Write a style embedding directly, the way a fusion run would.
pub async fn set_embedding(db: &CatalogDb, key: &str, embedding: Vec<f32>) {
    db.query(
        "UPDATE type::thing('product', $key) \
         SET style_embedding = $embedding, embedded_at = time::now()",
    )
    .bind(("key", key.to_string()))
    .bind(("embedding", embedding))
    .await
    .expect("Failed to set style embedding");
}

/// Write a raw (possibly malformed) style embedding value.
pub async fn set_raw_embedding(db: &CatalogDb, key: &str, value: serde_json::Value) {
    db.query("UPDATE type::thing('product', $key) SET style_embedding = $value")
        .bind(("key", key.to_string()))
        .bind(("value", value))
        .await
        .expect("Failed to set raw style embedding");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_creates_database() {
        let harness = TestHarness::new().await;
        assert!(Arc::strong_count(&harness.db) == 1);
    }
}
