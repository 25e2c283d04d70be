//! Outfit compatibility retrieval.
//!
//! Given one query product, ranks catalog products from the rule-allowed
//! target categories by style similarity and returns the closest matches.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use tracing::debug;

use crate::db::connection::CatalogDb;
use crate::embedding::provider::read_encoder_metadata;
use crate::models::product::product_record_id;
use crate::rules::OutfitRules;
use crate::utils::math::cosine_similarity;
use crate::VestraError;

/// Default number of recommendations per query.
pub const DEFAULT_RECOMMEND_LIMIT: usize = 5;

/// One ranked recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Bare product key (no `product:` prefix).
    pub id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub score: f32,
}

/// Internal product row with the embedding left unparsed.
///
/// Embeddings written by older ingest paths can be malformed (strings,
/// truncated arrays); deserializing them as raw values lets each row decide
/// between skip and error instead of failing the whole fetch.
#[derive(Debug, Deserialize)]
struct ProductRow {
    id: RecordId,
    name: Option<String>,
    category: Option<String>,
    #[serde(default)]
    style_embedding: Option<serde_json::Value>,
}

/// Recommendation service for outfit compatibility lookups.
#[async_trait]
pub trait RecommendService: Send + Sync {
    /// Rank rule-compatible catalog products by style similarity to the
    /// query product. Returns at most `limit` results, best first.
    async fn recommend(
        &self,
        product_id: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>, VestraError>;
}

/// SurrealDB-backed recommender.
pub struct CatalogRecommender {
    db: Arc<CatalogDb>,
    rules: Arc<OutfitRules>,
}

impl CatalogRecommender {
    pub fn new(db: Arc<CatalogDb>, rules: Arc<OutfitRules>) -> Self {
        Self { db, rules }
    }

    /// Load the query product and parse its stored embedding.
    ///
    /// Failure modes are deliberate and distinct: an unresolved id is
    /// [`VestraError::NotFound`], a product that was never embedded is
    /// [`VestraError::MissingEmbedding`] (never silently "no results"),
    /// and a stored value that does not parse into floats is
    /// [`VestraError::InvalidEmbedding`].
    async fn load_query_product(
        &self,
        product_id: &str,
    ) -> Result<(ProductRow, Vec<f32>), VestraError> {
        let record_id = product_record_id(product_id);
        let product: Option<ProductRow> = self.db.select(record_id).await?;
        let product = product.ok_or_else(|| VestraError::NotFound {
            id: product_id.to_string(),
        })?;

        let raw = match &product.style_embedding {
            None | Some(serde_json::Value::Null) => {
                return Err(VestraError::MissingEmbedding {
                    id: product_id.to_string(),
                })
            }
            Some(value) => value,
        };

        let embedding =
            parse_embedding(raw).map_err(|reason| VestraError::InvalidEmbedding {
                id: product_id.to_string(),
                reason,
            })?;
        if embedding.is_empty() {
            return Err(VestraError::MissingEmbedding {
                id: product_id.to_string(),
            });
        }

        // When a fusion run has recorded the encoder dimensionality, a query
        // embedding of another width cannot be compared meaningfully.
        if let Some(meta) = read_encoder_metadata(&self.db).await? {
            if embedding.len() != meta.dimensions {
                return Err(VestraError::InvalidEmbedding {
                    id: product_id.to_string(),
                    reason: format!(
                        "expected {} dimensions, found {}",
                        meta.dimensions,
                        embedding.len()
                    ),
                });
            }
        }

        Ok((product, embedding))
    }

    /// Fetch candidates: rule-allowed category, embedding present, and never
    /// the query product itself.
    async fn fetch_candidates(
        &self,
        targets: &[String],
        query_id: &RecordId,
    ) -> Result<Vec<ProductRow>, VestraError> {
        let query = "SELECT id, name, category, style_embedding FROM product \
                     WHERE category IN $targets \
                       AND style_embedding IS NOT NONE \
                       AND id != $query_id";
        let mut response = self
            .db
            .query(query)
            .bind(("targets", targets.to_vec()))
            .bind(("query_id", query_id.clone()))
            .await?;
        let candidates: Vec<ProductRow> = response.take(0)?;
        Ok(candidates)
    }
}

#[async_trait]
impl RecommendService for CatalogRecommender {
    async fn recommend(
        &self,
        product_id: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation>, VestraError> {
        let (product, query_embedding) = self.load_query_product(product_id).await?;

        let targets = self.rules.targets_for(product.category.as_deref());
        if targets.is_empty() {
            debug!(
                "No target categories for {:?}; returning no recommendations",
                product.category
            );
            return Ok(Vec::new());
        }

        let candidates = self.fetch_candidates(targets, &product.id).await?;
        debug!("Ranking {} candidates for {}", candidates.len(), product.id);

        Ok(rank_candidates(&query_embedding, candidates, limit))
    }
}

/// Score candidates by true cosine similarity and order them best-first.
///
/// Embeddings are unit-normalized at write time, but legacy vectors may not
/// be — the true cosine (never a bare dot product) keeps those comparable.
/// Candidates whose embedding fails to parse or has the wrong width are
/// skipped, not treated as a failure of the whole request. Ties break on
/// ascending id so a fixed candidate set always ranks identically.
fn rank_candidates(
    query_embedding: &[f32],
    candidates: Vec<ProductRow>,
    limit: usize,
) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = Vec::new();

    for candidate in candidates {
        let raw = match &candidate.style_embedding {
            Some(value) => value,
            None => continue,
        };
        let embedding = match parse_embedding(raw) {
            Ok(v) => v,
            Err(reason) => {
                debug!(
                    "Skipping candidate {} with malformed embedding: {}",
                    candidate.id, reason
                );
                continue;
            }
        };
        if embedding.len() != query_embedding.len() {
            debug!(
                "Skipping candidate {}: dimension mismatch ({} vs {})",
                candidate.id,
                embedding.len(),
                query_embedding.len()
            );
            continue;
        }

        let score = cosine_similarity(query_embedding, &embedding);
        ranked.push(Recommendation {
            id: candidate.id.key().to_string(),
            name: candidate.name,
            category: candidate.category,
            score,
        });
    }

    ranked.sort_by(|a, b| match b.score.partial_cmp(&a.score) {
        Some(std::cmp::Ordering::Equal) | None => a.id.cmp(&b.id),
        Some(ordering) => ordering,
    });
    ranked.truncate(limit);

    ranked
}

/// Parse a stored embedding value into floats.
///
/// Integers are accepted: round components lose their float-ness on some
/// storage paths. Everything else is malformed.
fn parse_embedding(value: &serde_json::Value) -> Result<Vec<f32>, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("expected an array, found {}", value_kind(value)))?;

    let mut parsed = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item.as_f64() {
            Some(n) => parsed.push(n as f32),
            None => return Err(format!("non-numeric element at index {}", i)),
        }
    }
    Ok(parsed)
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
