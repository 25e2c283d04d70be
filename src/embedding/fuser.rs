//! Style embedding fusion for catalog products.
//!
//! For each product the fuser fetches the product photo, encodes photo and
//! name with the style encoder, and combines the two modalities into a single
//! normalized style vector written back to the catalog record.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use image::DynamicImage;
use serde::Serialize;
use surrealdb::{Datetime, RecordId};
use tracing::{debug, info, warn};

use crate::db::connection::CatalogDb;
use crate::embedding::provider::write_encoder_metadata;
use crate::embedding::{ImageFetcher, StyleEncoder};
use crate::utils::math::{l2_norm, vector_normalize, weighted_sum};
use crate::VestraError;

/// Weight of the image modality in the fused style vector. Visual style
/// dominates perceived compatibility; the name acts as a disambiguator
/// (a graphic tee and a plain tee can look nearly identical).
pub const IMAGE_WEIGHT: f32 = 0.7;
/// Weight of the text modality in the fused style vector.
pub const TEXT_WEIGHT: f32 = 0.3;

/// Products per chunk. Bounds concurrent image downloads.
const CHUNK_SIZE: usize = 32;

/// Combine the available modality embeddings into one style vector.
///
/// Both present: `0.7 * image + 0.3 * text`. One present: that vector,
/// with no re-weighting. Neither: `None`, the product cannot be embedded.
///
/// The combined vector is normalized to unit L2 norm unless its norm is
/// exactly zero, in which case it is kept as-is — a zero vector is a
/// data-quality condition worth flagging, not a runtime error.
pub fn fuse_embeddings(image: Option<Vec<f32>>, text: Option<Vec<f32>>) -> Option<Vec<f32>> {
    let combined = match (image, text) {
        (Some(img), Some(txt)) => weighted_sum(&img, IMAGE_WEIGHT, &txt, TEXT_WEIGHT),
        (Some(img), None) => img,
        (None, Some(txt)) => txt,
        (None, None) => return None,
    };

    if l2_norm(&combined) == 0.0 {
        warn!("Fused style vector has zero norm; storing unnormalized");
        Some(combined)
    } else {
        Some(vector_normalize(&combined))
    }
}

/// Statistics from a fusion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FusionStats {
    pub total_products: usize,
    pub embedded: usize,
    pub failed: usize,
    pub category_stats: HashMap<String, usize>,
}

/// Options controlling which products a fusion run covers.
#[derive(Debug, Clone, Default)]
pub struct FusionOptions {
    /// Re-embed even when a style embedding is already stored.
    pub force: bool,
    /// Restrict the run to one category.
    pub category: Option<String>,
    /// Cap the number of products processed.
    pub limit: Option<usize>,
}

#[derive(serde::Deserialize)]
struct ProductForFusion {
    id: RecordId,
    name: Option<String>,
    category: Option<String>,
    image_url: Option<String>,
}

/// Service that runs embedding fusion over the catalog.
pub struct FusionService {
    db: Arc<CatalogDb>,
    encoder: Arc<dyn StyleEncoder>,
    fetcher: ImageFetcher,
}

impl FusionService {
    pub fn new(db: Arc<CatalogDb>, encoder: Arc<dyn StyleEncoder>) -> Result<Self, VestraError> {
        Ok(Self {
            db,
            encoder,
            fetcher: ImageFetcher::new()?,
        })
    }

    /// Fuse style embeddings for every product the options select.
    ///
    /// By default only products missing a `style_embedding` are processed;
    /// `force` re-embeds the selected set regardless. One product's failure
    /// never aborts the run — it is logged and counted, and a later run
    /// naturally retries since the product still has no embedding.
    pub async fn run(&self, options: FusionOptions) -> Result<FusionStats, VestraError> {
        if !self.encoder.is_available() {
            return Err(VestraError::Encoder(
                "Style encoder not available - cannot fuse embeddings".to_string(),
            ));
        }

        let products = self.select_products(&options).await?;
        let mut stats = FusionStats {
            total_products: products.len(),
            ..Default::default()
        };

        if products.is_empty() {
            info!("No products need embedding");
            return Ok(stats);
        }

        info!(
            "Fusing style embeddings for {} products with {}",
            products.len(),
            self.encoder.model_id()
        );

        for chunk in products.chunks(CHUNK_SIZE) {
            let images = join_all(chunk.iter().map(|p| self.fetch_image_modality(p))).await;
            for (product, image) in chunk.iter().zip(images) {
                self.fuse_and_store(product, image, &mut stats).await;
            }
        }

        info!(
            "Fusion complete: {} total, {} embedded, {} failed",
            stats.total_products, stats.embedded, stats.failed
        );

        if stats.embedded > 0 {
            if let Err(e) =
                write_encoder_metadata(&self.db, self.encoder.model_id(), self.encoder.dimensions())
                    .await
            {
                warn!("Failed to update encoder metadata: {}", e);
            }
        }

        Ok(stats)
    }

    /// Select the products a run covers: missing embeddings by default, the
    /// whole (optionally category-scoped) selection under `force`.
    async fn select_products(
        &self,
        options: &FusionOptions,
    ) -> Result<Vec<ProductForFusion>, VestraError> {
        let mut conditions: Vec<&str> = Vec::new();
        if !options.force {
            conditions.push("style_embedding IS NONE");
        }
        if options.category.is_some() {
            conditions.push("category = $category");
        }

        let mut query = String::from("SELECT id, name, category, image_url FROM product");
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY name");
        if let Some(limit) = options.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        let mut request = self.db.query(query);
        if let Some(category) = &options.category {
            request = request.bind(("category", category.clone()));
        }

        let mut response = request.await?;
        let products: Vec<ProductForFusion> = response.take(0)?;
        Ok(products)
    }

    /// Fetch and decode the product photo, treating any failure as a missing
    /// image modality for this product.
    async fn fetch_image_modality(&self, product: &ProductForFusion) -> Option<DynamicImage> {
        let url = product.image_url.as_deref().filter(|u| !u.is_empty())?;
        match self.fetcher.fetch_image(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Image unavailable for {}: {}", product.id, e);
                None
            }
        }
    }

    /// Encode whatever modalities survived, fuse them, and write the result.
    async fn fuse_and_store(
        &self,
        product: &ProductForFusion,
        image: Option<DynamicImage>,
        stats: &mut FusionStats,
    ) {
        let image_vec = match image {
            Some(img) => match self.encoder.encode_image(&img).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Image encoding failed for {}: {}", product.id, e);
                    None
                }
            },
            None => None,
        };

        let name = product
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let text_vec = match name {
            Some(name) => match self.encoder.encode_text(name).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Text encoding failed for {}: {}", product.id, e);
                    None
                }
            },
            None => {
                debug!("Product {} has no name; skipping text modality", product.id);
                None
            }
        };

        match fuse_embeddings(image_vec, text_vec) {
            Some(embedding) => {
                let update_query = format!(
                    "UPDATE {} SET style_embedding = $embedding, embedded_at = $embedded_at",
                    product.id
                );
                match self
                    .db
                    .query(&update_query)
                    .bind(("embedding", embedding))
                    .bind(("embedded_at", Datetime::from(chrono::Utc::now())))
                    .await
                {
                    Ok(_) => {
                        stats.embedded += 1;
                        if let Some(category) = &product.category {
                            *stats.category_stats.entry(category.clone()).or_insert(0) += 1;
                        }
                        if stats.embedded.is_multiple_of(50) {
                            info!("Fused {} products so far", stats.embedded);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to store embedding for {}: {}", product.id, e);
                        stats.failed += 1;
                    }
                }
            }
            None => {
                warn!(
                    "No usable modality for {} (image and text both unavailable)",
                    product.id
                );
                stats.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "expected {:?}, got {:?}", expected, actual);
        }
    }

    #[test]
    fn both_modalities_are_weighted_then_normalized() {
        let fused = fuse_embeddings(Some(vec![1.0, 0.0]), Some(vec![0.0, 1.0])).unwrap();
        // 0.7*[1,0] + 0.3*[0,1] = [0.7, 0.3], then unit-normalized
        let norm = (0.7f32 * 0.7 + 0.3 * 0.3).sqrt();
        assert_close(&fused, &[0.7 / norm, 0.3 / norm]);
        assert!((l2_norm(&fused) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn image_only_passes_through_up_to_normalization() {
        let fused = fuse_embeddings(Some(vec![3.0, 4.0]), None).unwrap();
        assert_close(&fused, &[0.6, 0.8]);
    }

    #[test]
    fn text_only_passes_through_up_to_normalization() {
        let fused = fuse_embeddings(None, Some(vec![2.0, 0.0])).unwrap();
        assert_close(&fused, &[1.0, 0.0]);
    }

    #[test]
    fn no_modality_yields_none() {
        assert_eq!(fuse_embeddings(None, None), None);
    }

    #[test]
    fn zero_norm_vector_is_kept_unnormalized() {
        let fused = fuse_embeddings(Some(vec![0.0, 0.0]), Some(vec![0.0, 0.0])).unwrap();
        assert_eq!(fused, vec![0.0, 0.0]);
    }

    #[test]
    fn cancelling_modalities_yield_the_zero_vector() {
        // 0.7*[3,-3] + 0.3*[-7,7] cancels out exactly
        let fused = fuse_embeddings(Some(vec![3.0, -3.0]), Some(vec![-7.0, 7.0])).unwrap();
        assert_eq!(fused, vec![0.0, 0.0]);
    }
}
