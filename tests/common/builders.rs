//! Test data builders for catalog products, plus a deterministic encoder.
//!
//! Provides fluent API for creating test products with sensible defaults.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use image::DynamicImage;

use vestra::embedding::StyleEncoder;
use vestra::models::ProductCreate;
use vestra::VestraError;

/// Builder for creating test products.
pub struct ProductBuilder {
    name: String,
    category: Option<String>,
    image_url: Option<String>,
    brand: Option<String>,
    price: Option<f64>,
}

impl ProductBuilder {
    /// Create a new product builder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            image_url: None,
            brand: None,
            price: None,
        }
    }

    /// Set the product category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the product image URL.
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Set the product brand.
    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the product price.
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Build the ProductCreate struct.
    pub fn build(self) -> ProductCreate {
        ProductCreate {
            name: self.name,
            category: self.category,
            image_url: self.image_url,
            brand: self.brand,
            price: self.price,
            ..Default::default()
        }
    }
}

/// Embedding width produced by [`StubStyleEncoder`].
pub const STUB_DIMS: usize = 8;

/// Deterministic in-process style encoder.
///
/// Hashes its input into a direction, so distinct inputs get distinct,
/// reproducible embeddings without any model download.
pub struct StubStyleEncoder {
    fail_marker: Option<String>,
}

impl Default for StubStyleEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StubStyleEncoder {
    pub fn new() -> Self {
        Self { fail_marker: None }
    }

    /// Fail any text encode whose input contains `marker`.
    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            fail_marker: Some(marker.into()),
        }
    }

    fn direction(seed: u64) -> Vec<f32> {
        // Components stay strictly positive so the vector never has zero norm.
        (0..STUB_DIMS)
            .map(|i| (seed.wrapping_add(i as u64 * 7919) % 1000) as f32 / 1000.0 + 0.001)
            .collect()
    }
}

#[async_trait]
impl StyleEncoder for StubStyleEncoder {
    async fn encode_text(&self, text: &str) -> Result<Vec<f32>, VestraError> {
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker) {
                return Err(VestraError::Encoder(format!(
                    "stub refuses to encode '{}'",
                    text
                )));
            }
        }
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        Ok(Self::direction(hasher.finish()))
    }

    async fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>, VestraError> {
        let mut hasher = DefaultHasher::new();
        (image.width(), image.height()).hash(&mut hasher);
        Ok(Self::direction(hasher.finish()))
    }

    fn dimensions(&self) -> usize {
        STUB_DIMS
    }

    fn model_id(&self) -> &str {
        "stub-encoder"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_builder() {
        let data = ProductBuilder::new("Slim Fit Jeans")
            .category("jeans")
            .brand("H&M")
            .price(39.99)
            .build();

        assert_eq!(data.name, "Slim Fit Jeans");
        assert_eq!(data.category, Some("jeans".to_string()));
        assert_eq!(data.brand, Some("H&M".to_string()));
        assert_eq!(data.price, Some(39.99));
        assert_eq!(data.image_url, None);
    }

    #[tokio::test]
    async fn test_stub_encoder_is_deterministic() {
        let encoder = StubStyleEncoder::new();
        let a = encoder.encode_text("denim jacket").await.unwrap();
        let b = encoder.encode_text("denim jacket").await.unwrap();
        let c = encoder.encode_text("red dress").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), STUB_DIMS);
    }
}
