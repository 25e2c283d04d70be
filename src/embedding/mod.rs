//! Style-embedding infrastructure.
//!
//! This module turns raw product inputs (a photo and a short text label) into
//! one fixed-length style vector per product. The StyleEncoder trait abstracts
//! the two encoding modalities for swappability; ClipEncoder implements both
//! with a local CLIP model via candle, and FusionService drives the weighted
//! fusion batch over the catalog.

pub mod clip;
pub mod fetch;
pub mod fuser;
pub mod provider;

use async_trait::async_trait;
use image::DynamicImage;

use crate::VestraError;

pub use clip::ClipEncoder;
pub use fetch::ImageFetcher;
pub use fuser::{FusionOptions, FusionService, FusionStats};
pub use provider::{create_style_encoder, load_encoder_config, EncoderConfig};

/// Service trait for encoding product modalities into style vectors.
///
/// Image and text encodings land in the same vector space so the fusion
/// weighting in [`fuser`] is meaningful. Encoder outputs are raw (not
/// unit-normalized); normalization happens once, after fusion.
#[async_trait]
pub trait StyleEncoder: Send + Sync {
    /// Encode a product's text label.
    ///
    /// # Arguments
    ///
    /// * `text` - The product name or label to encode
    ///
    /// # Returns
    ///
    /// A vector of f32 values representing the text-modality embedding.
    async fn encode_text(&self, text: &str) -> Result<Vec<f32>, VestraError>;

    /// Encode a decoded product image.
    ///
    /// # Arguments
    ///
    /// * `image` - The decoded image (converted to RGB during preprocessing)
    ///
    /// # Returns
    ///
    /// A vector of f32 values representing the image-modality embedding.
    async fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>, VestraError>;

    /// Get embedding dimensions (e.g., 512 for CLIP ViT-B/32).
    fn dimensions(&self) -> usize;

    /// Identifier of the underlying model (recorded in catalog metadata).
    fn model_id(&self) -> &str;

    /// Check if the encoder is available.
    ///
    /// Returns false if the model failed to load (e.g., no internet on first run).
    fn is_available(&self) -> bool;
}

/// No-op style encoder for testing and encoder-less contexts.
///
/// Always reports as unavailable and returns errors for encode operations.
pub struct NoopStyleEncoder;

impl Default for NoopStyleEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopStyleEncoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StyleEncoder for NoopStyleEncoder {
    async fn encode_text(&self, _text: &str) -> Result<Vec<f32>, VestraError> {
        Err(VestraError::Encoder(
            "Style encoder is not available (noop)".to_string(),
        ))
    }

    async fn encode_image(&self, _image: &DynamicImage) -> Result<Vec<f32>, VestraError> {
        Err(VestraError::Encoder(
            "Style encoder is not available (noop)".to_string(),
        ))
    }

    fn dimensions(&self) -> usize {
        512 // Match CLIP ViT-B/32 dimensions
    }

    fn model_id(&self) -> &str {
        "noop"
    }

    fn is_available(&self) -> bool {
        false
    }
}
