//! Style encoder configuration and factory.
//!
//! Supports multiple encoding backends via a tagged enum configuration.
//! Default is the candle CLIP backend (ViT-B/32). The noop backend exists
//! for tests and for catalog-only commands on machines without the model.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use surrealdb::Datetime;
use tracing::info;

use crate::db::connection::CatalogDb;
use crate::embedding::clip::{ClipEncoder, DEFAULT_CLIP_MODEL};
use crate::embedding::{NoopStyleEncoder, StyleEncoder};
use crate::VestraError;

/// Style encoder configuration.
///
/// Determines which encoding backend to use. Loaded from
/// `{data_path}/encoder.toml` or the `VESTRA_ENCODER` env var.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum EncoderConfig {
    /// Candle CLIP model (default).
    Clip {
        /// HuggingFace repo id. Any ViT-B/32-compatible checkpoint works,
        /// e.g. a fashion-tuned CLIP variant.
        #[serde(default = "default_clip_model")]
        model: String,
        /// Cache directory for model files
        #[serde(default)]
        cache_dir: Option<String>,
    },
    /// Backend that refuses all encode calls.
    Noop,
}

fn default_clip_model() -> String {
    DEFAULT_CLIP_MODEL.to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::Clip {
            model: default_clip_model(),
            cache_dir: None,
        }
    }
}

impl EncoderConfig {
    /// Model id this config would load, without loading it.
    pub fn model_id(&self) -> &str {
        match self {
            Self::Clip { model, .. } => model,
            Self::Noop => "noop",
        }
    }

    /// Embedding dimensionality this config would produce, without loading
    /// any weights.
    pub fn dimensions(&self) -> usize {
        match self {
            Self::Clip { .. } => {
                candle_transformers::models::clip::ClipConfig::vit_base_patch32()
                    .text_config
                    .projection_dim
            }
            Self::Noop => NoopStyleEncoder::new().dimensions(),
        }
    }
}

/// Stored metadata about the encoder that produced a catalog's embeddings.
///
/// Lives in the `catalog_meta:current` singleton record, written after each
/// successful fusion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderMetadata {
    pub encoder_model: String,
    pub dimensions: usize,
    pub updated_at: Datetime,
}

/// Result of comparing the configured encoder against stored catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderMatch {
    /// No metadata stored yet (fresh catalog, or one embedded before metadata
    /// tracking existed).
    NoMetadata,
    /// Configured encoder matches what produced the stored embeddings.
    Match,
    /// Encoder changed since the last fusion run — similarity scores are
    /// unreliable until embeddings are refreshed.
    Mismatch {
        stored_model: String,
        stored_dimensions: usize,
        current_model: String,
        current_dimensions: usize,
    },
}

/// Compare the configured encoder against stored catalog metadata.
pub fn check_encoder_match(
    config: &EncoderConfig,
    stored: Option<&EncoderMetadata>,
) -> EncoderMatch {
    match stored {
        None => EncoderMatch::NoMetadata,
        Some(meta) => {
            if meta.encoder_model == config.model_id() && meta.dimensions == config.dimensions() {
                EncoderMatch::Match
            } else {
                EncoderMatch::Mismatch {
                    stored_model: meta.encoder_model.clone(),
                    stored_dimensions: meta.dimensions,
                    current_model: config.model_id().to_string(),
                    current_dimensions: config.dimensions(),
                }
            }
        }
    }
}

const METADATA_TABLE: &str = "catalog_meta";
const METADATA_KEY: &str = "current";

/// Read the stored encoder metadata, if any fusion run has recorded one.
pub async fn read_encoder_metadata(
    db: &CatalogDb,
) -> Result<Option<EncoderMetadata>, VestraError> {
    let meta: Option<EncoderMetadata> = db.select((METADATA_TABLE, METADATA_KEY)).await?;
    Ok(meta)
}

/// Record which encoder produced the catalog's embeddings.
pub async fn write_encoder_metadata(
    db: &CatalogDb,
    model_id: &str,
    dimensions: usize,
) -> Result<(), VestraError> {
    let meta = EncoderMetadata {
        encoder_model: model_id.to_string(),
        dimensions,
        updated_at: Datetime::from(chrono::Utc::now()),
    };
    let _: Option<EncoderMetadata> = db
        .upsert((METADATA_TABLE, METADATA_KEY))
        .content(meta)
        .await?;
    Ok(())
}

/// Load encoder config with priority:
/// 1. `{data_path}/encoder.toml` file
/// 2. `VESTRA_ENCODER` env var (JSON)
/// 3. Default (CLIP ViT-B/32)
pub fn load_encoder_config(data_path: &Path) -> EncoderConfig {
    // Try file first
    let config_path = data_path.join("encoder.toml");
    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<EncoderConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded encoder config from {}", config_path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse {}: {}. Using default.",
                        config_path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}: {}. Using default.",
                    config_path.display(),
                    e
                );
            }
        }
    }

    // Try env var (JSON format)
    if let Ok(json) = std::env::var("VESTRA_ENCODER") {
        match serde_json::from_str::<EncoderConfig>(&json) {
            Ok(config) => {
                info!("Loaded encoder config from VESTRA_ENCODER env");
                return config;
            }
            Err(e) => {
                tracing::warn!("Failed to parse VESTRA_ENCODER: {}. Using default.", e);
            }
        }
    }

    EncoderConfig::default()
}

/// Create a style encoder from configuration.
///
/// Blocking for the CLIP backend (downloads weights on first run); call via
/// `spawn_blocking` from async contexts.
pub fn create_style_encoder(
    config: &EncoderConfig,
) -> Result<Arc<dyn StyleEncoder>, VestraError> {
    match config {
        EncoderConfig::Clip { model, cache_dir } => {
            let encoder = ClipEncoder::new(model, cache_dir.as_deref())?;
            Ok(Arc::new(encoder))
        }
        EncoderConfig::Noop => Ok(Arc::new(NoopStyleEncoder::new())),
    }
}
