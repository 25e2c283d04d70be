//! Shared initialization logic for CLI commands.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::db::connection::{init_db, load_db_config, CatalogDb};
use crate::db::schema::apply_schema;
use crate::embedding::provider::{check_encoder_match, read_encoder_metadata, EncoderMatch};
use crate::embedding::{load_encoder_config, EncoderConfig};
use crate::rules::{load_outfit_rules, OutfitRules};
use crate::services::{CatalogRecommender, RecommendService};

/// Application context holding the catalog handle and services.
///
/// The style encoder is deliberately not constructed here: loading CLIP
/// weights takes seconds (and a download on first run), and only the embed
/// command needs them. Everything else works from stored embeddings.
pub struct AppContext {
    pub db: Arc<CatalogDb>,
    pub data_path: PathBuf,
    pub rules: Arc<OutfitRules>,
    pub encoder_config: EncoderConfig,
    pub encoder_match: EncoderMatch,
    pub recommender: Arc<dyn RecommendService>,
}

impl AppContext {
    /// Initialize application context.
    ///
    /// Data path priority: explicit path > VESTRA_DATA_PATH env > ./.vestra (if exists) > ~/.vestra
    pub async fn new(explicit_path: Option<PathBuf>) -> Result<Self> {
        let data_path = explicit_path
            .or_else(|| std::env::var("VESTRA_DATA_PATH").ok().map(PathBuf::from))
            .or_else(|| {
                let local_path = Path::new(".vestra");
                if local_path.exists() && local_path.is_dir() {
                    Some(local_path.to_path_buf())
                } else {
                    None
                }
            })
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".vestra"))
                    .unwrap_or_else(|| PathBuf::from(".vestra"))
            });

        tracing::info!("Using data path: {}", data_path.display());

        let db_config = load_db_config(&data_path);
        let db = init_db(&db_config, &data_path).await?;
        tracing::info!("Catalog connected");

        apply_schema(&db).await?;
        tracing::info!("Schema applied");

        let db = Arc::new(db);

        // Outfit rules (built-in table or file override)
        let rules = Arc::new(load_outfit_rules(&data_path)?);

        // Encoder config only — the model itself loads lazily in `embed`
        let encoder_config = load_encoder_config(&data_path);
        let stored_meta = read_encoder_metadata(&db).await?;
        let encoder_match = check_encoder_match(&encoder_config, stored_meta.as_ref());
        if let EncoderMatch::Mismatch {
            stored_model,
            current_model,
            ..
        } = &encoder_match
        {
            tracing::warn!(
                "Catalog embedded with '{}' but configured encoder is '{}'",
                stored_model,
                current_model
            );
        }

        let recommender: Arc<dyn RecommendService> =
            Arc::new(CatalogRecommender::new(db.clone(), rules.clone()));

        Ok(Self {
            db,
            data_path,
            rules,
            encoder_config,
            encoder_match,
            recommender,
        })
    }
}
