//! Candle-based CLIP backend for style embeddings.
//!
//! Pure-Rust ML runtime using candle with Metal GPU acceleration on macOS.
//! A single CLIP checkpoint serves both modalities: [`ClipEncoder`] projects
//! product photos and product names into one shared embedding space so the
//! two vectors can be fused and compared directly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::{LayerNorm, Module, VarBuilder};
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use image::DynamicImage;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::warn;

use crate::embedding::StyleEncoder;
use crate::VestraError;

/// Default CLIP checkpoint. ViT-B/32 projects both modalities to 512
/// dimensions, matching the embeddings stored in existing catalogs.
pub const DEFAULT_CLIP_MODEL: &str = "openai/clip-vit-base-patch32";

/// Paths to downloaded model files from HuggingFace Hub.
pub struct ModelFiles {
    pub tokenizer_path: PathBuf,
    pub weights_path: PathBuf,
}

/// Download CLIP model files from HuggingFace Hub.
///
/// Uses `hf_hub::api::sync::Api` which caches at `~/.cache/huggingface/hub/`
/// unless `cache_dir` overrides it. Designed to be called from
/// `spawn_blocking` since it performs synchronous I/O. The model config is
/// not downloaded: candle ships the ViT-B/32 hyperparameters.
pub fn download_model(repo_id: &str, cache_dir: Option<&str>) -> Result<ModelFiles> {
    let api = match cache_dir {
        Some(dir) => hf_hub::api::sync::ApiBuilder::new()
            .with_cache_dir(PathBuf::from(dir))
            .build()
            .context("Failed to initialize HuggingFace Hub API")?,
        None => hf_hub::api::sync::Api::new().context("Failed to initialize HuggingFace Hub API")?,
    };
    let repo = api.model(repo_id.to_string());

    let tokenizer_path = repo
        .get("tokenizer.json")
        .context("Failed to download tokenizer.json")?;
    let weights_path = repo
        .get("model.safetensors")
        .context("Failed to download model.safetensors")?;

    Ok(ModelFiles {
        tokenizer_path,
        weights_path,
    })
}

/// Select the best available compute device.
///
/// Tries Metal (macOS) or CUDA (Linux/Windows) if the corresponding feature
/// is enabled. Probes layer-norm support since the CLIP transformer blocks
/// require it — falls back to CPU if the GPU backend lacks the kernel.
pub fn select_device() -> Device {
    #[cfg(target_os = "macos")]
    {
        if let Ok(device) = Device::new_metal(0) {
            if probe_layer_norm(&device) {
                tracing::info!("Using Metal GPU for inference");
                return device;
            }
            tracing::warn!("Metal GPU available but layer-norm not supported, falling back to CPU");
        }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            if probe_layer_norm(&device) {
                tracing::info!("Using CUDA GPU for inference");
                return device;
            }
            tracing::warn!("CUDA GPU available but layer-norm not supported, falling back to CPU");
        }
    }
    tracing::info!("Using CPU for inference");
    Device::Cpu
}

/// Probe whether a device supports layer-norm (required by CLIP).
fn probe_layer_norm(device: &Device) -> bool {
    (|| -> candle_core::Result<()> {
        let weight = Tensor::ones(4, DType::F32, device)?;
        let bias = Tensor::zeros(4, DType::F32, device)?;
        let ln = LayerNorm::new(weight, bias, 1e-5);
        let input = Tensor::randn(0f32, 1.0, (1, 4), device)?;
        let _ = ln.forward(&input)?;
        Ok(())
    })()
    .is_ok()
}

/// Loaded CLIP modules shared across blocking inference calls.
struct ClipModules {
    model: ClipModel,
    tokenizer: Tokenizer,
    device: Device,
    image_size: usize,
}

impl ClipModules {
    fn load(files: &ModelFiles, device: Device, config: &ClipConfig) -> Result<Self> {
        let mut tokenizer = Tokenizer::from_file(&files.tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // CLIP's text tower has a fixed 77-position context; longer product
        // names must be truncated or position-embedding lookup fails.
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.text_config.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure tokenizer truncation: {}", e))?;

        // SAFETY: mmap'd safetensors file — safe as long as the file is not modified
        // while the model is in use.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&files.weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };
        let model = ClipModel::new(vb, config).context("Failed to construct CLIP model")?;

        Ok(Self {
            model,
            tokenizer,
            device,
            image_size: config.image_size,
        })
    }

    /// Encode a text into the shared embedding space.
    ///
    /// Returns the raw (unnormalized) projection; callers normalize after
    /// fusion so the weighting stays meaningful.
    fn encode_text_blocking(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;
        let ids = encoding.get_ids().to_vec();
        if ids.is_empty() {
            anyhow::bail!("Tokenizer produced no tokens");
        }

        let input_ids = Tensor::new(vec![ids], &self.device)?;
        let features = self.model.get_text_features(&input_ids)?;
        let rows = features.to_vec2::<f32>()?;
        rows.into_iter().next().context("Empty text feature batch")
    }

    /// Encode an image into the shared embedding space.
    fn encode_image_blocking(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let pixels = self.preprocess(image)?;
        let batch = pixels.unsqueeze(0)?;
        let features = self.model.get_image_features(&batch)?;
        let rows = features.to_vec2::<f32>()?;
        rows.into_iter().next().context("Empty image feature batch")
    }

    /// Center-crop-resize to the model's input size, force 3-channel RGB,
    /// and scale pixel values to `[-1, 1]`.
    fn preprocess(&self, image: &DynamicImage) -> Result<Tensor> {
        let size = self.image_size;
        let resized = image.resize_to_fill(
            size as u32,
            size as u32,
            image::imageops::FilterType::Triangle,
        );
        let raw = resized.to_rgb8().into_raw();
        let tensor = Tensor::from_vec(raw, (size, size, 3), &Device::Cpu)?
            .permute((2, 0, 1))?
            .to_dtype(DType::F32)?
            .affine(2. / 255., -1.)?
            .to_device(&self.device)?;
        Ok(tensor)
    }
}

/// Dual-modality style encoder backed by a candle CLIP model.
///
/// Attempts to load the checkpoint at construction. If loading fails (e.g.
/// no internet on first run), the encoder reports itself unavailable but
/// construction does not error — commands that never run inference still
/// work offline.
pub struct ClipEncoder {
    modules: Option<Arc<ClipModules>>,
    model_id: String,
    dimensions: usize,
}

impl ClipEncoder {
    /// Download (or reuse cached) model files and load the CLIP checkpoint.
    ///
    /// Blocking: downloads and mmaps weights. Call from `spawn_blocking`
    /// when inside the async runtime.
    pub fn new(model_id: &str, cache_dir: Option<&str>) -> Result<Self, VestraError> {
        let config = ClipConfig::vit_base_patch32();
        let dimensions = config.text_config.projection_dim;

        let loaded = download_model(model_id, cache_dir)
            .and_then(|files| ClipModules::load(&files, select_device(), &config));

        match loaded {
            Ok(modules) => Ok(Self {
                modules: Some(Arc::new(modules)),
                model_id: model_id.to_string(),
                dimensions,
            }),
            Err(e) => {
                warn!(
                    "Failed to load CLIP model '{}': {}. Style encoder will be unavailable.",
                    model_id, e
                );
                Ok(Self {
                    modules: None,
                    model_id: model_id.to_string(),
                    dimensions,
                })
            }
        }
    }

    fn modules(&self) -> Result<Arc<ClipModules>, VestraError> {
        self.modules
            .as_ref()
            .cloned()
            .ok_or_else(|| VestraError::Encoder("Style encoder is not available".to_string()))
    }
}

#[async_trait]
impl StyleEncoder for ClipEncoder {
    async fn encode_text(&self, text: &str) -> Result<Vec<f32>, VestraError> {
        let modules = self.modules()?;
        let text = text.to_string();

        // spawn_blocking since candle inference is synchronous and CPU-bound
        tokio::task::spawn_blocking(move || modules.encode_text_blocking(&text))
            .await
            .map_err(|e| VestraError::Encoder(format!("Task join error: {}", e)))?
            .map_err(|e| VestraError::Encoder(format!("Text encoding failed: {}", e)))
    }

    async fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>, VestraError> {
        let modules = self.modules()?;
        let image = image.clone();

        tokio::task::spawn_blocking(move || modules.encode_image_blocking(&image))
            .await
            .map_err(|e| VestraError::Encoder(format!("Task join error: {}", e)))?
            .map_err(|e| VestraError::Encoder(format!("Image encoding failed: {}", e)))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn is_available(&self) -> bool {
        self.modules.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_device_returns_usable_device() {
        let device = select_device();
        // Whatever was selected must at least construct tensors.
        let t = Tensor::zeros(4, DType::F32, &device);
        assert!(t.is_ok());
    }

    #[test]
    fn probe_layer_norm_passes_on_cpu() {
        assert!(probe_layer_norm(&Device::Cpu));
    }

    /// Requires the ViT-B/32 checkpoint (~600MB download on first run).
    #[test]
    #[ignore = "Requires CLIP model download"]
    fn clip_encodes_text_and_image_into_same_space() {
        let encoder = ClipEncoder::new(DEFAULT_CLIP_MODEL, None).unwrap();
        assert!(encoder.is_available());
        assert_eq!(encoder.dimensions(), 512);

        let modules = encoder.modules().unwrap();
        let text_vec = modules.encode_text_blocking("red leather boots").unwrap();
        assert_eq!(text_vec.len(), 512);

        let img = DynamicImage::new_rgb8(64, 64);
        let img_vec = modules.encode_image_blocking(&img).unwrap();
        assert_eq!(img_vec.len(), 512);
    }
}
