//! HTTP retrieval of product images for the embedding pipeline.

use std::time::Duration;

use image::DynamicImage;
use tracing::debug;

use crate::VestraError;

const USER_AGENT: &str = "vestra/0.1";

/// Fixed per-request timeout. A slow CDN counts as an image-modality failure
/// for that product instead of stalling the whole batch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Downloads and decodes product images.
///
/// Every failure mode (DNS, timeout, non-2xx status, undecodable bytes) maps
/// to [`VestraError::ImageFetch`] so callers can fall back to text-only
/// embedding for that product.
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new() -> Result<Self, VestraError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch an image by URL and decode it.
    pub async fn fetch_image(&self, url: &str) -> Result<DynamicImage, VestraError> {
        let url = normalize_url(url);
        debug!("Fetching image: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(VestraError::ImageFetch(format!(
                "'{}' returned {}",
                url,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        decode_image(&bytes)
    }
}

/// Catalog feeds commonly store protocol-relative URLs
/// (`//cdn.example.com/x.jpg`); upgrade those to https.
fn normalize_url(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Decode raw bytes into an image, sniffing the format from content.
fn decode_image(bytes: &[u8]) -> Result<DynamicImage, VestraError> {
    image::load_from_memory(bytes)
        .map_err(|e| VestraError::ImageFetch(format!("Failed to decode image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrades_protocol_relative_urls() {
        assert_eq!(
            normalize_url("//cdn.example.com/shoe.jpg"),
            "https://cdn.example.com/shoe.jpg"
        );
    }

    #[test]
    fn leaves_absolute_urls_untouched() {
        assert_eq!(
            normalize_url("http://example.com/shoe.jpg"),
            "http://example.com/shoe.jpg"
        );
        assert_eq!(
            normalize_url("https://example.com/shoe.jpg"),
            "https://example.com/shoe.jpg"
        );
    }

    #[test]
    fn decodes_png_bytes() {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&buf).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 2);
    }

    #[test]
    fn rejects_undecodable_bytes() {
        let err = decode_image(b"not an image").unwrap_err();
        assert!(matches!(err, VestraError::ImageFetch(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let fetcher = ImageFetcher::new().unwrap();
        // Port 1 refuses connections immediately.
        let err = fetcher
            .fetch_image("http://127.0.0.1:1/shoe.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, VestraError::ImageFetch(_)));
    }
}
