//! Image normalization for recognition requests.
//!
//! Uploads arrive as arbitrary camera photos. Before they go to the
//! recognition service they are downscaled to a bounded long edge, lightly
//! sharpened so small print survives re-compression, and re-encoded as JPEG
//! at a fixed quality. Normalization never fails the pipeline: bytes that
//! cannot be decoded are passed through unchanged.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::config::NormalizeSettings;

/// Image bytes ready for the recognition service.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// False when decoding failed and the original bytes were kept.
    pub was_normalized: bool,
}

/// Re-encodes uploaded receipt photos for text recognition.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    settings: NormalizeSettings,
}

impl ImageNormalizer {
    pub fn new(settings: NormalizeSettings) -> Self {
        Self { settings }
    }

    /// Normalize raw upload bytes.
    ///
    /// The declared media type is a hint only; the real type is sniffed from
    /// the content. On any decode or encode failure the original bytes are
    /// returned with their sniffed (or declared) type.
    pub fn normalize(&self, bytes: &[u8], declared_mime: Option<&str>) -> NormalizedImage {
        let sniffed = infer::get(bytes).map(|t| t.mime_type().to_string());
        let source_mime = sniffed
            .or_else(|| declared_mime.map(str::to_string))
            .unwrap_or_else(|| "image/jpeg".to_string());

        match self.reencode(bytes) {
            Ok(encoded) => {
                debug!(
                    from = bytes.len(),
                    to = encoded.len(),
                    "normalized upload image"
                );
                NormalizedImage {
                    bytes: encoded,
                    mime_type: "image/jpeg".to_string(),
                    was_normalized: true,
                }
            }
            Err(err) => {
                warn!("image normalization failed, passing original through: {err}");
                NormalizedImage {
                    bytes: bytes.to_vec(),
                    mime_type: source_mime,
                    was_normalized: false,
                }
            }
        }
    }

    fn reencode(&self, bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;

        let max_edge = self.settings.max_edge;
        let resized = if decoded.width().max(decoded.height()) > max_edge {
            decoded.resize(max_edge, max_edge, FilterType::Lanczos3)
        } else {
            decoded
        };

        // Mild unsharp mask keeps small receipt print readable after the
        // quality reduction below.
        let sharpened = resized.unsharpen(1.0, 2);

        // JPEG carries no alpha channel.
        let rgb = DynamicImage::ImageRgb8(sharpened.to_rgb8());

        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.settings.jpeg_quality);
        rgb.write_with_encoder(encoder)?;
        Ok(out.into_inner())
    }
}
