//! Derived image pipeline: fit within the bounding box, re-encode as JPEG.

use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};

use crate::config::{IMAGE_JPEG_QUALITY, IMAGE_MAX_HEIGHT, IMAGE_MAX_WIDTH};
use crate::errors::{AppError, AppResult};

/// Decode, downscale to fit 1200x800 (never upscale) and encode at quality 80.
pub fn normalize(raw: &[u8]) -> AppResult<Vec<u8>> {
    let decoded = image::load_from_memory(raw).map_err(|e| {
        tracing::warn!(error = %e, "Unreadable image upload");
        AppError::UploadFailure
    })?;

    let fitted = if decoded.width() > IMAGE_MAX_WIDTH || decoded.height() > IMAGE_MAX_HEIGHT {
        decoded.resize(IMAGE_MAX_WIDTH, IMAGE_MAX_HEIGHT, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(fitted.to_rgb8());

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, IMAGE_JPEG_QUALITY);
    rgb.write_with_encoder(encoder).map_err(|e| {
        tracing::error!(error = %e, "Image encoding failed");
        AppError::UploadFailure
    })?;
    Ok(buf)
}

/// [`normalize`] on the blocking pool.
pub async fn normalize_blocking(raw: Bytes) -> AppResult<Bytes> {
    tokio::task::spawn_blocking(move || normalize(&raw))
        .await
        .map_err(|e| AppError::internal(format!("Image task failed: {}", e)))?
        .map(Bytes::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn dimensions(encoded: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(encoded).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_wide_image_fits_width() {
        let out = normalize(&png(2400, 1200)).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        assert_eq!(dimensions(&out), (1200, 600));
    }

    #[test]
    fn test_tall_image_fits_height() {
        let out = normalize(&png(800, 1600)).unwrap();
        assert_eq!(dimensions(&out), (400, 800));
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let out = normalize(&png(300, 200)).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        assert_eq!(dimensions(&out), (300, 200));
    }

    #[test]
    fn test_output_is_deterministic() {
        let input = png(1600, 900);
        assert_eq!(normalize(&input).unwrap(), normalize(&input).unwrap());
    }

    #[test]
    fn test_garbage_is_upload_failure() {
        assert!(matches!(
            normalize(b"definitely not an image"),
            Err(AppError::UploadFailure)
        ));
    }

    #[tokio::test]
    async fn test_normalize_blocking() {
        let out = normalize_blocking(Bytes::from(png(10, 10))).await.unwrap();
        assert_eq!(dimensions(&out), (10, 10));
    }
}
