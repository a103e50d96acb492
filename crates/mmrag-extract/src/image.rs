//! Image encoding helpers.
//!
//! Chat backends receive figures as base64 JPEG, whatever format they were
//! stored in on disk.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;
use mmrag_core::ExtractError;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Load the image at `path`, re-encode it as JPEG and return standard base64.
pub async fn encode_image_base64(path: &Path) -> Result<String, ExtractError> {
    debug!("Encoding image: {:?}", path);
    let bytes = tokio::fs::read(path).await?;

    tokio::task::spawn_blocking(move || {
        let img = image::load_from_memory(&bytes)
            .map_err(|e| ExtractError::Parse(format!("failed to decode image: {e}")))?;
        let jpeg = encode_jpeg(&img)?;
        Ok(STANDARD.encode(jpeg))
    })
    .await
    .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))?
}

/// Encode an image as JPEG bytes.
///
/// JPEG has no alpha or 16-bit support, so such images are flattened first.
pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, ExtractError> {
    let flattened = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => None,
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            Some(DynamicImage::ImageLuma8(img.to_luma8()))
        }
        _ => Some(DynamicImage::ImageRgb8(img.to_rgb8())),
    };
    let source = flattened.as_ref().unwrap_or(img);

    let mut out = Vec::new();
    source
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .map_err(|e| ExtractError::Failed(format!("JPEG encoding failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_encode_png_as_jpeg_base64() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.png");
        RgbaImage::from_pixel(64, 64, Rgba([200, 30, 30, 255]))
            .save(&path)
            .unwrap();

        let encoded = encode_image_base64(&path).await.unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        // JPEG SOI marker
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_encode_missing_file_is_io_error() {
        let err = encode_image_base64(Path::new("/nonexistent/figure.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[tokio::test]
    async fn test_encode_garbage_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let err = encode_image_base64(&path).await.unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn test_encode_jpeg_gray() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::new(8, 8));
        let jpeg = encode_jpeg(&img).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
