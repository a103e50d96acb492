//! PDF document extractor.
//!
//! Uses pdf-extract for page text and lopdf for embedded figures. Figures are
//! written as JPEG files under `<image_dir>/<document stem>/`.

use async_trait::async_trait;
use flate2::read::ZlibDecoder;
use lopdf::Document;
use mmrag_core::{DocumentExtractor, ExtractError, Extraction, Extractions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::chunking::{build_elements, chunk_by_title, ChunkedText};
use crate::config::ExtractionConfig;
use crate::image::encode_jpeg;

const MAX_IMAGES: usize = 100;
const MIN_DIMENSION: i64 = 50; // Skip icons and rules

/// Extractor for PDF files.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    config: ExtractionConfig,
}

impl PdfExtractor {
    /// Create an extractor, rejecting unusable chunk sizes.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Directory that receives the figures of `path`.
    pub fn figure_dir(&self, path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        self.config.image_dir.join(stem)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self {
            config: ExtractionConfig::default(),
        }
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<Extractions, ExtractError> {
        info!("Extracting PDF: {:?}", path);

        let bytes = tokio::fs::read(path).await?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractError::UnsupportedType(format!(
                "{} is not a PDF",
                path.display()
            )));
        }

        let config = self.config.clone();
        let chunked = tokio::task::spawn_blocking({
            let bytes = bytes.clone();
            move || extract_text(&bytes, &config)
        })
        .await
        .map_err(|e| ExtractError::Failed(format!("Task join error: {e}")))??;

        let figure_dir = self.figure_dir(path);
        tokio::fs::create_dir_all(&figure_dir).await?;
        let written = tokio::task::spawn_blocking({
            let figure_dir = figure_dir.clone();
            move || write_figures(&bytes, &figure_dir)
        })
        .await
        .map_err(|e| ExtractError::Failed(format!("Image extraction task error: {e}")))?;

        let images = list_figures(&figure_dir).await?;
        info!(
            "Extracted {} text chunks, {} tables, {} images ({} written this run)",
            chunked.texts.len(),
            chunked.tables.len(),
            images.len(),
            written
        );

        Ok(Extractions {
            texts: chunked.texts.into_iter().map(Extraction::text).collect(),
            tables: chunked.tables.into_iter().map(Extraction::table).collect(),
            images: images.iter().map(Extraction::image).collect(),
        })
    }
}

fn extract_text(bytes: &[u8], config: &ExtractionConfig) -> Result<ChunkedText, ExtractError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractError::Parse(format!("PDF text extraction failed: {e}")))?;
    let elements = build_elements(&text);
    debug!("Found {} elements in {} chars", elements.len(), text.len());
    Ok(chunk_by_title(elements, config))
}

/// Write every usable embedded image; returns the number of files written.
fn write_figures(bytes: &[u8], dir: &Path) -> usize {
    let doc = match Document::load_mem(bytes) {
        Ok(d) => d,
        Err(e) => {
            warn!("Failed to load PDF for image extraction: {}", e);
            return 0;
        }
    };

    let mut written = 0;
    'pages: for (page_num, page_id) in doc.get_pages() {
        let page_images = match doc.get_page_images(page_id) {
            Ok(images) => images,
            Err(e) => {
                debug!("Failed to get images from page {}: {}", page_num, e);
                continue;
            }
        };

        for (n, pdf_image) in page_images.iter().enumerate() {
            if written >= MAX_IMAGES {
                debug!("Reached maximum image count ({})", MAX_IMAGES);
                break 'pages;
            }
            if pdf_image.width < MIN_DIMENSION || pdf_image.height < MIN_DIMENSION {
                debug!(
                    "Skipping small image: {}x{}",
                    pdf_image.width, pdf_image.height
                );
                continue;
            }

            let Some(jpeg) = to_jpeg(pdf_image) else {
                continue;
            };
            let target = dir.join(format!("figure-{}-{}.jpg", page_num, n + 1));
            match std::fs::write(&target, jpeg) {
                Ok(()) => written += 1,
                Err(e) => warn!("Failed to write {:?}: {}", target, e),
            }
        }
    }
    written
}

fn to_jpeg(pdf_image: &lopdf::xobject::PdfImage) -> Option<Vec<u8>> {
    let filters = pdf_image.filters.as_deref().unwrap_or_default();

    if filters.iter().any(|f| f == "DCTDecode") {
        return Some(pdf_image.content.to_vec());
    }
    if filters.iter().any(|f| f == "FlateDecode") {
        return match decode_flate(pdf_image) {
            Ok(jpeg) => Some(jpeg),
            Err(e) => {
                warn!("Skipping FlateDecode image: {}", e);
                None
            }
        };
    }
    warn!("Skipping image with unsupported filters {:?}", filters);
    None
}

fn decode_flate(pdf_image: &lopdf::xobject::PdfImage) -> Result<Vec<u8>, String> {
    let mut raw = Vec::new();
    ZlibDecoder::new(pdf_image.content)
        .read_to_end(&mut raw)
        .map_err(|e| format!("decompression failed: {e}"))?;

    let width = u32::try_from(pdf_image.width).map_err(|e| e.to_string())?;
    let height = u32::try_from(pdf_image.height).map_err(|e| e.to_string())?;
    let color_space = pdf_image.color_space.as_deref().unwrap_or("DeviceRGB");

    let img = match color_space {
        "DeviceGray" | "Gray" | "CalGray" => {
            image::GrayImage::from_raw(width, height, raw).map(image::DynamicImage::ImageLuma8)
        }
        "DeviceCMYK" | "CMYK" => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&raw))
            .map(image::DynamicImage::ImageRgb8),
        _ => image::RgbImage::from_raw(width, height, raw).map(image::DynamicImage::ImageRgb8),
    }
    .ok_or_else(|| format!("buffer does not match {width}x{height} {color_space}"))?;

    encode_jpeg(&img).map_err(|e| e.to_string())
}

#[allow(clippy::many_single_char_names)]
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 1.0 - f32::from(px[3]) / 255.0;
            let channel = |v: u8| (255.0 * (1.0 - f32::from(v) / 255.0) * k) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

async fn list_figures(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut figures = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_jpg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg"));
        if is_jpg {
            figures.push(path);
        }
    }
    figures.sort();
    Ok(figures)
}
