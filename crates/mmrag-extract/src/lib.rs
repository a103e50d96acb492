//! Content extraction for mmrag.
//!
//! [`PdfExtractor`] implements [`DocumentExtractor`](mmrag_core::DocumentExtractor):
//!
//! - Text is chunked by title with the limits of [`ExtractionConfig`]
//! - Table-like blocks become table extractions
//! - Embedded figures are written to disk as JPEG and returned by path
//!
//! [`encode_image_base64`] prepares a figure for a multimodal chat model.

pub mod chunking;
pub mod config;
pub mod image;
pub mod pdf;

pub use chunking::{build_elements, chunk_by_title, ChunkedText, Element};
pub use config::ExtractionConfig;
pub use image::{encode_image_base64, encode_jpeg};
pub use pdf::PdfExtractor;
