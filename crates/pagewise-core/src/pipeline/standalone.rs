//! Whole-document text extraction with a full-OCR fallback.
//!
//! Unlike [`PagePipeline`](super::PagePipeline) this path makes one
//! decision for the whole document: either the text layer is usable as a
//! whole, or every page is rendered and recognised.

use tracing::{info, warn};

use crate::error::Result;
use crate::models::config::PagewiseConfig;
use crate::ocr::TextRecognizer;
use crate::pdf::{Rasterizer, TextLayerReader};

/// Tesseract's default engine mode.
const DEFAULT_ENGINE_MODE: u8 = 3;
/// Tesseract's default page segmentation (fully automatic, no OSD).
const DEFAULT_SEGMENTATION_MODE: u8 = 3;

/// Extract the text of a document, OCRing every page when the text layer is
/// too short.
///
/// A failing text layer is not fatal: it counts as empty and the document
/// goes through OCR.
pub fn extract_document_text<S, R>(source: &S, ocr: &R, config: &PagewiseConfig) -> Result<String>
where
    S: TextLayerReader + Rasterizer + ?Sized,
    R: TextRecognizer + ?Sized,
{
    let text = source.document_text().unwrap_or_else(|e| {
        warn!("Text layer extraction failed, falling back to OCR: {}", e);
        String::new()
    });

    let length = text.chars().count();
    if length > config.pdf.standalone_min_text {
        info!("Using text layer ({} characters)", length);
        return Ok(text);
    }

    info!(
        "Text layer too short ({} characters), running OCR on {} pages",
        length,
        source.page_count()
    );

    let mut pages = Vec::with_capacity(source.page_count() as usize);
    for page_index in 0..source.page_count() {
        let image = source.render(page_index, config.pdf.standalone_dpi)?;
        let page_text = ocr.recognize(
            &image,
            &config.ocr.language,
            DEFAULT_ENGINE_MODE,
            DEFAULT_SEGMENTATION_MODE,
        )?;
        pages.push(page_text);
    }

    Ok(pages.join("\n\n"))
}
