//! PDF access: text layers, rasterization, and embedded images.

mod extractor;
mod render;

pub use extractor::{ExtractedImage, PdfDocument};
pub use render::PdftoppmRasterizer;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Reference to an image object inside a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageXref {
    pub object: u32,
    pub generation: u16,
}

impl From<lopdf::ObjectId> for ImageXref {
    fn from((object, generation): lopdf::ObjectId) -> Self {
        Self { object, generation }
    }
}

impl From<ImageXref> for lopdf::ObjectId {
    fn from(xref: ImageXref) -> Self {
        (xref.object, xref.generation)
    }
}

/// Access to the machine-readable text of a document.
///
/// Page indices are 0-based.
pub trait TextLayerReader {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Text layer of a single page, possibly empty.
    fn text_layer(&self, page_index: u32) -> Result<String>;

    /// Text of the whole document.
    fn document_text(&self) -> Result<String> {
        let mut text = String::new();
        for page_index in 0..self.page_count() {
            text.push_str(&self.text_layer(page_index)?);
            text.push('\n');
        }
        Ok(text)
    }
}

/// Renders pages to pixels.
pub trait Rasterizer {
    /// Render a page at the given resolution. Every call produces an
    /// independent image.
    fn render(&self, page_index: u32, dpi: u32) -> Result<DynamicImage>;
}

/// Lists and extracts the raster images embedded in pages.
pub trait ImageLister {
    /// Image objects referenced by a page, in resource order.
    fn list_images(&self, page_index: u32) -> Result<Vec<ImageXref>>;

    /// Pull one image out of the document.
    fn extract_image(&self, xref: ImageXref) -> Result<ExtractedImage>;
}

/// Everything the page pipeline needs from a document.
pub trait PageSource: TextLayerReader + Rasterizer + ImageLister {}

impl<T: TextLayerReader + Rasterizer + ImageLister> PageSource for T {}
