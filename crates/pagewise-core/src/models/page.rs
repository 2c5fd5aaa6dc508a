//! Per-page result types produced by the pipeline.

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::ocr::Rotation;
use crate::pdf::ExtractedImage;

/// Outcome of the text-presence classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// The page carries a usable machine-readable text layer.
    DigitalText,
    /// The page is raster-only and needs OCR.
    Scanned,
}

/// Classification decision together with the length it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: PageKind,
    /// Character count of the trimmed text layer.
    pub text_length: usize,
}

impl Classification {
    pub fn is_digital(&self) -> bool {
        self.kind == PageKind::DigitalText
    }
}

/// How a page's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    DigitalExtraction,
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::DigitalExtraction => "digital_extraction",
            ExtractionMethod::Ocr => "ocr",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box in raster pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width over height, 0.0 for a zero-height box.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// A region of a scanned page that likely holds a figure.
#[derive(Debug, Clone)]
pub struct FigureRegion {
    /// Position of the region within the page raster.
    pub bbox: BoundingBox,
    /// Pixels cropped from the colour raster.
    pub image: DynamicImage,
}

/// An embedded image pulled out of the PDF, tagged with its position in the
/// page's image list (1-based).
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub sequence: usize,
    pub image: ExtractedImage,
}

impl EmbeddedImage {
    /// File name used when the image is saved, e.g. `page3_img1.jpeg`.
    pub fn file_name(&self, page_number: u32) -> String {
        format!("page{}_img{}.{}", page_number, self.sequence, self.image.extension)
    }
}

/// Rasters kept for scanned pages so they can be persisted.
#[derive(Debug, Clone)]
pub struct PageRasters {
    /// Page as rendered, before orientation correction.
    pub original: DynamicImage,
    /// Orientation-corrected grayscale image handed to OCR.
    pub processed: DynamicImage,
}

/// Text and by-products of a page, by extraction path.
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Text layer taken verbatim; figures are not computed on this path.
    Digital { text: String },
    /// Text recognised from the rendered page.
    Ocr {
        text: String,
        figures: Vec<FigureRegion>,
        rotation: Rotation,
        rasters: PageRasters,
    },
}

/// Everything the pipeline produced for one page.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// Page number (1-indexed).
    pub page_number: u32,
    pub classification: Classification,
    pub content: PageContent,
    pub embedded_images: Vec<EmbeddedImage>,
}

impl PageResult {
    pub fn method(&self) -> ExtractionMethod {
        match self.content {
            PageContent::Digital { .. } => ExtractionMethod::DigitalExtraction,
            PageContent::Ocr { .. } => ExtractionMethod::Ocr,
        }
    }

    pub fn text(&self) -> &str {
        match &self.content {
            PageContent::Digital { text } | PageContent::Ocr { text, .. } => text,
        }
    }

    /// Detected figures; always empty for digital pages.
    pub fn figures(&self) -> &[FigureRegion] {
        match &self.content {
            PageContent::Digital { .. } => &[],
            PageContent::Ocr { figures, .. } => figures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_zero_height() {
        let bbox = BoundingBox { x: 0, y: 0, width: 10, height: 0 };
        assert_eq!(bbox.aspect_ratio(), 0.0);
        assert_eq!(bbox.area(), 0);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(ExtractionMethod::DigitalExtraction.to_string(), "digital_extraction");
        assert_eq!(ExtractionMethod::Ocr.to_string(), "ocr");
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::Ocr).unwrap(),
            "\"ocr\""
        );
    }

    #[test]
    fn test_digital_page_has_no_figures() {
        let page = PageResult {
            page_number: 1,
            classification: Classification { kind: PageKind::DigitalText, text_length: 120 },
            content: PageContent::Digital { text: "hello".to_string() },
            embedded_images: Vec::new(),
        };
        assert_eq!(page.method(), ExtractionMethod::DigitalExtraction);
        assert_eq!(page.text(), "hello");
        assert!(page.figures().is_empty());
    }
}
