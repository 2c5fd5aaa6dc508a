//! Serializable run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::page::{BoundingBox, ExtractionMethod, PageContent, PageKind, PageResult};

/// Summary of one processed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Source document path as given by the caller.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub page_count: usize,
    pub pages: Vec<PageReport>,
}

/// Summary of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub page_number: u32,
    pub kind: PageKind,
    pub method: ExtractionMethod,
    /// Trimmed text-layer length used for classification.
    pub text_layer_length: usize,
    /// Character count of the text produced for the page.
    pub text_length: usize,
    /// Clockwise correction applied before OCR, in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u16>,
    pub figures: Vec<BoundingBox>,
    /// File names of the embedded images saved for the page.
    pub embedded_images: Vec<String>,
}

impl DocumentReport {
    pub fn new(source: impl Into<String>, results: &[PageResult]) -> Self {
        Self::from_pages(source, results.iter().map(PageReport::from).collect())
    }

    /// Build from page summaries collected while the pages were streamed out.
    pub fn from_pages(source: impl Into<String>, pages: Vec<PageReport>) -> Self {
        Self {
            source: source.into(),
            generated_at: Utc::now(),
            page_count: pages.len(),
            pages,
        }
    }

    pub fn digital_pages(&self) -> usize {
        self.count_method(ExtractionMethod::DigitalExtraction)
    }

    pub fn ocr_pages(&self) -> usize {
        self.count_method(ExtractionMethod::Ocr)
    }

    pub fn total_figures(&self) -> usize {
        self.pages.iter().map(|p| p.figures.len()).sum()
    }

    pub fn total_embedded_images(&self) -> usize {
        self.pages.iter().map(|p| p.embedded_images.len()).sum()
    }

    fn count_method(&self, method: ExtractionMethod) -> usize {
        self.pages.iter().filter(|p| p.method == method).count()
    }
}

impl From<&PageResult> for PageReport {
    fn from(result: &PageResult) -> Self {
        let rotation = match &result.content {
            PageContent::Digital { .. } => None,
            PageContent::Ocr { rotation, .. } => Some(rotation.degrees()),
        };

        Self {
            page_number: result.page_number,
            kind: result.classification.kind,
            method: result.method(),
            text_layer_length: result.classification.text_length,
            text_length: result.text().chars().count(),
            rotation,
            figures: result.figures().iter().map(|f| f.bbox).collect(),
            embedded_images: result
                .embedded_images
                .iter()
                .map(|image| image.file_name(result.page_number))
                .collect(),
        }
    }
}
