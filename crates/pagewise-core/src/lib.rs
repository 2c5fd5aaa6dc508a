//! Core library for page-wise PDF text extraction.
//!
//! This crate provides:
//! - Text-layer classification deciding between direct extraction and OCR
//! - PDF access (text layers, embedded images) and page rasterization
//! - Tesseract-backed OCR with best-effort orientation correction
//! - Heuristic figure detection on scanned pages
//! - The on-disk output layout of a processing run

mod command;
pub mod error;
pub mod figures;
pub mod models;
pub mod ocr;
pub mod output;
pub mod pdf;
pub mod pipeline;

pub use error::{OcrError, PagewiseError, PdfError, Result};
pub use figures::{FigureDetector, FigureFinder};
pub use models::{
    BoundingBox, Classification, DocumentReport, ExtractionMethod, FigureRegion, PageContent,
    PageKind, PageReport, PageResult, PagewiseConfig,
};
pub use ocr::{OrientationCorrector, Rotation, Tesseract};
pub use output::OutputLayout;
pub use pdf::{PageSource, PdfDocument, PdftoppmRasterizer};
pub use pipeline::{PagePipeline, classify, extract_document_text};
