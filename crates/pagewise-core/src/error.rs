//! Error types for the pagewise-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the pagewise library.
#[derive(Error, Debug)]
pub enum PagewiseError {
    /// The input document does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract an embedded image.
    #[error("failed to extract image: {0}")]
    ImageExtraction(String),

    /// Failed to rasterize a page.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page index requested.
    #[error("invalid page index: {0}")]
    InvalidPage(u32),
}

/// Errors related to the OCR engine and orientation detection.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine binary could not be found.
    #[error("OCR engine not found: {0}")]
    EngineNotFound(String),

    /// The engine did not finish within the allotted time.
    #[error("OCR engine timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The engine ran but reported a failure.
    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The engine output could not be interpreted.
    #[error("malformed engine output: {0}")]
    MalformedOutput(String),
}

/// Result type for the pagewise library.
pub type Result<T> = std::result::Result<T, PagewiseError>;
