//! Page classification and extraction pipelines.

pub mod classifier;
mod orchestrator;
mod standalone;

pub use classifier::{DEFAULT_TEXT_THRESHOLD, classify};
pub use orchestrator::{OcrBackend, PagePipeline, PipelineSettings};
pub use standalone::extract_document_text;
