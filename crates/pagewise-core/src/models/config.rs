//! Configuration structures for the page pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PagewiseError, Result};

/// Main configuration for the pagewise pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PagewiseConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering scanned pages.
    pub render_dpi: u32,

    /// Trimmed text-layer length a page must exceed to count as digital.
    pub text_threshold: usize,

    /// Whole-document text length the standalone extractor must exceed
    /// before it skips OCR.
    pub standalone_min_text: usize,

    /// DPI used by the standalone extractor when it falls back to OCR.
    pub standalone_dpi: u32,

    /// Rasterizer executable.
    pub pdftoppm_cmd: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            text_threshold: 100,
            standalone_min_text: 200,
            standalone_dpi: 300,
            pdftoppm_cmd: "pdftoppm".to_string(),
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. "eng" or "eng+deu".
    pub language: String,

    /// OCR engine mode (`--oem`).
    pub engine_mode: u8,

    /// Page segmentation mode (`--psm`).
    pub segmentation_mode: u8,

    /// Run orientation detection before OCR.
    pub use_osd: bool,

    /// Orientation detection timeout in seconds.
    pub osd_timeout_secs: u64,

    /// OCR engine executable.
    pub tesseract_cmd: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            engine_mode: 3,
            segmentation_mode: 6,
            use_osd: true,
            osd_timeout_secs: 10,
            tesseract_cmd: "tesseract".to_string(),
        }
    }
}

impl OcrConfig {
    /// Orientation detection timeout as a `Duration`.
    pub fn osd_timeout(&self) -> Duration {
        Duration::from_secs(self.osd_timeout_secs)
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root output directory.
    pub dir: PathBuf,

    /// Save the rendered and preprocessed rasters of scanned pages.
    pub save_page_images: bool,

    /// Write a machine-readable `report.json`.
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            save_page_images: true,
            write_report: true,
        }
    }
}

impl PagewiseConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PagewiseError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PagewiseError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: PagewiseConfig =
            serde_json::from_str(r#"{"ocr": {"language": "deu"}}"#).unwrap();
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.segmentation_mode, 6);
        assert_eq!(config.pdf.text_threshold, 100);
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PagewiseConfig::default();
        config.pdf.render_dpi = 200;
        config.ocr.use_osd = false;
        config.save(&path).unwrap();

        let loaded = PagewiseConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.render_dpi, 200);
        assert!(!loaded.ocr.use_osd);
        assert_eq!(loaded.ocr.osd_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PagewiseConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, PagewiseError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PagewiseConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PagewiseError::Io(_)));
    }
}
